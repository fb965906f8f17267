/// Fire-and-forget user notifications. Implementations must not block and
/// must swallow their own failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, subtitle: &str);
}

#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _title: &str, _message: &str, _subtitle: &str) {}
}
