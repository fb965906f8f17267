use library_core::notifier::Notifier;
use std::time::Duration;
use tracing::{debug, warn};

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Native notifications through `osascript`. Elsewhere it only logs.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    runtime: Option<tokio::runtime::Handle>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str, subtitle: &str) {
        if !cfg!(target_os = "macos") {
            debug!(title, message, subtitle, "notifications unsupported on this platform");
            return;
        }
        let Some(runtime) = &self.runtime else {
            warn!("no async runtime available for notifications");
            return;
        };
        let script = apple_script(title, message, subtitle);
        runtime.spawn(async move {
            let child = tokio::process::Command::new("osascript")
                .arg("-e")
                .arg(&script)
                .kill_on_drop(true)
                .output();
            match tokio::time::timeout(SCRIPT_TIMEOUT, child).await {
                Ok(Ok(out)) if out.status.success() => debug!("notification sent"),
                Ok(Ok(out)) => warn!(
                    "notification failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
                Ok(Err(e)) => warn!("notification failed: {}", e),
                Err(_) => warn!("notification timed out"),
            }
        });
    }
}

pub fn apple_script(title: &str, message: &str, subtitle: &str) -> String {
    format!(
        "display notification \"{}\" with title \"{}\" subtitle \"{}\"",
        escape(message),
        escape(title),
        escape(subtitle)
    )
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_escapes_quotes_and_backslashes() {
        let script = apple_script("AI \"Library\"", "Moved to: a\\b", "");
        assert_eq!(
            script,
            r#"display notification "Moved to: a\\b" with title "AI \"Library\"" subtitle """#
        );
    }
}
