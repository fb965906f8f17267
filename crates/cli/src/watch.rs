use anyhow::{Context, Result};
use library_core::monitor::Monitor;
use library_core::Organizer;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{info, warn};

/// Runs the monitor until Ctrl+C or SIGTERM.
pub async fn watch_directory(organizer: Arc<Mutex<Organizer>>) -> Result<()> {
    let (watch_root, native_events) = {
        let org = organizer.lock().await;
        (
            org.layout().watch_root.clone(),
            org.config().monitor.native_events,
        )
    };

    info!(path = %watch_root.display(), "starting background monitor");

    // The watcher must outlive the loop; dropping it stops events.
    let (_watcher, wake) = if native_events {
        match change_feed(&watch_root) {
            Ok((watcher, rx)) => (Some(watcher), Some(rx)),
            Err(e) => {
                warn!("native change notifications unavailable, polling only: {}", e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let signals = ShutdownSignals::install()?;
    let running = Arc::new(AtomicBool::new(true));
    let stopped = spawn_stopper(signals.recv(), running.clone());

    let mut monitor = Monitor::new(organizer, running).await;
    monitor
        .run(wake, async {
            let _ = stopped.await;
        })
        .await;
    info!("monitor stopped");
    Ok(())
}

/// Clears `running` once `trigger` resolves and reports it on the returned
/// channel, so a stop lands even while a tick is still in progress.
pub fn spawn_stopper<F>(trigger: F, running: Arc<AtomicBool>) -> oneshot::Receiver<()>
where
    F: Future<Output = &'static str> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let name = trigger.await;
        info!("received {}, shutting down", name);
        running.store(false, Ordering::SeqCst);
        let _ = tx.send(());
    });
    rx
}

/// Ctrl+C and SIGTERM handlers, registered when constructed.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("installing SIGINT handler")?,
            terminate: signal(SignalKind::terminate()).context("installing SIGTERM handler")?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self> {
        Ok(Self {})
    }

    /// Resolves with the name of the first signal received.
    #[cfg(unix)]
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "Ctrl+C",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}

/// Non-recursive watcher on `root`; every event becomes one coalescable wake.
fn change_feed(root: &Path) -> notify::Result<(RecommendedWatcher, mpsc::Receiver<()>)> {
    let (tx, rx) = mpsc::channel(1);
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        match event {
            // A full channel already holds a pending wake.
            Ok(_) => {
                let _ = tx.try_send(());
            }
            Err(e) => warn!("watch error: {:?}", e),
        }
    })?;
    watcher.watch(root, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stopper_clears_flag_and_fires() {
        let running = Arc::new(AtomicBool::new(true));
        let stopped = spawn_stopper(async { "test" }, running.clone());
        tokio::time::timeout(Duration::from_secs(2), stopped)
            .await
            .expect("stopper never fired")
            .unwrap();
        assert!(!running.load(Ordering::SeqCst));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_is_caught_once_installed() {
        let signals = ShutdownSignals::install().unwrap();
        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());
        let name = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .expect("signal not delivered");
        assert_eq!(name, "SIGTERM");
    }
}
