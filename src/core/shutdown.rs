//! Shutdown coordination
//!
//! A [`ShutdownCoordinator`] turns OS signals (and explicit requests) into a
//! broadcast that long-running work can `select!` on. The first signal asks
//! for a graceful stop so execution queues can drain; a second one exits.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit status used when a second signal forces termination
const FORCED_EXIT_CODE: i32 = 130;

/// Coordinates graceful shutdown across the application
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        };
        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown and notify every subscriber
    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Run `future_fn` with signal handlers installed
    ///
    /// The closure receives a clone of the coordinator (to trigger shutdown
    /// itself) and a receiver that fires on the first signal.
    pub async fn guard<F, Fut, R, E>(future_fn: F) -> Result<R, E>
    where
        F: FnOnce(Self, broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        install_signal_handlers(&coordinator);
        future_fn(coordinator, shutdown_rx).await
    }

    fn on_signal(&self, signal_count: &AtomicUsize, name: &str) {
        let previous = signal_count.fetch_add(1, Ordering::AcqRel);
        if previous >= 1 {
            log::warn!("{} received again; exiting without draining queues", name);
            std::process::exit(FORCED_EXIT_CODE);
        }
        log::info!("{} received; draining execution queues", name);
        self.trigger_shutdown();
    }
}

fn install_signal_handlers(coordinator: &ShutdownCoordinator) {
    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let signals = [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::hangup(), "SIGHUP"),
            (SignalKind::quit(), "SIGQUIT"),
        ];
        for (kind, name) in signals {
            let coordinator = coordinator.clone();
            let signal_count = Arc::clone(&signal_count);
            tokio::spawn(async move {
                match signal(kind) {
                    Ok(mut stream) => {
                        while stream.recv().await.is_some() {
                            coordinator.on_signal(&signal_count, name);
                        }
                    }
                    Err(e) => log::debug!("Could not install {} handler: {}", name, e),
                }
            });
        }
    }

    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            coordinator.on_signal(&signal_count, "Ctrl-C");
        }
    });
}
