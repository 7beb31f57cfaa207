//! Shutdown on Ctrl+C or SIGTERM

use farsight_core::Error;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::signal;
use tracing::{info, warn};

/// Set `stop` once the process receives Ctrl+C or SIGTERM
pub fn on_signal(stop: Arc<AtomicBool>) -> Result<JoinHandle<()>, Error> {
    watch(stop, wait_for_shutdown())
}

/// Set `stop` once `signal` completes. The future runs on its own thread
/// with a single-threaded runtime, so the pacing loop stays synchronous.
pub fn watch<F>(stop: Arc<AtomicBool>, signal: F) -> Result<JoinHandle<()>, Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::library(format!("could not build signal runtime: {}", e)))?;

    thread::Builder::new()
        .name("farsight-signal".to_string())
        .spawn(move || {
            runtime.block_on(signal);
            stop.store(true, Ordering::Relaxed);
        })
        .map_err(|e| Error::library(format!("could not start signal thread: {}", e)))
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Could not listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn test_flag_set_when_signal_completes() {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel::<()>();

        let watcher = watch(stop.clone(), async move {
            let _ = rx.await;
        })
        .unwrap();
        assert!(!stop.load(Ordering::Relaxed));

        tx.send(()).unwrap();
        watcher.join().unwrap();
        assert!(stop.load(Ordering::Relaxed));
    }
}
