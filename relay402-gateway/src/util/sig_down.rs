//! Graceful shutdown signal handling.
//!
//! [`SigDown`] listens for SIGTERM and SIGINT (Ctrl+C on Windows) in a
//! background task and turns the first one into a cancelled
//! [`CancellationToken`]. The gateway hands a clone of that token to
//! `axum::serve(..).with_graceful_shutdown(..)` so in-flight relays finish
//! before the process exits.

#[cfg(unix)]
use tokio::signal::unix::SignalKind;
#[cfg(unix)]
use tokio::signal::unix::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Turns OS shutdown signals into a cancellation token.
///
/// ```ignore
/// let sig_down = SigDown::try_new()?;
/// let token = sig_down.cancellation_token();
/// axum::serve(listener, app)
///     .with_graceful_shutdown(async move { token.cancelled().await })
///     .await?;
/// sig_down.recv().await;
/// ```
#[allow(missing_debug_implementations)] // TaskTracker doesn't impl Debug
pub struct SigDown {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl SigDown {
    /// Registers the signal handlers and spawns the listener task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)] // Result needed on Unix for signal registration
    pub fn try_new() -> Result<Self, std::io::Error> {
        let inner = CancellationToken::new();
        let outer = inner.clone();
        let task_tracker = TaskTracker::new();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            task_tracker.spawn(async move {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, shutting down");
                        inner.cancel();
                    },
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT, shutting down");
                        inner.cancel();
                    },
                    () = inner.cancelled() => {},
                }
            });
        }

        #[cfg(windows)]
        {
            task_tracker.spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received Ctrl-C, shutting down");
                        inner.cancel();
                    },
                    () = inner.cancelled() => {},
                }
            });
        }

        task_tracker.close();
        Ok(Self {
            task_tracker,
            cancellation_token: outer,
        })
    }

    /// Returns a clone of the shutdown token.
    ///
    /// Cancelling any clone also stops the listener task.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Waits until shutdown was requested and the listener task has exited.
    pub async fn recv(&self) {
        self.cancellation_token.cancelled().await;
        self.task_tracker.wait().await;
    }
}
