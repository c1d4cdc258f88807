//! Process signal handling
//!
//! SIGINT, SIGTERM and SIGQUIT cancel the invocation-wide token.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::Result;

/// Cancel `token` when the process receives a termination signal
///
/// The returned task also ends if `token` is cancelled by other means.
///
/// # Errors
///
/// Returns error if the signal handlers cannot be registered
pub fn install(token: CancellationToken) -> Result<JoinHandle<()>> {
    let signal = termination_signal()?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            name = signal => {
                info!("Received {name}, shutting down");
                token.cancel();
            }
            () = token.cancelled() => {}
        }
    }))
}

#[cfg(unix)]
fn termination_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = quit.recv() => "SIGQUIT",
        }
    })
}

#[cfg(not(unix))]
fn termination_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    Ok(async {
        tokio::signal::ctrl_c().await.ok();
        "Ctrl-C"
    })
}
