//! # OS termination signals for [`Controller::run_until_signal`](crate::Controller::run_until_signal).
//!
//! **Unix:** `SIGINT` (Ctrl-C), `SIGTERM` (systemd/Kubernetes stop), `SIGQUIT`.
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].

use std::io;

/// Which termination signal arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShutdownSignal {
    Interrupt,
    #[cfg_attr(not(unix), allow(dead_code))]
    Terminate,
    #[cfg_attr(not(unix), allow(dead_code))]
    Quit,
}

impl ShutdownSignal {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Quit => "SIGQUIT",
        }
    }
}

/// Completes on the first termination signal.
///
/// Listeners are installed per call; an `Err` means they could not be installed.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> io::Result<ShutdownSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = sigint.recv()  => ShutdownSignal::Interrupt,
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sigquit.recv() => ShutdownSignal::Quit,
    };
    Ok(received)
}

/// Completes on the first termination signal.
///
/// Listeners are installed per call; an `Err` means they could not be installed.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}
