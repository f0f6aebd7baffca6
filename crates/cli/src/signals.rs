use crate::error::Error;
use flume::Sender;
use tokio::signal::unix::{SignalKind, signal};

/// Indefinitely listens to signals and sends signal events to the provided channel.
///
/// SIGUSR1 and SIGUSR2 stand in for the vehicle's ignition line.
pub async fn wait_for_signal(signal_event: &Sender<SignalEvent>) -> Result<(), Error> {
    let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(Error::SignalHandler)?;
    let mut sigusr2 = signal(SignalKind::user_defined2()).map_err(Error::SignalHandler)?;
    let mut sighup = signal(SignalKind::hangup()).map_err(Error::SignalHandler)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(Error::SignalHandler)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(Error::SignalHandler)?;

    loop {
        tokio::select! {
            _ = sigusr1.recv() => {
                signal_event.send_async(SignalEvent::IgnitionOff).await?;
            }
            _ = sigusr2.recv() => {
                signal_event.send_async(SignalEvent::IgnitionOn).await?;
            }
            _ = sighup.recv() => {
                signal_event.send_async(SignalEvent::Reload).await?;
            }
            _ = sigint.recv() => {
                signal_event.send_async(SignalEvent::Shutdown).await?;
            }
            _ = sigterm.recv() => {
                signal_event.send_async(SignalEvent::Shutdown).await?;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    IgnitionOff,
    IgnitionOn,
    Reload,
    Shutdown,
}
