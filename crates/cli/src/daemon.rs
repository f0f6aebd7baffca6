use crate::{
    error::Error,
    signals::{SignalEvent, wait_for_signal},
};
use config::Config;
use flume::{Receiver, bounded, unbounded};
use kernel::{
    Collaborators,
    clock::SystemClock,
    notifier::{ChannelNotifier, HmiMessage},
    policy::AllowAllPolicy,
    registry::InMemoryRegistry,
};
use orchestrator::{
    ControlEvent, Engine, NoopRepository, Services, SqliteRepository, StateRepository,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Where the configuration comes from, so it can be read again on reload.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub conffile: Option<PathBuf>,
    pub statefile: Option<PathBuf>,
}

impl ConfigSource {
    pub fn load(&self) -> Result<Config, Error> {
        let mut config = match &self.conffile {
            Some(path) => Config::load(path)?,
            None => Config::new(),
        };
        if let Some(statefile) = &self.statefile {
            config.persistence.state_path =
                (!statefile.as_os_str().is_empty()).then(|| statefile.clone());
        }
        Ok(config)
    }
}

/// Run until SIGINT or SIGTERM.
pub async fn run(source: ConfigSource, config: Config) -> Result<(), Error> {
    let repo: Arc<dyn StateRepository> = match &config.persistence.state_path {
        Some(path) => {
            info!(path = %path.display(), "using resumption database");
            Arc::new(SqliteRepository::new(path.clone()).await?)
        }
        None => {
            info!("no state path, resumption data is kept in memory");
            Arc::new(NoopRepository)
        }
    };

    let (outbound_tx, outbound_rx) = unbounded();
    let services = Services {
        repo,
        collaborators: Collaborators {
            registry: Arc::new(InMemoryRegistry::new()),
            notifier: Arc::new(ChannelNotifier::new(outbound_tx)),
            policy: Arc::new(AllowAllPolicy),
            clock: Arc::new(SystemClock),
        },
    };
    let mut engine = Engine::load(config, services).await?;

    let cancel = CancellationToken::new();
    // the transport feeding HMI events holds on to `_events_tx`
    let (_events_tx, events_rx) = mpsc::unbounded_channel();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (signal_tx, signal_rx) = bounded(8);

    let signals = tokio::spawn(async move {
        if let Err(err) = wait_for_signal(&signal_tx).await {
            error!(error = ?err, "Error while waiting for signal");
        }
    });
    let dispatcher = tokio::spawn(dispatch_signals(
        signal_rx,
        control_tx,
        cancel.clone(),
        source,
    ));
    let outbound = tokio::spawn(drain_outbound(outbound_rx));

    engine.run_until(cancel, events_rx, control_rx).await?;

    signals.abort();
    dispatcher.abort();
    outbound.abort();
    info!("stopped");
    Ok(())
}

async fn dispatch_signals(
    signals: Receiver<SignalEvent>,
    control: UnboundedSender<ControlEvent>,
    cancel: CancellationToken,
    source: ConfigSource,
) {
    while let Ok(event) = signals.recv_async().await {
        debug!(?event, "Received signal event");
        let control_event = match event {
            SignalEvent::IgnitionOff => ControlEvent::IgnitionOff,
            SignalEvent::IgnitionOn => ControlEvent::IgnitionOn,
            SignalEvent::Reload => match source.load() {
                Ok(config) => ControlEvent::Reload(Box::new(config)),
                Err(err) => {
                    warn!(%err, "keeping the current configuration");
                    continue;
                }
            },
            SignalEvent::Shutdown => {
                cancel.cancel();
                break;
            }
        };
        if control.send(control_event).is_err() {
            break;
        }
    }
}

/// Stand-in for the HMI transport: outbound messages are only logged.
async fn drain_outbound(messages: Receiver<HmiMessage>) {
    while let Ok(message) = messages.recv_async().await {
        debug!(?message, "outbound message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{io::Write, time::Duration};
    use tempfile::NamedTempFile;

    #[test]
    fn statefile_overrides_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[persistence]\nstate_path = \"/var/lib/hmi/state.db\"").unwrap();
        writeln!(file, "[resumption]\nresuming_timeout = 500").unwrap();

        let source = ConfigSource {
            conffile: Some(file.path().to_owned()),
            statefile: Some(PathBuf::from("/tmp/other.db")),
        };
        let config = source.load().unwrap();
        assert_eq!(
            config.persistence.state_path,
            Some(PathBuf::from("/tmp/other.db"))
        );
        assert_eq!(config.resumption.resuming_timeout, Duration::from_millis(500));
    }

    #[test]
    fn empty_statefile_means_in_memory() {
        let source = ConfigSource {
            conffile: None,
            statefile: Some(PathBuf::new()),
        };
        assert_eq!(source.load().unwrap().persistence.state_path, None);
    }

    #[tokio::test]
    async fn signals_map_to_control_events() {
        let (signal_tx, signal_rx) = bounded(8);
        let (control_tx, mut control_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(dispatch_signals(
            signal_rx,
            control_tx,
            cancel.clone(),
            ConfigSource::default(),
        ));

        signal_tx.send(SignalEvent::IgnitionOff).unwrap();
        signal_tx.send(SignalEvent::IgnitionOn).unwrap();
        signal_tx.send(SignalEvent::Reload).unwrap();
        signal_tx.send(SignalEvent::Shutdown).unwrap();
        task.await.unwrap();

        assert!(matches!(control_rx.recv().await, Some(ControlEvent::IgnitionOff)));
        assert!(matches!(control_rx.recv().await, Some(ControlEvent::IgnitionOn)));
        assert!(matches!(control_rx.recv().await, Some(ControlEvent::Reload(_))));
        assert!(control_rx.recv().await.is_none());
        assert!(cancel.is_cancelled());
    }
}
