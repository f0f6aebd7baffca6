#![forbid(unsafe_code)]

use crate::error::Error;
use crate::persistence::{Persister, SNAPSHOT_SCHEMA_VERSION, StateRepository, StoresSnapshot};
use config::Config;
use kernel::clock::Clock;
use kernel::hmi::UnregisterReason;
use kernel::{Arbitrator, Collaborators, HmiEvent, ResumptionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Services {
    pub repo: Arc<dyn StateRepository>,
    pub collaborators: Collaborators,
}

#[derive(Debug)]
pub enum ControlEvent {
    /// Unregister everyone and age the saved applications by one cycle.
    IgnitionOff,
    IgnitionOn,
    Reload(Box<Config>),
}

pub struct Engine {
    config: Config,
    arbitrator: Arbitrator,
    store: ResumptionStore,
    repo: Arc<dyn StateRepository>,
    clock: Arc<dyn Clock>,
    /// Last store revision handed to the persistence worker.
    submitted: u64,
}

impl Engine {
    /// Create a new engine with an empty store. No persistence is read.
    pub fn new(config: Config, services: Services) -> Self {
        let store = ResumptionStore::new();
        let revision = store.revision();
        Self::with_store(config, services, store, revision)
    }

    /// Load the store from the configured repository, prune it and build
    /// the engine.
    pub async fn load(config: Config, services: Services) -> Result<Self, Error> {
        let snapshot = services.repo.load().await?;
        let store = if snapshot.meta.schema_version == SNAPSHOT_SCHEMA_VERSION {
            ResumptionStore::from_snapshot(snapshot.state)
        } else {
            warn!(
                found = snapshot.meta.schema_version,
                expected = SNAPSHOT_SCHEMA_VERSION,
                "saved state has an unknown layout, starting empty"
            );
            ResumptionStore::new()
        };

        // pruning counts as a change, so the next flush writes it back
        let loaded = store.revision();
        let removed = store.load_resume_data(config.resumption.max_ignition_cycles);
        info!(
            saved = store.len(),
            removed,
            app_version = ?snapshot.meta.app_version,
            "resumption data loaded"
        );
        Ok(Self::with_store(config, services, store, loaded))
    }

    fn with_store(
        config: Config,
        services: Services,
        store: ResumptionStore,
        submitted: u64,
    ) -> Self {
        let clock = services.collaborators.clock.clone();
        let arbitrator = Arbitrator::new(&config, store.clone(), services.collaborators);
        Self {
            config,
            arbitrator,
            submitted,
            store,
            repo: services.repo,
            clock,
        }
    }

    /// Service events until the cancellation token is triggered.
    ///
    /// Store changes are written by a background worker. Changes made by
    /// timers are picked up every `flush_interval`.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        mut events: mpsc::UnboundedReceiver<HmiEvent>,
        mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
    ) -> Result<(), Error> {
        let mut persister = Persister::spawn(self.repo.clone());
        let period = self
            .config
            .persistence
            .flush_interval
            .max(Duration::from_millis(1));
        let mut flush = tokio::time::interval(period);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                Some(event) = events.recv() => {
                    self.arbitrator.handle(event);
                }
                Some(event) = control_rx.recv() => {
                    self.handle_control(event, &mut persister).await;
                }
                _ = flush.tick() => {}
            }
            self.publish(&persister);
        }

        if self.config.persistence.save_on_shutdown {
            let revision = self.store.revision();
            if let Err(err) = persister.flush(revision, self.snapshot()).await {
                warn!(%err, "final save failed");
            }
        }
        persister.shutdown().await;
        Ok(())
    }

    /// Persist the current store directly through the repository.
    pub async fn save(&self) -> Result<(), Error> {
        self.repo.save(&self.snapshot()).await
    }

    pub fn arbitrator(&self) -> &Arbitrator {
        &self.arbitrator
    }

    /// Read-only access to the store (useful for tests).
    pub fn store(&self) -> &ResumptionStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn snapshot(&self) -> StoresSnapshot {
        StoresSnapshot::capture(self.store.snapshot())
    }

    fn publish(&mut self, persister: &Persister) {
        let revision = self.store.revision();
        if revision != self.submitted {
            debug!(revision, "store changed");
            persister.submit(revision, self.snapshot());
            self.submitted = revision;
        }
    }

    async fn handle_control(&mut self, event: ControlEvent, persister: &mut Persister) {
        match event {
            ControlEvent::IgnitionOff => {
                let unregistered = self.arbitrator.unregister_all(UnregisterReason::IgnitionOff);
                self.store.on_suspend(self.clock.unix_time());
                info!(unregistered, saved = self.store.len(), "ignition off");

                let revision = self.store.revision();
                match persister.flush(revision, self.snapshot()).await {
                    Ok(()) => self.submitted = revision,
                    Err(err) => warn!(%err, "could not save state at ignition off"),
                }
            }
            ControlEvent::IgnitionOn => {
                self.store.on_awake(self.clock.unix_time());
                info!("ignition on");
            }
            ControlEvent::Reload(config) => {
                self.apply_reload(*config);
                info!("config reloaded");
            }
        }
    }

    fn apply_reload(&mut self, mut config: Config) {
        if config.persistence.state_path != self.config.persistence.state_path {
            warn!(
                current = ?self.config.persistence.state_path,
                requested = ?config.persistence.state_path,
                "ignoring state_path change during reload"
            );
            config.persistence.state_path = self.config.persistence.state_path.clone();
        }

        self.arbitrator.update_config(&config);
        self.config = config;
    }
}
