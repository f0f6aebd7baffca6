#![forbid(unsafe_code)]

use crate::error::Error;
use crate::persistence::{StateRepository, StoresSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
struct Pending {
    revision: u64,
    snapshot: StoresSnapshot,
}

#[derive(Debug, Clone, Copy)]
struct Flushed {
    revision: u64,
    ok: bool,
}

/// Handle to the background task that is the only writer of the
/// repository.
///
/// Submissions coalesce: while a save is in flight only the newest snapshot
/// is kept, older ones are skipped.
#[derive(Debug)]
pub struct Persister {
    pending: watch::Sender<Option<Pending>>,
    flushed: watch::Receiver<Flushed>,
    worker: JoinHandle<()>,
}

impl Persister {
    /// Spawn the worker on the current runtime.
    pub fn spawn(repo: Arc<dyn StateRepository>) -> Self {
        let (pending, pending_rx) = watch::channel(None);
        // nothing submitted yet counts as saved
        let (flushed_tx, flushed) = watch::channel(Flushed {
            revision: 0,
            ok: true,
        });
        let worker = tokio::spawn(run(repo, pending_rx, flushed_tx));
        Self {
            pending,
            flushed,
            worker,
        }
    }

    /// Queue `snapshot` without waiting for it to reach the disk.
    pub fn submit(&self, revision: u64, snapshot: StoresSnapshot) {
        self.pending
            .send_replace(Some(Pending { revision, snapshot }));
    }

    /// Queue `snapshot` and wait until the worker has handled it.
    pub async fn flush(&mut self, revision: u64, snapshot: StoresSnapshot) -> Result<(), Error> {
        self.submit(revision, snapshot);
        let flushed = *self
            .flushed
            .wait_for(|flushed| flushed.revision >= revision)
            .await
            .map_err(|_| Error::WorkerGone)?;
        if flushed.ok {
            Ok(())
        } else {
            Err(Error::SaveFailed(flushed.revision))
        }
    }

    /// Let the worker finish what is queued, then stop it.
    pub async fn shutdown(self) {
        drop(self.pending);
        if let Err(err) = self.worker.await {
            error!(%err, "persistence worker panicked");
        }
    }
}

async fn run(
    repo: Arc<dyn StateRepository>,
    mut pending: watch::Receiver<Option<Pending>>,
    flushed: watch::Sender<Flushed>,
) {
    while pending.changed().await.is_ok() {
        let Some(Pending { revision, snapshot }) = pending.borrow_and_update().clone() else {
            continue;
        };
        let ok = match repo.save(&snapshot).await {
            Ok(()) => {
                debug!(revision, "state saved");
                true
            }
            Err(err) => {
                warn!(revision, %err, "failed to save state");
                false
            }
        };
        flushed.send_replace(Flushed { revision, ok });
    }
    debug!("persistence worker stopped");
}
