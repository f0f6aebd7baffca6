mod task;

pub use task::TimerTask;

use crate::Error;
use educe::Educe;
use parking_lot::{Mutex, ReentrantMutex};
use std::{sync::Arc, time::Duration};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, error, trace};

#[derive(Debug, Default)]
struct TimerState {
    /// Interval in milliseconds, 0 while stopped.
    timeout_ms: u32,

    running: bool,

    /// Stop after the next firing instead of rearming.
    suspended: bool,

    /// Bumped on every arm and disarm. A firing loop only acts while the
    /// generation it was spawned with is still current.
    generation: u64,

    handle: Option<JoinHandle<()>>,
}

#[derive(Educe)]
#[educe(Debug)]
struct Shared {
    name: String,

    #[educe(Debug(ignore))]
    task: Arc<dyn TimerTask>,

    looper: bool,

    state: Mutex<TimerState>,

    /// Held while the task runs; dropping the timer waits on it.
    #[educe(Debug(ignore))]
    firing: ReentrantMutex<()>,
}

/// A named one-shot or repeating timer.
///
/// The timer is constructed stopped. [`start`](Timer::start) arms it on the
/// ambient tokio runtime, and every expiry runs the task. A looping timer
/// rearms after each firing until it is stopped or suspended.
///
/// ```text
///            start                    fire (loop, not suspended)
///  Stopped ─────────► Armed ◄──────────────────────────┐
///     ▲                 │ └────────────────────────────┘
///     └─────────────────┘
///      stop | fire (one-shot) | fire (suspended)
/// ```
#[derive(Debug)]
pub struct Timer(Arc<Shared>);

impl Timer {
    pub fn new(name: impl Into<String>, task: impl TimerTask + 'static, looper: bool) -> Self {
        Self(Arc::new(Shared {
            name: name.into(),
            task: Arc::new(task),
            looper,
            state: Mutex::new(TimerState::default()),
            firing: ReentrantMutex::new(()),
        }))
    }

    /// Arm the timer to fire after `timeout_ms` (at least 1ms).
    ///
    /// Starting a running timer restarts the countdown from scratch. If the
    /// timer cannot be armed it stays stopped and the failure is logged.
    pub fn start(&self, timeout_ms: u32) {
        let mut state = self.0.state.lock();
        self.start_locked(&mut state, timeout_ms);
    }

    /// Disarm the timer. Future firings are cancelled; a firing that was
    /// already dispatched may still complete.
    pub fn stop(&self) {
        debug!(name = %self.0.name, "stopping timer");
        let mut state = self.0.state.lock();
        Self::disarm(&mut state);
        state.timeout_ms = 0;
    }

    /// Let a looping timer fire once more, then stop.
    pub fn suspend(&self) {
        debug!(name = %self.0.name, "suspending timer after next loop");
        self.0.state.lock().suspended = true;
    }

    /// Change the interval. A running timer is restarted with it, a stopped
    /// one only remembers it.
    pub fn update_timeout(&self, timeout_ms: u32) {
        let mut state = self.0.state.lock();
        if state.running {
            self.start_locked(&mut state, timeout_ms);
        } else {
            state.timeout_ms = clamp_timeout(timeout_ms);
        }
    }

    pub fn is_running(&self) -> bool {
        self.0.state.lock().running
    }

    pub fn timeout(&self) -> u32 {
        self.0.state.lock().timeout_ms
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_looper(&self) -> bool {
        self.0.looper
    }

    pub fn task(&self) -> Arc<dyn TimerTask> {
        Arc::clone(&self.0.task)
    }

    fn start_locked(&self, state: &mut TimerState, timeout_ms: u32) {
        if state.running {
            debug!(name = %self.0.name, "restarting running timer");
            Self::disarm(state);
        }
        state.timeout_ms = clamp_timeout(timeout_ms);
        state.suspended = false;

        if let Err(err) = self.arm(state) {
            error!(%err, "timer stays stopped");
            state.timeout_ms = 0;
        }
    }

    fn arm(&self, state: &mut TimerState) -> Result<(), Error> {
        let runtime = Handle::try_current().map_err(|err| Error::TimerUnavailable {
            name: self.0.name.clone(),
            reason: err.to_string(),
        })?;

        state.generation = state.generation.wrapping_add(1);
        let interval = Duration::from_millis(u64::from(state.timeout_ms));
        trace!(name = %self.0.name, ?interval, "arming timer");
        state.handle = Some(runtime.spawn(fire_loop(
            Arc::clone(&self.0),
            state.generation,
            interval,
        )));
        state.running = true;
        Ok(())
    }

    fn disarm(state: &mut TimerState) {
        state.generation = state.generation.wrapping_add(1);
        if let Some(handle) = state.handle.take() {
            handle.abort();
        }
        state.running = false;
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!(name = %self.0.name, "timer is to be destroyed");
        self.stop();
        // Blocks until a firing running on another thread is done. Reentrant,
        // so dropping the timer from inside its own task is fine.
        drop(self.0.firing.lock());
    }
}

/// Intervals below 1ms are raised to 1ms.
const fn clamp_timeout(timeout_ms: u32) -> u32 {
    if timeout_ms > 0 { timeout_ms } else { 1 }
}

async fn fire_loop(shared: Arc<Shared>, generation: u64, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        {
            // Checked under `firing` so a concurrent drop either sees the
            // task running or leaves us a stale generation.
            let _firing = shared.firing.lock();
            if shared.state.lock().generation != generation {
                return;
            }
            debug!(name = %shared.name, ?interval, "timer has finished counting");
            shared.task.run();
        }

        let rearm = {
            let mut state = shared.state.lock();
            if state.generation != generation {
                // the task (or someone else) restarted or stopped us meanwhile
                return;
            }
            if shared.looper && !state.suspended {
                true
            } else {
                state.generation = state.generation.wrapping_add(1);
                state.handle = None;
                state.running = false;
                state.timeout_ms = 0;
                false
            }
        };
        if !rearm {
            return;
        }
        trace!(name = %shared.name, "rearming looper");
    }
}
