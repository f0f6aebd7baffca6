/// Work invoked by a [`Timer`](super::Timer) when its interval elapses.
///
/// The task runs on a runtime worker, never on the thread that armed the
/// timer, and may run concurrently with `start`/`stop`/`suspend` calls made
/// elsewhere. Synchronizing the data it captures is up to the task.
pub trait TimerTask: Send + Sync {
    fn run(&self);
}

impl<F> TimerTask for F
where
    F: Fn() + Send + Sync,
{
    fn run(&self) {
        self()
    }
}
