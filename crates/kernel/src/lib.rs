pub mod app;
mod arbitrator;
pub mod clock;
mod error;
pub mod hmi;
pub mod notifier;
pub mod policy;
pub mod registry;
pub mod resumption;
pub mod timer;

pub use app::Application;
pub use arbitrator::{Arbitrator, Collaborators, HmiEvent};
pub use error::Error;
pub use resumption::ResumptionStore;
pub use timer::Timer;
