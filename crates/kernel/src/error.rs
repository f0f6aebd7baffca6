use crate::hmi::{AppId, SystemAction};

/// Represents all possible errors that can occur in this crate.
///
/// None of these are fatal: event handlers log them and discard the event.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered application has this id.
    #[error("Application not found: {0}")]
    AppNotFound(AppId),

    /// The event needs an application in FULL and there is none.
    #[error("No active application")]
    NoActiveApp,

    /// A deactivation no longer matches the application that is active.
    #[error("Stale event for app {requested}, active app is {active}")]
    StaleEvent { requested: AppId, active: AppId },

    /// The policy collaborator refused the action.
    #[error("Action {action:?} denied by policy for {mobile_app_id}")]
    PolicyDenied {
        action: SystemAction,
        mobile_app_id: String,
    },

    /// An application with the same id is already in the registry.
    #[error("Application already registered: {0}")]
    AlreadyRegistered(AppId),

    /// The timer could not be armed on the runtime.
    #[error("Timer `{name}` could not be armed: {reason}")]
    TimerUnavailable { name: String, reason: String },

    /// The string does not name an HMI level.
    #[error("Invalid HMI level: {0}")]
    InvalidHmiLevel(String),
}
