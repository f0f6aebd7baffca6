use crate::hmi::SystemAction;

/// Yes/no outcome of the policy engine for an application.
pub trait PolicyCheck: Send + Sync {
    fn is_action_allowed(&self, action: SystemAction, mobile_app_id: &str) -> bool;
}

/// Grants everything. Used when no policy engine is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllPolicy;

impl PolicyCheck for AllowAllPolicy {
    fn is_action_allowed(&self, _action: SystemAction, _mobile_app_id: &str) -> bool {
        true
    }
}
