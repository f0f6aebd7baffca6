use crate::{
    app::Application,
    hmi::{AppId, HmiLevel},
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// The set of currently registered applications.
///
/// Lookups are total: absence is reported as `None`, never as an error.
pub trait ApplicationRegistry: Send + Sync {
    fn application(&self, app_id: AppId) -> Option<Application>;

    /// The application holding FULL, if any.
    fn active_application(&self) -> Option<Application>;

    fn applications(&self) -> Vec<Application>;

    /// Add an application. Returns `false` if the id is already taken.
    fn insert(&self, app: Application) -> bool;

    fn remove(&self, app_id: AppId) -> Option<Application>;
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    apps: RwLock<BTreeMap<AppId, Application>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationRegistry for InMemoryRegistry {
    fn application(&self, app_id: AppId) -> Option<Application> {
        self.apps.read().get(&app_id).cloned()
    }

    fn active_application(&self) -> Option<Application> {
        self.apps
            .read()
            .values()
            .find(|app| app.hmi_level() == HmiLevel::Full)
            .cloned()
    }

    fn applications(&self) -> Vec<Application> {
        self.apps.read().values().cloned().collect()
    }

    fn insert(&self, app: Application) -> bool {
        let mut apps = self.apps.write();
        let app_id = app.app_id();
        if apps.contains_key(&app_id) {
            return false;
        }
        apps.insert(app_id, app);
        true
    }

    fn remove(&self, app_id: AppId) -> Option<Application> {
        self.apps.write().remove(&app_id)
    }
}
