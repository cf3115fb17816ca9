use std::sync::Arc;

use crate::config::AppConfig;
use crate::coordinator::DocumentCoordinator;
use crate::events_out::EventsOutTx;

/// Long-lived collaborators shared by every command and request.
#[derive(Clone)]
pub struct Services {
    pub coordinator: Arc<DocumentCoordinator>,
}

/// Builds `Services` from config. Implemented outside core so core does not
/// depend on concrete sources or stores.
pub trait ServicesFactory: Send + Sync {
    fn build_services(
        &self,
        cfg: &AppConfig,
        events_out: Option<EventsOutTx>,
    ) -> anyhow::Result<Services>;
}
