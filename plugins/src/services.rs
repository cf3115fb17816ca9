//! `ServicesFactory` backed by the built-in sources, stores and handlers.
use std::sync::Arc;

use docstream_core::api::{AppConfig, DocumentCoordinator, EventsOutTx, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

impl ServicesFactory for PluginServicesFactory {
    fn build_services(
        &self,
        cfg: &AppConfig,
        events_out: Option<EventsOutTx>,
    ) -> anyhow::Result<Services> {
        let source = factory::build_source(cfg)?;
        let store = factory::build_store(cfg);
        let registry = factory::build_registry(cfg, source.clone());

        tracing::info!(
            target: "docstream.services",
            source = %source.name(),
            store = %store.name(),
            model = %cfg.model.artifact_model(),
            "services ready"
        );

        let coordinator =
            DocumentCoordinator::new(Arc::new(registry), store).with_events_out(events_out);
        Ok(Services {
            coordinator: Arc::new(coordinator),
        })
    }
}
