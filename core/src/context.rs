use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::error::CliError;
use crate::events_out::{start_events_out, EventsOutTx, EventsOutWriter};
use crate::services::{Services, ServicesFactory};

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    events_out: Option<EventsOutTx>,
    events_writer: Arc<Mutex<Option<EventsOutWriter>>>,
    factory: Arc<dyn ServicesFactory>,
}

impl AppContext {
    pub async fn new(cfg: AppConfig, factory: Arc<dyn ServicesFactory>) -> Result<Self, CliError> {
        let (events_out, events_writer) = match start_events_out(&cfg.events_out)
            .await
            .map_err(CliError::Command)?
        {
            Some((tx, writer)) => (Some(tx), Some(writer)),
            None => (None, None),
        };
        Ok(Self {
            cfg,
            events_out,
            events_writer: Arc::new(Mutex::new(events_writer)),
            factory,
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn events_out(&self) -> Option<EventsOutTx> {
        self.events_out.clone()
    }

    pub fn build_services(&self) -> Result<Services, CliError> {
        self.factory
            .build_services(&self.cfg, self.events_out.clone())
            .map_err(CliError::Services)
    }

    /// Flushes the audit trail. Call once before the process exits; later
    /// calls are no-ops.
    pub async fn shutdown(&self) {
        let writer = match self.events_writer.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(writer) = writer {
            writer.shutdown().await;
        }
    }
}
