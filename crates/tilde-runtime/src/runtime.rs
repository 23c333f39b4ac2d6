use std::sync::Arc;
use tilde_template::Evaluator;

use crate::config::EngineConfig;
use crate::mapping::{MappingProcessor, MappingRegistry, MappingRegistryError};
use crate::processor::DataProcessor;
use crate::session::Session;
use crate::transport::Transport;

/// Services shared by actions and data sources: the transport, the session latch,
/// response processors and mapping processors.
#[derive(Clone)]
pub struct Runtime {
    transport: Arc<dyn Transport>,
    session: Session,
    processors: Vec<Arc<dyn DataProcessor>>,
    mappings: MappingRegistry,
    evaluator: Evaluator,
    config: EngineConfig,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("session", &self.session)
            .field("processors", &self.processors.len())
            .field("mappings", &self.mappings)
            .field("config", &self.config)
            .finish()
    }
}

impl Runtime {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::default(),
            processors: Vec::new(),
            mappings: MappingRegistry::builtin(),
            evaluator: Evaluator::default(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.evaluator = Evaluator::new(config.template.clone());
        self.config = config;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Append a response processor. Processors run in the order they were added.
    pub fn with_data_processor(mut self, processor: Arc<dyn DataProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn with_mapping_processor(
        mut self,
        id: impl Into<String>,
        processor: Arc<dyn MappingProcessor>,
    ) -> Result<Self, MappingRegistryError> {
        self.mappings.register_named(id, processor)?;
        Ok(self)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn processors(&self) -> &[Arc<dyn DataProcessor>] {
        &self.processors
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
