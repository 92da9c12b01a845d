//! Composition root: builds every service once and hands them to handlers.

use std::sync::Arc;

use protolane_core::ArchiveExtractor;
use protolane_core::ExtractionLimits;
use protolane_core::RelayForwarder;
use protolane_core::SchemaCompiler;
use protolane_core::ScratchSpace;
use protolane_core::TempScratch;
use tokio::sync::Semaphore;

use crate::config::ServerConfig;

/// Services and limits shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Archive extraction into scratch directories.
    pub extractor: ArchiveExtractor,
    /// Descriptor compilation.
    pub compiler: SchemaCompiler,
    /// Payload relay.
    pub forwarder: RelayForwarder,
    /// Limits applied to every upload.
    pub limits: ExtractionLimits,
    /// Admission control for extraction plus compilation.
    pub compile_permits: Arc<Semaphore>,
    /// Largest accepted archive upload in bytes.
    pub max_upload: usize,
    /// Largest accepted relay payload in bytes.
    pub max_payload: usize,
    /// Whether `POST /mock` is routed.
    pub enable_mock: bool,
}

impl AppState {
    /// Builds the production services from configuration.
    pub fn assemble(config: &ServerConfig) -> protolane_core::Result<Self> {
        let scratch: Arc<dyn ScratchSpace> = match &config.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                Arc::new(TempScratch::new(root))
            }
            None => Arc::new(TempScratch::system()),
        };

        Ok(Self::with_services(
            config,
            ArchiveExtractor::new(scratch),
            SchemaCompiler::new(&config.compiler_config()),
            RelayForwarder::new(&config.relay_config())?,
        ))
    }

    /// Builds state from already-constructed services.
    pub fn with_services(
        config: &ServerConfig,
        extractor: ArchiveExtractor,
        compiler: SchemaCompiler,
        forwarder: RelayForwarder,
    ) -> Self {
        let permits = usize::try_from(config.max_concurrent_compilations)
            .unwrap_or(1)
            .max(1);
        Self {
            extractor,
            compiler,
            forwarder,
            limits: config.extraction_limits(),
            compile_permits: Arc::new(Semaphore::new(permits)),
            max_upload: config.max_upload_bytes(),
            max_payload: config.max_payload_bytes(),
            enable_mock: config.enable_mock,
        }
    }
}
