use crate::adapters::FsSourceReader;
use crate::error::WorkerError;
use crate::generate::generate_empty_coverage;
use crate::ports::SourceReader;
use crate::settings::WorkerSettings;
use covgen_policy::{InstrumentationPolicy, ShouldInstrumentOptions};
use covgen_transform::{
    ConfigurationError, FsTransformCache, Instrumenter, LineInstrumenter, NoopTransformCache,
    TransformCache, TransformPipeline, TransformerRegistry, config_string,
};
use covgen_types::config::ProjectConfig;
use covgen_types::worker::{CoverageWorkerData, CoverageWorkerResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Serves empty-coverage jobs for one execution unit.
///
/// Pipelines are loaded once per distinct project config and reused across jobs. Per-job state
/// (scope sets, file contents) never outlives the job.
pub struct CoverageWorker<R = FsSourceReader> {
    reader: R,
    registry: TransformerRegistry,
    settings: WorkerSettings,
    instrumenter: Arc<dyn Instrumenter>,
    cache: Arc<dyn TransformCache>,
    pipelines: Mutex<HashMap<String, Arc<TransformPipeline>>>,
}

impl CoverageWorker<FsSourceReader> {
    pub fn new(settings: WorkerSettings, registry: TransformerRegistry) -> Self {
        Self::with_reader(FsSourceReader, settings, registry)
    }
}

impl<R: SourceReader> CoverageWorker<R> {
    pub fn with_reader(reader: R, settings: WorkerSettings, registry: TransformerRegistry) -> Self {
        let cache: Arc<dyn TransformCache> = match &settings.cache_dir {
            Some(dir) => Arc::new(FsTransformCache::new(dir.clone())),
            None => Arc::new(NoopTransformCache),
        };
        let instrumenter = Arc::new(LineInstrumenter::new(settings.comment_prefixes.clone()));
        Self {
            reader,
            registry,
            settings,
            instrumenter,
            cache,
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the secondary instrumenter. Pipelines already loaded keep the previous one.
    pub fn with_instrumenter(mut self, instrumenter: Arc<dyn Instrumenter>) -> Self {
        self.instrumenter = instrumenter;
        self
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Run one job.
    pub async fn worker(
        &self,
        data: CoverageWorkerData,
    ) -> Result<Option<CoverageWorkerResult>, WorkerError> {
        let CoverageWorkerData {
            config,
            global_config,
            path,
            context,
        } = data;

        let options = ShouldInstrumentOptions::new(&global_config, context.into_context());
        let policy = InstrumentationPolicy::new(options, &config);

        generate_empty_coverage(&self.reader, &path, &policy, || self.pipeline_for(config)).await
    }

    fn pipeline_for(&self, config: ProjectConfig) -> Result<Arc<TransformPipeline>, WorkerError> {
        let key = config_string(&config).map_err(|e| ConfigurationError::Fingerprint {
            message: e.to_string(),
        })?;
        let mut pipelines = self.pipelines.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = pipelines.get(&key) {
            return Ok(hit.clone());
        }

        debug!(project = %config.name, "loading transform pipeline");
        let pipeline = Arc::new(TransformPipeline::load(
            Arc::new(config),
            &self.registry,
            self.settings.usage,
            self.instrumenter.clone(),
            self.cache.clone(),
        )?);
        pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }
}

impl<R> std::fmt::Debug for CoverageWorker<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageWorker")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
