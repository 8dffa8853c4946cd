//! The ingestion pipeline record kind.

use crate::service::PIPELINE_SERVICE;
use catalog_model::{
    Containment, Entity, EntityHeader, EntityReference, FieldSpec, HookPolicy, KindHandler,
    KindSpec, UndeployOn,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity type of ingestion pipelines.
pub const INGESTION_PIPELINE: &str = "ingestionPipeline";

/// What an ingestion pipeline extracts from its source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineType {
    #[default]
    Metadata,
    Usage,
    Lineage,
    Profiler,
    Dbt,
}

/// Log level of the running pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Where a pipeline reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_connection: Option<Value>,
    #[serde(default)]
    pub source_config: SourceConfig,
}

impl Source {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            service_name: String::new(),
            service_connection: None,
            source_config: SourceConfig::default(),
        }
    }
}

/// Connector-specific settings, opaque to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub config: Value,
}

/// Scheduling settings handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AirflowConfig {
    /// Deploy to the orchestrator after every create and update.
    pub force_deploy: bool,
    pub pause_pipeline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub concurrency: u32,
    pub max_active_runs: u32,
    pub retries: u32,
    /// Seconds between retries.
    pub retry_delay: u32,
    pub pipeline_catchup: bool,
    pub workflow_timeout: u32,
}

impl Default for AirflowConfig {
    fn default() -> Self {
        Self {
            force_deploy: false,
            pause_pipeline: false,
            schedule_interval: None,
            start_date: None,
            end_date: None,
            concurrency: 1,
            max_active_runs: 1,
            retries: 3,
            retry_delay: 300,
            pipeline_catchup: false,
            workflow_timeout: 60,
        }
    }
}

/// A scheduled extraction job contained in a pipeline service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionPipeline {
    #[serde(flatten)]
    pub header: EntityHeader,
    #[serde(default)]
    pub pipeline_type: PipelineType,
    pub source: Source,
    #[serde(default)]
    pub airflow_config: AirflowConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_metadata_server_connection: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger_level: Option<LogLevel>,
    /// The containing pipeline service. Relationship-derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<EntityReference>,
}

impl IngestionPipeline {
    pub fn new(name: impl Into<String>, service: EntityReference, source: Source) -> Self {
        Self {
            header: EntityHeader::new(name),
            pipeline_type: PipelineType::default(),
            source,
            airflow_config: AirflowConfig::default(),
            open_metadata_server_connection: None,
            logger_level: None,
            service: Some(service),
        }
    }

    pub fn with_owner(mut self, owner: EntityReference) -> Self {
        self.header.owner = Some(owner);
        self
    }

    pub fn with_logger_level(mut self, level: LogLevel) -> Self {
        self.logger_level = Some(level);
        self
    }

    pub fn with_force_deploy(mut self, force: bool) -> Self {
        self.airflow_config.force_deploy = force;
        self
    }
}

impl Entity for IngestionPipeline {
    const ENTITY_TYPE: &'static str = INGESTION_PIPELINE;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn container(&self) -> Option<&EntityReference> {
        self.service.as_ref()
    }

    fn set_container(&mut self, container: Option<EntityReference>) {
        self.service = container;
    }
}

/// Fills the source's service name from the resolved container and
/// rejects pipelines without a source type.
#[derive(Debug, Default)]
pub struct PipelineHandler;

impl KindHandler<IngestionPipeline> for PipelineHandler {
    fn prepare(&self, pipeline: &mut IngestionPipeline) -> Result<(), String> {
        if pipeline.source.service_name.is_empty() {
            if let Some(name) = pipeline.service.as_ref().and_then(|s| s.name.clone()) {
                pipeline.source.service_name = name;
            }
        }
        Ok(())
    }

    fn validate(&self, pipeline: &IngestionPipeline) -> Result<(), String> {
        if pipeline.source.source_type.trim().is_empty() {
            return Err(format!("pipeline {} has no source type", pipeline.header.name));
        }
        Ok(())
    }
}

/// Capabilities of the ingestion pipeline kind.
///
/// Pipelines live in a pipeline service. `source` and `airflowConfig` are
/// always compared; the server connection and logger level keep their
/// stored value when an update leaves them out. The deployment hook runs
/// after create and update when `airflowConfig.forceDeploy` is set, and
/// every delete removes the deployed pipeline.
pub fn ingestion_pipeline_spec() -> KindSpec<IngestionPipeline> {
    KindSpec::<IngestionPipeline>::new()
        .contained_in(Containment::Required(&[PIPELINE_SERVICE]))
        .field(FieldSpec::required("source", |p| &p.source))
        .field(FieldSpec::required("airflowConfig", |p| &p.airflow_config))
        .field(FieldSpec::keep_when_unset(
            "openMetadataServerConnection",
            |p| &p.open_metadata_server_connection,
            |p| &mut p.open_metadata_server_connection,
        ))
        .field(FieldSpec::keep_when_unset(
            "loggerLevel",
            |p| &p.logger_level,
            |p| &mut p.logger_level,
        ))
        .hooks(HookPolicy::deploy_if(
            |p| p.airflow_config.force_deploy,
            UndeployOn::AnyDelete,
        ))
        .handler(PipelineHandler)
}
