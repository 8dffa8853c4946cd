//! Bundled record kinds.
//!
//! [`IngestionPipeline`] is contained in a [`PipelineService`] and owned by
//! a [`User`] or [`Team`]. [`Catalog`] wires a repository for each of them
//! over one database.

mod catalog;
mod owners;
mod pipeline;
mod service;

pub use catalog::Catalog;
pub use owners::{team_spec, user_spec, Team, User};
pub use pipeline::{
    ingestion_pipeline_spec, AirflowConfig, IngestionPipeline, LogLevel, PipelineHandler,
    PipelineType, Source, SourceConfig, INGESTION_PIPELINE,
};
pub use service::{pipeline_service_spec, PipelineService, PIPELINE_SERVICE};
