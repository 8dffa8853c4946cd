//! Pipeline services, the containers of ingestion pipelines.

use catalog_model::{Entity, EntityHeader, FieldSpec, KindSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity type of pipeline services.
pub const PIPELINE_SERVICE: &str = "pipelineService";

/// An orchestration system hosting ingestion pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineService {
    #[serde(flatten)]
    pub header: EntityHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Value>,
}

impl PipelineService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: EntityHeader::new(name),
            service_type: None,
            connection: None,
        }
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }
}

impl Entity for PipelineService {
    const ENTITY_TYPE: &'static str = PIPELINE_SERVICE;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }
}

pub fn pipeline_service_spec() -> KindSpec<PipelineService> {
    KindSpec::<PipelineService>::new()
        .field(FieldSpec::optional("serviceType", |s| &s.service_type))
        .field(FieldSpec::keep_when_unset_on_put(
            "connection",
            |s| &s.connection,
            |s| &mut s.connection,
        ))
}
