use catalog_model::{
    Containment, Entity, EntityHeader, EntityReference, FieldSpec, HookPolicy, KindHandler,
    KindSpec, OnUnset, RelatedEntity, Relationship, UndeployOn,
};
use catalog_types::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    #[serde(flatten)]
    header: EntityHeader,
    schedule: String,
    #[serde(default)]
    retries: Option<u32>,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    auto_start: bool,
}

impl Entity for Job {
    const ENTITY_TYPE: &'static str = "job";

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }
}

fn make_job(retries: Option<u32>, queue: Option<&str>) -> Job {
    Job {
        header: EntityHeader::new("nightly"),
        schedule: "0 0 * * *".into(),
        retries,
        queue: queue.map(str::to_string),
        auto_start: false,
    }
}

// ── FieldSpec ────────────────────────────────────────────────────

#[test]
fn required_field_always_extracts() {
    let field = FieldSpec::<Job>::required("schedule", |j| &j.schedule);
    let job = make_job(None, None);
    assert_eq!(field.name(), "schedule");
    assert_eq!(field.on_unset(), OnUnset::Record);
    assert_eq!(field.extract(&job).unwrap(), Some(json!("0 0 * * *")));
}

#[test]
fn optional_field_extracts_none_when_unset() {
    let field = FieldSpec::<Job>::optional("retries", |j| &j.retries);
    assert_eq!(field.extract(&make_job(None, None)).unwrap(), None);
    assert_eq!(field.extract(&make_job(Some(3), None)).unwrap(), Some(json!(3)));
}

#[test]
fn optional_field_cannot_carry_over() {
    let field = FieldSpec::<Job>::optional("retries", |j| &j.retries);
    let original = make_job(Some(3), None);
    let mut updated = make_job(None, None);
    assert!(!field.carry_over(&original, &mut updated));
    assert_eq!(updated.retries, None);
}

#[test]
fn keep_when_unset_carries_original_value() {
    let field = FieldSpec::<Job>::keep_when_unset("queue", |j| &j.queue, |j| &mut j.queue);
    assert_eq!(field.on_unset(), OnUnset::Preserve);

    let original = make_job(None, Some("high"));
    let mut updated = make_job(None, None);
    assert!(field.carry_over(&original, &mut updated));
    assert_eq!(updated.queue.as_deref(), Some("high"));
}

#[test]
fn keep_when_unset_on_put_reports_its_mode() {
    let field = FieldSpec::<Job>::keep_when_unset_on_put("queue", |j| &j.queue, |j| &mut j.queue);
    assert_eq!(field.on_unset(), OnUnset::PreserveOnPut);
    assert_eq!(format!("{field:?}"), "FieldSpec { name: \"queue\", on_unset: PreserveOnPut }");
}

// ── Containment & hooks ──────────────────────────────────────────

#[test]
fn containment_allows_listed_types_only() {
    let required = Containment::Required(&["pipelineService"]);
    assert!(required.is_required());
    assert!(required.allows("pipelineService"));
    assert!(!required.allows("databaseService"));

    let optional = Containment::Optional(&["team"]);
    assert!(!optional.is_required());
    assert!(optional.allows("team"));

    assert!(!Containment::None.allows("team"));
}

#[test]
fn undeploy_policy_by_delete_mode() {
    assert!(!UndeployOn::Never.applies(true));
    assert!(UndeployOn::HardDeleteOnly.applies(true));
    assert!(!UndeployOn::HardDeleteOnly.applies(false));
    assert!(UndeployOn::AnyDelete.applies(false));
    assert!(UndeployOn::AnyDelete.applies(true));
}

#[test]
fn deploy_predicate_gates_create_and_update() {
    let policy = HookPolicy::<Job>::deploy_if(|j| j.auto_start, UndeployOn::AnyDelete);
    let mut job = make_job(None, None);
    assert!(!policy.should_deploy_on_create(&job));
    job.auto_start = true;
    assert!(policy.should_deploy_on_create(&job));
    assert!(policy.should_deploy_on_update(&job));
    assert!(policy.should_undeploy(false));
}

#[test]
fn default_policy_never_fires() {
    let policy = HookPolicy::<Job>::default();
    let mut job = make_job(None, None);
    job.auto_start = true;
    assert!(!policy.should_deploy_on_create(&job));
    assert!(!policy.should_deploy_on_update(&job));
    assert!(!policy.should_undeploy(true));
}

#[test]
fn update_only_policy_skips_create() {
    let policy = HookPolicy::<Job> {
        on_create: false,
        ..HookPolicy::deploy_if(|_| true, UndeployOn::Never)
    };
    let job = make_job(None, None);
    assert!(!policy.should_deploy_on_create(&job));
    assert!(policy.should_deploy_on_update(&job));
}

// ── KindSpec ─────────────────────────────────────────────────────

struct LineageHandler {
    upstream: EntityId,
}

impl KindHandler<Job> for LineageHandler {
    fn validate(&self, job: &Job) -> Result<(), String> {
        if job.schedule.is_empty() {
            return Err("schedule must not be empty".into());
        }
        Ok(())
    }

    fn relationships(&self, _job: &Job) -> Vec<RelatedEntity> {
        vec![RelatedEntity {
            target: EntityReference::new(self.upstream, "job"),
            relation: Relationship::Upstream,
        }]
    }
}

#[test]
fn kind_spec_defaults() {
    let spec = KindSpec::<Job>::new();
    assert_eq!(spec.entity_type(), "job");
    assert_eq!(spec.containment, Containment::None);
    assert!(spec.fields.is_empty());

    let mut job = make_job(None, None);
    assert!(spec.handler.prepare(&mut job).is_ok());
    assert!(spec.handler.validate(&job).is_ok());
    assert!(spec.handler.relationships(&job).is_empty());
}

#[test]
fn kind_spec_builder_collects_fields_in_order() {
    let spec = KindSpec::<Job>::new()
        .contained_in(Containment::Optional(&["team"]))
        .field(FieldSpec::required("schedule", |j| &j.schedule))
        .field(FieldSpec::optional("retries", |j| &j.retries))
        .hooks(HookPolicy::deploy_if(|j| j.auto_start, UndeployOn::HardDeleteOnly));
    assert_eq!(spec.field_names(), vec!["schedule", "retries"]);
    assert!(spec.containment.allows("team"));
    assert_eq!(spec.hooks.undeploy_on, UndeployOn::HardDeleteOnly);
}

#[test]
fn custom_handler_is_used() {
    let upstream = EntityId::new();
    let spec = KindSpec::<Job>::new().handler(LineageHandler { upstream });

    let mut job = make_job(None, None);
    let edges = spec.handler.relationships(&job);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target.id, upstream);
    assert_eq!(edges[0].relation, Relationship::Upstream);

    job.schedule.clear();
    assert_eq!(spec.handler.validate(&job).unwrap_err(), "schedule must not be empty");
}
