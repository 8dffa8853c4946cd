use crate::owners::{team_spec, user_spec, Team, User};
use crate::pipeline::{ingestion_pipeline_spec, IngestionPipeline, INGESTION_PIPELINE};
use crate::service::{pipeline_service_spec, PipelineService};
use catalog_hooks::HookDispatcher;
use catalog_repo::{EntityRepository, ReferenceResolver, RepositoryConfig, StoreResolver};
use catalog_storage::CatalogDb;
use std::sync::Arc;

/// Repositories for every bundled kind over one database.
///
/// The pipeline repository deploys and undeploys its own entities. The
/// service repository shares the dispatcher only to undeploy the pipelines
/// a recursive service delete removes. Users and teams have no hooks.
pub struct Catalog {
    pub services: EntityRepository<PipelineService>,
    pub users: EntityRepository<User>,
    pub teams: EntityRepository<Team>,
    pub pipelines: EntityRepository<IngestionPipeline>,
}

impl Catalog {
    pub fn new(db: CatalogDb, hooks: HookDispatcher, config: RepositoryConfig) -> Self {
        let resolver: Arc<dyn ReferenceResolver> = Arc::new(StoreResolver);
        let pipeline_spec = ingestion_pipeline_spec();
        Self {
            services: EntityRepository::new(
                db.clone(),
                pipeline_service_spec(),
                resolver.clone(),
                hooks.clone(),
                config.clone(),
            )
            .with_child_undeploy(INGESTION_PIPELINE, pipeline_spec.hooks.undeploy_on),
            users: EntityRepository::new(
                db.clone(),
                user_spec(),
                resolver.clone(),
                HookDispatcher::disabled(),
                config.clone(),
            ),
            teams: EntityRepository::new(
                db.clone(),
                team_spec(),
                resolver.clone(),
                HookDispatcher::disabled(),
                config.clone(),
            ),
            pipelines: EntityRepository::new(db, pipeline_spec, resolver, hooks, config),
        }
    }
}
