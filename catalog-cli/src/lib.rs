//! Argument parsing and command execution for the `catalog` binary.

use anyhow::{bail, Context, Result};
use catalog_hooks::{HookDispatcher, HookReport, RestClientConfig, RestDeploymentClient, RetryConfig};
use catalog_model::{Entity, EntityReference, Include};
use catalog_pipeline::{Catalog, IngestionPipeline, PipelineService, Team, User};
use catalog_repo::{DeleteMode, ListParams, Mutation, RepoError, RepositoryConfig};
use catalog_storage::CatalogDb;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Versioned catalog of ingestion pipelines backed by SQLite")]
pub struct Args {
    /// Path to the catalog database
    #[arg(long, env = "CATALOG_DB", default_value = "catalog.db")]
    pub db: PathBuf,

    /// Base URL of the deployment API; deploy hooks are skipped when unset
    #[arg(long, env = "CATALOG_DEPLOY_URL")]
    pub deploy_url: Option<String>,

    /// JSON file with repository, retry and deployment settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Name recorded as `updatedBy` on mutations
    #[arg(long, env = "CATALOG_USER", default_value = "admin")]
    pub user: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Create a pipeline service
    CreateService {
        name: String,
        #[arg(long)]
        service_type: Option<String>,
    },
    /// Create a user that can own pipelines
    CreateUser {
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a team that can own pipelines
    CreateTeam { name: String },
    /// Create or update an ingestion pipeline from a JSON file
    PutPipeline {
        file: PathBuf,
        /// Name of the containing pipeline service
        #[arg(long)]
        service: Option<String>,
        /// Name of the owning user, or of a team when no user has that name
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print a pipeline by fully qualified name
    GetPipeline {
        fqn: String,
        #[arg(long)]
        include_deleted: bool,
    },
    /// List pipelines ordered by fully qualified name
    ListPipelines {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        after: Option<String>,
    },
    /// Print the version history of a pipeline
    History { fqn: String },
    /// Delete a pipeline
    DeletePipeline {
        fqn: String,
        #[arg(long)]
        hard: bool,
    },
    /// Bring back a soft-deleted pipeline
    RestorePipeline { fqn: String },
}

/// Settings read from `--config`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub repository: RepositoryConfig,
    pub retry: RetryConfig,
    pub deploy: Option<RestClientConfig>,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Opens the catalog described by `args`.
pub fn open_catalog(args: &Args) -> Result<Catalog> {
    let config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let db = CatalogDb::open(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;

    let deploy = match (&args.deploy_url, config.deploy) {
        (Some(url), deploy) => Some(RestClientConfig {
            base_url: url.clone(),
            ..deploy.unwrap_or_default()
        }),
        (None, deploy) => deploy,
    };
    let hooks = match deploy {
        Some(deploy) => {
            info!(base_url = %deploy.base_url, "deployment hooks enabled");
            let client = RestDeploymentClient::new(deploy).context("Failed to build deployment client")?;
            HookDispatcher::new(Arc::new(client), config.retry)
        }
        None => HookDispatcher::disabled(),
    };
    Ok(Catalog::new(db, hooks, config.repository))
}

/// Runs the parsed command, writing its output to `out`.
pub async fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let catalog = open_catalog(args)?;
    let by = args.user.as_str();

    match &args.command {
        Command::CreateService { name, service_type } => {
            let mut service = PipelineService::new(name);
            service.service_type = service_type.clone();
            let created = catalog.services.create(service, by).await?;
            writeln!(out, "{}", created.entity.id())?;
        }
        Command::CreateUser { name, email } => {
            let mut user = User::new(name);
            user.email = email.clone();
            let created = catalog.users.create(user, by).await?;
            writeln!(out, "{}", created.entity.id())?;
        }
        Command::CreateTeam { name } => {
            let created = catalog.teams.create(Team::new(name), by).await?;
            writeln!(out, "{}", created.entity.id())?;
        }
        Command::PutPipeline {
            file,
            service,
            owner,
        } => {
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read pipeline file {}", file.display()))?;
            let mut pipeline: IngestionPipeline =
                serde_json::from_str(&raw).context("Failed to parse pipeline JSON")?;
            if let Some(service) = service {
                let found = catalog
                    .services
                    .get_by_name(service, Include::NonDeleted)
                    .with_context(|| format!("Unknown pipeline service {service}"))?;
                pipeline.service = Some(found.to_reference());
            }
            if let Some(owner) = owner {
                pipeline.header.owner = Some(find_owner(&catalog, owner)?);
            }
            if pipeline.service.is_none() {
                bail!("pipeline has no service; pass --service or set it in the file");
            }
            let result = catalog.pipelines.create_or_update(pipeline, by).await?;
            report(out, &result)?;
        }
        Command::GetPipeline {
            fqn,
            include_deleted,
        } => {
            let include = if *include_deleted {
                Include::All
            } else {
                Include::NonDeleted
            };
            let pipeline = catalog.pipelines.get_by_name(fqn, include)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&pipeline)?)?;
        }
        Command::ListPipelines { limit, after } => {
            let page = catalog.pipelines.list(&ListParams {
                limit: *limit,
                after: after.clone(),
                ..Default::default()
            })?;
            for pipeline in &page.data {
                writeln!(
                    out,
                    "{}\t{}",
                    pipeline.fully_qualified_name().unwrap_or_default(),
                    pipeline.version()
                )?;
            }
            if let Some(after) = page.after {
                writeln!(out, "next: {after}")?;
            }
        }
        Command::History { fqn } => {
            let id = catalog.pipelines.get_by_name(fqn, Include::All)?.id();
            for version in catalog.pipelines.list_versions(id)? {
                let fields = version
                    .header
                    .change_description
                    .as_ref()
                    .map(|c| c.field_names().join(","))
                    .unwrap_or_default();
                writeln!(out, "{}\t{}\t{fields}", version.version(), version.header.updated_by)?;
            }
        }
        Command::DeletePipeline { fqn, hard } => {
            let id = catalog.pipelines.get_by_name(fqn, Include::All)?.id();
            let mode = if *hard { DeleteMode::hard() } else { DeleteMode::soft() };
            let result = catalog.pipelines.delete(id, by, mode).await?;
            report(out, &result)?;
        }
        Command::RestorePipeline { fqn } => {
            let id = catalog.pipelines.get_by_name(fqn, Include::Deleted)?.id();
            let result = catalog.pipelines.restore(id, by).await?;
            report(out, &result)?;
        }
    }
    Ok(())
}

/// Looks `name` up as a user first, then as a team.
fn find_owner(catalog: &Catalog, name: &str) -> Result<EntityReference> {
    match catalog.users.get_by_name(name, Include::NonDeleted) {
        Ok(user) => return Ok(EntityReference::new(user.id(), User::ENTITY_TYPE)),
        Err(RepoError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }
    let team = catalog
        .teams
        .get_by_name(name, Include::NonDeleted)
        .with_context(|| format!("Unknown owner {name}: no user or team has that name"))?;
    Ok(EntityReference::new(team.id(), Team::ENTITY_TYPE))
}

fn report(out: &mut impl Write, result: &Mutation<IngestionPipeline>) -> Result<()> {
    writeln!(
        out,
        "{:?} {} {}",
        result.status,
        result.entity.fully_qualified_name().unwrap_or_default(),
        result.entity.version()
    )?;
    if let HookReport::Failed { error, attempts } = &result.hook {
        warn!(attempts, %error, "deployment hook failed");
        writeln!(out, "hook failed after {attempts} attempts: {error}")?;
    }
    Ok(())
}
