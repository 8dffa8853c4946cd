//! Generic versioned entity repository.
//!
//! One [`EntityRepository`] serves one record kind, described by its
//! [`KindSpec`](catalog_model::KindSpec). The repository resolves
//! references, computes fully qualified names, diffs updates field by field,
//! versions every real change and rebuilds relationship edges, all inside a
//! single storage transaction per mutation. Post-mutation hooks run after
//! commit through the injected [`HookDispatcher`](catalog_hooks::HookDispatcher).

mod config;
pub mod differ;
mod error;
mod ledger;
mod repository;
mod resolver;
mod updater;

pub use config::RepositoryConfig;
pub use error::{RepoError, RepoResult};
pub use ledger::{ChangeRecorder, VersionTransition};
pub use repository::{DeleteMode, EntityPage, EntityRepository, ListParams, Mutation, MutationStatus};
pub use resolver::{ReferenceResolver, StoreResolver};
pub use updater::EntityUpdater;
