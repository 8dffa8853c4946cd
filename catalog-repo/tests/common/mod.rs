#![allow(dead_code)]

use async_trait::async_trait;
use catalog_hooks::{
    DeployRequest, DeploymentClient, HookDispatchError, HookDispatcher, HookResult, RetryConfig,
};
use catalog_model::{
    Containment, Entity, EntityHeader, EntityReference, FieldSpec, HookPolicy, KindHandler,
    KindSpec, RelatedEntity, Relationship, UndeployOn,
};
use catalog_repo::{EntityRepository, RepositoryConfig, StoreResolver};
use catalog_storage::CatalogDb;
use catalog_types::EntityId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ── Kinds ────────────────────────────────────────────────────────

macro_rules! header_entity {
    ($ty:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $ty {
            #[serde(flatten)]
            pub header: EntityHeader,
        }

        impl $ty {
            pub fn new(name: &str) -> Self {
                Self {
                    header: EntityHeader::new(name),
                }
            }
        }

        impl Entity for $ty {
            const ENTITY_TYPE: &'static str = $kind;

            fn header(&self) -> &EntityHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut EntityHeader {
                &mut self.header
            }
        }
    };
}

header_entity!(Person, "user");
header_entity!(Group, "team");
header_entity!(Shelf, "shelf");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(flatten)]
    pub header: EntityHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<EntityReference>,
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub publish: bool,
}

impl Entity for Book {
    const ENTITY_TYPE: &'static str = "book";

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn container(&self) -> Option<&EntityReference> {
        self.shelf.as_ref()
    }

    fn set_container(&mut self, container: Option<EntityReference>) {
        self.shelf = container;
    }
}

pub fn make_book(name: &str, shelf: EntityId, owner: Option<EntityReference>) -> Book {
    let mut header = EntityHeader::new(name);
    header.owner = owner;
    Book {
        header,
        shelf: Some(EntityReference::new(shelf, "shelf")),
        isbn: "978-0".into(),
        pages: Some(100),
        notes: None,
        publish: false,
    }
}

pub fn book_spec() -> KindSpec<Book> {
    KindSpec::<Book>::new()
        .contained_in(Containment::Required(&["shelf"]))
        .field(FieldSpec::required("isbn", |b| &b.isbn))
        .field(FieldSpec::optional("pages", |b| &b.pages))
        .field(FieldSpec::keep_when_unset("notes", |b| &b.notes, |b| &mut b.notes))
        .hooks(HookPolicy::deploy_if(|b| b.publish, UndeployOn::HardDeleteOnly))
}

/// Declares a `uses` edge to an entity that may or may not exist.
pub struct LinkedHandler {
    pub target: Arc<Mutex<Option<EntityReference>>>,
}

impl KindHandler<Book> for LinkedHandler {
    fn relationships(&self, _book: &Book) -> Vec<RelatedEntity> {
        self.target
            .lock()
            .unwrap()
            .iter()
            .map(|target| RelatedEntity {
                target: target.clone(),
                relation: Relationship::Uses,
            })
            .collect()
    }

    fn validate(&self, book: &Book) -> Result<(), String> {
        if book.isbn.is_empty() {
            return Err("isbn must not be empty".into());
        }
        Ok(())
    }
}

// ── Deployment client ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingClient {
    pub deployed: Mutex<Vec<String>>,
    pub undeployed: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingClient {
    pub fn deployed(&self) -> Vec<String> {
        self.deployed.lock().unwrap().clone()
    }

    pub fn undeployed(&self) -> Vec<String> {
        self.undeployed.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeploymentClient for RecordingClient {
    async fn deploy(&self, request: &DeployRequest) -> HookResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HookDispatchError::Client("orchestrator unavailable".into()));
        }
        self.deployed.lock().unwrap().push(request.fully_qualified_name.clone());
        Ok(())
    }

    async fn undeploy(&self, name: &str) -> HookResult<()> {
        self.undeployed.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

// ── Fixture ──────────────────────────────────────────────────────

pub struct Fixture {
    pub db: CatalogDb,
    pub people: EntityRepository<Person>,
    pub groups: EntityRepository<Group>,
    pub shelves: EntityRepository<Shelf>,
    pub books: EntityRepository<Book>,
    pub client: Arc<RecordingClient>,
}

pub fn repo<E: Entity>(db: &CatalogDb, spec: KindSpec<E>, hooks: HookDispatcher) -> EntityRepository<E> {
    EntityRepository::new(
        db.clone(),
        spec,
        Arc::new(StoreResolver),
        hooks,
        RepositoryConfig::default(),
    )
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RepositoryConfig::default())
    }

    pub fn with_config(config: RepositoryConfig) -> Self {
        let db = CatalogDb::open_in_memory().unwrap();
        let client = Arc::new(RecordingClient::default());
        let hooks = HookDispatcher::new(client.clone(), RetryConfig::no_retry());
        Self {
            people: repo(&db, KindSpec::new(), HookDispatcher::disabled()),
            groups: repo(&db, KindSpec::new(), HookDispatcher::disabled()),
            shelves: repo(&db, KindSpec::new(), HookDispatcher::disabled()),
            books: EntityRepository::new(
                db.clone(),
                book_spec(),
                Arc::new(StoreResolver),
                hooks,
                config,
            ),
            db,
            client,
        }
    }

    pub async fn person(&self, name: &str) -> Person {
        self.people.create(Person::new(name), "admin").await.unwrap().entity
    }

    pub async fn shelf(&self, name: &str) -> Shelf {
        self.shelves.create(Shelf::new(name), "admin").await.unwrap().entity
    }
}
