use crate::handler::{DefaultHandler, KindHandler};
use crate::Entity;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// What an absent incoming value means for an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnUnset {
    /// Absent means "remove the value"; recorded as a deleted field.
    Record,
    /// Absent means "not supplied"; the original value is kept.
    Preserve,
    /// `Preserve` for PUT, `Record` for PATCH.
    PreserveOnPut,
}

type Extract<E> = Box<dyn Fn(&E) -> Result<Option<Value>, serde_json::Error> + Send + Sync>;
type CarryOver<E> = Box<dyn Fn(&E, &mut E) + Send + Sync>;

/// One field that participates in change detection.
///
/// Fields are declared through typed accessors rather than by name lookup
/// in the serialized body, so a misspelled field cannot silently stop
/// producing diffs. The name is only the label written to change records.
pub struct FieldSpec<E> {
    name: &'static str,
    on_unset: OnUnset,
    extract: Extract<E>,
    carry_over: Option<CarryOver<E>>,
}

impl<E: 'static> FieldSpec<E> {
    /// A field that always has a value.
    pub fn required<T: Serialize + 'static>(name: &'static str, get: fn(&E) -> &T) -> Self {
        Self {
            name,
            on_unset: OnUnset::Record,
            extract: Box::new(move |e| serde_json::to_value(get(e)).map(Some)),
            carry_over: None,
        }
    }

    /// An optional field; an absent incoming value is a removal.
    pub fn optional<T: Serialize + 'static>(name: &'static str, get: fn(&E) -> &Option<T>) -> Self {
        Self {
            name,
            on_unset: OnUnset::Record,
            extract: extract_optional(get),
            carry_over: None,
        }
    }

    /// An optional field whose original value is kept when the incoming
    /// entity does not supply one.
    pub fn keep_when_unset<T: Serialize + Clone + 'static>(
        name: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self {
        Self {
            name,
            on_unset: OnUnset::Preserve,
            extract: extract_optional(get),
            carry_over: Some(Box::new(move |original, updated| {
                *get_mut(updated) = get(original).clone();
            })),
        }
    }

    /// Like [`FieldSpec::keep_when_unset`] for PUT, like
    /// [`FieldSpec::optional`] for PATCH.
    pub fn keep_when_unset_on_put<T: Serialize + Clone + 'static>(
        name: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self {
        Self {
            on_unset: OnUnset::PreserveOnPut,
            ..Self::keep_when_unset(name, get, get_mut)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn on_unset(&self) -> OnUnset {
        self.on_unset
    }

    /// Serialized value of the field, `None` when unset.
    pub fn extract(&self, entity: &E) -> Result<Option<Value>, serde_json::Error> {
        (self.extract)(entity)
    }

    /// Copies the original value onto `updated`. Returns false for fields
    /// that cannot carry a value over.
    pub fn carry_over(&self, original: &E, updated: &mut E) -> bool {
        match &self.carry_over {
            Some(carry) => {
                carry(original, updated);
                true
            }
            None => false,
        }
    }
}

fn extract_optional<E: 'static, T: Serialize + 'static>(get: fn(&E) -> &Option<T>) -> Extract<E> {
    Box::new(move |e| get(e).as_ref().map(serde_json::to_value).transpose())
}

impl<E> fmt::Debug for FieldSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("on_unset", &self.on_unset)
            .finish()
    }
}

/// Whether a kind lives inside a container, and which types may contain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Top-level kind; any supplied container is rejected.
    None,
    Optional(&'static [&'static str]),
    Required(&'static [&'static str]),
}

impl Containment {
    pub fn is_required(&self) -> bool {
        matches!(self, Containment::Required(_))
    }

    /// Whether `entity_type` may contain this kind.
    pub fn allows(&self, entity_type: &str) -> bool {
        match self {
            Containment::None => false,
            Containment::Optional(types) | Containment::Required(types) => {
                types.contains(&entity_type)
            }
        }
    }
}

/// When a delete triggers the external undeploy side effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndeployOn {
    #[default]
    Never,
    HardDeleteOnly,
    /// Soft deletes undeploy too; a flagged entity must not keep running.
    AnyDelete,
}

impl UndeployOn {
    pub fn applies(&self, hard_delete: bool) -> bool {
        match self {
            UndeployOn::Never => false,
            UndeployOn::HardDeleteOnly => hard_delete,
            UndeployOn::AnyDelete => true,
        }
    }
}

/// Declarative post-mutation side-effect policy of one kind.
pub struct HookPolicy<E> {
    /// Predicate deciding whether a created/updated entity is deployed.
    /// `None` never deploys.
    pub deploy_when: Option<fn(&E) -> bool>,
    pub on_create: bool,
    pub on_update: bool,
    pub undeploy_on: UndeployOn,
}

impl<E> HookPolicy<E> {
    /// No side effects at all.
    pub fn none() -> Self {
        Self {
            deploy_when: None,
            on_create: false,
            on_update: false,
            undeploy_on: UndeployOn::Never,
        }
    }

    /// Deploy on create and update when `predicate` holds; undeploy per `undeploy_on`.
    pub fn deploy_if(predicate: fn(&E) -> bool, undeploy_on: UndeployOn) -> Self {
        Self {
            deploy_when: Some(predicate),
            on_create: true,
            on_update: true,
            undeploy_on,
        }
    }

    pub fn should_deploy_on_create(&self, entity: &E) -> bool {
        self.on_create && self.deploy_when.is_some_and(|p| p(entity))
    }

    pub fn should_deploy_on_update(&self, entity: &E) -> bool {
        self.on_update && self.deploy_when.is_some_and(|p| p(entity))
    }

    pub fn should_undeploy(&self, hard_delete: bool) -> bool {
        self.undeploy_on.applies(hard_delete)
    }
}

impl<E> Default for HookPolicy<E> {
    fn default() -> Self {
        Self::none()
    }
}

/// Capabilities one record kind supplies to the generic repository.
pub struct KindSpec<E> {
    pub containment: Containment,
    /// Kind-specific fields compared on update, in record order.
    pub fields: Vec<FieldSpec<E>>,
    pub hooks: HookPolicy<E>,
    pub handler: Box<dyn KindHandler<E>>,
}

impl<E: Entity> KindSpec<E> {
    /// A top-level kind with no change fields, hooks or handler.
    pub fn new() -> Self {
        Self {
            containment: Containment::None,
            fields: Vec::new(),
            hooks: HookPolicy::none(),
            handler: Box::new(DefaultHandler),
        }
    }

    pub fn entity_type(&self) -> &'static str {
        E::ENTITY_TYPE
    }

    pub fn contained_in(mut self, containment: Containment) -> Self {
        self.containment = containment;
        self
    }

    pub fn field(mut self, field: FieldSpec<E>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn hooks(mut self, hooks: HookPolicy<E>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn handler(mut self, handler: impl KindHandler<E> + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Names of the declared change fields.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(FieldSpec::name).collect()
    }
}

impl<E: Entity> Default for KindSpec<E> {
    fn default() -> Self {
        Self::new()
    }
}
