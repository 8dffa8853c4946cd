//! Users and teams, the kinds allowed to own other entities.

use catalog_model::{Entity, EntityHeader, FieldSpec, KindSpec, TEAM, USER};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub header: EntityHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: EntityHeader::new(name),
            email: None,
            is_admin: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl Entity for User {
    const ENTITY_TYPE: &'static str = USER;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }
}

pub fn user_spec() -> KindSpec<User> {
    KindSpec::<User>::new()
        .field(FieldSpec::keep_when_unset_on_put("email", |u| &u.email, |u| &mut u.email))
        .field(FieldSpec::required("isAdmin", |u| &u.is_admin))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(flatten)]
    pub header: EntityHeader,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: EntityHeader::new(name),
        }
    }
}

impl Entity for Team {
    const ENTITY_TYPE: &'static str = TEAM;

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }
}

pub fn team_spec() -> KindSpec<Team> {
    KindSpec::new()
}
