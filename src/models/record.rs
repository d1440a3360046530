use crate::error::{Result, UserdeskError};
use serde::{Deserialize, Deserializer, Serialize};

/// Status text shown when a required field is missing.
pub const MISSING_FIELDS_MESSAGE: &str = "Enter name and email!";

/// A user record as held by the remote store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Record {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    pub(crate) fn apply(&mut self, draft: &RecordDraft) {
        self.name = draft.name.clone();
        self.email = draft.email.clone();
    }
}

/// The `{name, email}` body sent on create and update.
///
/// Only constructed through [`RecordDraft::new`], so an instance always
/// carries two non-blank fields.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RecordDraft {
    name: String,
    email: String,
}

impl RecordDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let email = email.into();
        if is_blank(&name) || is_blank(&email) {
            return Err(UserdeskError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }
        Ok(Self { name, email })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// Servers disagree on whether ids are strings or integers.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}
