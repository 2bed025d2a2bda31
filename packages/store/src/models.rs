//! # Domain models for entries and users
//!
//! Defines the records every store in this crate hands out. All types are
//! `Serialize + Deserialize` so they can be persisted into key-value storage
//! (guest mode) and cross the HTTP boundary to the backend (remote mode).
//!
//! ## Types
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Entry`] | A bookmarked resource: generated `id`, the four editable fields, and optional `createdAt`/`updatedAt` timestamps (always set in guest mode, backend-managed in remote mode). |
//! | [`EntryFields`] | The four user-editable fields, used as the payload of create and update. |
//! | [`EntryType`] | The fixed content type enumeration: `Written`, `Illustrated`, `Video`. |
//! | [`EntryField`] | Names one of the editable fields; used for sorting and for editing drafts. |
//! | [`UserInfo`] | The authenticated user as reported by the identity provider. |
//!
//! ## Identifiers
//!
//! [`generate_id`] builds the `<prefix>_<epoch ms>_<suffix>` identifiers used for
//! guest entries and guest sessions. The suffix is nine random base-36
//! characters, which is plenty for a single browser session.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A bookmarked resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Opaque identifier, immutable after creation: "todo_1718000000000_k3j9x0a2b"
    pub id: String,
    pub name: String,
    pub r#type: EntryType,
    pub url: String,
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Build an entry from its fields, stamping both timestamps with `at`.
    pub fn from_fields(id: String, fields: EntryFields, at: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            name: fields.name,
            r#type: fields.r#type,
            url: fields.url,
            creator: fields.creator,
            created_at: at,
            updated_at: at,
        }
    }

    /// The editable part of this entry.
    pub fn fields(&self) -> EntryFields {
        EntryFields {
            name: self.name.clone(),
            r#type: self.r#type,
            url: self.url.clone(),
            creator: self.creator.clone(),
        }
    }

    /// Overwrite the editable fields, leaving `id` and timestamps alone.
    pub fn apply(&mut self, fields: EntryFields) {
        self.name = fields.name;
        self.r#type = fields.r#type;
        self.url = fields.url;
        self.creator = fields.creator;
    }

    /// String value of `field`, as used for ordering.
    pub fn field_value(&self, field: EntryField) -> &str {
        match field {
            EntryField::Name => &self.name,
            EntryField::Type => self.r#type.as_str(),
            EntryField::Url => &self.url,
            EntryField::Creator => &self.creator,
        }
    }
}

/// The user-editable fields of an [`Entry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFields {
    pub name: String,
    pub r#type: EntryType,
    pub url: String,
    pub creator: String,
}

impl EntryFields {
    pub fn new(
        name: impl Into<String>,
        r#type: EntryType,
        url: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            r#type,
            url: url.into(),
            creator: creator.into(),
        }
    }
}

/// Content type of an entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    #[default]
    Written,
    Illustrated,
    Video,
}

impl EntryType {
    pub const ALL: [EntryType; 3] = [EntryType::Written, EntryType::Illustrated, EntryType::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Written => "Written",
            EntryType::Illustrated => "Illustrated",
            EntryType::Video => "Video",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Written" => Ok(EntryType::Written),
            "Illustrated" => Ok(EntryType::Illustrated),
            "Video" => Ok(EntryType::Video),
            other => Err(ValidationError::UnknownType(other.to_string())),
        }
    }
}

/// One of the four editable fields of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryField {
    Name,
    Type,
    Url,
    Creator,
}

impl EntryField {
    pub const ALL: [EntryField; 4] = [
        EntryField::Name,
        EntryField::Type,
        EntryField::Url,
        EntryField::Creator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryField::Name => "name",
            EntryField::Type => "type",
            EntryField::Url => "url",
            EntryField::Creator => "creator",
        }
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User information reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub provider: String,
}

impl UserInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build a `<prefix>_<epoch ms>_<random base-36>` identifier.
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{prefix}_{}_{suffix}", now.timestamp_millis())
}
