// Data models for custstore

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A customer record as persisted in the JSON document
///
/// Every field except `name` has a default so documents written by older
/// layouts (no `id`, no `store`/`location`/`description`) still load.
/// An `id` of 0 means "not yet assigned" and is replaced on load. Keys
/// outside the schema are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    /// Build a record from submitted field values, trimming each value
    pub fn from_fields(id: u64, fields: &CustomerFields) -> Self {
        Self {
            id,
            name: fields.name.trim().to_string(),
            store: fields.store.trim().to_string(),
            location: fields.location.trim().to_string(),
            email: fields.email.trim().to_string(),
            phone: fields.phone.trim().to_string(),
            description: fields
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            extra: Map::new(),
        }
    }
}

/// Field values submitted by the boundary layer for create and update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFields {
    pub name: String,
    pub store: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub description: Option<String>,
}

impl From<&Customer> for CustomerFields {
    fn from(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            store: customer.store.clone(),
            location: customer.location.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            description: customer.description.clone(),
        }
    }
}
