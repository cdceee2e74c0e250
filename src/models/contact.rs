//! Contact model for the organization roster.

use serde::{Deserialize, Serialize};

use crate::db::{LocalLayout, Record, StoreError};

/// Image shown for contacts that have not uploaded a picture.
pub const PLACEHOLDER_IMAGE: &str = "assets/images/generic-user.jpg";

/// A roster contact, keyed by its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Contact {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: None,
            email: None,
            phone: None,
            image: None,
        }
    }
}

impl Record for Contact {
    const KIND: &'static str = "contacts";
    const LOCAL_LAYOUT: LocalLayout = LocalLayout::Keyed { prefix: "contact" };

    fn key(&self) -> Result<String, StoreError> {
        if self.role.is_empty() {
            return Err(StoreError::MissingIdentifier(Self::KIND));
        }
        Ok(self.role.clone())
    }

    fn attach_key(&mut self, key: &str) {
        self.role = key.to_string();
    }
}

/// Request body for saving a contact. The role comes from the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl SaveContactRequest {
    pub fn into_contact(self, role: &str) -> Contact {
        Contact {
            role: role.to_string(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            image: self.image,
        }
    }
}
