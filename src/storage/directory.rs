//! Role, credential and business-profile lookups over a [`DocumentStore`].
//!
//! | document                               | fields used                                 |
//! |----------------------------------------|---------------------------------------------|
//! | `users/{uid}`                          | `role`, `staffRole`                         |
//! | `businesses/{businessId}/drivers/{uid}`| `backgroundCheckStatus`, `licenseVerified`  |
//! | `businesses/{businessId}`              | `name`, `address`, `coordinates`            |

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::dispatch::Role;
use crate::interfaces::{
    BusinessDirectory, BusinessProfile, Document, DocumentKey, DocumentStore, DriverCredential,
    Result, RoleDirectory, RoleRecord,
};

const USERS_COLLECTION: &str = "users";
const BUSINESSES_COLLECTION: &str = "businesses";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(default)]
    role: String,
    #[serde(default)]
    staff_role: Option<String>,
}

/// Directory backed by plain document reads. Nothing is cached.
pub struct DocumentDirectory {
    store: Arc<dyn DocumentStore>,
}

impl DocumentDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn user_key(uid: &str) -> DocumentKey {
        DocumentKey::new(USERS_COLLECTION, uid)
    }

    pub fn credential_key(business_id: &str, uid: &str) -> DocumentKey {
        DocumentKey::new(format!("{BUSINESSES_COLLECTION}/{business_id}/drivers"), uid)
    }

    pub fn business_key(business_id: &str) -> DocumentKey {
        DocumentKey::new(BUSINESSES_COLLECTION, business_id)
    }

    async fn read<T: DeserializeOwned>(&self, key: &DocumentKey) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(document) => Ok(Some(decode(document)?)),
            None => Ok(None),
        }
    }
}

fn decode<T: DeserializeOwned>(document: Document) -> serde_json::Result<T> {
    serde_json::from_value(serde_json::Value::Object(document))
}

#[async_trait]
impl RoleDirectory for DocumentDirectory {
    async fn lookup(&self, uid: &str, business_id: Option<&str>) -> Result<Option<RoleRecord>> {
        let Some(user) = self.read::<UserDocument>(&Self::user_key(uid)).await? else {
            return Ok(None);
        };

        let credential = match business_id {
            Some(business_id) if Role::parse(&user.role) == Role::Staff => {
                self.read::<DriverCredential>(&Self::credential_key(business_id, uid))
                    .await?
            }
            _ => None,
        };

        Ok(Some(RoleRecord {
            role: user.role,
            staff_role: user.staff_role,
            credential,
        }))
    }
}

#[async_trait]
impl BusinessDirectory for DocumentDirectory {
    async fn business_profile(&self, business_id: &str) -> Result<Option<BusinessProfile>> {
        self.read(&Self::business_key(business_id)).await
    }
}
