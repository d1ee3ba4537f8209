//! Identity and business lookups.
//!
//! Read non-transactionally and fresh on every request: roles and driver
//! credentials are never cached.

use async_trait::async_trait;
use serde::Deserialize;

use super::document_store::Result;
use crate::dispatch::model::Coordinates;

/// A driver/courier record scoped to one business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCredential {
    #[serde(default)]
    pub background_check_status: String,
    #[serde(default)]
    pub license_verified: bool,
}

impl DriverCredential {
    pub fn is_approved(&self) -> bool {
        self.background_check_status.eq_ignore_ascii_case("approved") && self.license_verified
    }
}

/// Everything the role resolver needs to know about a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRecord {
    /// Platform-level role, e.g. `driver_inhouse` or `staff`.
    pub role: String,
    /// Staff sub-role, e.g. `server`. Only meaningful when `role` is `staff`.
    pub staff_role: Option<String>,
    /// Driver credential for the requested business. Only looked up for staff.
    pub credential: Option<DriverCredential>,
}

/// Role and credential lookup.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Look up the caller's role record.
    ///
    /// When the caller is staff and `business_id` is given, the driver
    /// credential for that `(business_id, uid)` pair is included. Returns
    /// `None` if the caller has no user record.
    async fn lookup(&self, uid: &str, business_id: Option<&str>) -> Result<Option<RoleRecord>>;
}

/// The parts of a business profile used to label pickups.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Business profile lookup.
#[async_trait]
pub trait BusinessDirectory: Send + Sync {
    async fn business_profile(&self, business_id: &str) -> Result<Option<BusinessProfile>>;
}
