//! Role resolution: may this identity act as a transporter, and with what
//! privileges?

use std::sync::Arc;

use tracing::{debug, warn};

use crate::interfaces::{RoleDirectory, RoleRecord};

use super::error::{Denial, DispatchError};
use super::model::{Lineage, TransporterKind};

/// Platform-level roles relevant to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    DriverInhouse,
    DriverMarketplace,
    Manager,
    Admin,
    Staff,
    /// Any role that cannot perform transporter actions.
    Other(String),
}

impl Role {
    pub fn parse(role: &str) -> Self {
        match role.trim().to_ascii_lowercase().as_str() {
            "driver_inhouse" => Role::DriverInhouse,
            "driver_marketplace" => Role::DriverMarketplace,
            "manager" => Role::Manager,
            "admin" => Role::Admin,
            "staff" => Role::Staff,
            _ => Role::Other(role.to_string()),
        }
    }

    /// Operator roles may bypass ownership and code checks.
    pub fn can_override(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn is_transporter_capable(&self) -> bool {
        !matches!(self, Role::Other(_))
    }

    /// How a holder of this role is recorded when claiming a merchant order.
    pub fn transporter_kind(&self) -> TransporterKind {
        match self {
            Role::DriverMarketplace => TransporterKind::Courier,
            _ => TransporterKind::Inhouse,
        }
    }
}

/// A caller cleared to act on deliveries of one lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transporter {
    pub uid: String,
    pub role: Role,
    pub can_override: bool,
}

impl Transporter {
    pub fn kind(&self) -> TransporterKind {
        self.role.transporter_kind()
    }
}

/// Staff-specific gating rules.
#[derive(Debug, Clone)]
pub struct StaffPolicy {
    /// Staff sub-roles allowed to deliver, e.g. `server`.
    pub server_capable_roles: Vec<String>,
    /// `businessId` value that quick deliveries carry instead of a business.
    pub quick_business_sentinel: String,
}

impl Default for StaffPolicy {
    fn default() -> Self {
        Self {
            server_capable_roles: vec!["server".to_string()],
            quick_business_sentinel: "quick".to_string(),
        }
    }
}

impl StaffPolicy {
    fn is_server_capable(&self, staff_role: Option<&str>) -> bool {
        staff_role.is_some_and(|r| {
            self.server_capable_roles
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(r.trim()))
        })
    }

    /// A real business id: present, non-empty and not the quick sentinel.
    pub fn is_business_id(&self, business_id: Option<&str>) -> bool {
        business_id.is_some_and(|b| !b.trim().is_empty() && b != self.quick_business_sentinel)
    }
}

/// Resolves callers into [`Transporter`]s.
pub struct RoleResolver {
    directory: Arc<dyn RoleDirectory>,
    policy: StaffPolicy,
}

impl RoleResolver {
    pub fn new(directory: Arc<dyn RoleDirectory>, policy: StaffPolicy) -> Self {
        Self { directory, policy }
    }

    pub fn policy(&self) -> &StaffPolicy {
        &self.policy
    }

    /// Authorize `uid` for transporter actions on `lineage`.
    ///
    /// Staff are only accepted for merchant deliveries of a business where
    /// they hold an approved, license-verified driver credential and a
    /// server-capable sub-role. Costs one directory read.
    pub async fn resolve(
        &self,
        uid: &str,
        lineage: Lineage,
        business_id: Option<&str>,
    ) -> Result<Transporter, DispatchError> {
        let business_id = business_id.filter(|b| self.policy.is_business_id(Some(*b)));
        let record = self.directory.lookup(uid, business_id).await?;

        let Some(record) = record else {
            warn!(uid = %uid, "caller has no role record");
            return Err(Denial::NotTransporter { role: None }.into());
        };

        let role = Role::parse(&record.role);
        if !role.is_transporter_capable() {
            warn!(uid = %uid, role = %record.role, "role cannot perform delivery actions");
            return Err(Denial::NotTransporter {
                role: Some(record.role),
            }
            .into());
        }

        if role == Role::Staff {
            self.check_staff(uid, lineage, business_id, &record)?;
        }

        debug!(uid = %uid, role = ?role, lineage = %lineage, "transporter resolved");
        Ok(Transporter {
            uid: uid.to_string(),
            can_override: role.can_override(),
            role,
        })
    }

    fn check_staff(
        &self,
        uid: &str,
        lineage: Lineage,
        business_id: Option<&str>,
        record: &RoleRecord,
    ) -> Result<(), Denial> {
        if lineage != Lineage::Merchant {
            warn!(uid = %uid, "staff attempted a quick delivery");
            return Err(Denial::StaffQuickDelivery);
        }
        let Some(business_id) = business_id else {
            warn!(uid = %uid, "staff action without a business");
            return Err(Denial::StaffBusinessRequired);
        };
        if !self.policy.is_server_capable(record.staff_role.as_deref()) {
            warn!(uid = %uid, staff_role = ?record.staff_role, "staff sub-role cannot deliver");
            return Err(Denial::StaffNotServer {
                staff_role: record.staff_role.clone(),
            });
        }
        if !record.credential.as_ref().is_some_and(|c| c.is_approved()) {
            warn!(uid = %uid, business_id = %business_id, "staff lacks an approved driver credential");
            return Err(Denial::DriverNotApproved {
                business_id: business_id.to_string(),
            });
        }
        Ok(())
    }
}
