//! Dispatch action handling, independent of transport.
//!
//! Resolves the caller, optionally enriches an `accept` with the pickup
//! location, runs the transition and notifies downstream sinks.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};

use crate::interfaces::{BusinessDirectory, BusinessProfile, DispatchEventSink, DocumentStore};
use crate::storage::DocumentDirectory;

use super::codes::CodeGenerator;
use super::error::DispatchError;
use super::events::DispatchEvent;
use super::machine::{Action, DeliveryStateMachine, TransitionRequest};
use super::model::{DeliveryRecord, Origin, PickupSnapshot};
use super::roles::{RoleResolver, StaffPolicy, Transporter};

/// Result of a committed action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub record: DeliveryRecord,
    pub transporter: Transporter,
}

/// The dispatch action handler.
pub struct DispatchService {
    resolver: RoleResolver,
    machine: DeliveryStateMachine,
    businesses: Arc<dyn BusinessDirectory>,
    events: Arc<dyn DispatchEventSink>,
}

impl DispatchService {
    pub fn new(
        resolver: RoleResolver,
        machine: DeliveryStateMachine,
        businesses: Arc<dyn BusinessDirectory>,
        events: Arc<dyn DispatchEventSink>,
    ) -> Self {
        Self {
            resolver,
            machine,
            businesses,
            events,
        }
    }

    /// Wire a service whose role, credential and business lookups all read
    /// from `store`.
    pub fn over_store(
        store: Arc<dyn DocumentStore>,
        policy: StaffPolicy,
        codes: Arc<dyn CodeGenerator>,
        events: Arc<dyn DispatchEventSink>,
    ) -> Self {
        let directory = Arc::new(DocumentDirectory::new(Arc::clone(&store)));
        Self::new(
            RoleResolver::new(directory.clone(), policy),
            DeliveryStateMachine::new(store, codes),
            directory,
            events,
        )
    }

    pub fn policy(&self) -> &StaffPolicy {
        self.resolver.policy()
    }

    /// Perform `request` on behalf of the authenticated user `uid`.
    pub async fn handle(
        &self,
        uid: &str,
        request: TransitionRequest,
    ) -> Result<ActionOutcome, DispatchError> {
        let transporter = self
            .resolver
            .resolve(uid, request.origin.lineage(), request.origin.business_id())
            .await?;

        let pickup = match (&request.action, &request.origin) {
            (Action::Accept, Origin::Merchant { business_id }) => {
                self.pickup_snapshot(business_id).await
            }
            _ => None,
        };

        let record = self.machine.apply(&request, &transporter, pickup).await?;
        self.notify(&request, &transporter, &record).await;

        Ok(ActionOutcome {
            record,
            transporter,
        })
    }

    /// Pickup location from the business profile. Lookup failures degrade to
    /// `None`; the state machine then falls back to the order's own name.
    async fn pickup_snapshot(&self, business_id: &str) -> Option<PickupSnapshot> {
        match self.businesses.business_profile(business_id).await {
            Ok(Some(profile)) => snapshot_from(profile),
            Ok(None) => None,
            Err(e) => {
                warn!(business_id = %business_id, error = %e, "business profile lookup failed");
                None
            }
        }
    }

    async fn notify(
        &self,
        request: &TransitionRequest,
        transporter: &Transporter,
        record: &DeliveryRecord,
    ) {
        let event = DispatchEvent {
            lineage: record.lineage(),
            business_id: request.origin.business_id().map(str::to_string),
            order_id: request.order_id.clone(),
            transporter_id: transporter.uid.clone(),
            action: request.action,
            status: record.status(),
            overridden: transporter.can_override
                && record.assigned_to() != Some(transporter.uid.as_str()),
            at: record.fields.updated_at.unwrap_or_else(Utc::now),
        };
        if let Err(e) = self.events.publish(&event).await {
            error!(
                order_id = %event.order_id,
                action = %event.action,
                error = %e,
                "failed to publish dispatch event"
            );
        }
    }
}

fn snapshot_from(profile: BusinessProfile) -> Option<PickupSnapshot> {
    let label = profile.name.filter(|name| !name.trim().is_empty())?;
    Some(PickupSnapshot {
        label,
        address: profile.address,
        coordinates: profile.coordinates,
    })
}
