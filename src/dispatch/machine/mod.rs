//! Delivery state machine.
//!
//! Every action is one read-modify-write of a single delivery record inside
//! a store transaction. Preconditions are checked against the state read in
//! that transaction; any violation aborts it with a [`Rejection`] and nothing
//! is written. Two concurrent `accept`s on one record are serialized by the
//! store, so the second sees the first's claim and is rejected.
//!
//! | action   | from                              | to                    |
//! |----------|-----------------------------------|-----------------------|
//! | accept   | pre-claim (or own claim, retried) | lineage's claimed     |
//! | pickup   | awaiting pickup                   | lineage's in transit  |
//! | complete | in transit                        | delivered             |

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::interfaces::{Document, DocumentKey, DocumentStore, FieldUpdates, TransactionBody};

use super::codes::{self, CodeGenerator};
use super::error::{Checkpoint, DispatchError, Rejection};
use super::lineage::LineageDescriptor;
use super::model::{DeliveryFields, DeliveryRecord, DeliveryStatus, Origin, PickupSnapshot};
use super::roles::Transporter;

/// Fallback pickup label when neither the business profile nor the order
/// carries a name.
pub const DEFAULT_PICKUP_LABEL: &str = "Restaurant";

/// Document fields written by transitions. Everything else in a delivery
/// document belongs to other subsystems and is left untouched.
const OWNED_FIELDS: &[&str] = &[
    "status",
    "assignedTransporterId",
    "transporterKind",
    "deliveryVerification",
    "deliveryWorkflow",
    "pickup",
    "updatedAt",
];

/// A dispatch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accept,
    Pickup,
    Complete,
}

impl Action {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "accept" => Some(Action::Accept),
            "pickup" => Some(Action::Pickup),
            "complete" => Some(Action::Complete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Pickup => "pickup",
            Action::Complete => "complete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested transition on one delivery.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub action: Action,
    pub origin: Origin,
    pub order_id: String,
    pub verification_code: Option<String>,
}

impl TransitionRequest {
    pub fn document_key(&self) -> DocumentKey {
        LineageDescriptor::document_key(&self.origin, &self.order_id)
    }
}

/// Inputs to [`plan`] that do not come from the record.
pub struct PlanContext<'a> {
    pub now: DateTime<Utc>,
    pub codes: &'a dyn CodeGenerator,
    /// Pickup location resolved before the transaction, for `accept`.
    pub pickup: Option<PickupSnapshot>,
}

/// Decide the record's fields after `action`, or why it cannot happen.
///
/// Pure: the only side effect is drawing codes from `ctx.codes`.
pub fn plan(
    action: Action,
    record: &DeliveryRecord,
    actor: &Transporter,
    supplied_code: Option<&str>,
    ctx: PlanContext<'_>,
) -> Result<DeliveryFields, Rejection> {
    let descriptor = LineageDescriptor::of(record.lineage());
    match action {
        Action::Accept => plan_accept(descriptor, record, actor, ctx),
        Action::Pickup => plan_pickup(descriptor, record, actor, supplied_code, ctx.now),
        Action::Complete => plan_complete(descriptor, record, actor, supplied_code, ctx.now),
    }
}

fn plan_accept(
    descriptor: &LineageDescriptor,
    record: &DeliveryRecord,
    actor: &Transporter,
    ctx: PlanContext<'_>,
) -> Result<DeliveryFields, Rejection> {
    let owned_by_caller = record.assigned_to() == Some(actor.uid.as_str());
    if record.assigned_to().is_some() && !owned_by_caller && !actor.can_override {
        return Err(Rejection::AlreadyClaimed);
    }

    // A claimed record is only re-accepted by its owner or an operator, even
    // when the assignee is missing.
    let status = record.status();
    let reclaim = status == descriptor.claimed && (owned_by_caller || actor.can_override);
    if !descriptor.is_pre_claim(status) && !reclaim {
        return Err(Rejection::NotClaimable {
            noun: descriptor.noun,
            status,
        });
    }

    let mut fields = record.fields.clone();
    fields.assigned_transporter_id = Some(actor.uid.clone());
    if let Origin::Merchant { .. } = record.origin {
        fields.transporter_kind = Some(actor.kind());
    }
    codes::issue_missing(&mut fields.verification, ctx.codes);

    fields.status = descriptor.claimed;
    fields.workflow.phase = Some(descriptor.claimed.to_string());
    if owned_by_caller {
        fields.workflow.accepted_at.get_or_insert(ctx.now);
    } else {
        fields.workflow.accepted_at = Some(ctx.now);
    }

    if descriptor.snapshots_pickup && fields.pickup.is_none() {
        fields.pickup = Some(ctx.pickup.unwrap_or_else(|| PickupSnapshot {
            label: fields
                .business_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PICKUP_LABEL.to_string()),
            address: None,
            coordinates: None,
        }));
    }

    fields.updated_at = Some(ctx.now);
    Ok(fields)
}

fn plan_pickup(
    descriptor: &LineageDescriptor,
    record: &DeliveryRecord,
    actor: &Transporter,
    supplied_code: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DeliveryFields, Rejection> {
    let status = record.status();
    if !descriptor.is_awaiting_pickup(status) {
        return Err(Rejection::NotAwaitingPickup {
            noun: descriptor.noun,
            status,
        });
    }
    require_owner(record, actor)?;

    // Records that never had a code issued skip verification entirely.
    // TODO: confirm with product whether such legacy records should keep
    // bypassing the check or be rejected.
    let mut fields = record.fields.clone();
    if let Some(stored) = fields.verification.pickup_code.as_deref() {
        if !actor.can_override {
            check_code(Checkpoint::Pickup, supplied_code, stored)?;
        }
        fields.verification.pickup_verified_at = Some(now);
    }

    fields.status = descriptor.in_transit;
    fields.workflow.phase = Some(descriptor.in_transit.to_string());
    fields.workflow.picked_up_at = Some(now);
    fields.updated_at = Some(now);
    Ok(fields)
}

fn plan_complete(
    descriptor: &LineageDescriptor,
    record: &DeliveryRecord,
    actor: &Transporter,
    supplied_code: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DeliveryFields, Rejection> {
    let status = record.status();
    if !descriptor.is_completable(status) {
        return Err(Rejection::NotInTransit {
            noun: descriptor.noun,
            status,
        });
    }
    require_owner(record, actor)?;

    let mut fields = record.fields.clone();
    if let Some(stored) = fields.verification.dropoff_code.as_deref() {
        if !actor.can_override {
            check_code(Checkpoint::Dropoff, supplied_code, stored)?;
        }
    }

    fields.status = DeliveryStatus::Delivered;
    fields.workflow.phase = Some(DeliveryStatus::Delivered.to_string());
    fields.verification.dropoff_verified_at = Some(now);
    fields.workflow.delivered_at = Some(now);
    fields.updated_at = Some(now);
    Ok(fields)
}

fn require_owner(record: &DeliveryRecord, actor: &Transporter) -> Result<(), Rejection> {
    if actor.can_override || record.assigned_to() == Some(actor.uid.as_str()) {
        Ok(())
    } else {
        Err(Rejection::NotAssigned)
    }
}

fn check_code(
    checkpoint: Checkpoint,
    supplied: Option<&str>,
    stored: &str,
) -> Result<(), Rejection> {
    let supplied = supplied
        .map(codes::normalize)
        .filter(|code| !code.is_empty())
        .ok_or(Rejection::CodeRequired(checkpoint))?;
    if codes::matches(&supplied, stored) {
        Ok(())
    } else {
        Err(Rejection::InvalidCode(checkpoint))
    }
}

/// Encode the fields a transition owns as a store update.
pub fn owned_updates(fields: &DeliveryFields) -> Result<FieldUpdates, serde_json::Error> {
    let serde_json::Value::Object(mut all) = serde_json::to_value(fields)? else {
        return Ok(FieldUpdates::new());
    };
    all.retain(|name, _| OWNED_FIELDS.contains(&name.as_str()));
    Ok(all)
}

/// Applies transitions against a [`DocumentStore`].
pub struct DeliveryStateMachine {
    store: Arc<dyn DocumentStore>,
    codes: Arc<dyn CodeGenerator>,
}

impl DeliveryStateMachine {
    pub fn new(store: Arc<dyn DocumentStore>, codes: Arc<dyn CodeGenerator>) -> Self {
        Self { store, codes }
    }

    /// Run `request` for `actor` as one store transaction.
    ///
    /// Returns the record as committed. No retries: a caller that loses an
    /// `accept` race gets [`Rejection::AlreadyClaimed`].
    pub async fn apply(
        &self,
        request: &TransitionRequest,
        actor: &Transporter,
        pickup: Option<PickupSnapshot>,
    ) -> Result<DeliveryRecord, DispatchError> {
        let key = request.document_key();
        let noun = LineageDescriptor::of(request.origin.lineage()).noun;
        let codes = Arc::clone(&self.codes);
        let now = Utc::now();

        let body: TransactionBody<'_> = Box::new(move |current: Option<&Document>| {
            let document = current.ok_or(Rejection::NotFound { noun })?;
            let record = DeliveryRecord::decode(&request.order_id, request.origin.clone(), document)
                .map_err(|e| Rejection::Unreadable(e.to_string()))?;
            let ctx = PlanContext {
                now,
                codes: codes.as_ref(),
                pickup,
            };
            let fields = plan(
                request.action,
                &record,
                actor,
                request.verification_code.as_deref(),
                ctx,
            )?;
            owned_updates(&fields).map_err(|e| Rejection::Unreadable(e.to_string()))
        });

        let committed = match self.store.run_transaction(&key, body).await {
            Ok(document) => document,
            Err(e) => {
                let err = DispatchError::from(e);
                warn!(
                    key = %key,
                    action = %request.action,
                    uid = %actor.uid,
                    error = %err,
                    "delivery transition rejected"
                );
                return Err(err);
            }
        };

        let record = DeliveryRecord::decode(&request.order_id, request.origin.clone(), &committed)
            .map_err(|e| Rejection::Unreadable(e.to_string()))?;
        info!(
            key = %key,
            action = %request.action,
            uid = %actor.uid,
            status = %record.status(),
            "delivery transition applied"
        );
        Ok(record)
    }
}
