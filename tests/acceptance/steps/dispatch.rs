//! Dispatch step definitions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use cucumber::{given, then, when, World};
use serde_json::{json, Value};

use crate::common::{order_key, quick_key, TestApp};
use delivery_dispatch::storage::MemoryDocumentStore;

/// Test context for dispatch scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct DispatchWorld {
    codes: Vec<String>,
    app: Option<TestApp>,
    /// order id -> business id
    orders: HashMap<String, String>,
    last: Option<(StatusCode, Value)>,
}

impl fmt::Debug for DispatchWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchWorld")
            .field("codes", &self.codes)
            .field("orders", &self.orders)
            .field("last", &self.last)
            .finish()
    }
}

impl DispatchWorld {
    fn new() -> Self {
        Self {
            codes: Vec::new(),
            app: None,
            orders: HashMap::new(),
            last: None,
        }
    }

    fn app(&self) -> &TestApp {
        self.app.as_ref().expect("platform not initialized")
    }

    fn last(&self) -> &(StatusCode, Value) {
        self.last.as_ref().expect("no request was made")
    }

    async fn act(&mut self, uid: &str, body: Value) {
        let result = self.app().act(uid, body).await;
        self.last = Some(result);
    }

    async fn merchant(&mut self, uid: &str, action: &str, order_id: &str, code: Option<String>) {
        let business_id = self
            .orders
            .get(order_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let mut body = json!({ "action": action, "businessId": business_id, "orderId": order_id });
        if let Some(code) = code {
            body["verificationCode"] = json!(code);
        }
        self.act(uid, body).await;
    }

    async fn merchant_doc(&self, order_id: &str) -> serde_json::Map<String, Value> {
        let business_id = &self.orders[order_id];
        self.app().read(&order_key(business_id, order_id)).await
    }
}

// --- Background ---

#[given(expr = "a delivery platform issuing codes {string} then {string}")]
async fn given_platform(world: &mut DispatchWorld, pickup: String, dropoff: String) {
    world.codes = vec![pickup, dropoff];
    let codes: Vec<&str> = world.codes.iter().map(String::as_str).collect();
    world.app = Some(TestApp::new(Arc::new(MemoryDocumentStore::new()), &codes));
}

// --- Given steps ---

#[given(expr = "an in-house driver {string}")]
async fn given_inhouse_driver(world: &mut DispatchWorld, uid: String) {
    world.app().user(&uid, "driver_inhouse").await;
}

#[given(expr = "a marketplace driver {string}")]
async fn given_marketplace_driver(world: &mut DispatchWorld, uid: String) {
    world.app().user(&uid, "driver_marketplace").await;
}

#[given(expr = "a manager {string}")]
async fn given_manager(world: &mut DispatchWorld, uid: String) {
    world.app().user(&uid, "manager").await;
}

#[given(expr = "a staff member {string} with sub-role {string}")]
async fn given_staff(world: &mut DispatchWorld, uid: String, staff_role: String) {
    world.app().staff(&uid, &staff_role).await;
}

#[given(expr = "{string} holds an approved driver credential for business {string}")]
async fn given_credential(world: &mut DispatchWorld, uid: String, business_id: String) {
    world.app().credential(&business_id, &uid, true).await;
}

#[given(expr = "merchant order {string} for business {string} with status {string}")]
async fn given_merchant_order(
    world: &mut DispatchWorld,
    order_id: String,
    business_id: String,
    status: String,
) {
    world
        .app()
        .order(&business_id, &order_id, json!({ "status": status }))
        .await;
    world.orders.insert(order_id, business_id);
}

#[given(expr = "quick delivery {string} with status {string}")]
async fn given_quick_delivery(world: &mut DispatchWorld, order_id: String, status: String) {
    world
        .app()
        .quick_job(&order_id, json!({ "status": status }))
        .await;
}

// --- When steps ---

#[when(expr = "{string} performs {string} on order {string}")]
async fn when_merchant_action(world: &mut DispatchWorld, uid: String, action: String, order_id: String) {
    world.merchant(&uid, &action, &order_id, None).await;
}

#[when(expr = "{string} performs {string} on order {string} with code {string}")]
async fn when_merchant_action_with_code(
    world: &mut DispatchWorld,
    uid: String,
    action: String,
    order_id: String,
    code: String,
) {
    world.merchant(&uid, &action, &order_id, Some(code)).await;
}

#[when(expr = "{string} performs {string} on quick delivery {string}")]
async fn when_quick_action(world: &mut DispatchWorld, uid: String, action: String, order_id: String) {
    let body = json!({ "action": action, "source": "quick", "orderId": order_id });
    world.act(&uid, body).await;
}

// --- Then steps ---

#[then("the request succeeds")]
async fn then_succeeds(world: &mut DispatchWorld) {
    let (status, body) = world.last();
    assert_eq!(*status, StatusCode::OK, "body: {body}");
    assert_eq!(body, &json!({ "ok": true }));
}

#[then(expr = "the request fails with status {int}")]
async fn then_fails(world: &mut DispatchWorld, status: u16) {
    let (actual, body) = world.last();
    assert_eq!(actual.as_u16(), status, "body: {body}");
    assert!(body["error"].is_string());
}

#[then(expr = "the request fails with status {int} and message {string}")]
async fn then_fails_with(world: &mut DispatchWorld, status: u16, message: String) {
    let (actual, body) = world.last();
    assert_eq!(actual.as_u16(), status, "body: {body}");
    assert_eq!(body["error"], message.as_str());
}

#[then(expr = "order {string} has status {string}")]
async fn then_order_status(world: &mut DispatchWorld, order_id: String, status: String) {
    let doc = world.merchant_doc(&order_id).await;
    assert_eq!(doc["status"], status.as_str());
}

#[then(expr = "order {string} is assigned to {string}")]
async fn then_order_assignee(world: &mut DispatchWorld, order_id: String, uid: String) {
    let doc = world.merchant_doc(&order_id).await;
    assert_eq!(doc["assignedTransporterId"], uid.as_str());
}

#[then(expr = "order {string} has pickup code {string} and drop-off code {string}")]
async fn then_order_codes(world: &mut DispatchWorld, order_id: String, pickup: String, dropoff: String) {
    let doc = world.merchant_doc(&order_id).await;
    assert_eq!(doc["deliveryVerification"]["pickupCode"], pickup.as_str());
    assert_eq!(doc["deliveryVerification"]["dropoffCode"], dropoff.as_str());
}

#[then(expr = "quick delivery {string} has status {string}")]
async fn then_quick_status(world: &mut DispatchWorld, order_id: String, status: String) {
    let doc = world.app().read(&quick_key(&order_id)).await;
    assert_eq!(doc["status"], status.as_str());
}
