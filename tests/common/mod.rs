//! Shared fixtures for dispatch integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, HeaderName, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use delivery_dispatch::config::DEFAULT_USER_HEADER;
use delivery_dispatch::dispatch::{
    BroadcastEventSink, CodeGenerator, DispatchService, LineageDescriptor, Origin, StaffPolicy,
};
use delivery_dispatch::handlers::dispatch::{router, AppState};
use delivery_dispatch::interfaces::{Document, DocumentKey, DocumentStore};
use delivery_dispatch::storage::DocumentDirectory;

/// Hands out scripted codes in order, then "000001", "000002", ...
pub struct ScriptedCodes {
    script: Mutex<Vec<String>>,
    fallback: Mutex<u32>,
}

impl ScriptedCodes {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().map(|c| c.to_string()).collect()),
            fallback: Mutex::new(0),
        }
    }
}

impl CodeGenerator for ScriptedCodes {
    fn generate(&self) -> String {
        let mut script = self.script.lock().unwrap();
        if !script.is_empty() {
            return script.remove(0);
        }
        let mut n = self.fallback.lock().unwrap();
        *n += 1;
        format!("{:06}", *n)
    }
}

/// A router wired over `store`, plus handles tests inspect.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub events: Arc<BroadcastEventSink>,
}

impl TestApp {
    pub fn new(store: Arc<dyn DocumentStore>, codes: &[&str]) -> Self {
        let events = Arc::new(BroadcastEventSink::new());
        let service = DispatchService::over_store(
            store.clone(),
            StaffPolicy::default(),
            Arc::new(ScriptedCodes::new(codes)),
            events.clone(),
        );
        let state = AppState::new(
            Arc::new(service),
            HeaderName::from_static(DEFAULT_USER_HEADER),
        );
        Self {
            router: router(state),
            store,
            events,
        }
    }

    /// POST an action as `uid`; returns the status and JSON body.
    pub async fn act(&self, uid: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/api/delivery/action")
            .header(header::CONTENT_TYPE, "application/json")
            .header(DEFAULT_USER_HEADER, uid)
            .body(Body::from(body.to_string()))
            .unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn put(&self, key: DocumentKey, value: Value) {
        self.store.set(&key, to_document(value)).await.unwrap();
    }

    pub async fn user(&self, uid: &str, role: &str) {
        self.put(DocumentDirectory::user_key(uid), json!({ "role": role }))
            .await;
    }

    pub async fn staff(&self, uid: &str, staff_role: &str) {
        self.put(
            DocumentDirectory::user_key(uid),
            json!({ "role": "staff", "staffRole": staff_role }),
        )
        .await;
    }

    pub async fn credential(&self, business_id: &str, uid: &str, approved: bool) {
        self.put(
            DocumentDirectory::credential_key(business_id, uid),
            json!({
                "backgroundCheckStatus": if approved { "approved" } else { "pending" },
                "licenseVerified": true
            }),
        )
        .await;
    }

    pub async fn order(&self, business_id: &str, order_id: &str, value: Value) {
        self.put(order_key(business_id, order_id), value).await;
    }

    pub async fn quick_job(&self, order_id: &str, value: Value) {
        self.put(quick_key(order_id), value).await;
    }

    pub async fn read(&self, key: &DocumentKey) -> Document {
        self.store.get(key).await.unwrap().unwrap()
    }
}

pub fn order_key(business_id: &str, order_id: &str) -> DocumentKey {
    LineageDescriptor::document_key(
        &Origin::Merchant {
            business_id: business_id.to_string(),
        },
        order_id,
    )
}

pub fn quick_key(order_id: &str) -> DocumentKey {
    LineageDescriptor::document_key(&Origin::Quick, order_id)
}

pub fn to_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

pub fn merchant_action(action: &str, order_id: &str, code: Option<&str>) -> Value {
    let mut body = json!({ "action": action, "businessId": "b1", "orderId": order_id });
    if let Some(code) = code {
        body["verificationCode"] = json!(code);
    }
    body
}
