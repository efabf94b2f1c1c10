//! Minimal Telegram Bot API double.
//!
//! Serves `POST /bot{token}/{method}`, records every call, answers `ok: true`, and hands out
//! queued updates from `getUpdates`. Updates can be queued in-process with
//! [`MockBotApi::push_update`] or over HTTP with `POST /_mock/updates`; recorded calls are
//! listed at `GET /_mock/calls`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Value, json};

/// Longest time an empty `getUpdates` is held open.
const MAX_HOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedCall {
    pub token: String,
    pub method: String,
    pub payload: Value,
}

#[derive(Default)]
struct Inner {
    calls: Mutex<Vec<RecordedCall>>,
    updates: Mutex<VecDeque<Value>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
    next_update_id: AtomicI64,
    next_message_id: AtomicI64,
}

#[derive(Clone, Default)]
pub struct MockBotApi {
    inner: Arc<Inner>,
}

impl MockBotApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/_mock/updates", post(queue_update))
            .route("/_mock/calls", get(list_calls))
            .route("/{bot}/{method}", post(call))
            .with_state(self.clone())
    }

    /// Queues an update; `update_id` is assigned when missing.
    pub fn push_update(&self, mut update: Value) -> i64 {
        let id = self.inner.next_update_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(obj) = update.as_object_mut() {
            obj.entry("update_id").or_insert_with(|| json!(id));
        }
        self.lock_updates().push_back(update);
        id
    }

    /// Makes every later call to `method` fail with the given status and description.
    pub fn fail_method(&self, method: &str, status: u16, description: &str) {
        self.inner
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(method.to_string(), (status, description.to_string()));
    }

    /// Holds every later reply to `method` for `delay`. The call is recorded on arrival.
    pub fn delay_method(&self, method: &str, delay: Duration) {
        self.inner
            .delays
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(method.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    /// Payloads of recorded calls to `method`, oldest first.
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.lock_calls()
            .iter()
            .filter(|call| call.method == method)
            .map(|call| call.payload.clone())
            .collect()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_updates(&self) -> std::sync::MutexGuard<'_, VecDeque<Value>> {
        self.inner
            .updates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failure_for(&self, method: &str) -> Option<(u16, String)> {
        self.inner
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(method)
            .cloned()
    }

    fn delay_for(&self, method: &str) -> Option<Duration> {
        self.inner
            .delays
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(method)
            .copied()
    }

    fn take_updates(&self, offset: Option<i64>) -> Vec<Value> {
        let mut queue = self.lock_updates();
        if let Some(offset) = offset {
            queue.retain(|update| update_id(update) >= offset);
        }
        queue.drain(..).collect()
    }
}

fn update_id(update: &Value) -> i64 {
    update
        .get("update_id")
        .and_then(Value::as_i64)
        .unwrap_or_default()
}

async fn call(
    State(api): State<MockBotApi>,
    Path((bot, method)): Path<(String, String)>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(token) = bot.strip_prefix("bot") else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "error_code": 404, "description": "Not Found"})),
        );
    };
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    tracing::info!(method = %method, payload = %payload, "bot api call");
    api.lock_calls().push(RecordedCall {
        token: token.to_string(),
        method: method.clone(),
        payload: payload.clone(),
    });

    if let Some(delay) = api.delay_for(&method) {
        tokio::time::sleep(delay).await;
    }

    if let Some((status, description)) = api.failure_for(&method) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        return (
            status,
            Json(json!({
                "ok": false,
                "error_code": status.as_u16(),
                "description": description,
            })),
        );
    }

    let result = match method.as_str() {
        "getUpdates" => {
            let offset = payload.get("offset").and_then(Value::as_i64);
            let mut updates = api.take_updates(offset);
            let hold = payload
                .get("timeout")
                .and_then(Value::as_u64)
                .map(Duration::from_secs)
                .unwrap_or_default()
                .min(MAX_HOLD);
            if updates.is_empty() && !hold.is_zero() {
                tokio::time::sleep(hold).await;
                updates = api.take_updates(offset);
            }
            Value::Array(updates)
        }
        "sendMessage" | "sendPhoto" => {
            let message_id = api.inner.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
            json!({
                "message_id": message_id,
                "chat": { "id": payload.get("chat_id").cloned().unwrap_or(Value::Null) },
            })
        }
        _ => Value::Bool(true),
    };
    (StatusCode::OK, Json(json!({ "ok": true, "result": result })))
}

async fn queue_update(State(api): State<MockBotApi>, Json(update): Json<Value>) -> Json<Value> {
    let update_id = api.push_update(update);
    Json(json!({ "ok": true, "update_id": update_id }))
}

async fn list_calls(State(api): State<MockBotApi>) -> Json<Vec<RecordedCall>> {
    Json(api.calls())
}
