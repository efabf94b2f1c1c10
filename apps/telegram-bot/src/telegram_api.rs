//! Thin Telegram Bot API client: the handful of methods the storefront needs.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::time::sleep;

/// Default per-request budget for everything except long polls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_millis(250),
    Duration::from_secs(1),
    Duration::from_secs(4),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("telegram {method} failed: {description}")]
    Rejected {
        method: String,
        code: Option<u16>,
        description: String,
    },
    #[error("telegram {method} request")]
    Http {
        method: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Network trouble and server-side errors are worth repeating an idempotent call for.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { .. } => true,
            ApiError::Rejected { code, .. } => matches!(code, Some(500..=599)),
        }
    }

    /// True only when the request never reached the Bot API, so resending cannot duplicate it.
    pub fn never_delivered(&self) -> bool {
        matches!(self, ApiError::Http { source, .. } if source.is_connect())
    }

    /// Telegram refuses edits that would leave a message unchanged.
    pub fn is_not_modified(&self) -> bool {
        matches!(
            self,
            ApiError::Rejected { description, .. } if description.contains("message is not modified")
        )
    }
}

#[derive(Clone)]
pub struct BotClient {
    http: Client,
    api_base: String,
    token: String,
    request_timeout: Duration,
}

impl BotClient {
    pub fn new(http: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            token: token.into(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }

    /// Calls `method` once, decoding the Bot API envelope.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let http_err = |source| ApiError::Http {
            method: method.to_string(),
            source,
        };
        let res = self
            .http
            .post(self.url(method))
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(http_err)?;
        let status = res.status();
        let body = res.text().await.map_err(http_err)?;

        let parsed: Option<TelegramResponse<T>> = serde_json::from_str(&body).ok();
        match parsed {
            Some(TelegramResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Some(envelope) => Err(ApiError::Rejected {
                method: method.to_string(),
                code: envelope.error_code.or(Some(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            }),
            None => Err(ApiError::Rejected {
                method: method.to_string(),
                code: Some(status.as_u16()),
                description: format!("unexpected response {status}: {body}"),
            }),
        }
    }

    /// Like [`call`](Self::call), retrying transient failures with backoff.
    /// Only for idempotent methods (edits, callback answers).
    pub async fn call_with_retry<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, ApiError> {
        with_retry(
            || self.call(method, payload, self.request_timeout),
            ApiError::is_retryable,
        )
        .await
    }

    /// Posts a new message. Resent only when the connection was never established; a
    /// timeout or 5xx may follow a delivered message, so those are returned as-is.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, ApiError> {
        with_retry(
            || self.call(method, payload, self.request_timeout),
            ApiError::never_delivered,
        )
        .await
    }

    /// Long-polls for updates after `offset`. Not retried; the poll loop owns backoff.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, ApiError> {
        let mut payload = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call("getUpdates", &payload, timeout + self.request_timeout)
            .await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), ApiError> {
        let payload = json!({ "callback_query_id": callback_query_id });
        self.call_with_retry::<Value>("answerCallbackQuery", &payload)
            .await
            .map(|_| ())
    }
}

/// Telegram takes numeric chat ids as integers and public usernames as strings.
pub fn chat_id_value(chat_id: &str) -> Value {
    match chat_id.parse::<i64>() {
        Ok(id) => json!(id),
        Err(_) => json!(chat_id),
    }
}

async fn with_retry<F, Fut, T>(mut op: F, retryable: fn(&ApiError) -> bool) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retryable(&err) && attempt < RETRY_DELAYS.len() => {
                tracing::debug!(error = %err, attempt, "retrying telegram call");
                sleep(RETRY_DELAYS[attempt]).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn rejected(code: u16, description: &str) -> ApiError {
        ApiError::Rejected {
            method: "sendMessage".into(),
            code: Some(code),
            description: description.into(),
        }
    }

    /// Counts attempts; `outcome` decides each one from its zero-based number.
    fn counted<T>(
        attempts: &Arc<AtomicUsize>,
        outcome: impl Fn(usize) -> Result<T, ApiError>,
    ) -> impl FnMut() -> std::future::Ready<Result<T, ApiError>> {
        let attempts = attempts.clone();
        move || std::future::ready(outcome(attempts.fetch_add(1, Ordering::SeqCst)))
    }

    #[tokio::test]
    async fn retry_recovers_from_server_errors() {
        tokio::time::pause();
        let attempts = Arc::new(AtomicUsize::new(0));
        let op = counted(&attempts, |n| {
            if n < 2 {
                Err(rejected(502, "Bad Gateway"))
            } else {
                Ok(7)
            }
        });
        let result = with_retry(op, ApiError::is_retryable).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let op = counted(&attempts, |_| -> Result<(), _> {
            Err(rejected(400, "Bad Request: chat not found"))
        });
        assert!(with_retry(op, ApiError::is_retryable).await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_gives_up_after_backoff_schedule() {
        tokio::time::pause();
        let attempts = Arc::new(AtomicUsize::new(0));
        let op = counted(&attempts, |_| -> Result<(), _> {
            Err(rejected(503, "Service Unavailable"))
        });
        assert!(with_retry(op, ApiError::is_retryable).await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), RETRY_DELAYS.len() + 1);
    }

    #[tokio::test]
    async fn sends_are_not_repeated_after_server_errors() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let op = counted(&attempts, |_| -> Result<(), _> {
            Err(rejected(502, "Bad Gateway"))
        });
        assert!(with_retry(op, ApiError::never_delivered).await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rate_limits_and_rejections_are_final() {
        assert!(!rejected(429, "Too Many Requests: retry after 5").is_retryable());
        assert!(!rejected(429, "Too Many Requests: retry after 5").never_delivered());
        assert!(!rejected(502, "Bad Gateway").never_delivered());
    }

    #[tokio::test]
    async fn refused_connections_are_never_delivered() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = BotClient::new(Client::new(), format!("http://{addr}"), "t");
        let err = client
            .call::<Value>("sendMessage", &json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.never_delivered(), "{err:?}");
        assert!(err.is_retryable());
    }

    #[test]
    fn detects_not_modified_edits() {
        assert!(
            rejected(
                400,
                "Bad Request: message is not modified: specified new message content and reply markup are exactly the same"
            )
            .is_not_modified()
        );
        assert!(!rejected(400, "Bad Request: message to edit not found").is_not_modified());
    }

    #[test]
    fn chat_ids_keep_their_json_type() {
        assert_eq!(chat_id_value("-1001"), json!(-1001));
        assert_eq!(chat_id_value("@shop_orders"), json!("@shop_orders"));
    }

    #[test]
    fn url_trims_trailing_slash() {
        let client = BotClient::new(Client::new(), "https://api.telegram.org/", "123:abc");
        assert_eq!(
            client.url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn updates_deserialize() {
        let raw = json!({
            "update_id": 10,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 5, "username": "ann"},
                "message": {"message_id": 3, "chat": {"id": 5}, "date": 0},
                "data": "next"
            }
        });
        let update: Update = serde_json::from_value(raw).unwrap();
        let query = update.callback_query.unwrap();
        assert_eq!(query.data.as_deref(), Some("next"));
        assert_eq!(query.message.unwrap().message_id, 3);
        assert!(update.message.is_none());
    }
}
