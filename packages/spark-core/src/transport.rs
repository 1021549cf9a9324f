//! # HTTP Transport
//!
//! Thin JSON-over-HTTPS layer shared by the resource clients.
//!
//! Every request carries the bearer token, `Accept: application/json` and the
//! configured `User-Agent`. Non-success responses are turned into typed
//! [`Error`]s carrying the backend's message and tracking id. Nothing is
//! retried here.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SdkConfig;
use crate::error::{Error, Result, ServiceFailure};

/// Header some deployments use to echo the request's tracking id.
const TRACKING_ID_HEADER: &str = "trackingid";

/// Error body returned by the service.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
    tracking_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    description: Option<String>,
}

/// Shared HTTP client bound to one service endpoint and token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Arc<str>,
}

impl HttpTransport {
    /// Build a transport from a validated configuration.
    pub fn new(config: &SdkConfig) -> Result<Self> {
        let token = config.validate()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            Error::InvalidConfig("access token contains characters not valid in a header".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with query parameters and decode the JSON body.
    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R> {
        let request = self.client.get(self.url(path)).query(query);
        let response = self.execute(Method::GET, path, request).await?;
        decode(response).await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.execute(Method::POST, path, request).await?;
        decode(response).await
    }

    /// PUT a JSON body to `path` and decode the JSON response.
    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.client.put(self.url(path)).json(body);
        let response = self.execute(Method::PUT, path, request).await?;
        decode(response).await
    }

    /// DELETE `path`, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.client.delete(self.url(path));
        self.execute(Method::DELETE, path, request).await?;
        Ok(())
    }

    async fn execute(&self, method: Method, path: &str, request: RequestBuilder) -> Result<Response> {
        tracing::debug!(method = %method, path, "Sending request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path, error = %e, "Request failed to complete");
            Error::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(method = %method, path, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let err = error_from_response(response).await;
        tracing::warn!(
            method = %method,
            path,
            status = status.as_u16(),
            error = %err,
            "Service rejected request"
        );
        Err(err)
    }
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Turn a non-success response into a typed error.
async fn error_from_response(response: Response) -> Error {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let header_tracking_id = response
        .headers()
        .get(TRACKING_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = response.text().await.unwrap_or_default();
    let mut failure = parse_failure(status, &body);
    if failure.tracking_id.is_none() {
        failure.tracking_id = header_tracking_id;
    }

    Error::from_status(status.as_u16(), failure, retry_after)
}

/// Extract the human-readable reason from an error body.
///
/// Prefers the JSON `message`, then the first `errors[].description`, then
/// the raw body, then the status reason phrase.
fn parse_failure(status: StatusCode, body: &str) -> ServiceFailure {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .or_else(|| parsed.errors.into_iter().find_map(|e| e.description))
        .or_else(|| {
            let raw = body.trim();
            (!raw.is_empty() && !raw.starts_with('{')).then(|| raw.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    ServiceFailure {
        message,
        tracking_id: parsed.tracking_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_prefers_message() {
        let body = r#"{"message":"Room not found","errors":[{"description":"other"}],"trackingId":"T-1"}"#;
        let failure = parse_failure(StatusCode::NOT_FOUND, body);
        assert_eq!(failure.message, "Room not found");
        assert_eq!(failure.tracking_id.as_deref(), Some("T-1"));
    }

    #[test]
    fn test_parse_failure_falls_back_to_error_description() {
        let body = r#"{"errors":[{"description":"personId is invalid"}]}"#;
        let failure = parse_failure(StatusCode::BAD_REQUEST, body);
        assert_eq!(failure.message, "personId is invalid");
        assert!(failure.tracking_id.is_none());
    }

    #[test]
    fn test_parse_failure_uses_plain_text_body() {
        let failure = parse_failure(StatusCode::BAD_GATEWAY, "upstream went away");
        assert_eq!(failure.message, "upstream went away");
    }

    #[test]
    fn test_parse_failure_uses_reason_phrase_for_empty_body() {
        let failure = parse_failure(StatusCode::NOT_FOUND, "");
        assert_eq!(failure.message, "Not Found");

        let failure = parse_failure(StatusCode::CONFLICT, "{}");
        assert_eq!(failure.message, "Conflict");
    }

    #[test]
    fn test_new_requires_token() {
        let err = HttpTransport::new(&SdkConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingAccessToken));
    }

    #[test]
    fn test_new_rejects_header_breaking_token() {
        let err = HttpTransport::new(&SdkConfig::with_access_token("bad\ntoken")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let mut config = SdkConfig::with_access_token("t");
        config.base_url = "http://localhost:9000/v1/".into();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:9000/v1");
        assert_eq!(transport.url("/memberships"), "http://localhost:9000/v1/memberships");
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(
            &self,
            _serializer: S,
        ) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot encode"))
        }
    }

    #[tokio::test]
    async fn test_unencodable_body_is_serialization_error() {
        let config = SdkConfig::with_access_token("t").base_url("http://127.0.0.1:9");
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport
            .post::<_, serde_json::Value>("/memberships", &Unencodable)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)), "got {err:?}");
        assert_eq!(err.code(), 601);
    }
}
