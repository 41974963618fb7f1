//! Authentication API client for otpgate.
//!
//! This crate provides the collaborator the OTP widget talks to. It focuses
//! on:
//!
//! - The [`AuthClient`] trait: the two capabilities the widget consumes
//!   (`verify_code` and `resend_code`)
//! - [`HttpAuthClient`]: a `reqwest` implementation posting JSON to an
//!   application-defined API
//! - Validating the configured base URL for safety
//!
//! # Example
//!
//! ```ignore
//! use otpgate_api::{AuthClient, HttpAuthClient};
//!
//! async fn confirm() -> Result<(), otpgate_api::AuthError> {
//!     let client = HttpAuthClient::new("https://auth.example.com/api")?;
//!     client.verify_code("user@example.com", "123456").await?;
//!     Ok(())
//! }
//! ```

mod error;

use std::time::Duration;

use async_trait::async_trait;
use otpgate_types::{ResendAck, VerificationAck};
use otpgate_util::redact_code;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use error::AuthError;

/// Hostnames allowed to use plain HTTP for local development.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Path of the code verification endpoint, relative to the base URL.
pub const VERIFY_PATH: &str = "/auth/verify-otp";
/// Path of the code resend endpoint, relative to the base URL.
pub const RESEND_PATH: &str = "/auth/resend-otp";

/// Shown when the server rejects a code without explaining why.
pub const VERIFY_FALLBACK_MESSAGE: &str = "OTP verification failed";
/// Shown when the server refuses to resend without explaining why.
pub const RESEND_FALLBACK_MESSAGE: &str = "Failed to resend OTP";

/// The capabilities the OTP widget consumes from the authentication backend.
///
/// Both calls are fallible and asynchronous. Implementations own the wire
/// format entirely; callers only see acknowledgements and [`AuthError`]s.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Confirms `code` for `email`.
    async fn verify_code(&self, email: &str, code: &str) -> Result<VerificationAck, AuthError>;

    /// Asks the backend to send a fresh code to `email`.
    async fn resend_code(&self, email: &str) -> Result<ResendAck, AuthError>;
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    email: &'a str,
}

/// Response envelope shared by both endpoints.
#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for the auth API.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL.
pub struct HttpAuthClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl HttpAuthClient {
    /// Construct an [`HttpAuthClient`] for `base_url`.
    ///
    /// Non-localhost hosts must use HTTPS. A trailing slash is trimmed so
    /// endpoint paths can be appended verbatim.
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("otpgate/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(StatusCode, String), AuthError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn verify_code(&self, email: &str, code: &str) -> Result<VerificationAck, AuthError> {
        debug!(email, code = %redact_code(code), "verifying code");
        let (status, body) = self.post_json(VERIFY_PATH, &VerifyRequest { email, otp: code }).await?;
        match interpret_response(status, &body, VERIFY_FALLBACK_MESSAGE) {
            Ok(message) => {
                info!(email, "code verified");
                Ok(VerificationAck { message })
            }
            Err(error) => {
                warn!(email, %status, "code verification failed: {error}");
                Err(error)
            }
        }
    }

    async fn resend_code(&self, email: &str) -> Result<ResendAck, AuthError> {
        debug!(email, "requesting a new code");
        let (status, body) = self.post_json(RESEND_PATH, &ResendRequest { email }).await?;
        match interpret_response(status, &body, RESEND_FALLBACK_MESSAGE) {
            Ok(message) => {
                info!(email, "new code sent");
                Ok(ResendAck { message })
            }
            Err(error) => {
                warn!(email, %status, "resend failed: {error}");
                Err(error)
            }
        }
    }
}

/// Map a status and raw body into an acknowledgement message or an error.
///
/// Rules:
/// - 2xx with an empty body, or a JSON envelope whose `success` is not
///   `false`, is a positive acknowledgement
/// - 2xx with `success: false` is a negative acknowledgement
/// - 2xx with a body that is not JSON is an [`AuthError::InvalidResponse`]
/// - any other status is a rejection; the envelope's `message` is used when
///   present, otherwise `fallback`
fn interpret_response(status: StatusCode, body: &str, fallback: &str) -> Result<Option<String>, AuthError> {
    let trimmed = body.trim();
    let parsed = if trimmed.is_empty() {
        Some(ApiEnvelope::default())
    } else {
        serde_json::from_str::<ApiEnvelope>(trimmed).ok()
    };

    if status.is_success() {
        let Some(envelope) = parsed else {
            return Err(AuthError::InvalidResponse(truncate_for_log(trimmed)));
        };
        if envelope.success == Some(false) {
            return Err(AuthError::Rejected {
                status: Some(status.as_u16()),
                message: non_empty(envelope.message).unwrap_or_else(|| fallback.to_string()),
            });
        }
        return Ok(non_empty(envelope.message));
    }

    let message = parsed
        .and_then(|envelope| non_empty(envelope.message))
        .unwrap_or_else(|| fallback.to_string());
    Err(AuthError::Rejected {
        status: Some(status.as_u16()),
        message,
    })
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|text| !text.trim().is_empty())
}

fn truncate_for_log(body: &str) -> String {
    body.chars().take(120).collect()
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
pub fn validate_base_url(base: &str) -> Result<(), AuthError> {
    let parsed_base_url = Url::parse(base).map_err(|e| AuthError::InvalidBaseUrl(format!("'{base}': {e}")))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| AuthError::InvalidBaseUrl(format!("'{base}' must include a host")))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(AuthError::InvalidBaseUrl(format!(
            "'{base}' must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        )));
    }

    Ok(())
}
