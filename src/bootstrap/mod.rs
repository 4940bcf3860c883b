//! Exchange of the one-time bootstrap secret for a long-lived API key.
mod client;
mod secret;

pub use client::{BOOTSTRAP_PATH, ConnectBootstrapClient};
pub use secret::{BootstrapSecret, SECRET_LEN};

use secrecy::SecretString;
use thiserror::Error;

/// Errors from the bootstrap exchange.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("bootstrap secret is not valid base64")]
    InvalidSecret(#[source] base64::DecodeError),

    #[error("failed to derive bootstrap token: {0}")]
    Token(String),

    #[error("bootstrap request failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport { status: Option<u16>, message: String },

    #[error("bootstrap succeeded but returned an empty API key")]
    EmptyKey,

    #[error("unexpected bootstrap response: {0}")]
    UnexpectedResponse(String),
}

/// The server-side half of the bootstrap protocol.
pub trait BootstrapClient {
    /// Short-lived token keyed by the raw secret.
    fn derive_token(&self, secret: &[u8]) -> Result<String, BootstrapError>;

    /// Present `token` to the server and return its JSON reply.
    fn bootstrap(&self, server_url: &str, token: &str) -> Result<serde_json::Value, BootstrapError>;
}

/// Trade `secret` for an API key from the server at `server_url`.
pub fn exchange(
    client: &dyn BootstrapClient,
    secret: &BootstrapSecret,
    server_url: &str,
) -> Result<SecretString, BootstrapError> {
    let raw = secret.decode()?;
    let token = client.derive_token(&raw)?;
    let response = client.bootstrap(server_url, &token)?;
    extract_api_key(&response).map(SecretString::from)
}

fn extract_api_key(response: &serde_json::Value) -> Result<String, BootstrapError> {
    let Some(object) = response.as_object() else {
        return Err(BootstrapError::UnexpectedResponse(format!(
            "expected a JSON object, got {response}"
        )));
    };
    match object.get("api_key") {
        None => Err(BootstrapError::UnexpectedResponse(
            "response has no `api_key` field".to_string(),
        )),
        Some(serde_json::Value::Null) => Err(BootstrapError::EmptyKey),
        Some(serde_json::Value::String(key)) if key.is_empty() => Err(BootstrapError::EmptyKey),
        Some(serde_json::Value::String(key)) => Ok(key.clone()),
        Some(other) => Err(BootstrapError::UnexpectedResponse(format!(
            "`api_key` is not a string: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    /// Client that records the secret it was keyed with.
    struct Recording {
        response: Result<serde_json::Value, BootstrapError>,
        seen_secret: RefCell<Option<Vec<u8>>>,
        seen_url: RefCell<Option<String>>,
    }

    impl Recording {
        fn replying(response: serde_json::Value) -> Self {
            Self {
                response: Ok(response),
                seen_secret: RefCell::new(None),
                seen_url: RefCell::new(None),
            }
        }
    }

    impl BootstrapClient for Recording {
        fn derive_token(&self, secret: &[u8]) -> Result<String, BootstrapError> {
            *self.seen_secret.borrow_mut() = Some(secret.to_vec());
            Ok("token".into())
        }

        fn bootstrap(&self, server_url: &str, token: &str) -> Result<serde_json::Value, BootstrapError> {
            assert_eq!(token, "token");
            *self.seen_url.borrow_mut() = Some(server_url.to_string());
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(err) => Err(BootstrapError::Transport {
                    status: None,
                    message: err.to_string(),
                }),
            }
        }
    }

    #[test]
    fn returns_api_key_from_response() {
        let client = Recording::replying(json!({ "api_key": "abc123" }));
        let secret = BootstrapSecret::generate();
        let key = exchange(&client, &secret, "http://localhost:3939").unwrap();
        assert_eq!(key.expose_secret(), "abc123");
        assert_eq!(client.seen_url.borrow().as_deref(), Some("http://localhost:3939"));
    }

    #[test]
    fn token_is_keyed_with_the_decoded_secret() {
        let client = Recording::replying(json!({ "api_key": "abc123" }));
        let secret = BootstrapSecret::generate();
        exchange(&client, &secret, "http://localhost:3939").unwrap();
        let seen = client.seen_secret.borrow().clone().unwrap();
        assert_eq!(seen, secret.decode().unwrap());
        assert_eq!(BootstrapSecret::from_bytes(&seen).encoded(), secret.encoded());
    }

    #[test]
    fn empty_or_null_key_is_rejected() {
        for body in [json!({ "api_key": "" }), json!({ "api_key": null })] {
            let client = Recording::replying(body);
            let err = exchange(&client, &BootstrapSecret::generate(), "http://x").unwrap_err();
            assert!(matches!(err, BootstrapError::EmptyKey), "got {err:?}");
        }
    }

    #[test]
    fn missing_field_is_unexpected() {
        for body in [json!({ "key": "abc" }), json!(["abc"]), json!("abc")] {
            let client = Recording::replying(body);
            let err = exchange(&client, &BootstrapSecret::generate(), "http://x").unwrap_err();
            assert!(matches!(err, BootstrapError::UnexpectedResponse(_)), "got {err:?}");
        }
    }

    #[test]
    fn transport_failure_is_wrapped() {
        let client = Recording {
            response: Err(BootstrapError::Token("connection refused".into())),
            seen_secret: RefCell::new(None),
            seen_url: RefCell::new(None),
        };
        let err = exchange(&client, &BootstrapSecret::generate(), "http://x").unwrap_err();
        assert!(matches!(err, BootstrapError::Transport { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn invalid_secret_never_reaches_the_client() {
        let client = Recording::replying(json!({ "api_key": "abc" }));
        let err = exchange(&client, &BootstrapSecret::from_encoded("%%%"), "http://x").unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidSecret(_)));
        assert!(client.seen_secret.borrow().is_none());
    }

    #[test]
    fn transport_message_includes_status() {
        let err = BootstrapError::Transport {
            status: Some(401),
            message: "bad token".into(),
        };
        assert_eq!(err.to_string(), "bootstrap request failed (HTTP 401): bad token");
    }
}
