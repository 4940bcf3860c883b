use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::debug;

use super::{BootstrapClient, BootstrapError};

/// Path of the Connect bootstrap endpoint, relative to the server URL.
pub const BOOTSTRAP_PATH: &str = "/__api__/v1/experimental/bootstrap";

/// Authorization scheme the bootstrap endpoint expects.
const AUTH_SCHEME: &str = "Connect-Bootstrap";
const TOKEN_ISSUER: &str = "rsconnect-python";
const TOKEN_AUDIENCE: &str = "rsconnect-python";
const TOKEN_SCOPE: &str = "bootstrap";
const TOKEN_TTL_SECS: u64 = 300;

/// [`BootstrapClient`] speaking Connect's bootstrap HTTP API.
pub struct ConnectBootstrapClient {
    http_client: reqwest::blocking::Client,
}

impl ConnectBootstrapClient {
    pub fn new(timeout: Duration) -> Result<Self, BootstrapError> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("with-connect/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| BootstrapError::Transport {
                status: None,
                message: error.to_string(),
            })?;
        Ok(Self { http_client })
    }

    fn sign(&self, secret: &[u8], now: u64) -> Result<String, BootstrapError> {
        #[derive(Debug, Serialize)]
        struct Claims {
            iss: &'static str,
            aud: &'static str,
            scope: &'static str,
            iat: u64,
            exp: u64,
            jti: String,
        }

        let claims = Claims {
            iss: TOKEN_ISSUER,
            aud: TOKEN_AUDIENCE,
            scope: TOKEN_SCOPE,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let key = EncodingKey::from_secret(secret);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|error| BootstrapError::Token(error.to_string()))
    }
}

impl BootstrapClient for ConnectBootstrapClient {
    fn derive_token(&self, secret: &[u8]) -> Result<String, BootstrapError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|error| BootstrapError::Token(error.to_string()))?
            .as_secs();
        self.sign(secret, now)
    }

    fn bootstrap(&self, server_url: &str, token: &str) -> Result<serde_json::Value, BootstrapError> {
        let endpoint = format!("{}{BOOTSTRAP_PATH}", server_url.trim_end_matches('/'));
        debug!(%endpoint, "requesting bootstrap API key");

        let response = self
            .http_client
            .post(&endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("{AUTH_SCHEME} {token}"))
            .send()
            .map_err(|error| BootstrapError::Transport {
                status: None,
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unable to read bootstrap response body".to_string());
            return Err(BootstrapError::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        response
            .json::<serde_json::Value>()
            .map_err(|error| BootstrapError::UnexpectedResponse(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::{DecodingKey, Validation};

    use super::*;

    fn client() -> ConnectBootstrapClient {
        ConnectBootstrapClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn token_verifies_with_the_same_secret() {
        let secret = b"0123456789abcdef0123456789abcdef";
        let token = client().derive_token(secret).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[TOKEN_ISSUER]);
        let decoded = jsonwebtoken::decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(secret),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims["scope"], "bootstrap");
    }

    #[test]
    fn token_is_rejected_with_another_secret() {
        let token = client().derive_token(b"first secret").unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        let result = jsonwebtoken::decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"second secret"),
            &validation,
        );
        assert!(result.is_err());
    }

    #[test]
    fn token_expires_after_ttl() {
        let token = client().sign(b"secret", 1_700_000_000).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims["iat"], 1_700_000_000u64);
        assert_eq!(claims["exp"], 1_700_000_000u64 + TOKEN_TTL_SECS);
        assert!(claims["jti"].as_str().is_some_and(|j| !j.is_empty()));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client()
            .bootstrap(&format!("http://127.0.0.1:{port}"), "token")
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Transport { status: None, .. }));
    }
}
