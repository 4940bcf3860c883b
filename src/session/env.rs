use std::collections::BTreeMap;
use std::ffi::OsString;

use secrecy::{ExposeSecret, SecretString};

use crate::bootstrap::BootstrapSecret;

pub const BOOTSTRAP_ENABLED_VAR: &str = "CONNECT_BOOTSTRAP_ENABLED";
pub const BOOTSTRAP_SECRET_VAR: &str = "CONNECT_BOOTSTRAP_SECRETKEY";
pub const API_KEY_VAR: &str = "CONNECT_API_KEY";
pub const SERVER_VAR: &str = "CONNECT_SERVER";

/// Container environment: bootstrap settings first, then user overrides in
/// order. Later entries replace earlier ones with the same name.
pub fn container_env(
    secret: &BootstrapSecret,
    overrides: &[(String, String)],
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert(BOOTSTRAP_ENABLED_VAR.to_string(), "true".to_string());
    env.insert(BOOTSTRAP_SECRET_VAR.to_string(), secret.encoded().to_string());
    for (key, value) in overrides {
        env.insert(key.clone(), value.clone());
    }
    env
}

/// Child-command environment: `base` with the API key and server URL layered on top.
pub fn child_env(
    base: impl IntoIterator<Item = (OsString, OsString)>,
    api_key: &SecretString,
    server_url: &str,
) -> BTreeMap<OsString, OsString> {
    let mut env: BTreeMap<OsString, OsString> = base.into_iter().collect();
    env.insert(API_KEY_VAR.into(), api_key.expose_secret().into());
    env.insert(SERVER_VAR.into(), server_url.into());
    env
}

/// Parse a `KEY=VALUE` override. The value may itself contain `=`.
pub fn parse_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        Some(_) => Err(format!("missing variable name in `{raw}`")),
        None => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
