//! Environment variable handling for the EventPay services.
//!
//! Plain settings are overridden with `EVENTPAY__SECTION__KEY` variables.
//! Secrets are never written to config files: a value of `secret_from_env`
//! marks a field whose value is read from `EVENTPAY_SECRET_SECTION_KEY`,
//! falling back to the legacy `SECTION_KEY` name (e.g. `STRIPE_SECRET_KEY`).

use std::env;
use tracing::warn;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "EVENTPAY";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "EVENTPAY_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Marker value that requests injection from the environment.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// `"server.port"` becomes `"EVENTPAY__SERVER__PORT"`.
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Convert a secret path to an environment variable name
///
/// `"stripe.secret_key"` becomes `"EVENTPAY_SECRET_STRIPE_SECRET_KEY"`.
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Convert a secret path to its legacy, unprefixed name
///
/// `"stripe.secret_key"` becomes `"STRIPE_SECRET_KEY"`.
pub fn legacy_secret_path_to_env_var(path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() < 2 {
        return path.to_uppercase();
    }

    let service = parts[0];
    let key = parts[1..].join(SECRET_SEPARATOR);
    format!("{}_{}", service, key).to_uppercase()
}

/// Get an environment variable for a secret path, trying the prefixed name first.
pub fn get_secret_env_var(path: &str) -> Option<String> {
    let env_var = secret_path_to_env_var(path);
    if let Ok(value) = env::var(&env_var) {
        return Some(value);
    }

    let legacy_env_var = legacy_secret_path_to_env_var(path);
    env::var(&legacy_env_var).ok()
}

/// Replace every `secret_from_env` string in `value` with its environment value.
///
/// Markers whose variable is missing are turned into `null`, so optional
/// secret fields deserialize as `None` instead of carrying the marker text.
/// Returns the paths that could not be resolved.
pub fn inject_env_vars(value: &mut serde_json::Value) -> Vec<String> {
    use serde_json::Value;

    fn walk(path: &mut Vec<String>, obj: &mut Value, missing: &mut Vec<String>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::Array(arr) => {
                for (i, v) in arr.iter_mut().enumerate() {
                    path.push(i.to_string());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                match get_secret_env_var(&path_str) {
                    Some(env_val) => *obj = Value::String(env_val),
                    None => {
                        warn!(path = %path_str, "secret env var not found");
                        missing.push(path_str);
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }
    }

    let mut missing = Vec::new();
    walk(&mut Vec::new(), value, &mut missing);
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_path_to_env_var() {
        assert_eq!(
            config_path_to_env_var("server.host"),
            "EVENTPAY__SERVER__HOST"
        );
        assert_eq!(
            config_path_to_env_var("client.backend_base_url"),
            "EVENTPAY__CLIENT__BACKEND_BASE_URL"
        );
    }

    #[test]
    fn test_secret_path_to_env_var() {
        assert_eq!(
            secret_path_to_env_var("stripe.secret_key"),
            "EVENTPAY_SECRET_STRIPE_SECRET_KEY"
        );
        assert_eq!(
            secret_path_to_env_var("stripe.webhook_secret"),
            "EVENTPAY_SECRET_STRIPE_WEBHOOK_SECRET"
        );
    }

    #[test]
    fn test_legacy_secret_path_to_env_var() {
        assert_eq!(
            legacy_secret_path_to_env_var("stripe.secret_key"),
            "STRIPE_SECRET_KEY"
        );
        assert_eq!(
            legacy_secret_path_to_env_var("client.processor.publishable_key"),
            "CLIENT_PROCESSOR_PUBLISHABLE_KEY"
        );
        assert_eq!(legacy_secret_path_to_env_var("token"), "TOKEN");
    }

    #[test]
    fn test_inject_env_vars_replaces_markers() {
        std::env::set_var(
            "EVENTPAY_SECRET_INJECTTEST_API_KEY",
            "sk_test_injected",
        );
        let mut value = json!({
            "injecttest": { "api_key": "secret_from_env", "other": "plain" }
        });

        let missing = inject_env_vars(&mut value);

        assert!(missing.is_empty());
        assert_eq!(value["injecttest"]["api_key"], "sk_test_injected");
        assert_eq!(value["injecttest"]["other"], "plain");
    }

    #[test]
    fn test_inject_env_vars_nulls_missing_markers() {
        let mut value = json!({ "nosuchservice": { "nosuch_secret": "secret_from_env" } });

        let missing = inject_env_vars(&mut value);

        assert_eq!(missing, vec!["nosuchservice.nosuch_secret".to_string()]);
        assert!(value["nosuchservice"]["nosuch_secret"].is_null());
    }
}
