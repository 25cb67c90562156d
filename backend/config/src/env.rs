//! Environment variable substitution for settings values.
//!
//! String leaves may reference `${VAR_NAME}` or `${VAR_NAME:-fallback}`.
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are matched, and `$${VAR}` escapes
//! to a literal `${VAR}`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// `(escape)${NAME(:-fallback)}`
static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("env reference pattern")
});

/// Error returned for a referenced variable that is unset and has no fallback.
#[derive(Debug, thiserror::Error)]
#[error("missing env var \"{var_name}\" referenced at settings path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a settings tree using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value, MissingEnvVarError> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars from a provided map.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    substitute(value, env, "")
}

fn substitute(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    Ok(match value {
        Value::String(s) => Value::String(substitute_str(s, env, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| substitute(v, env, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let child = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                out.insert(k.clone(), substitute(v, env, &child)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn substitute_str(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let replaced = ENV_REF.replace_all(s, |caps: &Captures| {
        let whole = &caps[0];
        if !caps[1].is_empty() {
            // `$${VAR}` stays literal, minus the escape.
            return whole[1..].to_string();
        }
        let name = &caps[2];
        match (env.get(name), caps.get(3)) {
            (Some(val), _) if !val.is_empty() => val.clone(),
            (_, Some(fallback)) => fallback.as_str().to_string(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"cluster": {"podName": "${POD_NAME}"}});
        let result = resolve_env_vars_with(&v, &env(&[("POD_NAME", "api-7f9c")])).unwrap();
        assert_eq!(result["cluster"]["podName"], "api-7f9c");
    }

    #[test]
    fn uses_fallback_when_unset() {
        let v = json!({"logging": {"path": "${LOG_DIR:-/var/log/app}"}});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["logging"]["path"], "/var/log/app");
    }

    #[test]
    fn missing_var_reports_path() {
        let v = json!({"application": {"env": "${APP_ENV}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        assert_eq!(err.var_name, "APP_ENV");
        assert_eq!(err.config_path, "application.env");
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"k": "cost: $${PRICE}"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["k"], "cost: ${PRICE}");
    }

    #[test]
    fn non_string_leaves_pass_through() {
        let v = json!({"logging": {"maxSize": 50, "compress": true, "dirs": ["${A}"]}});
        let result = resolve_env_vars_with(&v, &env(&[("A", "x")])).unwrap();
        assert_eq!(result["logging"]["maxSize"], 50);
        assert_eq!(result["logging"]["compress"], true);
        assert_eq!(result["logging"]["dirs"][0], "x");
    }
}
