//! Dotted-path access to a loaded settings tree.

use serde_json::Value;

/// Read-only lookup of settings by dotted path (`logging.maxSize`).
///
/// Missing or mistyped keys yield the zero value of the requested type.
pub trait ConfigSource {
    fn get_string(&self, path: &str) -> String;
    fn get_int(&self, path: &str) -> i64;
    fn get_bool(&self, path: &str) -> bool;
}

/// Settings backed by a JSON value tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Settings {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse YAML text into settings, without env substitution.
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let root: Value = serde_yaml::from_str(raw)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walk the tree one segment at a time; `None` if any segment is absent.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.as_object()?.get(segment))
    }
}

impl ConfigSource for Settings {
    fn get_string(&self, path: &str) -> String {
        match self.lookup(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    fn get_int(&self, path: &str) -> i64 {
        match self.lookup(path) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }

    fn get_bool(&self, path: &str) -> bool {
        match self.lookup(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
            Some(Value::Number(n)) => n.as_i64().is_some_and(|i| i != 0),
            _ => false,
        }
    }
}
