use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

const MASK: &str = "***";

/// Hook producing the diagnostic context attached to every event.
pub trait ContextProvider: Send + Sync {
    /// An empty string means no context.
    fn context_message(&self) -> String;
}

/// Default hook: no context.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContext;

impl ContextProvider for EmptyContext {
    fn context_message(&self) -> String {
        String::new()
    }
}

/// Dumps named variable groups, one `$NAME = {...}` block per group.
///
/// Entries named in the mask set (`GROUP.KEY`) are replaced with `***`.
#[derive(Debug, Clone)]
pub struct VarsContext {
    groups: BTreeMap<String, Map<String, Value>>,
    mask: BTreeSet<String>,
}

impl Default for VarsContext {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            mask: [
                "_SERVER.HTTP_AUTHORIZATION",
                "_SERVER.PHP_AUTH_USER",
                "_SERVER.PHP_AUTH_PW",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl VarsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the process environment as the `_SERVER` group.
    pub fn from_process_env() -> Self {
        // Non-UTF-8 names or values are kept, lossily decoded
        let mut server: Map<String, Value> = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    Value::String(value.to_string_lossy().into_owned()),
                )
            })
            .collect();

        if !server.contains_key("SERVER_NAME")
            && let Ok(name) = hostname::get()
            && let Some(name) = name.to_str()
        {
            server.insert("SERVER_NAME".to_string(), Value::String(name.to_string()));
        }

        Self::new().with_group("_SERVER", server)
    }

    pub fn with_group(mut self, name: impl Into<String>, vars: Map<String, Value>) -> Self {
        self.groups.insert(name.into(), vars);
        self
    }

    pub fn with_mask(mut self, path: impl Into<String>) -> Self {
        self.mask.insert(path.into());
        self
    }

    fn masked_group(&self, name: &str, vars: &Map<String, Value>) -> Map<String, Value> {
        vars.iter()
            .map(|(key, value)| {
                if self.mask.contains(&format!("{name}.{key}")) {
                    (key.clone(), Value::String(MASK.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}

impl ContextProvider for VarsContext {
    fn context_message(&self) -> String {
        self.groups
            .iter()
            .filter(|(_, vars)| !vars.is_empty())
            .map(|(name, vars)| {
                let masked = Value::Object(self.masked_group(name, vars));
                let dump = serde_json::to_string_pretty(&masked)
                    .unwrap_or_else(|_| masked.to_string());
                format!("${name} = {dump}")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_context_is_empty() {
        assert_eq!(EmptyContext.context_message(), "");
        assert_eq!(VarsContext::new().context_message(), "");
    }

    #[test]
    fn test_groups_are_rendered_and_joined() {
        let context = VarsContext::new()
            .with_group("_GET", object(json!({"page": "2"})))
            .with_group("_COOKIE", object(json!({"lang": "en"})));

        let message = context.context_message();
        let blocks: Vec<&str> = message.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("$_COOKIE = "));
        assert!(blocks[1].starts_with("$_GET = "));
        assert!(message.contains("\"page\": \"2\""));
    }

    #[test]
    fn test_default_mask_hides_credentials() {
        let context = VarsContext::new().with_group(
            "_SERVER",
            object(json!({"PHP_AUTH_PW": "hunter2", "REQUEST_URI": "/login"})),
        );

        let message = context.context_message();
        assert!(!message.contains("hunter2"));
        assert!(message.contains("\"PHP_AUTH_PW\": \"***\""));
        assert!(message.contains("/login"));
    }

    #[test]
    fn test_custom_mask_is_scoped_to_group() {
        let context = VarsContext::new()
            .with_mask("_POST.password")
            .with_group("_POST", object(json!({"password": "secret"})))
            .with_group("_GET", object(json!({"password": "visible"})));

        let message = context.context_message();
        assert!(!message.contains("secret"));
        assert!(message.contains("visible"));
    }

    #[test]
    fn test_process_env_group() {
        let message = VarsContext::from_process_env().context_message();
        assert!(message.starts_with("$_SERVER = "));
    }
}
