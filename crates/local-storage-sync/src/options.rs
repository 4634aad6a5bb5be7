use serde::Deserialize;

/// Per-attach configuration.
///
/// Hosts may pass either the bare storage key or an object:
///
/// ```
/// use local_storage_sync::SyncOptions;
///
/// let from_key: SyncOptions = serde_json::from_str(r#""username""#).unwrap();
/// let full: SyncOptions =
///     serde_json::from_str(r#"{ "name": "username", "initValue": "guest" }"#).unwrap();
/// assert_eq!(from_key, SyncOptions::new("username"));
/// assert_eq!(full, SyncOptions::new("username").with_init_value("guest"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOptions")]
pub struct SyncOptions {
    name: String,
    init_value: Option<String>,
}

impl SyncOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init_value: None,
        }
    }

    /// Value applied instead of the stored one while seeding.
    /// An empty string means "unset".
    pub fn with_init_value(mut self, init_value: impl Into<String>) -> Self {
        let init_value = init_value.into();
        self.init_value = (!init_value.is_empty()).then_some(init_value);
        self
    }

    /// Storage key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn init_value(&self) -> Option<&str> {
        self.init_value.as_deref()
    }
}

impl From<&str> for SyncOptions {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SyncOptions {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOptions {
    Key(String),
    Full {
        name: String,
        #[serde(default, rename = "initValue", alias = "init_value")]
        init_value: Option<String>,
    },
}

impl From<RawOptions> for SyncOptions {
    fn from(raw: RawOptions) -> Self {
        match raw {
            RawOptions::Key(name) => Self::new(name),
            RawOptions::Full { name, init_value } => {
                let options = Self::new(name);
                match init_value {
                    Some(init_value) => options.with_init_value(init_value),
                    None => options,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SyncOptions::new("username");
        assert_eq!(options.name(), "username");
        assert_eq!(options.init_value(), None);
    }

    #[test]
    fn test_init_value_overrides_default() {
        let options = SyncOptions::from("username").with_init_value("alice");
        assert_eq!(options.init_value(), Some("alice"));
    }

    #[test]
    fn test_empty_init_value_is_unset() {
        let options = SyncOptions::new("username")
            .with_init_value("alice")
            .with_init_value("");
        assert_eq!(options.init_value(), None);
    }

    #[test]
    fn test_deserialize_shapes() {
        let options: SyncOptions = serde_json::from_str(r#"{ "name": "notes" }"#).unwrap();
        assert_eq!(options, SyncOptions::new("notes"));

        let options: SyncOptions =
            serde_json::from_str(r#"{ "name": "notes", "init_value": "draft" }"#).unwrap();
        assert_eq!(options.init_value(), Some("draft"));

        let options: SyncOptions =
            serde_json::from_str(r#"{ "name": "notes", "initValue": "" }"#).unwrap();
        assert_eq!(options.init_value(), None);

        assert!(serde_json::from_str::<SyncOptions>(r#"{ "initValue": "x" }"#).is_err());
    }
}
