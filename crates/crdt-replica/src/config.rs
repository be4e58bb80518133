use crdt_client::{ClientError, Result};
use serde::Deserialize;

/// Replica settings.
///
/// Loadable from TOML; every field is optional there:
///
/// ```
/// use crdt_replica::ReplicaConfig;
///
/// let config = ReplicaConfig::from_toml_str(
///     r#"
///     replica_id = "edge-7"
///     bucket = "sensors"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.replica_id, "edge-7");
/// assert!(config.persist_on_apply);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplicaConfig {
    /// Identifies this replica in dots and counter entries. Must be unique
    /// among replicas that merge with each other.
    pub replica_id: String,
    /// Storage namespace holding this replica's objects.
    pub bucket: String,
    /// Write touched objects to the backend on every apply.
    pub persist_on_apply: bool,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            replica_id: "local".to_string(),
            bucket: "default".to_string(),
            persist_on_apply: true,
        }
    }
}

impl ReplicaConfig {
    /// Defaults with the given replica id.
    pub fn new(replica_id: impl Into<String>) -> Self {
        Self {
            replica_id: replica_id.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| ClientError::InvalidArgument(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.replica_id.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "replica_id must not be empty".into(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "bucket must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(
            ReplicaConfig::from_toml_str("").unwrap(),
            ReplicaConfig::default()
        );
    }

    #[test]
    fn all_fields() {
        let config = ReplicaConfig::from_toml_str(
            "replica_id = \"a\"\nbucket = \"b\"\npersist_on_apply = false\n",
        )
        .unwrap();
        assert_eq!(config.replica_id, "a");
        assert_eq!(config.bucket, "b");
        assert!(!config.persist_on_apply);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ReplicaConfig::from_toml_str("replcia_id = \"typo\"").unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(ReplicaConfig::from_toml_str("replica_id = \" \"").is_err());
        assert!(ReplicaConfig::from_toml_str("bucket = \"\"").is_err());
    }
}
