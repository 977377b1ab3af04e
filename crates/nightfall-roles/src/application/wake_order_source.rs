//! Wake-order configuration sources.
//!
//! The card catalog that owns per-variant wake orders lives outside this
//! engine. [`WakeOrderSource`] is the seam; [`YamlWakeOrderSource`] reads the
//! same data from a YAML document so the engine can run standalone.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use nightfall_core::error::DomainError;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::wake_order::{WakeOrderConfig, WakeOrderEntry};

/// Name of the variant that only uses the base roles.
pub const BASE_VARIANT: &str = "base";

/// Provider of per-variant wake orders.
#[async_trait]
pub trait WakeOrderSource: Send + Sync {
    /// Returns the `{roleName, order}` rows for `variant_id`. With
    /// `include_base_roles`, base rows are merged under the variant's.
    async fn wake_order_config(
        &self,
        variant_id: &str,
        include_base_roles: bool,
    ) -> Result<Vec<WakeOrderEntry>, DomainError>;
}

/// On-disk layout of a wake-order document.
#[derive(Debug, Default, Deserialize)]
struct WakeOrderDocument {
    #[serde(default)]
    base: Vec<WakeOrderEntry>,
    #[serde(default)]
    variants: HashMap<String, Vec<WakeOrderEntry>>,
}

/// Wake-order source backed by a YAML document.
#[derive(Debug, Default)]
pub struct YamlWakeOrderSource {
    document: WakeOrderDocument,
}

impl YamlWakeOrderSource {
    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the document does not parse.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        let document = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Infrastructure(format!("invalid wake order YAML: {e}")))?;
        Ok(Self { document })
    }

    /// Reads and parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the file cannot be read or
    /// does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Infrastructure(format!("cannot read {}: {e}", path.display()))
        })?;
        let source = Self::from_yaml_str(&yaml)?;
        info!(
            path = %path.display(),
            variants = source.document.variants.len(),
            "loaded wake order document"
        );
        Ok(source)
    }
}

#[async_trait]
impl WakeOrderSource for YamlWakeOrderSource {
    async fn wake_order_config(
        &self,
        variant_id: &str,
        include_base_roles: bool,
    ) -> Result<Vec<WakeOrderEntry>, DomainError> {
        if variant_id == BASE_VARIANT {
            return Ok(self.document.base.clone());
        }
        let variant = self.document.variants.get(variant_id).ok_or_else(|| {
            DomainError::Validation(format!("unknown game variant '{variant_id}'"))
        })?;

        let mut entries = variant.clone();
        if include_base_roles {
            let base_rows = self
                .document
                .base
                .iter()
                .filter(|row| !variant.iter().any(|v| v.role_name == row.role_name))
                .cloned();
            entries.extend(base_rows);
        }
        Ok(entries)
    }
}

/// Fetches and validates the wake order for a variant, falling back to the
/// canonical order on any failure. Never fails.
pub async fn load_wake_order(
    source: &dyn WakeOrderSource,
    variant_id: &str,
    include_base_roles: bool,
) -> WakeOrderConfig {
    match source
        .wake_order_config(variant_id, include_base_roles)
        .await
    {
        Ok(entries) => WakeOrderConfig::from_entries_or_canonical(&entries),
        Err(e) => {
            warn!(variant_id, error = %e, "wake order unavailable, using canonical order");
            WakeOrderConfig::canonical()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::RoleId;
    use crate::domain::wake_order::SlotKey;

    const DOCUMENT: &str = r"
base:
  - { role_name: seer, order: 1 }
  - { role_name: werewolves, order: 2 }
  - { role_name: witch, order: 3 }
variants:
  new-moon:
    - { role_name: witch, order: 1 }
    - { role_name: protector, order: 4 }
";

    #[tokio::test]
    async fn test_base_variant_returns_base_rows() {
        let source = YamlWakeOrderSource::from_yaml_str(DOCUMENT).unwrap();

        let rows = source.wake_order_config("base", true).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].role_name, "seer");
    }

    #[tokio::test]
    async fn test_variant_rows_win_over_base_rows() {
        let source = YamlWakeOrderSource::from_yaml_str(DOCUMENT).unwrap();

        let config = load_wake_order(&source, "new-moon", true).await;

        assert_eq!(config.order_of(SlotKey::Role(RoleId::Witch)), Some(1));
        assert_eq!(config.order_of(SlotKey::Role(RoleId::Seer)), Some(1));
        assert_eq!(config.order_of(SlotKey::Role(RoleId::Protector)), Some(4));
        assert_eq!(config.order_of(SlotKey::WerewolfPack), Some(2));
    }

    #[tokio::test]
    async fn test_variant_without_base_rows() {
        let source = YamlWakeOrderSource::from_yaml_str(DOCUMENT).unwrap();

        let rows = source.wake_order_config("new-moon", false).await.unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_variant_falls_back_to_canonical() {
        let source = YamlWakeOrderSource::from_yaml_str(DOCUMENT).unwrap();

        assert!(source.wake_order_config("blood-moon", true).await.is_err());
        assert_eq!(
            load_wake_order(&source, "blood-moon", true).await,
            WakeOrderConfig::canonical()
        );
    }

    #[tokio::test]
    async fn test_empty_document_falls_back_to_canonical() {
        let source = YamlWakeOrderSource::default();

        assert_eq!(
            load_wake_order(&source, BASE_VARIANT, true).await,
            WakeOrderConfig::canonical()
        );
    }

    #[test]
    fn test_malformed_yaml_is_an_infrastructure_error() {
        let result = YamlWakeOrderSource::from_yaml_str("base: [ { role_name: seer, order: ");
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_missing_file_is_an_infrastructure_error() {
        let result = YamlWakeOrderSource::from_path("/nonexistent/wake-order.yaml");
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
