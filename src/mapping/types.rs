//! Mapped type definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How one logical field is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Logical field name used by application code
    #[serde(default)]
    pub field_name: String,
    /// Field name on disk
    pub name: String,
}

impl FieldMapping {
    pub fn new(field_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            name: name.into(),
        }
    }

    /// True when the on-disk name differs from the logical name
    pub fn is_aliased(&self) -> bool {
        self.field_name != self.name
    }
}

/// Metadata for one mapped document type.
///
/// Immutable once loaded; the gateway only ever reads from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedType {
    /// Type name, e.g. `Documents\User`
    pub name: String,
    /// Database name
    pub db: String,
    /// Collection name (the file collection prefix for file-backed types)
    pub collection: String,
    /// Logical name of the field holding the file payload
    #[serde(default)]
    pub file: Option<String>,
    /// Logical field name -> mapping
    #[serde(default)]
    pub field_mappings: IndexMap<String, FieldMapping>,
    /// On-disk discriminator field
    #[serde(default)]
    pub discriminator_field: Option<String>,
    /// This type's own discriminator value
    #[serde(default)]
    pub discriminator_value: Option<String>,
    /// Discriminator value -> type name
    #[serde(default)]
    pub discriminator_map: IndexMap<String, String>,
    /// Names of registered subclasses
    #[serde(default)]
    pub sub_classes: Vec<String>,
}

impl MappedType {
    pub fn new(name: impl Into<String>, db: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db: db.into(),
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Map a logical field to an on-disk name
    pub fn with_field(mut self, field_name: &str, name: &str) -> Self {
        self.field_mappings
            .insert(field_name.to_string(), FieldMapping::new(field_name, name));
        self
    }

    /// Mark the type as file-backed, with the payload held in `field_name`.
    ///
    /// Adds an identity mapping for the payload field when none exists.
    pub fn with_file(mut self, field_name: &str) -> Self {
        self.file = Some(field_name.to_string());
        self.field_mappings
            .entry(field_name.to_string())
            .or_insert_with(|| FieldMapping::new(field_name, field_name));
        self
    }

    pub fn with_discriminator(mut self, field: &str, value: &str) -> Self {
        self.discriminator_field = Some(field.to_string());
        self.discriminator_value = Some(value.to_string());
        self
    }

    /// Register a discriminator value for a type name
    pub fn with_discriminator_entry(mut self, value: &str, class_name: &str) -> Self {
        self.discriminator_map
            .insert(value.to_string(), class_name.to_string());
        self
    }

    pub fn with_sub_class(mut self, class_name: &str) -> Self {
        self.sub_classes.push(class_name.to_string());
        self
    }

    pub fn has_discriminator(&self) -> bool {
        self.discriminator_field.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        self.field_mappings.contains_key(field_name)
    }

    pub fn field_mapping(&self, field_name: &str) -> Option<&FieldMapping> {
        self.field_mappings.get(field_name)
    }

    /// Name of the payload field as it appears in documents, when the
    /// payload field is mapped.
    pub fn file_field_name(&self) -> Option<&str> {
        let file = self.file.as_deref()?;
        self.field_mappings
            .get(file)
            .map(|mapping| mapping.field_name.as_str())
    }

    /// Reverse lookup in the discriminator map.
    ///
    /// Several values may name the same type; the first one in map order wins.
    pub fn discriminator_value_for(&self, class_name: &str) -> Option<&str> {
        self.discriminator_map
            .iter()
            .find(|(_, name)| name.as_str() == class_name)
            .map(|(value, _)| value.as_str())
    }

    /// Fill in defaults and check structural consistency
    pub(crate) fn normalize(&mut self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("type name is empty".to_string());
        }
        if self.collection.is_empty() {
            return Err(format!("type {} has no collection", self.name));
        }
        if self.discriminator_value.is_some() && self.discriminator_field.is_none() {
            return Err(format!(
                "type {} has a discriminator value but no discriminator field",
                self.name
            ));
        }
        for (key, mapping) in self.field_mappings.iter_mut() {
            if mapping.field_name.is_empty() {
                mapping.field_name = key.clone();
            }
            if mapping.name.is_empty() {
                return Err(format!("field {} of {} has an empty name", key, self.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_lookup_first_match_wins() {
        let class = MappedType::new("Base", "db", "things")
            .with_discriminator("type", "A")
            .with_discriminator_entry("A", "Base")
            .with_discriminator_entry("B", "Sub1")
            .with_discriminator_entry("C", "Sub1");

        assert_eq!(class.discriminator_value_for("Sub1"), Some("B"));
        assert_eq!(class.discriminator_value_for("Unknown"), None);
    }

    #[test]
    fn test_file_field_requires_mapping() {
        let mut class = MappedType::new("Image", "db", "fs");
        class.file = Some("file".to_string());
        assert!(class.is_file());
        assert_eq!(class.file_field_name(), None);

        let class = MappedType::new("Image", "db", "fs").with_file("file");
        assert_eq!(class.file_field_name(), Some("file"));
    }

    #[test]
    fn test_normalize_fills_field_names() {
        let mut class: MappedType = serde_json::from_str(
            r#"{"name": "User", "db": "app", "collection": "users",
                "field_mappings": {"userName": {"name": "user_name"}}}"#,
        )
        .unwrap();
        class.normalize().unwrap();

        let mapping = class.field_mapping("userName").unwrap();
        assert_eq!(mapping.field_name, "userName");
        assert!(mapping.is_aliased());
    }

    #[test]
    fn test_normalize_rejects_orphan_discriminator_value() {
        let mut class = MappedType::new("User", "app", "users");
        class.discriminator_value = Some("user".to_string());
        assert!(class.normalize().is_err());
    }
}
