//! Mapping loader for reading type definitions from disk
//!
//! One JSON file per mapped type. Non-JSON files in the directory are ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use super::errors::{MappingError, MappingResult};
use super::types::MappedType;

/// Registry of mapped types, optionally backed by a directory of JSON files.
pub struct MappingLoader {
    /// Directory containing mapping files
    mapping_dir: PathBuf,
    /// Loaded types indexed by type name
    types: IndexMap<String, Arc<MappedType>>,
}

impl MappingLoader {
    /// Creates a loader reading `*.json` files from `mapping_dir`.
    pub fn new(mapping_dir: &Path) -> Self {
        Self {
            mapping_dir: mapping_dir.to_path_buf(),
            types: IndexMap::new(),
        }
    }

    pub fn mapping_dir(&self) -> &Path {
        &self.mapping_dir
    }

    /// Loads every mapping file in the mapping directory.
    ///
    /// A missing directory is treated as empty.
    pub fn load_all(&mut self) -> MappingResult<()> {
        if !self.mapping_dir.exists() {
            return Ok(());
        }

        let dir = self.mapping_dir.display().to_string();
        let entries = fs::read_dir(&self.mapping_dir).map_err(|e| {
            MappingError::malformed(&dir, format!("Failed to read mapping directory: {}", e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                MappingError::malformed(&dir, format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }

        // Directory order is platform dependent
        paths.sort();
        for path in paths {
            self.load_file(&path)?;
        }

        Ok(())
    }

    /// Loads a single mapping file.
    pub fn load_file(&mut self, path: &Path) -> MappingResult<Arc<MappedType>> {
        let content = fs::read_to_string(path).map_err(|e| {
            MappingError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;
        self.load_str(&path.display().to_string(), &content)
    }

    /// Parses and registers a mapping from JSON text.
    pub fn load_str(&mut self, source_name: &str, content: &str) -> MappingResult<Arc<MappedType>> {
        let class: MappedType = serde_json::from_str(content)
            .map_err(|e| MappingError::malformed(source_name, format!("Invalid JSON: {}", e)))?;
        self.register_from(source_name, class)
    }

    /// Registers a mapping built in code.
    pub fn register(&mut self, class: MappedType) -> MappingResult<Arc<MappedType>> {
        self.register_from("<in-memory>", class)
    }

    fn register_from(&mut self, source_name: &str, mut class: MappedType) -> MappingResult<Arc<MappedType>> {
        class
            .normalize()
            .map_err(|reason| MappingError::malformed(source_name, reason))?;

        if self.types.contains_key(&class.name) {
            return Err(MappingError::AlreadyRegistered(class.name));
        }

        let class = Arc::new(class);
        self.types.insert(class.name.clone(), Arc::clone(&class));
        Ok(class)
    }

    pub fn get(&self, name: &str) -> Option<Arc<MappedType>> {
        self.types.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const USER: &str = r#"{
        "name": "Documents\\User",
        "db": "doctrine_odm_tests",
        "collection": "users",
        "field_mappings": {
            "username": {"name": "username"},
            "createdAt": {"name": "created_at"}
        }
    }"#;

    #[test]
    fn test_load_all_from_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("user.json"), USER).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let mut loader = MappingLoader::new(tmp.path());
        loader.load_all().unwrap();

        assert_eq!(loader.len(), 1);
        let user = loader.get("Documents\\User").unwrap();
        assert_eq!(user.collection, "users");
        assert_eq!(user.field_mapping("createdAt").unwrap().name, "created_at");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let mut loader = MappingLoader::new(&tmp.path().join("nope"));
        loader.load_all().unwrap();
        assert!(loader.is_empty());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let mut loader = MappingLoader::new(tmp.path());
        let err = loader.load_str("broken.json", "{ not json").unwrap_err();
        assert_eq!(err.code(), "MAPPING_MALFORMED");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut loader = MappingLoader::new(tmp.path());
        loader.register(MappedType::new("User", "app", "users")).unwrap();
        let err = loader.register(MappedType::new("User", "app", "users")).unwrap_err();
        assert!(matches!(err, MappingError::AlreadyRegistered(_)));
    }
}
