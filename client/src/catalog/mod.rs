//! Menu catalog: human-readable menu names to menu ids.
//!
//! The catalog is a JSON document whose nested objects are flattened with
//! `/`:
//!
//! ```json
//! {"基本コンソール": {"機器一覧": "2100000303"}}
//! ```
//!
//! makes `基本コンソール/機器一覧` resolve to `2100000303`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CatalogError;

/// Environment variable naming the catalog file.
pub const CATALOG_ENV: &str = "EXASTRO_MENU_CATALOG";

/// Catalog file looked up in the working directory.
pub const DEFAULT_CATALOG_FILE: &str = "menus.json";

const SEPARATOR: char = '/';

/// Flattened name to menu id table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuCatalog {
    menus: BTreeMap<String, String>,
}

impl MenuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let document: Value = serde_json::from_str(text)?;
        let mut catalog = Self::new();
        catalog.flatten("", &document)?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&text)?;
        log::debug!("Loaded {} menus from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Load from `explicit`, then `EXASTRO_MENU_CATALOG`, then `menus.json`.
    ///
    /// An empty catalog is returned when no file is configured and the
    /// default file does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CatalogError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Ok(path) = env::var(CATALOG_ENV) {
            return Self::from_path(Path::new(&path));
        }

        let default = PathBuf::from(DEFAULT_CATALOG_FILE);
        if default.is_file() {
            return Self::from_path(&default);
        }
        Ok(Self::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, menu_id: impl Into<String>) {
        self.menus.insert(name.into(), menu_id.into());
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.menus.iter().map(|(name, id)| (name.as_str(), id.as_str()))
    }

    /// Menu id for a catalog name; an all-digit id is returned as is.
    pub fn resolve<'a>(&'a self, name_or_id: &'a str) -> Result<&'a str, CatalogError> {
        if let Some(id) = self.menus.get(name_or_id) {
            return Ok(id.as_str());
        }
        if !name_or_id.is_empty() && name_or_id.chars().all(|c| c.is_ascii_digit()) {
            return Ok(name_or_id);
        }
        Err(CatalogError::NotFound(name_or_id.to_string()))
    }

    fn flatten(&mut self, prefix: &str, value: &Value) -> Result<(), CatalogError> {
        match value {
            Value::Object(children) => {
                for (key, child) in children {
                    let name = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}{}{}", prefix, SEPARATOR, key)
                    };
                    self.flatten(&name, child)?;
                }
                Ok(())
            }
            Value::String(id) if !prefix.is_empty() => {
                self.insert(prefix, id.clone());
                Ok(())
            }
            Value::Number(id) if !prefix.is_empty() => {
                self.insert(prefix, id.to_string());
                Ok(())
            }
            _ => Err(CatalogError::InvalidEntry(prefix.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_nested_names_are_flattened() {
        let catalog = MenuCatalog::from_json_str(
            r#"{
                "基本コンソール": {"機器一覧": "2100000303", "投入オペレーション一覧": 2100000304},
                "hosts": "2100170001"
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.resolve("基本コンソール/機器一覧").unwrap(), "2100000303");
        assert_eq!(catalog.resolve("基本コンソール/投入オペレーション一覧").unwrap(), "2100000304");
        assert_eq!(catalog.resolve("hosts").unwrap(), "2100170001");

        let names: Vec<&str> = catalog.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["hosts", "基本コンソール/投入オペレーション一覧", "基本コンソール/機器一覧"]);
    }

    #[test]
    fn test_resolve_passes_ids_through() {
        let catalog = MenuCatalog::new();
        assert_eq!(catalog.resolve("2100000303").unwrap(), "2100000303");
        assert!(matches!(catalog.resolve("機器一覧"), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.resolve(""), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_invalid_entries() {
        assert!(matches!(
            MenuCatalog::from_json_str(r#"{"a": {"b": ["1"]}}"#),
            Err(CatalogError::InvalidEntry(path)) if path == "a/b"
        ));
        assert!(matches!(MenuCatalog::from_json_str(r#""1""#), Err(CatalogError::InvalidEntry(_))));
        assert!(matches!(MenuCatalog::from_json_str("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"menus": {{"devices": "2100000303"}}}}"#).unwrap();

        let catalog = MenuCatalog::load(Some(file.path())).unwrap();
        assert_eq!(catalog.resolve("menus/devices").unwrap(), "2100000303");

        let missing = file.path().with_extension("missing");
        assert!(matches!(MenuCatalog::from_path(&missing), Err(CatalogError::Io(_))));
    }
}
