use std::collections::{BTreeMap, BTreeSet};

use crate::models::CatalogEntry;

/// Category → equipment-type cascade, rebuilt from catalog rows on demand.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    cascade: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryCatalog {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a CatalogEntry>,
    {
        let mut cascade: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for entry in entries {
            let category = entry.category.trim();
            let equipment_type = entry.equipment_type.trim();
            if category.is_empty() {
                continue;
            }
            let types = cascade.entry(category.to_string()).or_default();
            if !equipment_type.is_empty() {
                types.insert(equipment_type.to_string());
            }
        }
        Self { cascade }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.cascade.keys().map(String::as_str)
    }

    /// Equipment types under `category`, sorted; empty for an unknown one.
    pub fn types_for(&self, category: &str) -> Vec<&str> {
        self.cascade
            .get(category.trim())
            .map(|types| types.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.cascade.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, equipment_type: &str) -> CatalogEntry {
        CatalogEntry {
            category: category.to_string(),
            equipment_type: equipment_type.to_string(),
        }
    }

    #[test]
    fn builds_sorted_cascade() {
        let entries = vec![
            entry("Power", "Rectifier"),
            entry("Power", "Battery"),
            entry("Radio", "RRU"),
            entry("Power", "Battery"),
            entry(" Radio ", "Antenna"),
        ];
        let catalog = CategoryCatalog::from_entries(&entries);
        assert_eq!(catalog.categories().collect::<Vec<_>>(), vec!["Power", "Radio"]);
        assert_eq!(catalog.types_for("Power"), vec!["Battery", "Rectifier"]);
        assert_eq!(catalog.types_for("Radio"), vec!["Antenna", "RRU"]);
    }

    #[test]
    fn unknown_category_has_no_types() {
        let catalog = CategoryCatalog::from_entries(&[entry("Power", "Battery")]);
        assert!(catalog.types_for("Cooling").is_empty());
        assert!(CategoryCatalog::default().is_empty());
    }

    #[test]
    fn skips_blank_categories() {
        let catalog = CategoryCatalog::from_entries(&[entry("", "Battery"), entry("Power", "")]);
        assert_eq!(catalog.categories().collect::<Vec<_>>(), vec!["Power"]);
        assert!(catalog.types_for("Power").is_empty());
    }
}
