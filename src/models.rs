use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::site_key::SiteKey;

/// One planned maintenance event as stored in the schedule table.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannedRecord {
    pub site_id: Option<String>,
    pub site_id_bare: Option<String>,
    pub city: String,
    pub fme_name: String,
    pub actual_date: Option<String>,
}

impl PlannedRecord {
    /// Either key column resolves the site; the prefixed one is tried first.
    pub fn site_key(&self, prefix: &str) -> Option<SiteKey> {
        self.site_id
            .as_deref()
            .and_then(|raw| SiteKey::parse(raw, prefix))
            .or_else(|| {
                self.site_id_bare
                    .as_deref()
                    .and_then(|raw| SiteKey::parse(raw, prefix))
            })
    }
}

/// One equipment row tied to a site.
#[derive(Debug, Clone)]
pub struct InventoryObservation {
    pub site_id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub tag_category: Option<String>,
    pub photo_category: Option<String>,
    pub source: Option<String>,
}

impl InventoryObservation {
    /// Both classification fields carry a value.
    pub fn is_filled(&self) -> bool {
        has_text(&self.tag_category) && has_text(&self.photo_category)
    }

    pub fn has_manual_marker(&self) -> bool {
        self.source
            .as_deref()
            .map(|s| s.to_ascii_lowercase().contains("manual"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub category: String,
    pub equipment_type: String,
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(tag: Option<&str>, photo: Option<&str>, source: Option<&str>) -> InventoryObservation {
        InventoryObservation {
            site_id: "W100".to_string(),
            updated_at: None,
            tag_category: tag.map(str::to_string),
            photo_category: photo.map(str::to_string),
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn filled_requires_both_classification_fields() {
        assert!(observation(Some("Rectifier"), Some("Front"), None).is_filled());
        assert!(!observation(Some("Rectifier"), None, None).is_filled());
        assert!(!observation(Some("  "), Some("Front"), None).is_filled());
    }

    #[test]
    fn manual_marker_is_case_insensitive() {
        assert!(observation(None, None, Some("MANUAL entry")).has_manual_marker());
        assert!(observation(None, None, Some("app-manual")).has_manual_marker());
        assert!(!observation(None, None, Some("import")).has_manual_marker());
        assert!(!observation(None, None, None).has_manual_marker());
    }

    #[test]
    fn planned_record_falls_back_to_bare_key() {
        let record = PlannedRecord {
            site_id: None,
            site_id_bare: Some("2470".to_string()),
            city: "Riyadh".to_string(),
            fme_name: "Team A".to_string(),
            actual_date: Some("15-Jan-26".to_string()),
        };
        assert_eq!(record.site_key("W").unwrap().canonical(), "W2470");
    }
}
