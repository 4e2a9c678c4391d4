use std::collections::BTreeSet;

use sqlx::PgPool;
use tracing::info;

use crate::aggregate::{build_trends, DateWindow, TrendReport};
use crate::config::TrendConfig;
use crate::dates::parse_compact_date;
use crate::db;
use crate::error::{Result, TrendError};
use crate::models::{InventoryObservation, PlannedRecord};
use crate::site_key::SiteKey;
use crate::submission::{SiteObservations, SubmissionState};

/// One trend query: an inclusive date window plus optional exact-match
/// city and assignee filters.
#[derive(Debug, Clone, Default)]
pub struct TrendQuery {
    pub window: DateWindow,
    pub city: Option<String>,
    pub fme_name: Option<String>,
    pub group_entities: bool,
}

/// Keys of the records that can actually be classified in `window`.
pub fn site_keys_in_window(
    records: &[PlannedRecord],
    window: &DateWindow,
    prefix: &str,
) -> Vec<SiteKey> {
    records
        .iter()
        .filter(|r| {
            r.actual_date
                .as_deref()
                .and_then(parse_compact_date)
                .is_some_and(|date| window.contains(date))
        })
        .filter_map(|r| r.site_key(prefix))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Inventory rows for `keys`, batched and paged the way `config` says.
async fn fetch_observations(
    pool: &PgPool,
    config: &TrendConfig,
    keys: &[SiteKey],
) -> Result<Vec<InventoryObservation>> {
    db::fetch_inventory(
        pool,
        keys,
        config.key_batch_size,
        config.effective_page_size(),
    )
    .await
}

/// Fetch everything a query needs and aggregate it. Nothing is returned
/// unless every fetch succeeds.
pub async fn run_trends(
    pool: &PgPool,
    config: &TrendConfig,
    query: &TrendQuery,
) -> Result<TrendReport> {
    config.validate()?;

    let records =
        db::fetch_planned_records(pool, query.city.as_deref(), query.fme_name.as_deref()).await?;
    let keys = site_keys_in_window(&records, &query.window, &config.site_prefix);
    let observations = fetch_observations(pool, config, &keys).await?;

    let options = config.trend_options(query.window, query.group_entities);
    let report = build_trends(&records, &observations, &options);

    info!(
        records = records.len(),
        sites = keys.len(),
        weeks = report.weeks.len(),
        policy = options.policy.name(),
        "trend run complete"
    );
    Ok(report)
}

#[derive(Debug, Clone)]
pub struct SiteStatus {
    pub key: SiteKey,
    pub observations: usize,
    pub filled: usize,
    pub state: SubmissionState,
}

/// Resolve a single site, given in either key form.
pub async fn site_status(pool: &PgPool, config: &TrendConfig, raw_key: &str) -> Result<SiteStatus> {
    config.validate()?;

    let key = SiteKey::parse(raw_key, &config.site_prefix)
        .ok_or_else(|| TrendError::Config(format!("`{raw_key}` is not a site key")))?;
    let observations = fetch_observations(pool, config, std::slice::from_ref(&key)).await?;

    let index = SiteObservations::index(&observations, &config.site_prefix);
    let rows = index.observations(&key);
    Ok(SiteStatus {
        observations: rows.len(),
        filled: rows.iter().filter(|o| o.is_filled()).count(),
        state: index.resolve(&key, &config.submission_policy()),
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(site: Option<&str>, bare: Option<&str>, date: Option<&str>) -> PlannedRecord {
        PlannedRecord {
            site_id: site.map(str::to_string),
            site_id_bare: bare.map(str::to_string),
            city: "Riyadh".to_string(),
            fme_name: "Team A".to_string(),
            actual_date: date.map(str::to_string),
        }
    }

    #[test]
    fn collects_unique_keys_for_dated_records_in_window() {
        let records = vec![
            record(Some("W2470"), None, Some("15-Jan-26")),
            record(None, Some("2470"), Some("16-Jan-26")),
            record(Some("W2471"), None, Some("bogus")),
            record(Some("W2472"), None, None),
            record(Some("W2473"), None, Some("15-Mar-26")),
            record(None, None, Some("15-Jan-26")),
        ];
        let window = DateWindow {
            from: NaiveDate::from_ymd_opt(2026, 1, 1),
            to: NaiveDate::from_ymd_opt(2026, 1, 31),
        };

        let keys = site_keys_in_window(&records, &window, "W");
        let canonical: Vec<String> = keys.iter().map(SiteKey::canonical).collect();
        assert_eq!(canonical, vec!["W2470"]);
    }

    #[test]
    fn site_lookup_batches_follow_configured_size() {
        let config = TrendConfig {
            key_batch_size: 1,
            ..TrendConfig::default()
        };
        assert!(config.validate().is_ok());

        let key = SiteKey::parse("2470", &config.site_prefix).unwrap();
        let batches = db::key_batches(std::slice::from_ref(&key), config.key_batch_size);
        assert_eq!(batches, vec![vec!["W2470".to_string(), "2470".to_string()]]);

        let keys = site_keys_in_window(
            &[
                record(Some("W1"), None, Some("15-Jan-26")),
                record(Some("W2"), None, Some("15-Jan-26")),
                record(None, Some("3"), Some("15-Jan-26")),
            ],
            &DateWindow::default(),
            &config.site_prefix,
        );
        assert_eq!(db::key_batches(&keys, config.key_batch_size).len(), 3);
    }
}
