use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dates::parse_timestamp;
use crate::error::Result;
use crate::models::{CatalogEntry, InventoryObservation, PlannedRecord};
use crate::site_key::SiteKey;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> Result<()> {
    let schedule = [
        (1u128, "W2470", "2470", "Riyadh", "Northern Field Ops", "5-Jan-26"),
        (2, "W2471", "2471", "Riyadh", "Northern Field Ops", "6-Jan-26"),
        (3, "W3102", "3102", "Jeddah", "Coastal Maintenance", "7-Jan-26"),
        (4, "W3105", "3105", "Jeddah", "Coastal Maintenance", "13-Jan-26"),
        (5, "W4410", "4410", "Dammam", "Eastern Site Services", "15-Jan-26"),
        (6, "W4412", "4412", "Dammam", "Eastern Site Services", "20-Jan-26"),
    ];

    for (id, site_id, site_id_bare, city, fme_name, actual_date) in schedule {
        sqlx::query(
            r#"
            INSERT INTO pmr_trending.pmr_schedule
            (id, site_id, site_id_bare, city, fme_name, actual_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from_u128(id))
        .bind(site_id)
        .bind(site_id_bare)
        .bind(city)
        .bind(fme_name)
        .bind(actual_date)
        .execute(pool)
        .await?;
    }

    let inventory = [
        (101u128, "W2470", (2026, 1, 5, 14), Some("Rectifier"), Some("Front"), "app"),
        (102, "2470", (2026, 1, 5, 16), Some("Battery"), Some("Cabinet"), "app"),
        (103, "W2471", (2026, 1, 7, 9), Some("Antenna"), Some("Tower"), "manual entry"),
        (104, "3102", (2026, 1, 8, 11), Some("RRU"), Some("Tower"), "app"),
        (105, "W3105", (2026, 1, 30, 10), Some("Rectifier"), Some("Front"), "manual"),
        (106, "W4410", (2026, 1, 15, 8), None, Some("Front"), "import"),
    ];

    for (id, site_id, (y, m, d, h), tag_category, photo_category, source) in inventory {
        let updated_at: Option<DateTime<Utc>> = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single();
        sqlx::query(
            r#"
            INSERT INTO pmr_trending.inventory
            (id, site_id, updated_at, tag_category, photo_category, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from_u128(id))
        .bind(site_id)
        .bind(updated_at)
        .bind(tag_category)
        .bind(photo_category)
        .bind(source)
        .execute(pool)
        .await?;
    }

    let catalog = [
        ("Power", "Rectifier"),
        ("Power", "Battery"),
        ("Radio", "Antenna"),
        ("Radio", "RRU"),
        ("Cooling", "Air Conditioner"),
    ];

    for (category, equipment_type) in catalog {
        sqlx::query(
            r#"
            INSERT INTO pmr_trending.catalog (category, equipment_type)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(category)
        .bind(equipment_type)
        .execute(pool)
        .await?;
    }

    Ok(())
}

fn planned_query(city: Option<&str>, fme_name: Option<&str>) -> String {
    let mut query = String::from(
        "SELECT site_id, site_id_bare, city, fme_name, actual_date \
         FROM pmr_trending.pmr_schedule \
         WHERE actual_date IS NOT NULL",
    );
    let mut param = 0;

    if city.is_some() {
        param += 1;
        query.push_str(&format!(" AND city = ${param}"));
    }
    if fme_name.is_some() {
        param += 1;
        query.push_str(&format!(" AND fme_name = ${param}"));
    }
    query.push_str(" ORDER BY created_at, id");
    query
}

pub async fn fetch_planned_records(
    pool: &PgPool,
    city: Option<&str>,
    fme_name: Option<&str>,
) -> Result<Vec<PlannedRecord>> {
    let query = planned_query(city, fme_name);
    let mut rows = sqlx::query(&query);

    if let Some(value) = city {
        rows = rows.bind(value);
    }
    if let Some(value) = fme_name {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut planned = Vec::with_capacity(records.len());

    for row in records {
        planned.push(PlannedRecord {
            site_id: row.try_get("site_id")?,
            site_id_bare: row.try_get("site_id_bare")?,
            city: row.try_get("city")?,
            fme_name: row.try_get("fme_name")?,
            actual_date: row.try_get("actual_date")?,
        });
    }

    debug!(count = planned.len(), "fetched planned records");
    Ok(planned)
}

/// Group distinct keys into batches of at most `batch_size` sites. Each batch
/// carries both textual forms of its sites, so the rows of one site never
/// span two batches.
pub fn key_batches(keys: &[SiteKey], batch_size: usize) -> Vec<Vec<String>> {
    let unique: Vec<&SiteKey> = keys.iter().collect::<BTreeSet<_>>().into_iter().collect();
    unique
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.iter().flat_map(|key| key.forms()).collect())
        .collect()
}

/// Rows are matched on the trimmed, upper-cased site id, the same
/// normalization `SiteKey` applies. Pages follow insertion order (`seq`).
const INVENTORY_PAGE_QUERY: &str = r#"
    SELECT seq, site_id, updated_at, tag_category, photo_category, source
    FROM pmr_trending.inventory
    WHERE upper(btrim(site_id)) = ANY($1)
      AND seq > $2
    ORDER BY seq
    LIMIT $3
"#;

/// Fetch inventory rows for `keys`, batching the `IN` list by site and paging
/// each batch. Batches run concurrently; their rows are merged back into
/// insertion order. The first failing page fails the whole fetch.
pub async fn fetch_inventory(
    pool: &PgPool,
    keys: &[SiteKey],
    batch_size: usize,
    page_size: usize,
) -> Result<Vec<InventoryObservation>> {
    let batches = key_batches(keys, batch_size);
    if batches.is_empty() {
        return Ok(Vec::new());
    }
    let forms: usize = batches.iter().map(Vec::len).sum();

    let mut tasks = JoinSet::new();
    for batch in batches {
        let pool = pool.clone();
        tasks.spawn(async move { fetch_inventory_batch(&pool, batch, page_size).await });
    }

    let mut fetched = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        fetched.push(joined??);
    }

    let observations = merge_in_insertion_order(fetched);
    info!(
        keys = forms,
        rows = observations.len(),
        "fetched inventory observations"
    );
    Ok(observations)
}

/// Flatten per-batch rows into one list ordered by `seq`, whatever order the
/// batches finished in.
pub fn merge_in_insertion_order(
    batches: Vec<Vec<(i64, InventoryObservation)>>,
) -> Vec<InventoryObservation> {
    let mut rows: Vec<(i64, InventoryObservation)> = batches.into_iter().flatten().collect();
    rows.sort_by_key(|(seq, _)| *seq);
    rows.into_iter().map(|(_, observation)| observation).collect()
}

async fn fetch_inventory_batch(
    pool: &PgPool,
    forms: Vec<String>,
    page_size: usize,
) -> Result<Vec<(i64, InventoryObservation)>> {
    let page_size = page_size.max(1);
    let mut observations = Vec::new();
    let mut after = 0i64;

    loop {
        let rows = sqlx::query(INVENTORY_PAGE_QUERY)
            .bind(&forms)
            .bind(after)
            .bind(page_size as i64)
            .fetch_all(pool)
            .await?;

        let fetched = rows.len();
        for row in rows {
            let seq: i64 = row.try_get("seq")?;
            observations.push((seq, observation_from_row(&row)?));
            after = seq;
        }
        debug!(after, fetched, "fetched inventory page");

        if fetched < page_size {
            break;
        }
    }

    Ok(observations)
}

fn observation_from_row(row: &PgRow) -> Result<InventoryObservation> {
    Ok(InventoryObservation {
        site_id: row.try_get("site_id")?,
        updated_at: row.try_get("updated_at")?,
        tag_category: row.try_get("tag_category")?,
        photo_category: row.try_get("photo_category")?,
        source: row.try_get("source")?,
    })
}

pub async fn fetch_catalog(pool: &PgPool) -> Result<Vec<CatalogEntry>> {
    let rows = sqlx::query(
        "SELECT category, equipment_type FROM pmr_trending.catalog ORDER BY category, equipment_type",
    )
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(CatalogEntry {
            category: row.try_get("category")?,
            equipment_type: row.try_get("equipment_type")?,
        });
    }
    Ok(entries)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Replace the whole schedule table with the rows of a CSV file.
pub async fn import_schedule(pool: &PgPool, csv_path: &Path) -> Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM pmr_trending.pmr_schedule")
        .execute(&mut *tx)
        .await?;

    for (line, result) in reader.deserialize::<PlannedRecord>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(line = line + 2, error = %err, "skipping schedule row");
                summary.skipped += 1;
                continue;
            }
        };

        sqlx::query(
            r#"
            INSERT INTO pmr_trending.pmr_schedule
            (id, site_id, site_id_bare, city, fme_name, actual_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.site_id)
        .bind(&row.site_id_bare)
        .bind(row.city.trim())
        .bind(row.fme_name.trim())
        .bind(&row.actual_date)
        .execute(&mut *tx)
        .await?;
        summary.inserted += 1;
    }

    tx.commit().await?;
    info!(?summary, path = %csv_path.display(), "schedule table replaced");
    Ok(summary)
}

#[derive(Debug, serde::Deserialize)]
struct InventoryCsvRow {
    site_id: String,
    updated_at: Option<String>,
    tag_category: Option<String>,
    photo_category: Option<String>,
    source: Option<String>,
}

impl InventoryCsvRow {
    fn into_observation(self) -> std::result::Result<InventoryObservation, String> {
        if self.site_id.trim().is_empty() {
            return Err("empty site_id".to_string());
        }
        let updated_at = match self.updated_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| format!("bad updated_at `{raw}`"))?),
        };
        Ok(InventoryObservation {
            site_id: self.site_id.trim().to_string(),
            updated_at,
            tag_category: self.tag_category,
            photo_category: self.photo_category,
            source: self.source,
        })
    }
}

/// Replace the whole inventory table with the rows of a CSV file.
pub async fn import_inventory(pool: &PgPool, csv_path: &Path) -> Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM pmr_trending.inventory")
        .execute(&mut *tx)
        .await?;

    for (line, result) in reader.deserialize::<InventoryCsvRow>().enumerate() {
        let observation = match result.map_err(|e| e.to_string()).and_then(InventoryCsvRow::into_observation) {
            Ok(observation) => observation,
            Err(err) => {
                warn!(line = line + 2, error = %err, "skipping inventory row");
                summary.skipped += 1;
                continue;
            }
        };

        sqlx::query(
            r#"
            INSERT INTO pmr_trending.inventory
            (id, site_id, updated_at, tag_category, photo_category, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&observation.site_id)
        .bind(observation.updated_at)
        .bind(&observation.tag_category)
        .bind(&observation.photo_category)
        .bind(&observation.source)
        .execute(&mut *tx)
        .await?;
        summary.inserted += 1;
    }

    tx.commit().await?;
    info!(?summary, path = %csv_path.display(), "inventory table replaced");
    Ok(summary)
}

/// Replace the catalog table with `category,equipment_type` rows.
pub async fn import_catalog(pool: &PgPool, csv_path: &Path) -> Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        category: String,
        equipment_type: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM pmr_trending.catalog")
        .execute(&mut *tx)
        .await?;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) if !row.category.trim().is_empty() => row,
            Ok(_) => {
                warn!(line = line + 2, "skipping catalog row without category");
                summary.skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(line = line + 2, error = %err, "skipping catalog row");
                summary.skipped += 1;
                continue;
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO pmr_trending.catalog (category, equipment_type)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(row.category.trim())
        .bind(row.equipment_type.trim())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    tx.commit().await?;
    info!(?summary, path = %csv_path.display(), "catalog table replaced");
    Ok(summary)
}
