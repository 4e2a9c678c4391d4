use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use pmr_trending::aggregate::{DateWindow, EntityKind};
use pmr_trending::catalog::CategoryCatalog;
use pmr_trending::config::{LoggingConfig, TrendConfig};
use pmr_trending::pipeline::{self, TrendQuery};
use pmr_trending::{db, logging, report, TrendError};

#[derive(Parser)]
#[command(name = "pmr-trending")]
#[command(about = "PMR submission timing trends for site inventory", long_about = None)]
struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct Scope {
    /// Exact city (area) to include
    #[arg(long)]
    city: Option<String>,
    /// Exact field maintenance engineer / NFO to include
    #[arg(long)]
    nfo: Option<String>,
    /// First planned date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last planned date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl Scope {
    fn window(&self) -> DateWindow {
        DateWindow {
            from: self.from,
            to: self.to,
        }
    }

    fn query(&self, group_entities: bool) -> TrendQuery {
        TrendQuery {
            window: self.window(),
            city: self.city.clone(),
            fme_name: self.nfo.clone(),
            group_entities,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Replace the PMR schedule with the rows of a CSV file
    ImportSchedule {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Replace the inventory table with the rows of a CSV file
    ImportInventory {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Replace the equipment catalog with the rows of a CSV file
    ImportCatalog {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print weekly and per-entity submission timing
    Trend {
        #[command(flatten)]
        scope: Scope,
        #[command(flatten)]
        config: TrendConfig,
        /// Entities to list per kind
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: Scope,
        #[command(flatten)]
        config: TrendConfig,
        #[arg(long, default_value = "pmr-report.md")]
        out: PathBuf,
    },
    /// Show the submission state of one site
    Site {
        /// Site key in either form, e.g. W2470 or 2470
        key: String,
        #[command(flatten)]
        config: TrendConfig,
    },
    /// List equipment categories, or the types under one category
    Catalog {
        #[arg(long)]
        category: Option<String>,
    },
}

fn explain(err: TrendError) -> anyhow::Error {
    if err.is_schema_mismatch() {
        anyhow::Error::new(err).context("database schema does not match; run `init-db`")
    } else {
        err.into()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(&cli.logging);

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await.map_err(explain)?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await.map_err(explain)?;
            println!("Seed data inserted.");
        }
        Commands::ImportSchedule { csv } => {
            let summary = db::import_schedule(&pool, &csv).await.map_err(explain)?;
            println!(
                "Replaced schedule with {} rows from {} ({} skipped).",
                summary.inserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::ImportInventory { csv } => {
            let summary = db::import_inventory(&pool, &csv).await.map_err(explain)?;
            println!(
                "Replaced inventory with {} rows from {} ({} skipped).",
                summary.inserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::ImportCatalog { csv } => {
            let summary = db::import_catalog(&pool, &csv).await.map_err(explain)?;
            println!(
                "Replaced catalog with {} entries from {} ({} skipped).",
                summary.inserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::Trend {
            scope,
            config,
            limit,
            json,
        } => {
            let trends = pipeline::run_trends(&pool, &config, &scope.query(true))
                .await
                .map_err(explain)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&trends)?);
                return Ok(());
            }

            if trends.weeks.is_empty() {
                println!("No planned visits found for this window.");
                return Ok(());
            }

            println!("Submission timing by week:");
            for week in &trends.weeks {
                println!(
                    "- {}: {} visits, same day {:.1}%, within week {:.1}%, late {}, none {}",
                    week.label,
                    week.tally.total,
                    week.rates.same_day_rate,
                    week.rates.within_week_cumulative_rate,
                    week.tally.late,
                    week.tally.no_submission
                );
            }

            for kind in [EntityKind::Area, EntityKind::Nfo] {
                println!();
                println!("Top {} by volume:", kind.as_str());
                for entity in trends.entities_of(kind).take(limit) {
                    println!(
                        "- {} {} visits, same day {:.1}%, within week {:.1}% ({})",
                        entity.name,
                        entity.totals.total,
                        entity.rates.same_day_rate,
                        entity.rates.within_week_cumulative_rate,
                        entity.performance_status
                    );
                }
            }

            let summary = &trends.summary;
            println!();
            println!(
                "Overall: {} visits across {} sites, status {}.",
                summary.tally.total, summary.site_count, summary.performance_status
            );
        }
        Commands::Report { scope, config, out } => {
            let trends = pipeline::run_trends(&pool, &config, &scope.query(true))
                .await
                .map_err(explain)?;
            let label = report::scope_label(scope.city.as_deref(), scope.nfo.as_deref());
            let markdown = report::build_report(&label, &scope.window(), &trends);
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Site { key, config } => {
            let status = pipeline::site_status(&pool, &config, &key)
                .await
                .map_err(explain)?;
            info!(site = %status.key, "resolved site");
            println!(
                "{} ({}): {} rows, {} filled, policy {}",
                status.key,
                status.key.bare(),
                status.observations,
                status.filled,
                config.submission_policy().name()
            );
            match (status.state.is_submitted, status.state.latest_update) {
                (true, Some(at)) => println!("Submitted, latest update {at}."),
                (true, None) => println!("Submitted, no update timestamp recorded."),
                (false, _) => println!("Not submitted."),
            }
        }
        Commands::Catalog { category } => {
            let entries = db::fetch_catalog(&pool).await.map_err(explain)?;
            let catalog = CategoryCatalog::from_entries(&entries);
            if catalog.is_empty() {
                println!("Catalog is empty.");
                return Ok(());
            }
            match category {
                Some(category) => {
                    let types = catalog.types_for(&category);
                    if types.is_empty() {
                        println!("No equipment types under {category}.");
                    }
                    for equipment_type in types {
                        println!("- {equipment_type}");
                    }
                }
                None => {
                    for category in catalog.categories() {
                        println!("- {category}");
                    }
                }
            }
        }
    }

    Ok(())
}
