use thiserror::Error;

/// Errors surfaced by a trend run or an import.
///
/// A run never returns partial results: the first failing fetch page aborts
/// the whole aggregation and comes back as one of these.
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("backing store query failed: {0}")]
    Fetch(#[source] sqlx::Error),

    #[error("backing store is missing expected column `{column}`")]
    SchemaMismatch { column: String },

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("csv import failed: {0}")]
    Import(#[from] csv::Error),

    #[error("fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TrendError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, TrendError::SchemaMismatch { .. })
    }
}

// Postgres SQLSTATE for undefined_column.
const UNDEFINED_COLUMN: &str = "42703";

impl From<sqlx::Error> for TrendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(column) => TrendError::SchemaMismatch { column },
            sqlx::Error::Database(ref db)
                if db.code().as_deref() == Some(UNDEFINED_COLUMN) =>
            {
                TrendError::SchemaMismatch {
                    column: db.message().to_string(),
                }
            }
            other => TrendError::Fetch(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_maps_to_schema_mismatch() {
        let err: TrendError = sqlx::Error::ColumnNotFound("photo_category".to_string()).into();
        assert!(err.is_schema_mismatch());
        assert_eq!(
            err.to_string(),
            "backing store is missing expected column `photo_category`"
        );
    }

    #[test]
    fn other_sqlx_errors_stay_fetch_failures() {
        let err: TrendError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, TrendError::Fetch(_)));
        assert!(!err.is_schema_mismatch());
    }
}
