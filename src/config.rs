use clap::{Args, ValueEnum};

use crate::aggregate::{DateWindow, TrendOptions};
use crate::error::TrendError;
use crate::site_key::DEFAULT_SITE_PREFIX;
use crate::submission::{ManualTimestamp, SubmissionPolicy, DEFAULT_COMPLETION_THRESHOLD};
use crate::weeks::WeekBucketer;

/// Hard cap on rows per inventory page.
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Any row whose source tag mentions "manual"
    Manual,
    /// Share of rows with both classification fields filled
    CompletionRatio,
}

/// Settings shared by every command that resolves submissions.
#[derive(Debug, Clone, Args)]
pub struct TrendConfig {
    /// Bucket dates before the year's first Monday as week 0
    #[arg(long, default_value_t = false)]
    pub include_pre_week: bool,

    #[arg(long, value_enum, default_value_t = PolicyKind::CompletionRatio)]
    pub policy: PolicyKind,

    /// Timestamp rule for the manual policy
    #[arg(long, value_enum, default_value_t = ManualTimestamp::FirstMatch)]
    pub manual_timestamp: ManualTimestamp,

    /// Filled share a site must exceed to count as submitted
    #[arg(long, default_value_t = DEFAULT_COMPLETION_THRESHOLD)]
    pub completion_threshold: f64,

    #[arg(long, default_value = DEFAULT_SITE_PREFIX)]
    pub site_prefix: String,

    /// Site keys per inventory query batch
    #[arg(long, default_value_t = 200)]
    pub key_batch_size: usize,

    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            include_pre_week: false,
            policy: PolicyKind::CompletionRatio,
            manual_timestamp: ManualTimestamp::FirstMatch,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            site_prefix: DEFAULT_SITE_PREFIX.to_string(),
            key_batch_size: 200,
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), TrendError> {
        if !(0.0..1.0).contains(&self.completion_threshold) {
            return Err(TrendError::Config(format!(
                "completion threshold {} must be in [0, 1)",
                self.completion_threshold
            )));
        }
        if self.site_prefix.trim().is_empty() {
            return Err(TrendError::Config("site prefix must not be empty".into()));
        }
        if self.key_batch_size == 0 {
            return Err(TrendError::Config("key batch size must be positive".into()));
        }
        if self.page_size == 0 {
            return Err(TrendError::Config("page size must be positive".into()));
        }
        Ok(())
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.min(MAX_PAGE_SIZE)
    }

    pub fn submission_policy(&self) -> SubmissionPolicy {
        match self.policy {
            PolicyKind::Manual => SubmissionPolicy::ManualMarker {
                timestamp: self.manual_timestamp,
            },
            PolicyKind::CompletionRatio => SubmissionPolicy::CompletionRatio {
                threshold: self.completion_threshold,
            },
        }
    }

    pub fn trend_options(&self, window: DateWindow, group_entities: bool) -> TrendOptions {
        TrendOptions {
            bucketer: WeekBucketer::new(self.include_pre_week),
            policy: self.submission_policy(),
            site_prefix: self.site_prefix.clone(),
            window,
            group_entities,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}
