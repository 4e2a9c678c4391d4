use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::models::InventoryObservation;
use crate::site_key::SiteKey;

pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.10;

/// Derived per-site submission state. `latest_update` is only ever set on a
/// submitted site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SubmissionState {
    pub is_submitted: bool,
    pub latest_update: Option<DateTime<Utc>>,
}

impl SubmissionState {
    pub fn not_submitted() -> Self {
        Self::default()
    }

    pub fn submitted(latest_update: Option<DateTime<Utc>>) -> Self {
        Self {
            is_submitted: true,
            latest_update,
        }
    }
}

/// Which timestamp the manual-marker policy reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManualTimestamp {
    /// Timestamp of the first marked row in fetch order.
    FirstMatch,
    /// Newest timestamp among marked rows.
    Latest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmissionPolicy {
    ManualMarker { timestamp: ManualTimestamp },
    CompletionRatio { threshold: f64 },
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        SubmissionPolicy::CompletionRatio {
            threshold: DEFAULT_COMPLETION_THRESHOLD,
        }
    }
}

impl SubmissionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionPolicy::ManualMarker { .. } => "manual-marker",
            SubmissionPolicy::CompletionRatio { .. } => "completion-ratio",
        }
    }

    /// Resolve one site from all of its observations.
    pub fn resolve<'a, I>(&self, observations: I) -> SubmissionState
    where
        I: IntoIterator<Item = &'a InventoryObservation>,
    {
        match *self {
            SubmissionPolicy::ManualMarker { timestamp } => {
                let mut marked = observations.into_iter().filter(|o| o.has_manual_marker());
                let Some(first) = marked.next() else {
                    return SubmissionState::not_submitted();
                };
                let latest_update = match timestamp {
                    ManualTimestamp::FirstMatch => first.updated_at,
                    ManualTimestamp::Latest => marked
                        .filter_map(|o| o.updated_at)
                        .chain(first.updated_at)
                        .max(),
                };
                SubmissionState::submitted(latest_update)
            }
            SubmissionPolicy::CompletionRatio { threshold } => {
                let mut total = 0usize;
                let mut filled = 0usize;
                let mut latest: Option<DateTime<Utc>> = None;
                for observation in observations {
                    total += 1;
                    if observation.is_filled() {
                        filled += 1;
                        latest = latest.max(observation.updated_at);
                    }
                }
                if total == 0 || (filled as f64 / total as f64) <= threshold {
                    return SubmissionState::not_submitted();
                }
                SubmissionState::submitted(latest)
            }
        }
    }
}

/// Observations grouped by normalized site key.
#[derive(Debug, Default)]
pub struct SiteObservations<'a> {
    by_site: HashMap<SiteKey, Vec<&'a InventoryObservation>>,
}

impl<'a> SiteObservations<'a> {
    pub fn index(observations: &'a [InventoryObservation], prefix: &str) -> Self {
        let mut by_site: HashMap<SiteKey, Vec<&'a InventoryObservation>> = HashMap::new();
        for observation in observations {
            if let Some(key) = SiteKey::parse(&observation.site_id, prefix) {
                by_site.entry(key).or_default().push(observation);
            }
        }
        Self { by_site }
    }

    pub fn site_count(&self) -> usize {
        self.by_site.len()
    }

    pub fn observations(&self, key: &SiteKey) -> &[&'a InventoryObservation] {
        self.by_site.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resolve(&self, key: &SiteKey, policy: &SubmissionPolicy) -> SubmissionState {
        policy.resolve(self.observations(key).iter().copied())
    }

    /// Resolve every indexed site once.
    pub fn resolve_all(&self, policy: &SubmissionPolicy) -> HashMap<SiteKey, SubmissionState> {
        self.by_site
            .iter()
            .map(|(key, rows)| (key.clone(), policy.resolve(rows.iter().copied())))
            .collect()
    }
}
