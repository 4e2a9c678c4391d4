use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::dates::parse_compact_date;
use crate::models::{InventoryObservation, PlannedRecord};
use crate::performance::PerformanceTier;
use crate::site_key::{SiteKey, DEFAULT_SITE_PREFIX};
use crate::submission::{SiteObservations, SubmissionPolicy, SubmissionState};
use crate::timing::{classify, TimingCategory};
use crate::weeks::{WeekBucketer, WeekId, WeekRange};

/// Five timing counters plus their total. The counters always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimingTally {
    pub total: u64,
    pub same_day: u64,
    pub next_day: u64,
    /// Exclusive 2..=7 day bucket; see `within_week_cumulative_rate`.
    pub within_week: u64,
    pub late: u64,
    pub no_submission: u64,
}

impl TimingTally {
    pub fn record(&mut self, category: TimingCategory) {
        self.total += 1;
        match category {
            TimingCategory::SameDay => self.same_day += 1,
            TimingCategory::NextDay => self.next_day += 1,
            TimingCategory::WithinWeek => self.within_week += 1,
            TimingCategory::Late => self.late += 1,
            TimingCategory::NoSubmission => self.no_submission += 1,
        }
    }

    pub fn merge(&mut self, other: &TimingTally) {
        self.total += other.total;
        self.same_day += other.same_day;
        self.next_day += other.next_day;
        self.within_week += other.within_week;
        self.late += other.late;
        self.no_submission += other.no_submission;
    }

    pub fn counter_sum(&self) -> u64 {
        self.same_day + self.next_day + self.within_week + self.late + self.no_submission
    }

    pub fn same_day_rate(&self) -> f64 {
        percentage(self.same_day, self.total)
    }

    /// Share submitted within seven days, same-day and next-day included.
    pub fn within_week_cumulative_rate(&self) -> f64 {
        percentage(self.same_day + self.next_day + self.within_week, self.total)
    }

    pub fn late_rate(&self) -> f64 {
        percentage(self.late, self.total)
    }

    pub fn no_submission_rate(&self) -> f64 {
        percentage(self.no_submission, self.total)
    }

    pub fn rates(&self) -> TimingRates {
        TimingRates {
            same_day_rate: self.same_day_rate(),
            within_week_cumulative_rate: self.within_week_cumulative_rate(),
            late_rate: self.late_rate(),
            no_submission_rate: self.no_submission_rate(),
        }
    }

    pub fn performance(&self) -> PerformanceTier {
        PerformanceTier::classify(self.same_day_rate(), self.within_week_cumulative_rate())
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingRates {
    pub same_day_rate: f64,
    pub within_week_cumulative_rate: f64,
    pub late_rate: f64,
    pub no_submission_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekBucket {
    pub id: WeekId,
    pub label: String,
    pub range: Option<WeekRange>,
    pub tally: TimingTally,
    pub rates: TimingRates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Area,
    Nfo,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Area => "area",
            EntityKind::Nfo => "nfo",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityWeek {
    pub week: WeekId,
    pub tally: TimingTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityTrend {
    pub name: String,
    pub kind: EntityKind,
    pub weeks: Vec<EntityWeek>,
    pub totals: TimingTally,
    pub rates: TimingRates,
    pub performance_status: PerformanceTier,
}

impl EntityTrend {
    pub fn week(&self, id: WeekId) -> Option<&TimingTally> {
        self.weeks.iter().find(|w| w.week == id).map(|w| &w.tally)
    }
}

/// Records dropped before classification, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Exclusions {
    pub unparseable_date: usize,
    pub outside_window: usize,
    pub before_first_monday: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub tally: TimingTally,
    pub rates: TimingRates,
    pub performance_status: PerformanceTier,
    pub site_count: usize,
    pub submitted_sites: usize,
    pub excluded: Exclusions,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    /// Ascending by `(year, week)`.
    pub weeks: Vec<WeekBucket>,
    /// Descending by total volume.
    pub entities: Vec<EntityTrend>,
    pub summary: TrendSummary,
}

impl TrendReport {
    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &EntityTrend> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }
}

/// Inclusive date window; an open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone)]
pub struct TrendOptions {
    pub bucketer: WeekBucketer,
    pub policy: SubmissionPolicy,
    pub site_prefix: String,
    pub window: DateWindow,
    pub group_entities: bool,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            bucketer: WeekBucketer::default(),
            policy: SubmissionPolicy::default(),
            site_prefix: DEFAULT_SITE_PREFIX.to_string(),
            window: DateWindow::default(),
            group_entities: true,
        }
    }
}

const UNASSIGNED: &str = "Unassigned";

/// Classify every planned record and fold the results into week and entity
/// tallies. Each call starts from empty counters.
pub fn build_trends(
    records: &[PlannedRecord],
    observations: &[InventoryObservation],
    options: &TrendOptions,
) -> TrendReport {
    let index = SiteObservations::index(observations, &options.site_prefix);
    let mut states: HashMap<SiteKey, SubmissionState> = HashMap::new();
    let mut weeks: BTreeMap<WeekId, TimingTally> = BTreeMap::new();
    let mut entities: HashMap<(EntityKind, String), BTreeMap<WeekId, TimingTally>> =
        HashMap::new();
    let mut sites: HashSet<SiteKey> = HashSet::new();
    let mut excluded = Exclusions::default();
    let mut overall = TimingTally::default();

    for record in records {
        let Some(planned) = record.actual_date.as_deref().and_then(parse_compact_date) else {
            debug!(site = ?record.site_id, date = ?record.actual_date, "skipping unparseable date");
            excluded.unparseable_date += 1;
            continue;
        };
        if !options.window.contains(planned) {
            excluded.outside_window += 1;
            continue;
        }
        let Some(week) = options.bucketer.week_of(planned) else {
            excluded.before_first_monday += 1;
            continue;
        };

        let state = match record.site_key(&options.site_prefix) {
            Some(key) => {
                let state = *states
                    .entry(key.clone())
                    .or_insert_with(|| index.resolve(&key, &options.policy));
                sites.insert(key);
                state
            }
            None => SubmissionState::not_submitted(),
        };
        let category = classify(planned, &state);

        overall.record(category);
        weeks.entry(week).or_default().record(category);

        if options.group_entities {
            for (kind, name) in [
                (EntityKind::Area, &record.city),
                (EntityKind::Nfo, &record.fme_name),
            ] {
                entities
                    .entry((kind, entity_name(name)))
                    .or_default()
                    .entry(week)
                    .or_default()
                    .record(category);
            }
        }
    }

    let weeks: Vec<WeekBucket> = weeks
        .into_iter()
        .map(|(id, tally)| WeekBucket {
            id,
            label: id.label(),
            range: options.bucketer.range_of(id),
            tally,
            rates: tally.rates(),
        })
        .collect();

    let mut entities: Vec<EntityTrend> = entities
        .into_iter()
        .map(|((kind, name), by_week)| {
            let mut totals = TimingTally::default();
            for tally in by_week.values() {
                totals.merge(tally);
            }
            EntityTrend {
                name,
                kind,
                weeks: by_week
                    .into_iter()
                    .map(|(week, tally)| EntityWeek { week, tally })
                    .collect(),
                totals,
                rates: totals.rates(),
                performance_status: totals.performance(),
            }
        })
        .collect();
    entities.sort_by(|a, b| {
        b.totals
            .total
            .cmp(&a.totals.total)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.name.cmp(&b.name))
    });

    let summary = TrendSummary {
        tally: overall,
        rates: overall.rates(),
        performance_status: overall.performance(),
        site_count: sites.len(),
        submitted_sites: states.values().filter(|s| s.is_submitted).count(),
        excluded,
    };

    TrendReport {
        weeks,
        entities,
        summary,
    }
}

fn entity_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNASSIGNED.to_string()
    } else {
        trimmed.to_string()
    }
}
