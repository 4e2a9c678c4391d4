use std::fmt::Write;

use crate::aggregate::{DateWindow, EntityKind, EntityTrend, TrendReport};

pub fn scope_label(city: Option<&str>, fme_name: Option<&str>) -> String {
    match (city, fme_name) {
        (Some(city), Some(fme)) => format!("{city} / {fme}"),
        (Some(city), None) => city.to_string(),
        (None, Some(fme)) => fme.to_string(),
        (None, None) => "all areas".to_string(),
    }
}

pub fn window_label(window: &DateWindow) -> String {
    match (window.from, window.to) {
        (Some(from), Some(to)) => format!("{from} to {to}"),
        (Some(from), None) => format!("since {from}"),
        (None, Some(to)) => format!("up to {to}"),
        (None, None) => "all dates".to_string(),
    }
}

pub fn build_report(scope: &str, window: &DateWindow, report: &TrendReport) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    let _ = writeln!(output, "# PMR Submission Timing Report");
    let _ = writeln!(output, "Generated for {} ({})", scope, window_label(window));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if summary.tally.total == 0 {
        let _ = writeln!(output, "No planned visits recorded for this window.");
    } else {
        let _ = writeln!(
            output,
            "- {} planned visits across {} sites ({} submitted)",
            summary.tally.total, summary.site_count, summary.submitted_sites
        );
        let _ = writeln!(
            output,
            "- Same day {:.1}%, within a week {:.1}%, late {:.1}%, no submission {:.1}%",
            summary.rates.same_day_rate,
            summary.rates.within_week_cumulative_rate,
            summary.rates.late_rate,
            summary.rates.no_submission_rate
        );
        let _ = writeln!(output, "- Overall status: {}", summary.performance_status);
    }
    let excluded = summary.excluded;
    if excluded.unparseable_date + excluded.before_first_monday > 0 {
        let _ = writeln!(
            output,
            "- Not bucketed: {} without a usable date, {} before the first Monday",
            excluded.unparseable_date, excluded.before_first_monday
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Timing");

    if report.weeks.is_empty() {
        let _ = writeln!(output, "No weeks with planned visits.");
    } else {
        let _ = writeln!(
            output,
            "| Week | Dates | Total | Same day | Next day | 2-7 days | Late | None | Same day % | Within week % |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|---|");
        for week in &report.weeks {
            let dates = week
                .range
                .map(|r| format!("{} to {}", r.start, r.end))
                .unwrap_or_default();
            let t = &week.tally;
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {:.1} | {:.1} |",
                week.label,
                dates,
                t.total,
                t.same_day,
                t.next_day,
                t.within_week,
                t.late,
                t.no_submission,
                week.rates.same_day_rate,
                week.rates.within_week_cumulative_rate
            );
        }
    }

    for (kind, title) in [(EntityKind::Area, "Area Performance"), (EntityKind::Nfo, "NFO Performance")] {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {title}");
        let entities: Vec<&EntityTrend> = report.entities_of(kind).collect();
        if entities.is_empty() {
            let _ = writeln!(output, "No {} entries for this window.", kind.as_str());
            continue;
        }
        for entity in entities {
            let _ = writeln!(
                output,
                "- {}: {} visits, same day {:.1}%, within week {:.1}% ({})",
                entity.name,
                entity.totals.total,
                entity.rates.same_day_rate,
                entity.rates.within_week_cumulative_rate,
                entity.performance_status
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{build_trends, TrendOptions};
    use crate::models::{InventoryObservation, PlannedRecord};
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_trends(&[], &[], &TrendOptions::default());
        let text = build_report("all areas", &DateWindow::default(), &report);
        assert!(text.contains("Generated for all areas (all dates)"));
        assert!(text.contains("No planned visits recorded"));
        assert!(text.contains("No weeks with planned visits."));
        assert!(text.contains("No area entries"));
    }

    #[test]
    fn renders_weeks_and_entities() {
        let records = vec![PlannedRecord {
            site_id: Some("W2470".to_string()),
            site_id_bare: None,
            city: "Riyadh".to_string(),
            fme_name: "Northern Field Ops".to_string(),
            actual_date: Some("15-Jan-26".to_string()),
        }];
        let observations = vec![InventoryObservation {
            site_id: "2470".to_string(),
            updated_at: Some(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()),
            tag_category: Some("Battery".to_string()),
            photo_category: Some("Cabinet".to_string()),
            source: None,
        }];
        let report = build_trends(&records, &observations, &TrendOptions::default());
        let text = build_report("Riyadh", &DateWindow::default(), &report);

        assert!(text.contains("| 2026 W02 | 2026-01-12 to 2026-01-18 | 1 | 1 |"));
        assert!(text.contains("- Riyadh: 1 visits, same day 100.0%"));
        assert!(text.contains("- Northern Field Ops: 1 visits"));
        assert!(text.contains("Overall status: excellent"));
    }

    #[test]
    fn labels_scope_and_window() {
        assert_eq!(scope_label(Some("Riyadh"), None), "Riyadh");
        assert_eq!(scope_label(Some("Riyadh"), Some("Team A")), "Riyadh / Team A");
        assert_eq!(scope_label(None, None), "all areas");
        let window = DateWindow {
            from: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
            to: None,
        };
        assert_eq!(window_label(&window), "since 2026-01-01");
    }
}
