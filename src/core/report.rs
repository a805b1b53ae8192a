//! Plain-text turnout tables for the summary panel and the clipboard.

use super::model::TurnoutSeries;
use super::processor::{turnout_stats, LatestFigures};
use chrono::NaiveDateTime;

const TABLE_WIDTH: usize = 80;
const OVERVIEW_WIDTH: usize = 110;

const TIME_W: usize = 10;
const SCOPE_W: usize = 27;
const ROUND_W: usize = 14;
const DIFF_W: usize = 14;
const HOURLY_W: usize = 16;
const DELTA_W: usize = 10;

/// Column headings for the two rounds, e.g. "Tur 2" / "Tur 1".
#[derive(Debug, Clone, Copy)]
pub struct RoundLabels<'a> {
    pub current: &'a str,
    pub previous: &'a str,
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Always signed: `+1,200`, `-35`, `+0`.
pub fn signed(n: i64) -> String {
    let sign = if n < 0 { '-' } else { '+' };
    format!("{sign}{}", group_thousands(n.unsigned_abs()))
}

pub fn delta_text(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{d:+.2}%"),
        None => "N/A".to_string(),
    }
}

fn slot_text(slot: NaiveDateTime) -> String {
    format!("[{}]", slot.format("%d %H:01"))
}

fn rule(left: char, mid: char, right: char, widths: &[usize]) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            line.push(mid);
        }
        line.push_str(&"─".repeat(*w));
    }
    line.push(right);
    line
}

/// Hour-by-hour table of one series.
pub fn turnout_table(labels: RoundLabels<'_>, series: &TurnoutSeries) -> String {
    let widths = [TIME_W, ROUND_W, ROUND_W, DIFF_W, HOURLY_W, DELTA_W];
    let stats = turnout_stats(series);
    let mut lines = Vec::new();

    lines.push("-".repeat(TABLE_WIDTH));
    lines.push(format!("{:-^TABLE_WIDTH$}", format!("  DATA FOR {}  ", series.scope)));
    lines.push("-".repeat(TABLE_WIDTH));

    lines.push(rule('┌', '┬', '┐', &widths));
    lines.push(format!(
        "│{:^TIME_W$}│{:^ROUND_W$}│{:^ROUND_W$}│{:^DIFF_W$}│{:^HOURLY_W$}│{:^DELTA_W$}│",
        " Time ",
        format!(" {} ", labels.current),
        format!(" {} ", labels.previous),
        " Difference ",
        " Hourly gain ",
        " Delta "
    ));
    lines.push(rule('├', '┼', '┤', &widths));

    for (i, sample) in series.samples.iter().enumerate() {
        let hourly = if i == 0 {
            "N/A".to_string()
        } else {
            signed(stats.hourly_increases[i])
        };
        lines.push(format!(
            "│{:^TIME_W$}│{:>ROUND_W$}│{:>ROUND_W$}│{:>DIFF_W$}│{:^HOURLY_W$}│{:^DELTA_W$}│",
            slot_text(sample.slot),
            group_thousands(sample.current),
            group_thousands(sample.previous),
            signed(sample.difference()),
            hourly,
            delta_text(stats.delta_percents[i]),
        ));
    }

    lines.push(rule('└', '┴', '┘', &widths));
    lines.join("\n")
}

/// One line per scope with its latest figures.
pub fn overview_table(
    labels: RoundLabels<'_>,
    slot: Option<NaiveDateTime>,
    rows: &[(String, LatestFigures)],
) -> String {
    let mut lines = Vec::new();
    let time = slot.map(slot_text).unwrap_or_else(|| "-".to_string());

    lines.push("=".repeat(OVERVIEW_WIDTH));
    lines.push(format!(
        "{:<TIME_W$} {:<SCOPE_W$} {:>ROUND_W$} {:>ROUND_W$} {:>DIFF_W$} {:>HOURLY_W$} {:>DELTA_W$}",
        "Time", "Scope", labels.current, labels.previous, "Difference", "Hourly gain", "Delta"
    ));
    lines.push("-".repeat(OVERVIEW_WIDTH));

    for (label, figures) in rows {
        let name: String = label.chars().take(SCOPE_W).collect();
        let diff = figures.current as i64 - figures.previous as i64;
        let delta = (figures.previous > 0).then(|| diff as f64 * 100.0 / figures.previous as f64);
        lines.push(format!(
            "{:<TIME_W$} {:<SCOPE_W$} {:>ROUND_W$} {:>ROUND_W$} {:>DIFF_W$} {:>HOURLY_W$} {:>DELTA_W$}",
            time,
            name,
            group_thousands(figures.current),
            group_thousands(figures.previous),
            signed(diff),
            signed(figures.hourly_increase),
            delta_text(delta),
        ));
    }

    lines.push("=".repeat(OVERVIEW_WIDTH));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Scope, TurnoutSample};
    use chrono::NaiveDate;

    const LABELS: RoundLabels<'static> = RoundLabels {
        current: "Tur 2",
        previous: "Tur 1",
    };

    fn slot(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 18)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(signed(0), "+0");
        assert_eq!(signed(-1500), "-1,500");
        assert_eq!(delta_text(Some(12.345)), "+12.35%");
        assert_eq!(delta_text(None), "N/A");
    }

    #[test]
    fn test_turnout_table_rows() {
        let series = TurnoutSeries {
            scope: Scope::Total,
            samples: vec![
                TurnoutSample {
                    slot: slot(7),
                    current: 1000,
                    previous: 0,
                },
                TurnoutSample {
                    slot: slot(8),
                    current: 2500,
                    previous: 2000,
                },
            ],
        };
        let table = turnout_table(LABELS, &series);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[1].contains("DATA FOR TOTAL"));
        assert_eq!(lines[1].chars().count(), TABLE_WIDTH);
        assert!(lines[4].contains("Tur 2"));
        assert!(lines[6].contains("[18 07:01]"));
        assert!(lines[6].contains("N/A"));
        assert!(lines[7].contains("2,500"));
        assert!(lines[7].contains("+1,500"));
        assert!(lines[7].contains("+25.00%"));
        assert!(lines[8].starts_with('└'));
        // every table row has the same width
        let width = lines[3].chars().count();
        assert!(lines[3..].iter().all(|l| l.chars().count() == width));
    }

    #[test]
    fn test_overview_table() {
        let rows = vec![(
            "GERMANIA".to_string(),
            LatestFigures {
                current: 300,
                previous: 200,
                hourly_increase: 40,
            },
        )];
        let table = overview_table(LABELS, Some(slot(9)), &rows);
        assert!(table.contains("GERMANIA"));
        assert!(table.contains("+50.00%"));
        assert!(table.contains("+40"));
        assert!(table.contains("[18 09:01]"));
    }
}
