//! Reshapes fetched data into what the charts and summary panel display.
//!
//! Everything here is pure; failures on bad input are raised earlier, when
//! the presence document is read.

use super::error::{MonitorError, Result};
use super::model::{CountryId, ElectionResult, TurnoutSeries};
use chrono::{DateTime, Utc};

/// Label of the bar that folds everything past the top bars.
pub const OTHERS_LABEL: &str = "OTHERS";

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTally {
    pub rank: usize,
    pub label: String,
    pub votes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub country: CountryId,
    pub total_votes: u64,
    pub rows: Vec<RankedTally>,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub votes: u64,
    pub percent: f64,
}

/// Per-slot statistics of a turnout series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnoutStats {
    /// Growth over the previous round in percent; `None` when the previous
    /// round had no votes yet at that slot.
    pub delta_percents: Vec<Option<f64>>,
    /// Votes gained since the previous slot; 0 for the first slot.
    pub hourly_increases: Vec<i64>,
}

/// Figures of the most recent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestFigures {
    pub current: u64,
    pub previous: u64,
    pub hourly_increase: i64,
}

fn percent_of(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 * 100.0 / total as f64
    }
}

/// Rank tallies by votes (ties by label) and attach their share of the total.
pub fn summarize(result: &ElectionResult) -> ResultSummary {
    let total_votes = result.total_votes();

    let mut sorted: Vec<_> = result.tallies.iter().collect();
    sorted.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.label.cmp(&b.label)));

    let rows = sorted
        .into_iter()
        .enumerate()
        .map(|(i, t)| RankedTally {
            rank: i + 1,
            label: t.label.clone(),
            votes: t.votes,
            percent: percent_of(t.votes, total_votes),
        })
        .collect();

    ResultSummary {
        country: result.country.clone(),
        total_votes,
        rows,
        retrieved_at: result.retrieved_at,
    }
}

/// Top `max_bars` rows; the rest is folded into one bar so the bars always
/// add up to the summary total.
pub fn chart_bars(summary: &ResultSummary, max_bars: usize) -> Vec<ChartBar> {
    let max_bars = max_bars.max(1);
    let bar = |label: &str, votes: u64| ChartBar {
        label: label.to_string(),
        votes,
        percent: percent_of(votes, summary.total_votes),
    };

    if summary.rows.len() <= max_bars {
        return summary.rows.iter().map(|r| bar(&r.label, r.votes)).collect();
    }

    let keep = max_bars - 1;
    let mut bars: Vec<ChartBar> = summary.rows[..keep]
        .iter()
        .map(|r| bar(&r.label, r.votes))
        .collect();
    let rest: u64 = summary.rows[keep..].iter().map(|r| r.votes).sum();
    bars.push(bar(OTHERS_LABEL, rest));
    bars
}

pub fn turnout_stats(series: &TurnoutSeries) -> TurnoutStats {
    let samples = &series.samples;
    let delta_percents = samples
        .iter()
        .map(|s| {
            (s.previous > 0).then(|| s.difference() as f64 * 100.0 / s.previous as f64)
        })
        .collect();
    let hourly_increases = samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == 0 {
                0
            } else {
                s.current as i64 - samples[i - 1].current as i64
            }
        })
        .collect();

    TurnoutStats {
        delta_percents,
        hourly_increases,
    }
}

/// Last slot of the series. For a single slot the increase is the whole count.
pub fn latest(series: &TurnoutSeries) -> Option<LatestFigures> {
    let last = series.samples.last()?;
    let hourly_increase = match series.samples.len() {
        1 => last.current as i64,
        n => last.current as i64 - series.samples[n - 2].current as i64,
    };
    Some(LatestFigures {
        current: last.current,
        previous: last.previous,
        hourly_increase,
    })
}

/// Reject a selection that is not one of the offered countries.
pub fn validate_country(selected: &CountryId, valid: &[CountryId]) -> Result<()> {
    if valid.contains(selected) {
        Ok(())
    } else {
        Err(MonitorError::InvalidCountry(selected.to_string()))
    }
}
