//! Domain types shared by the fetcher, cache, processor and UI.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name the feed uses for domestic turnout.
pub const ROMANIA: &str = "ROMANIA";

/// Country identifier: upper-cased name as published by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(String);

impl CountryId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_domestic(&self) -> bool {
        self.0 == ROMANIA
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a result: a party, candidate or precinct and its votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub label: String,
    pub votes: u64,
}

impl Tally {
    pub fn new(label: impl Into<String>, votes: u64) -> Self {
        Self {
            label: label.into(),
            votes,
        }
    }
}

/// One country's election outcome as last retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResult {
    pub country: CountryId,
    pub tallies: Vec<Tally>,
    pub retrieved_at: DateTime<Utc>,
}

impl ElectionResult {
    pub fn total_votes(&self) -> u64 {
        self.tallies.iter().map(|t| t.votes).sum()
    }
}

/// Stored result plus the URL it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: ElectionResult,
    #[serde(default)]
    pub source_url: String,
}

/// What a turnout series is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Total,
    Domestic,
    Country(CountryId),
}

impl Scope {
    pub fn for_country(country: &CountryId) -> Self {
        if country.is_domestic() {
            Scope::Domestic
        } else {
            Scope::Country(country.clone())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Scope::Total => "TOTAL",
            Scope::Domestic => ROMANIA,
            Scope::Country(c) => c.as_str(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Votes at one hourly slot in both rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnoutSample {
    pub slot: NaiveDateTime,
    pub current: u64,
    pub previous: u64,
}

impl TurnoutSample {
    pub fn difference(&self) -> i64 {
        self.current as i64 - self.previous as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnoutSeries {
    pub scope: Scope,
    pub samples: Vec<TurnoutSample>,
}

impl TurnoutSeries {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_id_normalizes_case_and_whitespace() {
        assert_eq!(CountryId::new("  Germania ").as_str(), "GERMANIA");
        assert_eq!(CountryId::new("franța").as_str(), "FRANȚA");
        assert!(CountryId::new("romania").is_domestic());
    }

    #[test]
    fn test_scope_for_country() {
        assert_eq!(Scope::for_country(&CountryId::new(ROMANIA)), Scope::Domestic);
        let italy = CountryId::new("ITALIA");
        assert_eq!(Scope::for_country(&italy), Scope::Country(italy.clone()));
        assert_eq!(Scope::Total.label(), "TOTAL");
    }

    #[test]
    fn test_total_votes() {
        let result = ElectionResult {
            country: CountryId::new("SPANIA"),
            tallies: vec![Tally::new("Madrid", 120), Tally::new("Valencia", 80)],
            retrieved_at: Utc::now(),
        };
        assert_eq!(result.total_votes(), 200);
    }
}
