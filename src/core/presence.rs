//! Wire format of the presence feed and the URLs it is published under.
//!
//! A presence document carries a `county` array (one entry per county, `SR`
//! being the abroad pseudo-county), a `precinct` array (one entry per polling
//! station) or both. `LT` is the number of people who voted so far.

use super::error::{MonitorError, Result};
use super::model::{Tally, ROMANIA};
use crate::config::Config;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Code of the abroad pseudo-county in the total document.
pub const ABROAD_COUNTY_CODE: &str = "SR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresenceDocument {
    #[serde(default)]
    pub county: Option<Vec<CountyPresence>>,
    #[serde(default)]
    pub precinct: Option<Vec<PrecinctPresence>>,
    #[serde(default)]
    pub totalv: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountyPresence {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "LT", default)]
    pub lt: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecinctPresence {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uat: Option<UatRef>,
    #[serde(rename = "LT", default)]
    pub lt: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UatRef {
    #[serde(default)]
    pub name: Option<String>,
}

impl PrecinctPresence {
    fn uat_name(&self) -> Option<&str> {
        self.uat
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    fn belongs_to(&self, country: &str) -> bool {
        self.uat_name()
            .map(|n| n.eq_ignore_ascii_case(country) || n.to_uppercase() == country)
            .unwrap_or(false)
    }
}

impl PresenceDocument {
    fn counties(&self) -> Result<&[CountyPresence]> {
        self.county
            .as_deref()
            .ok_or_else(|| MonitorError::MalformedData("document has no county list".to_string()))
    }

    fn precincts(&self) -> Result<&[PrecinctPresence]> {
        self.precinct
            .as_deref()
            .ok_or_else(|| MonitorError::MalformedData("document has no precinct list".to_string()))
    }

    /// Sum of `LT` over all counties.
    pub fn county_total(&self) -> Result<u64> {
        Ok(self.counties()?.iter().map(|c| c.lt).sum())
    }

    /// Votes cast abroad. Precinct sum when present, otherwise `totalv`,
    /// otherwise the county sum.
    pub fn abroad_total(&self) -> Result<u64> {
        if let Some(precincts) = &self.precinct {
            return Ok(precincts.iter().map(|p| p.lt).sum());
        }
        match (self.totalv, &self.county) {
            (Some(total), _) if total > 0 => Ok(total),
            (_, Some(counties)) => Ok(counties.iter().map(|c| c.lt).sum()),
            (Some(total), None) => Ok(total),
            (None, None) => Err(MonitorError::MalformedData(
                "document has neither precincts, totalv nor counties".to_string(),
            )),
        }
    }

    /// Votes in all precincts located in `country`.
    pub fn country_total(&self, country: &str) -> Result<u64> {
        Ok(self
            .precincts()?
            .iter()
            .filter(|p| p.belongs_to(country))
            .map(|p| p.lt)
            .sum())
    }

    /// Precinct tallies for `country`, grouped by precinct name in feed order.
    pub fn country_tallies(&self, country: &str) -> Result<Vec<Tally>> {
        let mut tallies: Vec<Tally> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (i, precinct) in self
            .precincts()?
            .iter()
            .filter(|p| p.belongs_to(country))
            .enumerate()
        {
            let label = precinct
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Precinct #{}", i + 1));

            match index.get(&label) {
                Some(&pos) => tallies[pos].votes += precinct.lt,
                None => {
                    index.insert(label.clone(), tallies.len());
                    tallies.push(Tally::new(label, precinct.lt));
                }
            }
        }

        Ok(tallies)
    }

    /// County tallies for domestic turnout (abroad pseudo-county excluded).
    pub fn domestic_tallies(&self) -> Result<Vec<Tally>> {
        Ok(self
            .counties()?
            .iter()
            .filter(|c| c.code.as_deref() != Some(ABROAD_COUNTY_CODE))
            .map(|c| {
                let label = c
                    .name
                    .clone()
                    .or_else(|| c.code.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                Tally::new(label, c.lt)
            })
            .collect())
    }

    /// Countries appearing in the precinct list with their vote totals,
    /// highest first. Domestic entries and blanks are skipped.
    pub fn country_names(&self) -> Result<Vec<(String, u64)>> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for precinct in self.precincts()? {
            if let Some(name) = precinct.uat_name() {
                let name = name.to_uppercase();
                if name == ROMANIA {
                    continue;
                }
                *totals.entry(name).or_insert(0) += precinct.lt;
            }
        }

        let mut names: Vec<(String, u64)> = totals.into_iter().collect();
        names.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(names)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Round {
    Current,
    Previous,
}

/// Which polling stations a document covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coverage {
    All,
    Abroad,
}

impl Coverage {
    fn prefix(self) -> &'static str {
        match self {
            Coverage::All => "",
            Coverage::Abroad => "sr_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Live(Coverage),
    Snapshot {
        round: Round,
        coverage: Coverage,
        slot: NaiveDateTime,
    },
}

impl Endpoint {
    pub fn url(&self, config: &Config) -> String {
        let base = config.api_base_url.trim_end_matches('/');
        let (round, file) = match *self {
            Endpoint::Live(coverage) => (
                Round::Current,
                format!("presence_{}now.json", coverage.prefix()),
            ),
            Endpoint::Snapshot {
                round,
                coverage,
                slot,
            } => (
                round,
                format!(
                    "presence_{}{}.json",
                    coverage.prefix(),
                    slot.format("%Y-%m-%d_%H-00")
                ),
            ),
        };
        let code = match round {
            Round::Current => &config.current_round.code,
            Round::Previous => &config.previous_round.code,
        };
        format!("{base}/prezidentiale{code}/data/json/simpv/presence/{file}")
    }
}
