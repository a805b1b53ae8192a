//! Data fetcher: cache-first access to election results and turnout series.

use super::cache::ResultCache;
use super::error::{MonitorError, Result};
use super::model::{CountryId, ElectionResult, Scope, TurnoutSample, TurnoutSeries};
use super::presence::{Coverage, Endpoint, PresenceDocument, Round};
use super::source::PresenceSource;
use crate::config::Config;
use chrono::{Duration, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DataFetcher {
    source: Arc<dyn PresenceSource>,
    cache: ResultCache,
    config: Config,
    /// Documents already requested during the current update pass.
    memo: HashMap<String, PresenceDocument>,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn PresenceSource>, cache: ResultCache, config: Config) -> Self {
        Self {
            source,
            cache,
            config,
            memo: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a new update pass; later requests go to the source again.
    pub fn begin_update(&mut self) {
        self.memo.clear();
    }

    pub fn is_cached(&self, country: &CountryId) -> bool {
        self.cache.get(country).is_some()
    }

    /// Cached result if there is one, otherwise a fresh fetch.
    pub async fn fetch_result(&mut self, country: &CountryId) -> Result<ElectionResult> {
        if let Some(result) = self.cache.get(country) {
            debug!(%country, "cache hit");
            return Ok(result.clone());
        }
        self.refresh_result(country).await
    }

    /// Always fetch. The cache entry is replaced only on success.
    pub async fn refresh_result(&mut self, country: &CountryId) -> Result<ElectionResult> {
        let endpoint = if country.is_domestic() {
            Endpoint::Live(Coverage::All)
        } else {
            Endpoint::Live(Coverage::Abroad)
        };
        let url = endpoint.url(&self.config);
        info!(%country, %url, "fetching result");

        let doc = self.document(&url).await?;
        let tallies = if country.is_domestic() {
            doc.domestic_tallies()?
        } else {
            doc.country_tallies(country.as_str())?
        };
        if tallies.is_empty() {
            return Err(MonitorError::NotFound(country.to_string()));
        }

        let result = ElectionResult {
            country: country.clone(),
            tallies,
            retrieved_at: Utc::now(),
        };
        self.cache.put(result.clone(), url)?;
        Ok(result)
    }

    /// Countries with polling stations abroad, busiest first.
    ///
    /// Served from the cache when possible; falls back to the configured list
    /// when the feed cannot be read.
    pub async fn countries(&mut self, refresh: bool) -> Vec<CountryId> {
        if refresh {
            self.cache.clear_countries();
        }
        if let Some(list) = self.cache.countries() {
            debug!(count = list.len(), "using cached country list");
            return list.iter().map(CountryId::new).collect();
        }

        let url = Endpoint::Live(Coverage::Abroad).url(&self.config);
        match self.document(&url).await.and_then(|d| d.country_names()) {
            Ok(names) if !names.is_empty() => {
                let list: Vec<String> = names.into_iter().map(|(name, _)| name).collect();
                info!(count = list.len(), "discovered countries");
                if let Err(e) = self.cache.set_countries(list.clone()) {
                    warn!(error = %e, "failed to cache country list");
                }
                return list.iter().map(CountryId::new).collect();
            }
            Ok(_) => warn!("feed lists no countries, using fallback list"),
            Err(e) => warn!(error = %e, "country discovery failed, using fallback list"),
        }

        let mut fallback: Vec<CountryId> = self
            .config
            .fallback_countries
            .iter()
            .map(CountryId::new)
            .collect();
        fallback.sort();
        fallback
    }

    /// Turnout of `scope` at each slot, compared with the previous round.
    pub async fn turnout(
        &mut self,
        scope: &Scope,
        slots: &[NaiveDateTime],
    ) -> Result<TurnoutSeries> {
        let offset = Duration::days(self.config.round_offset_days);
        let mut samples = Vec::with_capacity(slots.len());

        for &slot in slots {
            let current = self.snapshot_votes(scope, Round::Current, slot).await?;
            let previous = self.snapshot_votes(scope, Round::Previous, slot - offset).await?;
            samples.push(TurnoutSample {
                slot,
                current,
                previous,
            });
        }

        self.cache.flush()?;
        Ok(TurnoutSeries {
            scope: scope.clone(),
            samples,
        })
    }

    /// Latest overall count straight from the live document.
    pub async fn live_total(&mut self) -> Result<u64> {
        let url = Endpoint::Live(Coverage::All).url(&self.config);
        let doc = self.source.fetch(&url).await?;
        doc.county_total()
    }

    async fn snapshot_votes(
        &mut self,
        scope: &Scope,
        round: Round,
        slot: NaiveDateTime,
    ) -> Result<u64> {
        let all = Endpoint::Snapshot {
            round,
            coverage: Coverage::All,
            slot,
        }
        .url(&self.config);
        let abroad = Endpoint::Snapshot {
            round,
            coverage: Coverage::Abroad,
            slot,
        }
        .url(&self.config);

        let key = match scope {
            Scope::Total => format!("{scope}|{all}"),
            Scope::Country(_) => format!("{scope}|{abroad}"),
            Scope::Domestic => format!("{scope}|{all}|{abroad}"),
        };
        if let Some(votes) = self.cache.snapshot(&key) {
            return Ok(votes);
        }

        let extracted = match scope {
            Scope::Total => self.document(&all).await.and_then(|d| d.county_total()),
            Scope::Country(country) => self
                .document(&abroad)
                .await
                .and_then(|d| d.country_total(country.as_str())),
            Scope::Domestic => self.domestic_votes(&all, &abroad).await,
        };

        match extracted {
            Ok(votes) => {
                self.cache.put_snapshot(key, votes);
                Ok(votes)
            }
            // Not published yet; count as zero and ask again next time.
            Err(e) if e.is_not_found() => {
                debug!(%scope, %slot, "snapshot not published");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    async fn domestic_votes(&mut self, all_url: &str, abroad_url: &str) -> Result<u64> {
        let total = self.document(all_url).await?.county_total()?;
        let abroad = self.document(abroad_url).await?.abroad_total()?;
        Ok(total.saturating_sub(abroad))
    }

    async fn document(&mut self, url: &str) -> Result<PresenceDocument> {
        if let Some(doc) = self.memo.get(url) {
            return Ok(doc.clone());
        }
        let doc = self.source.fetch(url).await?;
        self.memo.insert(url.to_string(), doc.clone());
        Ok(doc)
    }
}
