//! Composes fetcher and processor into the view the window displays.

use super::error::Result;
use super::fetcher::DataFetcher;
use super::model::{CountryId, Scope, TurnoutSeries, ROMANIA};
use super::processor::{
    chart_bars, latest, summarize, turnout_stats, ChartBar, LatestFigures, ResultSummary,
    TurnoutStats,
};
use super::report::{overview_table, turnout_table, RoundLabels};
use super::schedule::vote_slots;
use super::search::display_name;
use chrono::NaiveDateTime;
use tracing::{info, warn};

/// Bars shown in the tally chart before the rest is folded.
pub const MAX_BARS: usize = 12;

/// Overview row of domestic turnout.
pub const DOMESTIC_ROW_LABEL: &str = "ROMANIA (excl. abroad)";

/// Everything the window shows for one selected country.
#[derive(Debug, Clone)]
pub struct CountryView {
    pub summary: ResultSummary,
    pub bars: Vec<ChartBar>,
    pub series: TurnoutSeries,
    pub stats: TurnoutStats,
    pub total_series: TurnoutSeries,
    pub total_stats: TurnoutStats,
    pub latest: Option<LatestFigures>,
    pub total_latest: Option<LatestFigures>,
    /// Latest figures of every country, then domestic, then the total.
    pub overview: Vec<(String, LatestFigures)>,
    /// Text tables for the summary panel and clipboard.
    pub report: String,
    /// The result came from the cache without a network call.
    pub from_cache: bool,
    pub loaded_at: NaiveDateTime,
}

/// Load the result and both turnout series of `country` as of `now`, plus
/// the overview across `countries`.
pub async fn load_country(
    fetcher: &mut DataFetcher,
    country: &CountryId,
    countries: &[CountryId],
    refresh: bool,
    now: NaiveDateTime,
) -> Result<CountryView> {
    fetcher.begin_update();

    let from_cache = !refresh && fetcher.is_cached(country);
    let result = if refresh {
        fetcher.refresh_result(country).await?
    } else {
        fetcher.fetch_result(country).await?
    };
    let summary = summarize(&result);
    let bars = chart_bars(&summary, MAX_BARS);

    let slots = vote_slots(fetcher.config(), now);
    let scope = Scope::for_country(country);
    let series = fetcher.turnout(&scope, &slots).await?;
    let total_series = fetcher.turnout(&Scope::Total, &slots).await?;
    let overview = overview_rows(fetcher, countries, &slots).await?;
    info!(%country, slots = slots.len(), rows = overview.len(), from_cache, "country view loaded");

    let config = fetcher.config();
    let labels = RoundLabels {
        current: &config.current_round.label,
        previous: &config.previous_round.label,
    };
    let last_slot = slots.last().copied();
    let report = [
        overview_table(labels, last_slot, &overview),
        turnout_table(labels, &series),
        turnout_table(labels, &total_series),
    ]
    .join("\n\n");

    Ok(CountryView {
        summary,
        bars,
        stats: turnout_stats(&series),
        total_stats: turnout_stats(&total_series),
        latest: latest(&series),
        total_latest: latest(&total_series),
        series,
        total_series,
        overview,
        report,
        from_cache,
        loaded_at: now,
    })
}

/// Latest figures per country abroad, then domestic, then the total.
async fn overview_rows(
    fetcher: &mut DataFetcher,
    countries: &[CountryId],
    slots: &[NaiveDateTime],
) -> Result<Vec<(String, LatestFigures)>> {
    // the last two slots are enough for the latest figures
    let tail = &slots[slots.len().saturating_sub(2)..];

    let mut scopes: Vec<(String, Scope)> = countries
        .iter()
        .filter(|c| !c.is_domestic())
        .map(|c| (display_name(c), Scope::Country(c.clone())))
        .collect();
    scopes.push((DOMESTIC_ROW_LABEL.to_string(), Scope::Domestic));
    scopes.push((Scope::Total.to_string(), Scope::Total));

    let mut rows = Vec::with_capacity(scopes.len());
    for (label, scope) in scopes {
        let series = fetcher.turnout(&scope, tail).await?;
        if let Some(figures) = latest(&series) {
            rows.push((label, figures));
        }
    }
    Ok(rows)
}

/// One load job of the window.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub country: CountryId,
    /// Countries listed in the overview.
    pub countries: Vec<CountryId>,
    pub refresh: bool,
    /// Also read the live total, which always goes to the network.
    pub with_live_total: bool,
    pub now: NaiveDateTime,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub view: Result<CountryView>,
    pub live_total: Option<u64>,
}

pub async fn run_load(fetcher: &mut DataFetcher, request: &LoadRequest) -> LoadOutcome {
    let view = load_country(
        fetcher,
        &request.country,
        &request.countries,
        request.refresh,
        request.now,
    )
    .await;

    let live_total = if request.with_live_total {
        match fetcher.live_total().await {
            Ok(total) => Some(total),
            Err(e) => {
                warn!(error = %e, "live total unavailable");
                None
            }
        }
    } else {
        None
    };

    LoadOutcome { view, live_total }
}

/// Votes counted since the start of the current hour.
///
/// The baseline is the total of the latest published slot. It is taken on
/// the first load and moved at every scheduled update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HourCounter {
    baseline: Option<u64>,
}

impl HourCounter {
    pub fn observe(&mut self, slot_total: u64, scheduled: bool) {
        if scheduled || matches!(self.baseline, None | Some(0)) {
            self.baseline = Some(slot_total);
        }
    }

    pub fn new_votes(&self, live_total: Option<u64>) -> Option<u64> {
        let baseline = self.baseline.filter(|b| *b > 0)?;
        Some(live_total?.saturating_sub(baseline))
    }
}

/// Dropdown entries: domestic first, then the countries abroad.
pub async fn country_choices(fetcher: &mut DataFetcher, refresh: bool) -> Vec<CountryId> {
    fetcher.begin_update();
    let mut choices = vec![CountryId::new(ROMANIA)];
    choices.extend(
        fetcher
            .countries(refresh)
            .await
            .into_iter()
            .filter(|c| !c.is_domestic()),
    );
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::cache::tests::temp_cache_path;
    use crate::core::cache::ResultCache;
    use crate::core::presence::{Coverage, Endpoint, Round};
    use crate::core::test_support::FakeSource;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;
    use std::sync::Arc;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 18)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn setup() -> (Arc<FakeSource>, DataFetcher) {
        let source = Arc::new(FakeSource::new());
        let mut config = Config::default();
        // a two-slot window keeps the request counts readable
        config.vote_start = at(7, 0);
        config.vote_end = at(21, 0);
        let fetcher = DataFetcher::new(source.clone(), ResultCache::open(temp_cache_path()), config);

        let config = fetcher.config().clone();
        source.insert(
            Endpoint::Live(Coverage::Abroad).url(&config),
            json!({ "precinct": [
                { "name": "Paris 1", "uat": { "name": "FRANȚA" }, "LT": 40 },
                { "name": "Lyon", "uat": { "name": "FRANȚA" }, "LT": 15 },
                { "name": "Paris 2", "uat": { "name": "FRANȚA" }, "LT": 25 },
                { "name": "Roma", "uat": { "name": "ITALIA" }, "LT": 90 }
            ] }),
        );
        for hour in [7, 8] {
            let slot = at(hour, 0);
            let prev = slot - Duration::days(config.round_offset_days);
            let n = u64::from(hour);
            for (round, when) in [(Round::Current, slot), (Round::Previous, prev)] {
                source.insert(
                    Endpoint::Snapshot { round, coverage: Coverage::All, slot: when }.url(&config),
                    json!({ "county": [ { "code": "B", "LT": 100 * n } ] }),
                );
                source.insert(
                    Endpoint::Snapshot { round, coverage: Coverage::Abroad, slot: when }.url(&config),
                    json!({ "precinct": [ { "uat": { "name": "FRANȚA" }, "LT": 10 * n } ] }),
                );
            }
        }
        (source, fetcher)
    }

    fn countries() -> Vec<CountryId> {
        vec![
            CountryId::new(ROMANIA),
            CountryId::new("ITALIA"),
            CountryId::new("FRANȚA"),
        ]
    }

    fn request(country: &str, with_live_total: bool) -> LoadRequest {
        LoadRequest {
            country: CountryId::new(country),
            countries: countries(),
            refresh: false,
            with_live_total,
            now: at(8, 30),
        }
    }

    #[tokio::test]
    async fn test_load_country_first_time_then_cached() {
        let (source, mut fetcher) = setup();
        let france = CountryId::new("FRANȚA");

        let first = load_country(&mut fetcher, &france, &countries(), false, at(8, 30)).await.unwrap();
        assert!(!first.from_cache);
        assert!(fetcher.is_cached(&france));
        let requests = source.request_count();

        let second = load_country(&mut fetcher, &france, &countries(), false, at(8, 30)).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(source.request_count(), requests);
        assert_eq!(second.summary, first.summary);
    }

    #[tokio::test]
    async fn test_chart_totals_match_result() {
        let (_source, mut fetcher) = setup();
        let france = CountryId::new("FRANȚA");

        let view = load_country(&mut fetcher, &france, &countries(), false, at(8, 30)).await.unwrap();
        let result = fetcher.cache().get(&france).unwrap();
        assert_eq!(view.summary.total_votes, result.total_votes());
        assert_eq!(view.bars.iter().map(|b| b.votes).sum::<u64>(), result.total_votes());
        assert_eq!(view.bars[0].label, "Paris 1");
    }

    #[tokio::test]
    async fn test_view_series_and_report() {
        let (_source, mut fetcher) = setup();
        let view = load_country(&mut fetcher, &CountryId::new("FRANȚA"), &countries(), false, at(8, 30))
            .await
            .unwrap();

        assert_eq!(view.series.scope, Scope::Country(CountryId::new("FRANȚA")));
        assert_eq!(view.series.samples.len(), 2);
        assert_eq!(view.series.samples[1].current, 80);
        assert_eq!(view.total_series.samples[1].current, 800);
        assert_eq!(view.total_latest.unwrap().hourly_increase, 100);
        assert_eq!(view.stats.hourly_increases, vec![0, 10]);
        assert!(view.report.contains("DATA FOR FRANȚA"));
        assert!(view.report.contains("DATA FOR TOTAL"));
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let (source, mut fetcher) = setup();
        let italy = CountryId::new("ITALIA");
        load_country(&mut fetcher, &italy, &countries(), false, at(6, 0)).await.unwrap();
        let requests = source.request_count();

        let view = load_country(&mut fetcher, &italy, &countries(), true, at(6, 0)).await.unwrap();
        assert!(!view.from_cache);
        assert_eq!(source.request_count(), requests + 1);
        assert!(view.series.is_empty());
    }

    #[tokio::test]
    async fn test_country_choices_start_with_domestic() {
        let (_source, mut fetcher) = setup();
        let choices = country_choices(&mut fetcher, false).await;
        assert_eq!(
            choices,
            vec![
                CountryId::new(ROMANIA),
                CountryId::new("ITALIA"),
                CountryId::new("FRANȚA")
            ]
        );
    }

    #[tokio::test]
    async fn test_overview_lists_every_scope() {
        let (_source, mut fetcher) = setup();
        let view = load_country(&mut fetcher, &CountryId::new("ITALIA"), &countries(), false, at(8, 30))
            .await
            .unwrap();

        let labels: Vec<&str> = view.overview.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["ITALIA", "FRANȚA", DOMESTIC_ROW_LABEL, "TOTAL"]);

        let france = &view.overview[1].1;
        assert_eq!(france.current, 80);
        assert_eq!(france.hourly_increase, 10);
        // 800 counted in total minus 80 abroad
        assert_eq!(view.overview[2].1.current, 720);
        assert_eq!(view.overview[3].1.current, 800);
        assert!(view.report.contains(DOMESTIC_ROW_LABEL));
    }

    #[tokio::test]
    async fn test_reselecting_without_live_total_stays_offline() {
        let (source, mut fetcher) = setup();
        source.insert(
            Endpoint::Live(Coverage::All).url(fetcher.config()),
            json!({ "county": [ { "code": "B", "LT": 900 } ] }),
        );

        let first = run_load(&mut fetcher, &request("FRANȚA", true)).await;
        assert_eq!(first.live_total, Some(900));
        let requests = source.request_count();

        let again = run_load(&mut fetcher, &request("FRANȚA", false)).await;
        assert!(again.view.unwrap().from_cache);
        assert_eq!(again.live_total, None);
        assert_eq!(source.request_count(), requests);
    }

    #[test]
    fn test_hour_counter() {
        let mut counter = HourCounter::default();
        assert_eq!(counter.new_votes(Some(100)), None);

        counter.observe(1000, false);
        assert_eq!(counter.new_votes(Some(1250)), Some(250));
        assert_eq!(counter.new_votes(None), None);

        // only a scheduled update moves an existing baseline
        counter.observe(1200, false);
        assert_eq!(counter.new_votes(Some(1250)), Some(250));
        counter.observe(1200, true);
        assert_eq!(counter.new_votes(Some(1250)), Some(50));
        assert_eq!(counter.new_votes(Some(1100)), Some(0));
    }
}
