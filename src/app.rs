use crate::config::{Config, ConfigManager};
use crate::core::fetcher::DataFetcher;
use crate::core::model::CountryId;
use crate::core::monitor::{self, CountryView, HourCounter, LoadOutcome, LoadRequest};
use crate::core::processor::validate_country;
use crate::core::report::group_thousands;
use crate::core::schedule;
use crate::core::search::{display_name, search_countries};
use crate::ui::{summary, theme};
use chrono::{Local, NaiveDateTime, Timelike};
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::Mutex;
use tracing::{info, warn};

const MAX_SEARCH_RESULTS: usize = 50;

/// Results of background jobs, polled once per frame.
enum JobOutcome {
    Countries(Vec<CountryId>),
    Country {
        country: CountryId,
        outcome: LoadOutcome,
        scheduled: bool,
    },
}

/// Which country is shown and which one waits for the running job.
#[derive(Debug, Default)]
struct Selection {
    current: Option<CountryId>,
    pending: Option<CountryId>,
}

impl Selection {
    /// Country to load for a pick, if any. While a job runs the pick is
    /// queued; a pick of the country on screen loads nothing.
    fn pick(
        &mut self,
        country: CountryId,
        busy: bool,
        shown: Option<&CountryId>,
    ) -> Option<CountryId> {
        if busy {
            self.pending = Some(country);
            return None;
        }
        self.pending = None;
        if shown == Some(&country) {
            self.current = Some(country);
            return None;
        }
        Some(country)
    }

    /// Make `country` the selection once its job is running.
    fn commit(&mut self, country: CountryId) {
        self.current = Some(country);
    }

    fn take_pending(&mut self) -> Option<CountryId> {
        self.pending.take()
    }
}

/// Main application state.
pub struct ElectionMonitorApp {
    // Services
    config_manager: ConfigManager,
    fetcher: Arc<Mutex<DataFetcher>>,
    runtime: Runtime,

    // State
    config: Config,
    countries: Vec<CountryId>,
    selection: Selection,
    search_input: String,
    view: Option<CountryView>,
    live_total: Option<u64>,
    hour_counter: HourCounter,
    error: Option<String>,
    busy: bool,
    next_update: NaiveDateTime,

    // Communication
    sender: Sender<JobOutcome>,
    receiver: Receiver<JobOutcome>,

    status: String,
}

impl ElectionMonitorApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: Runtime,
        fetcher: DataFetcher,
        config_manager: ConfigManager,
    ) -> Self {
        theme::apply_dark_theme(&cc.egui_ctx);

        let config = fetcher.config().clone();
        let (sender, receiver) = channel();
        let now = Local::now().naive_local();

        let mut app = Self {
            config_manager,
            fetcher: Arc::new(Mutex::new(fetcher)),
            runtime,
            next_update: schedule::next_update(&config, now),
            config,
            countries: Vec::new(),
            selection: Selection::default(),
            search_input: String::new(),
            view: None,
            live_total: None,
            hour_counter: HourCounter::default(),
            error: None,
            busy: false,
            sender,
            receiver,
            status: "Ready".to_string(),
        };

        app.load_countries(&cc.egui_ctx, false);
        app
    }

    fn spawn_job<F>(&mut self, ctx: &egui::Context, job: F)
    where
        F: std::future::Future<Output = JobOutcome> + Send + 'static,
    {
        self.busy = true;
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = job.await;
            let _ = sender.send(outcome);
            ctx.request_repaint();
        });
    }

    fn load_countries(&mut self, ctx: &egui::Context, refresh: bool) {
        if self.busy {
            return;
        }
        self.status = "Loading country list...".to_string();
        let fetcher = self.fetcher.clone();
        self.spawn_job(ctx, async move {
            let mut fetcher = fetcher.lock().await;
            JobOutcome::Countries(monitor::country_choices(&mut fetcher, refresh).await)
        });
    }

    /// Start loading `country`. Returns false when no job was started.
    fn load_country(
        &mut self,
        ctx: &egui::Context,
        country: CountryId,
        refresh: bool,
        scheduled: bool,
    ) -> bool {
        if self.busy {
            return false;
        }
        if let Err(e) = validate_country(&country, &self.countries) {
            self.error = Some(e.to_string());
            return false;
        }

        self.error = None;
        self.status = format!("Loading {}...", display_name(&country));
        let request = LoadRequest {
            country,
            countries: self.countries.clone(),
            refresh,
            with_live_total: refresh || self.live_total.is_none(),
            now: Local::now().naive_local(),
        };
        let fetcher = self.fetcher.clone();
        self.spawn_job(ctx, async move {
            let mut fetcher = fetcher.lock().await;
            let outcome = monitor::run_load(&mut fetcher, &request).await;
            JobOutcome::Country {
                country: request.country,
                outcome,
                scheduled,
            }
        });
        true
    }

    fn select(&mut self, ctx: &egui::Context, country: CountryId) {
        let shown = self.view.as_ref().map(|v| &v.summary.country);
        let Some(country) = self.selection.pick(country, self.busy, shown) else {
            return;
        };
        if self.load_country(ctx, country.clone(), false, false) {
            self.config.last_country = country.to_string();
            self.selection.commit(country);
            self.save_config();
        }
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config_manager.save(&self.config) {
            warn!(error = %e, "failed to save config");
            self.status = format!("Failed to save config: {e}");
        }
    }

    fn poll_jobs(&mut self, ctx: &egui::Context) {
        loop {
            let Ok(outcome) = self.receiver.try_recv() else {
                break;
            };
            self.busy = false;
            match outcome {
                JobOutcome::Countries(countries) => {
                    self.status = format!("{} countries available", countries.len());
                    self.countries = countries;

                    // keep the selection if it is still offered
                    let last = Some(CountryId::new(&self.config.last_country))
                        .filter(|c| !c.as_str().is_empty());
                    let wanted = self
                        .selection
                        .take_pending()
                        .or_else(|| self.selection.current.clone())
                        .or(last)
                        .filter(|c| self.countries.contains(c))
                        .or_else(|| self.countries.first().cloned());
                    if let Some(country) = wanted {
                        if self.load_country(ctx, country.clone(), false, false) {
                            self.selection.commit(country);
                        }
                    }
                }
                JobOutcome::Country {
                    country,
                    outcome,
                    scheduled,
                } => {
                    if outcome.live_total.is_some() {
                        self.live_total = outcome.live_total;
                    }
                    match outcome.view {
                        Ok(view) => {
                            let source = if view.from_cache { "cache hit" } else { "fetched" };
                            self.status = format!("{} loaded ({source})", display_name(&country));
                            info!(%country, source, "view updated");
                            if let Some(total) = view.total_latest {
                                self.hour_counter.observe(total.current, scheduled);
                            }
                            self.view = Some(view);
                        }
                        // the previous view stays on screen
                        Err(e) => {
                            warn!(%country, error = %e, "load failed");
                            self.error = Some(e.to_string());
                            self.status = format!("Failed to load {}", display_name(&country));
                        }
                    }
                }
            }
        }

        if !self.busy {
            if let Some(country) = self.selection.take_pending() {
                self.select(ctx, country);
            }
        }
    }

    fn auto_refresh(&mut self, ctx: &egui::Context) {
        let now = Local::now().naive_local();
        if now >= self.next_update {
            self.next_update = schedule::next_update(&self.config, now);
            if self.config.auto_refresh && !self.busy {
                if let Some(country) = self.selection.current.clone() {
                    info!(%country, "scheduled refresh");
                    self.load_country(ctx, country, true, true);
                }
            }
        }
        ctx.request_repaint_after(schedule::until_next_update(&self.config, now));
    }

    fn toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Election Monitor");
            ui.separator();

            ui.label("Country:");
            let selected_text = self
                .selection
                .current
                .as_ref()
                .map(display_name)
                .unwrap_or_else(|| "Select country".to_string());
            let mut clicked = None;
            ui.add_enabled_ui(!self.busy, |ui| {
                egui::ComboBox::from_id_salt("country_selector")
                    .selected_text(selected_text)
                    .width(260.0)
                    .show_ui(ui, |ui| {
                        for country in &self.countries {
                            let is_selected = self.selection.current.as_ref() == Some(country);
                            if ui.selectable_label(is_selected, display_name(country)).clicked() {
                                clicked = Some(country.clone());
                            }
                        }
                    });
            });
            if let Some(country) = clicked {
                self.select(ctx, country);
            }

            ui.separator();

            let can_run = !self.busy && self.selection.current.is_some();
            if ui
                .add_enabled(can_run, egui::Button::new("🔄 Refresh"))
                .on_hover_text("Fetch fresh data for the selected country")
                .clicked()
            {
                if let Some(country) = self.selection.current.clone() {
                    self.load_country(ctx, country, true, false);
                }
            }
            if ui
                .add_enabled(!self.busy, egui::Button::new("🌍 Countries"))
                .on_hover_text("Rediscover the country list")
                .clicked()
            {
                self.load_countries(ctx, true);
            }

            ui.separator();

            if ui.checkbox(&mut self.config.auto_refresh, "Auto refresh").changed() {
                self.save_config();
            }

            if self.busy {
                ui.add(egui::Spinner::new());
            }
        });
    }

    fn sidebar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.label("Search");
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.search_input)
                .desired_width(f32::INFINITY)
                .hint_text("Country name"),
        );
        let matches = search_countries(&self.search_input, &self.countries, MAX_SEARCH_RESULTS);
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            if let Some(best) = matches.first().cloned() {
                self.select(ctx, best);
            }
        }

        ui.separator();

        let mut clicked = None;
        let current = self.selection.current.as_ref();
        let enabled = !self.busy;
        egui::ScrollArea::vertical()
            .id_salt("country_list")
            .show(ui, |ui| {
                ui.add_enabled_ui(enabled, |ui| {
                    ui.with_layout(egui::Layout::top_down_justified(egui::Align::Min), |ui| {
                        for country in &matches {
                            let is_selected = current == Some(country);
                            let mut text = egui::RichText::new(display_name(country));
                            if is_selected {
                                text = text.color(theme::GREEN).strong();
                            }
                            if ui.add(egui::SelectableLabel::new(is_selected, text)).clicked() {
                                clicked = Some(country.clone());
                            }
                        }
                        if matches.is_empty() {
                            ui.label(egui::RichText::new("No match").color(theme::muted_color()));
                        }
                    });
                });
            });
        if let Some(country) = clicked {
            self.select(ctx, country);
        }
    }

    fn content(&mut self, ui: &mut egui::Ui) {
        if let Some(ref error) = self.error {
            ui.colored_label(theme::error_color(), format!("Error: {}", error));
            ui.add_space(6.0);
        }

        let Some(view) = self.view.take() else {
            if self.busy {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label("Loading...");
                });
            } else {
                ui.label("Select a country to see its results.");
            }
            return;
        };

        let labels = (
            self.config.current_round.label.as_str(),
            self.config.previous_round.label.as_str(),
        );
        egui::ScrollArea::vertical()
            .id_salt("content_scroll")
            .show(ui, |ui| {
                ui.columns(2, |columns| {
                    summary::totals(&mut columns[0], &view, self.live_total);
                    columns[0].add_space(10.0);
                    summary::ranking(&mut columns[0], &view);

                    crate::ui::charts::bar_chart(&mut columns[1], "Votes by tally", &view.bars);
                });

                ui.separator();
                summary::turnout_chart(ui, &view.series, labels);
                ui.add_space(10.0);
                summary::turnout_chart(ui, &view.total_series, labels);
                ui.add_space(10.0);
                summary::stats_chart(ui, &view.total_series, &view.total_stats);

                ui.separator();
                summary::report(ui, &view, &mut self.status);
            });

        self.view = Some(view);
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("v{}", env!("CARGO_PKG_VERSION")));
                ui.separator();
                ui.label(format!("Next update: {}", self.next_update.format("%H:%M:%S")));
                if let Some(new_votes) = self.hour_counter.new_votes(self.live_total) {
                    ui.separator();
                    ui.label(format!(
                        "New votes since {:02}:00: +{}",
                        Local::now().hour(),
                        group_thousands(new_votes)
                    ));
                }
                if let Some(ref view) = self.view {
                    ui.separator();
                    let (text, color) = if view.from_cache {
                        ("cache hit", theme::success_color())
                    } else {
                        ("cache miss", theme::muted_color())
                    };
                    ui.colored_label(color, text);
                }
            });
        });
    }
}

impl eframe::App for ElectionMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs(ctx);
        self.auto_refresh(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ctx, ui);
        });

        egui::TopBottomPanel::bottom("statusbar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::SidePanel::left("sidebar")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                self.sidebar(ctx, ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.content(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CountryId {
        CountryId::new(name)
    }

    #[test]
    fn test_pick_while_busy_is_queued() {
        let mut selection = Selection::default();
        selection.commit(id("ITALIA"));

        assert_eq!(selection.pick(id("FRANȚA"), true, Some(&id("ITALIA"))), None);
        // the dropdown keeps showing what is on screen
        assert_eq!(selection.current, Some(id("ITALIA")));

        // the last pick wins
        assert_eq!(selection.pick(id("SPANIA"), true, Some(&id("ITALIA"))), None);
        assert_eq!(selection.take_pending(), Some(id("SPANIA")));
        assert_eq!(selection.take_pending(), None);
    }

    #[test]
    fn test_pick_when_idle() {
        let mut selection = Selection::default();
        selection.commit(id("ITALIA"));

        assert_eq!(
            selection.pick(id("FRANȚA"), false, Some(&id("ITALIA"))),
            Some(id("FRANȚA"))
        );
        // committed only once the job is running
        assert_eq!(selection.current, Some(id("ITALIA")));
        selection.commit(id("FRANȚA"));
        assert_eq!(selection.current, Some(id("FRANȚA")));
    }

    #[test]
    fn test_pick_of_shown_country_loads_nothing() {
        let mut selection = Selection::default();
        // a failed load left the dropdown on FRANȚA while ITALIA is shown
        selection.commit(id("FRANȚA"));

        assert_eq!(selection.pick(id("ITALIA"), false, Some(&id("ITALIA"))), None);
        assert_eq!(selection.current, Some(id("ITALIA")));
        assert_eq!(selection.take_pending(), None);
    }
}
