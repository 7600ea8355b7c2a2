use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use env_logger::Env;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

use wattbook::cli::{
    Args, Command, DataCmd, DayArgs, EquipmentCmd, MeterCmd, ReadingArgs, SettingsCmd, UsageCmd,
};
use wattbook::display::{
    build_daily_quote_json, build_equipment_json, build_interval_json, build_meter_history_json,
    build_meter_month_json, build_meter_record_json, build_monthly_summary_json,
    build_usage_history_json, build_usage_record_json, print_json, render_billing_settings,
    render_daily_quote, render_equipment_list, render_interval, render_meter_history,
    render_meter_month, render_meter_record, render_meter_settings, render_monthly_summary,
    render_usage_history, render_usage_record,
};
use wattbook::meter::{MeterError, MeterTracker};
use wattbook::models::{ImportBundle, MeterForm};
use wattbook::service::{DataService, MeterService};
use wattbook::store::{Backend, LocalStore, StoreConfig, StoreResult, open_store};
use wattbook::usage::{UsageError, UsageTracker};
use wattbook::utils::{now_millis, today};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = StoreConfig {
        db_path: args.db_path.clone(),
        api_url: args.api_url.clone(),
    };
    let out = Output { json: args.json };
    let backend = Backend::from(args.backend);
    log::debug!("backend={backend} api_url={}", config.api_url);

    match args.command {
        Command::Meter(cmd) => run_meter(cmd, &config, out),
        Command::Data(cmd) => run_data(cmd, backend, &config, out),
        Command::Equipment(cmd) => Calculator::open(backend, &config, out)?.equipment(cmd),
        Command::Usage(cmd) => Calculator::open(backend, &config, out)?.usage(cmd),
        Command::Settings(cmd) => Calculator::open(backend, &config, out)?.settings(cmd),
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn emit(self, json: impl FnOnce() -> Value, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            print_json(&json())
        } else {
            println!("{}", text());
            Ok(())
        }
    }
}

/// Auto-save: failures are logged, the command still succeeds
fn persist(what: &str, result: StoreResult<()>) {
    if let Err(e) = result {
        log::warn!("could not save {what}: {e}");
    }
}

fn rate(value: f64, what: &str) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        bail!("{what} must be zero or more, got {value}");
    }
    Ok(value)
}

fn load_hint(backend: Backend) -> String {
    format!("could not load data from the {backend} backend; check that it is reachable and try again")
}

struct Calculator {
    service: DataService,
    tracker: UsageTracker,
    out: Output,
}

impl Calculator {
    fn open(backend: Backend, config: &StoreConfig, out: Output) -> Result<Self> {
        let store = open_store(backend, config).with_context(|| format!("open {backend} store"))?;
        let service = DataService::new(store);
        let snapshot = service.load().with_context(|| load_hint(backend))?;
        log::debug!(
            "loaded {} equipment, {} history records",
            snapshot.equipment.len(),
            snapshot.usage_history.len()
        );
        Ok(Self {
            service,
            tracker: UsageTracker::from(snapshot),
            out,
        })
    }

    fn equipment(&mut self, cmd: EquipmentCmd) -> Result<()> {
        match cmd {
            EquipmentCmd::List => {}
            EquipmentCmd::Add { name, watts } => {
                self.tracker.add_equipment(&name, watts, now_millis())?;
                persist("equipment", self.service.save_equipment(&self.tracker.equipment));
            }
            EquipmentCmd::Remove { id } => {
                self.tracker
                    .remove_equipment(id)
                    .ok_or(UsageError::UnknownEquipment(id))?;
                persist("equipment", self.service.save_equipment(&self.tracker.equipment));
            }
        }
        let equipment = &self.tracker.equipment;
        self.out.emit(
            || build_equipment_json(equipment),
            || render_equipment_list(equipment),
        )
    }

    fn apply_day(&mut self, day: &DayArgs) -> Result<NaiveDate> {
        for &(id, hours) in &day.hours {
            self.tracker.set_hours(id, hours)?;
        }
        Ok(day.date.unwrap_or_else(today))
    }

    fn usage(&mut self, cmd: UsageCmd) -> Result<()> {
        match cmd {
            UsageCmd::Quote(day) => {
                let date = self.apply_day(&day)?;
                let tracker = &self.tracker;
                self.out.emit(
                    || build_daily_quote_json(tracker, date),
                    || render_daily_quote(tracker, date),
                )
            }
            UsageCmd::Save(day) => {
                let date = self.apply_day(&day)?;
                let record = self.tracker.save_daily_usage(date, Utc::now())?.clone();
                persist(
                    "usage history",
                    self.service.save_usage_history(&self.tracker.history),
                );
                self.out.emit(
                    || build_usage_record_json(&record),
                    || render_usage_record(&record),
                )
            }
            UsageCmd::History => {
                let tracker = &self.tracker;
                self.out.emit(
                    || build_usage_history_json(tracker.recent_history()),
                    || render_usage_history(tracker.recent_history()),
                )
            }
            UsageCmd::Month { date } => {
                let month_of = date.unwrap_or_else(today);
                let summary = self.tracker.monthly_summary(month_of);
                self.out.emit(
                    || build_monthly_summary_json(month_of, &summary),
                    || render_monthly_summary(month_of, &summary),
                )
            }
        }
    }

    fn settings(&mut self, cmd: SettingsCmd) -> Result<()> {
        if let SettingsCmd::Set {
            unit_rate,
            service_fee,
        } = cmd
        {
            if let Some(r) = unit_rate {
                self.tracker.billing.unit_rate = rate(r, "unit rate")?;
            }
            if let Some(p) = service_fee {
                self.tracker.billing.service_fee = rate(p, "service fee")?;
            }
            persist(
                "billing settings",
                self.service.save_billing_settings(&self.tracker.billing),
            );
        }
        let billing = self.tracker.billing;
        self.out
            .emit(|| json!(billing), || render_billing_settings(&billing))
    }
}

fn run_data(cmd: DataCmd, backend: Backend, config: &StoreConfig, out: Output) -> Result<()> {
    let store = open_store(backend, config).with_context(|| format!("open {backend} store"))?;
    let service = DataService::new(store);

    match cmd {
        DataCmd::Export { path } => {
            let bundle = service
                .export_all()
                .with_context(|| format!("export failed; {}", load_hint(backend)))?;
            let path = path
                .unwrap_or_else(|| PathBuf::from(format!("electricity-data-{}.json", today())));
            let data = serde_json::to_string_pretty(&bundle)?;
            fs::write(&path, data).with_context(|| format!("write {}", path.display()))?;
            log::info!("exported to {}", path.display());
            out.emit(
                || json!({"path": path.display().to_string()}),
                || format!("exported to {}", path.display()),
            )
        }
        DataCmd::Import { path } => {
            let data =
                fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            let bundle: ImportBundle = serde_json::from_str(&data)
                .with_context(|| format!("{} is not a valid export file", path.display()))?;
            service
                .import_all(bundle)
                .context("import failed; some data may have been replaced")?;
            let snapshot = service.load().with_context(|| load_hint(backend))?;
            out.emit(
                || {
                    json!({
                        "equipment": snapshot.equipment.len(),
                        "usageHistory": snapshot.usage_history.len(),
                        "billingSettings": snapshot.billing_settings,
                    })
                },
                || {
                    format!(
                        "imported {} equipment and {} history records",
                        snapshot.equipment.len(),
                        snapshot.usage_history.len()
                    )
                },
            )
        }
        DataCmd::Clear { yes } => {
            if !yes {
                bail!("refusing to delete all data without --yes");
            }
            service.clear_all().context("clear failed")?;
            out.emit(|| json!({"cleared": true}), || "all calculator data deleted".to_string())
        }
    }
}

fn fill_form(form: &mut MeterForm, reading: &ReadingArgs) {
    if let Some(start) = reading.start {
        form.start_reading = Some(start);
    }
    if let Some(start_date) = reading.start_date {
        form.start_date = start_date;
    }
    form.current_reading = Some(reading.reading);
    if let Some(date) = reading.date {
        form.current_date = date;
    }
}

fn run_meter(cmd: MeterCmd, config: &StoreConfig, out: Output) -> Result<()> {
    let store = LocalStore::open(config.db_path.as_deref()).context("open local meter store")?;
    let service = MeterService::new(Box::new(store));
    let history = service
        .get_history()
        .context("could not load meter readings; try again")?;
    let settings = service
        .get_settings()
        .context("could not load meter settings; try again")?;
    let mut tracker = MeterTracker::new(history, settings, today());

    match cmd {
        MeterCmd::Quote(reading) => {
            fill_form(&mut tracker.form, &reading);
            let charge = tracker.quote();
            let form = &tracker.form;
            out.emit(
                || build_interval_json(form, &charge),
                || render_interval(form, &charge),
            )
        }
        MeterCmd::Record { reading, note } => {
            fill_form(&mut tracker.form, &reading);
            tracker.form.note = note;
            let record = tracker.save_reading(Utc::now(), today())?.clone();
            persist("meter readings", service.save_history(&tracker.history));
            out.emit(
                || build_meter_record_json(&record),
                || render_meter_record(&record),
            )
        }
        MeterCmd::History => out.emit(
            || build_meter_history_json(tracker.recent()),
            || render_meter_history(tracker.recent()),
        ),
        MeterCmd::Delete { id } => {
            let removed = tracker.delete_reading(id).ok_or(MeterError::NotFound(id))?;
            persist("meter readings", service.save_history(&tracker.history));
            out.emit(
                || build_meter_record_json(&removed),
                || format!("deleted reading #{}", removed.id),
            )
        }
        MeterCmd::Load { id } => {
            tracker.load_reading(id)?;
            let charge = tracker.quote();
            let form = &tracker.form;
            out.emit(
                || build_interval_json(form, &charge),
                || render_interval(form, &charge),
            )
        }
        MeterCmd::Month { month } => {
            let month_of = month.unwrap_or_else(today);
            let summary = tracker.monthly_summary(month_of);
            out.emit(
                || build_meter_month_json(month_of, &summary),
                || render_meter_month(month_of, &summary),
            )
        }
        MeterCmd::Settings {
            unit_rate,
            service_fee,
            minimum_charge,
        } => {
            let mut settings = tracker.settings;
            if let Some(r) = unit_rate {
                settings.unit_rate = rate(r, "unit rate")?;
            }
            if let Some(p) = service_fee {
                settings.service_fee = rate(p, "service fee")?;
            }
            if let Some(c) = minimum_charge {
                settings.minimum_charge = rate(c, "minimum charge")?;
            }
            if settings != tracker.settings {
                persist("meter settings", service.save_settings(&settings));
            }
            out.emit(|| json!(settings), || render_meter_settings(&settings))
        }
    }
}
