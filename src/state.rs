use crate::errors::ServiceError;
use crate::models::{
    Day, DayCollections, DashboardView, NewRecordDraft, RecordCard, ReportView,
};
use crate::report::{self, ReportGenerator};
use crate::sheet::RecordStore;
use crate::stats::{filter_records, summarize};
use chrono::Utc;
use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
pub struct Dashboard {
    pub collections: DayCollections,
    pub active_day: Day,
    pub search: String,
    pub loading: bool,
    pub error: Option<String>,
    pub in_flight: HashSet<u32>,
    pub report: ReportView,
}

impl Dashboard {
    pub fn view(&self) -> DashboardView {
        let day = self.active_day;
        let records = self.collections.get(day);
        let cards = filter_records(records, day, &self.search)
            .into_iter()
            .map(|record| RecordCard {
                row_index: record.row_index,
                flat_number: record.flat_number.clone(),
                name: record.name.clone(),
                phone_number: record.phone_number.clone(),
                amount_paid: record.amount_paid,
                subscribed: record.subscribed.get(day),
                served: record.served.get(day),
                updating: self.in_flight.contains(&record.row_index),
                malformed: record.flat_number.is_none(),
            })
            .collect();

        DashboardView {
            active_day: day,
            day_label: day.sheet_name().to_string(),
            search: self.search.clone(),
            loading: self.loading,
            error: self.error.clone(),
            summary: summarize(records, day),
            loaded_records: records.len(),
            records: cards,
            report: self.report.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<Dashboard>>,
    store: Arc<dyn RecordStore>,
    reporter: Arc<dyn ReportGenerator>,
    turns: Arc<Mutex<HashMap<u32, Arc<Mutex<()>>>>>,
}

/// A locally applied change waiting for the store to confirm it.
pub struct PendingUpdate<F> {
    state: AppState,
    key: u32,
    snapshot: DayCollections,
    failure_message: String,
    remote: F,
    turn: OwnedMutexGuard<()>,
}

impl<F> PendingUpdate<F>
where
    F: Future<Output = Result<(), ServiceError>>,
{
    /// Awaits the remote call; on failure the whole pre-update snapshot is put
    /// back. The in-flight marker is cleared either way.
    pub async fn settle(self) -> Result<(), ServiceError> {
        let PendingUpdate {
            state,
            key,
            snapshot,
            failure_message,
            remote,
            turn,
        } = self;

        let outcome = remote.await;

        let mut dashboard = state.dashboard.lock().await;
        match &outcome {
            Ok(()) => debug!("update for {key} confirmed"),
            Err(err) => {
                warn!("{failure_message} ({err})");
                dashboard.collections = snapshot;
                dashboard.error = Some(failure_message);
            }
        }
        dashboard.in_flight.remove(&key);
        drop(dashboard);
        state.release_turn(key, turn).await;

        outcome
    }
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, reporter: Arc<dyn ReportGenerator>) -> Self {
        let dashboard = Dashboard {
            loading: true,
            ..Dashboard::default()
        };
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
            store,
            reporter,
            turns: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn view(&self) -> DashboardView {
        self.dashboard.lock().await.view()
    }

    pub async fn report(&self) -> ReportView {
        self.dashboard.lock().await.report.clone()
    }

    pub async fn set_active_day(&self, day: Day) {
        self.dashboard.lock().await.active_day = day;
    }

    pub async fn set_search(&self, term: impl Into<String>) {
        self.dashboard.lock().await.search = term.into();
    }

    /// Fetches both days side by side and replaces both collections.
    pub async fn load(&self) {
        {
            let mut dashboard = self.dashboard.lock().await;
            dashboard.loading = true;
            dashboard.error = None;
        }

        let (day1, day2) = tokio::join!(
            self.store.fetch_day(Day::Day1),
            self.store.fetch_day(Day::Day2)
        );

        let mut dashboard = self.dashboard.lock().await;
        match (day1, day2) {
            (Ok(day1), Ok(day2)) => {
                info!("loaded {} rows for day1 and {} for day2", day1.len(), day2.len());
                dashboard.collections = DayCollections { day1, day2 };
            }
            (day1, day2) => {
                let failures: Vec<(Day, ServiceError)> = [(Day::Day1, day1.err()), (Day::Day2, day2.err())]
                    .into_iter()
                    .filter_map(|(day, err)| err.map(|err| (day, err)))
                    .collect();
                let days: Vec<&str> = failures.iter().map(|(day, _)| day.sheet_name()).collect();
                let details: Vec<String> = failures
                    .iter()
                    .map(|(day, err)| format!("{}: {err}", day.sheet_name()))
                    .collect();
                error!("load failed for {}", details.join("; "));

                dashboard.collections = DayCollections::default();
                dashboard.error = Some(format!(
                    "Could not load data for {} ({}). Check that the sheet tabs are named 'Day 1' and 'Day 2' and that the script is deployed, then retry.",
                    days.join(" and "),
                    details.join("; ")
                ));
            }
        }
        dashboard.loading = false;
    }

    async fn turn(&self, key: u32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut turns = self.turns.lock().await;
            Arc::clone(turns.entry(key).or_default())
        };
        lock.lock_owned().await
    }

    async fn release_turn(&self, key: u32, turn: OwnedMutexGuard<()>) {
        let mut turns = self.turns.lock().await;
        drop(turn);
        if turns.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            turns.remove(&key);
        }
    }

    /// Applies `mutate` to the local collections immediately and returns the
    /// pending half that runs `remote`.
    ///
    /// `mutate` returns the name used in the failure message, or `None` to
    /// reject the change; a rejected change must leave the collections alone.
    pub async fn optimistic<M, F>(&self, key: u32, mutate: M, remote: F) -> Option<PendingUpdate<F>>
    where
        M: FnOnce(&mut DayCollections) -> Option<String>,
        F: Future<Output = Result<(), ServiceError>>,
    {
        let turn = self.turn(key).await;
        let mut dashboard = self.dashboard.lock().await;
        let snapshot = dashboard.collections.clone();
        let Some(label) = mutate(&mut dashboard.collections) else {
            drop(dashboard);
            self.release_turn(key, turn).await;
            return None;
        };
        dashboard.in_flight.insert(key);

        Some(PendingUpdate {
            state: self.clone(),
            key,
            snapshot,
            failure_message: format!("Failed to update {label}. Reverting."),
            remote,
            turn,
        })
    }

    pub async fn begin_served_update(
        &self,
        row_index: u32,
        day: Day,
        new_count: i64,
    ) -> Option<PendingUpdate<impl Future<Output = Result<(), ServiceError>> + Send + 'static>> {
        let Ok(count) = u32::try_from(new_count) else {
            debug!("ignoring negative count {new_count} for row {row_index}");
            return None;
        };

        let store = Arc::clone(&self.store);
        let remote = async move { store.update_served_count(row_index, day, count).await };

        self.optimistic(
            row_index,
            move |collections| {
                let record = collections
                    .get_mut(day)
                    .iter_mut()
                    .find(|record| record.row_index == row_index)?;
                if count > record.subscribed.get(day) {
                    debug!("ignoring count {count} above subscription for row {row_index}");
                    return None;
                }
                record.served.set(day, count);
                Some(record.label().to_string())
            },
            remote,
        )
        .await
    }

    /// Runs the whole update; `Ok(false)` means the request was ignored.
    pub async fn update_served(&self, row_index: u32, day: Day, new_count: i64) -> Result<bool, ServiceError> {
        match self.begin_served_update(row_index, day, new_count).await {
            Some(pending) => pending.settle().await.map(|()| true),
            None => Ok(false),
        }
    }

    pub async fn add_record(&self, draft: NewRecordDraft) -> Result<(), ServiceError> {
        let draft = validate_draft(draft)?;
        self.store.add_record(&draft).await?;
        info!("added flat {}, reloading", draft.flat_number);
        self.load().await;
        Ok(())
    }

    /// Marks a report as pending and returns the summary to send, or `None`
    /// when a report is already being generated.
    pub async fn start_report(&self) -> Option<String> {
        let mut dashboard = self.dashboard.lock().await;
        if dashboard.report.loading {
            debug!("report already pending, ignoring trigger");
            return None;
        }
        dashboard.report.loading = true;
        let day = dashboard.active_day;
        let records = dashboard.collections.get(day);
        Some(report::summary_text(day, &summarize(records, day), records.len()))
    }

    pub async fn finish_report(&self, summary: String) -> ReportView {
        let content = report::report_or_fallback(self.reporter.generate(&summary).await);
        let mut dashboard = self.dashboard.lock().await;
        dashboard.report = ReportView {
            loading: false,
            content: Some(content),
            generated_at: Some(Utc::now()),
        };
        dashboard.report.clone()
    }

    pub async fn generate_report(&self) -> ReportView {
        match self.start_report().await {
            Some(summary) => self.finish_report(summary).await,
            None => self.report().await,
        }
    }
}

fn validate_draft(draft: NewRecordDraft) -> Result<NewRecordDraft, ServiceError> {
    let flat_number = draft.flat_number.trim().to_uppercase();
    if flat_number.is_empty() || draft.subscribed_plates < 1 {
        return Err(ServiceError::Validation(
            "Flat Number and at least 1 Subscribed Plate are required.".to_string(),
        ));
    }
    if draft.amount_paid.is_some_and(|amount| !amount.is_finite() || amount < 0.0) {
        return Err(ServiceError::Validation(
            "Amount Paid must be a non-negative number.".to_string(),
        ));
    }

    let optional = |value: Option<String>| {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Ok(NewRecordDraft {
        flat_number,
        subscribed_plates: draft.subscribed_plates,
        building_name: optional(draft.building_name),
        name: optional(draft.name),
        phone_number: optional(draft.phone_number),
        amount_paid: draft.amount_paid,
    })
}
