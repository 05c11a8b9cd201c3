use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    remote::{ActivityRecord, RemoteActivityStore},
    utils::{clock::Clock, time::DateStyle},
};

use super::{
    entities::{
        build_hour_logs, Activity, ActivityData, ActivityId, ActivityUpdate, Hour, HourLog,
        DAY_BUDGET_MINUTES,
    },
    export, mapping,
};

/// How a fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetched activities replaced the in-memory ones.
    Applied,
    /// The store couldn't be reached. Previous state is kept.
    Failed,
    /// A newer fetch or a date change happened while waiting. The result was thrown away.
    Stale,
}

/// How a mutation ended. Local state is already consistent with the outcome when it's returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The store accepted the change.
    Confirmed,
    /// The change targets an activity whose insert is still in flight. It is sent once the insert
    /// is confirmed.
    Deferred,
    /// The store rejected the change and local state was compensated.
    RolledBack,
    /// The selected date changed before the store answered, the answer was discarded.
    Superseded,
}

/// Consistent read of everything a day view needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub is_loading: bool,
    pub logs: Vec<HourLog>,
    pub total_duration: u32,
    pub remaining_minutes: i64,
}

enum InsertSettlement {
    Superseded,
    /// Deleted while the insert was in flight. Holds the stored id.
    Orphaned(ActivityId),
    /// Holds the stored id and local edits made while the insert was in flight.
    Stored(ActivityId, ActivityUpdate),
}

struct DayState {
    date: NaiveDate,
    activities: Vec<Activity>,
    is_loading: bool,
    /// Incremented by every fetch. Only the latest fetch may apply its result.
    fetch_sequence: u64,
    /// Incremented by every date change. Mutations only settle into the generation they started in.
    generation: u64,
    /// Temporary ids deleted before their insert was confirmed.
    pending_deletes: HashSet<ActivityId>,
}

/// Single source of truth for the activities of the selected date.
///
/// Mutations are applied to memory first and sent to the [RemoteActivityStore] afterwards, so
/// readers never wait for the network. When the store rejects a change the local state is
/// compensated: inserts are removed, updates and deletes are undone by fetching the day again.
/// Failures are only logged.
///
/// All operations take `&self` and may run concurrently. The lock is never held across an await.
pub struct DayLogStore<R> {
    remote: R,
    clock: Box<dyn Clock>,
    state: Mutex<DayState>,
}

impl<R: RemoteActivityStore> DayLogStore<R> {
    /// Starts at today with loading set. Nothing is fetched until [DayLogStore::fetch_activities]
    /// or a date change.
    pub fn new(remote: R, clock: Box<dyn Clock>) -> Self {
        let today = clock.today();
        Self {
            remote,
            clock,
            state: Mutex::new(DayState {
                date: today,
                activities: vec![],
                is_loading: true,
                fetch_sequence: 0,
                generation: 0,
                pending_deletes: HashSet::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, DayState> {
        // State is left consistent between statements, so a panic elsewhere doesn't corrupt it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.state().date
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    /// Today according to the store's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn is_today(&self) -> bool {
        self.current_date() == self.today()
    }

    /// Whether [DayLogStore::next_day] would move. Days after today can't be logged into.
    pub fn can_go_forward(&self) -> bool {
        self.current_date() < self.clock.today()
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.state().activities.clone()
    }

    pub fn find(&self, id: &ActivityId) -> Option<Activity> {
        self.state().activities.iter().find(|a| &a.id == id).cloned()
    }

    /// Exactly 24 buckets, one per hour.
    pub fn logs(&self) -> Vec<HourLog> {
        build_hour_logs(&self.state().activities)
    }

    pub fn total_duration(&self) -> u32 {
        self.state().activities.iter().map(|a| a.duration).sum()
    }

    /// Minutes left of the daily budget. Negative once more than a day has been logged.
    pub fn remaining_minutes(&self) -> i64 {
        DAY_BUDGET_MINUTES as i64 - self.total_duration() as i64
    }

    pub fn snapshot(&self) -> DaySnapshot {
        let state = self.state();
        let total_duration = state.activities.iter().map(|a| a.duration).sum::<u32>();
        DaySnapshot {
            date: state.date,
            is_loading: state.is_loading,
            logs: build_hour_logs(&state.activities),
            total_duration,
            remaining_minutes: DAY_BUDGET_MINUTES as i64 - total_duration as i64,
        }
    }

    /// CSV of the current day. The date column holds the export date, not the logged one.
    pub fn export_csv(&self, style: DateStyle) -> String {
        export::to_csv(&self.logs(), self.clock.today(), style)
    }

    /// Selects `date` and fetches it. Selecting the current date again simply re-fetches.
    pub async fn set_date(&self, date: NaiveDate) -> FetchOutcome {
        {
            let mut state = self.state();
            if state.date != date {
                debug!("Switching from {} to {date}", state.date);
                state.date = date;
                state.generation += 1;
                state.activities.clear();
            }
        }
        self.fetch_activities().await
    }

    /// Moves one day forward. Returns [None] without doing anything when already at today.
    pub async fn next_day(&self) -> Option<FetchOutcome> {
        if !self.can_go_forward() {
            debug!("Refusing to navigate past today");
            return None;
        }
        let next = self.current_date().succ_opt()?;
        Some(self.set_date(next).await)
    }

    pub async fn prev_day(&self) -> Option<FetchOutcome> {
        let previous = self.current_date().pred_opt()?;
        Some(self.set_date(previous).await)
    }

    /// Replaces in-memory activities with the store's records for the current date. Inserts that
    /// are still in flight survive the replacement.
    pub async fn fetch_activities(&self) -> FetchOutcome {
        let (date, sequence) = {
            let mut state = self.state();
            state.fetch_sequence += 1;
            state.is_loading = true;
            (state.date, state.fetch_sequence)
        };

        debug!("Fetching activities for {date} (fetch {sequence})");
        let result = self.remote.select(date).await;

        let mut state = self.state();
        if state.fetch_sequence != sequence || state.date != date {
            warn!(
                "Discarding fetch {sequence} for {date}, store is at fetch {} for {}",
                state.fetch_sequence, state.date
            );
            return FetchOutcome::Stale;
        }
        state.is_loading = false;

        match result {
            Ok(records) => {
                let mut activities = map_records(records);
                let pending = state
                    .activities
                    .drain(..)
                    .filter(|a| a.id.is_temporary())
                    .collect::<Vec<_>>();
                activities.extend(pending);
                info!("Fetched {} activities for {date}", activities.len());
                state.activities = activities;
                FetchOutcome::Applied
            }
            Err(e) => {
                error!("Error fetching activities for {date}: {e:?}");
                FetchOutcome::Failed
            }
        }
    }

    /// Appends the activity right away under a temporary id and inserts it remotely. The
    /// temporary copy is swapped for the stored one on success and removed on failure.
    pub async fn add_activity(&self, hour: Hour, data: ActivityData) -> MutationOutcome {
        let optimistic = mapping::to_optimistic(hour, &data);
        let temporary_id = optimistic.id.clone();
        let (date, generation) = {
            let mut state = self.state();
            state.activities.push(optimistic);
            (state.date, state.generation)
        };

        debug!("Inserting {temporary_id} at {hour} on {date}");
        let result = self
            .remote
            .insert(mapping::to_new_record(date, hour, &data))
            .await;

        match result {
            Ok(record) => {
                self.confirm_insert(generation, &temporary_id, &data, record)
                    .await
            }
            Err(e) => {
                error!("Error adding activity: {e:?}");
                let mut state = self.state();
                state.pending_deletes.remove(&temporary_id);
                if state.generation != generation {
                    return MutationOutcome::Superseded;
                }
                state.activities.retain(|a| a.id != temporary_id);
                MutationOutcome::RolledBack
            }
        }
    }

    async fn confirm_insert(
        &self,
        generation: u64,
        temporary_id: &ActivityId,
        sent: &ActivityData,
        record: ActivityRecord,
    ) -> MutationOutcome {
        match self.settle_insert(generation, temporary_id, sent, record) {
            InsertSettlement::Superseded => MutationOutcome::Superseded,
            InsertSettlement::Orphaned(id) => {
                info!("Removing {id} which was deleted before it was stored");
                if let Err(e) = self.remote.delete(&id).await {
                    error!("Error deleting activity {id}: {e:?}");
                }
                MutationOutcome::Superseded
            }
            InsertSettlement::Stored(id, follow_up) if follow_up.is_empty() => {
                info!("Stored {temporary_id} as {id}");
                MutationOutcome::Confirmed
            }
            InsertSettlement::Stored(id, follow_up) => {
                info!("Stored {temporary_id} as {id}, sending local edits");
                self.push_update(generation, &id, &follow_up).await
            }
        }
    }

    /// Swaps the temporary copy for the stored record.
    fn settle_insert(
        &self,
        generation: u64,
        temporary_id: &ActivityId,
        sent: &ActivityData,
        record: ActivityRecord,
    ) -> InsertSettlement {
        let mut state = self.state();
        if state.pending_deletes.remove(temporary_id) {
            return InsertSettlement::Orphaned(record.id);
        }
        if state.generation != generation {
            warn!(
                "Insert of {} for {} confirmed after the date changed, keeping it stored",
                record.id, record.date
            );
            return InsertSettlement::Superseded;
        }
        let Some(position) = state.activities.iter().position(|a| &a.id == temporary_id) else {
            warn!("Confirmed {temporary_id} as {} but it is no longer loaded", record.id);
            return InsertSettlement::Superseded;
        };

        let local = state.activities.remove(position);
        let follow_up = mapping::changes_since(sent, &local);
        let mut confirmed = mapping::reconcile(&local, record);
        confirmed.apply(&follow_up);
        let id = confirmed.id.clone();

        // A fetch may have brought the stored row in already
        match state.activities.iter_mut().find(|a| a.id == id) {
            Some(existing) => *existing = confirmed,
            None => state.activities.insert(position, confirmed),
        }
        InsertSettlement::Stored(id, follow_up)
    }

    /// Merges `update` into the activity right away and sends it to the store. A rejected update
    /// is undone by fetching the day again.
    pub async fn update_activity(
        &self,
        id: &ActivityId,
        update: ActivityUpdate,
    ) -> Result<MutationOutcome> {
        update.validate()?;
        let generation = {
            let mut state = self.state();
            match state.activities.iter_mut().find(|a| &a.id == id) {
                Some(activity) => activity.apply(&update),
                None => warn!("Updating {id} which isn't loaded"),
            }
            state.generation
        };

        if update.is_empty() {
            return Ok(MutationOutcome::Confirmed);
        }
        if id.is_temporary() {
            return Ok(MutationOutcome::Deferred);
        }
        Ok(self.push_update(generation, id, &update).await)
    }

    async fn push_update(
        &self,
        generation: u64,
        id: &ActivityId,
        update: &ActivityUpdate,
    ) -> MutationOutcome {
        debug!("Updating {id} with {update:?}");
        match self.remote.update(id, mapping::to_patch(update)).await {
            Ok(()) => MutationOutcome::Confirmed,
            Err(e) => {
                error!("Error updating activity {id}: {e:?}");
                self.refetch_for(generation).await
            }
        }
    }

    /// Removes the activity right away and deletes it remotely. A rejected delete is undone by
    /// fetching the day again.
    pub async fn delete_activity(&self, id: &ActivityId) -> MutationOutcome {
        let generation = {
            let mut state = self.state();
            let loaded = state.activities.len();
            state.activities.retain(|a| &a.id != id);
            if id.is_temporary() {
                if state.activities.len() == loaded {
                    warn!("Deleting {id} which isn't pending");
                    return MutationOutcome::Confirmed;
                }
                // The pending insert removes the stored row once it lands
                state.pending_deletes.insert(id.clone());
                return MutationOutcome::Deferred;
            }
            state.generation
        };

        debug!("Deleting {id}");
        match self.remote.delete(id).await {
            Ok(()) => MutationOutcome::Confirmed,
            Err(e) => {
                error!("Error deleting activity {id}: {e:?}");
                self.refetch_for(generation).await
            }
        }
    }

    /// Compensates a rejected mutation issued in `generation`.
    async fn refetch_for(&self, generation: u64) -> MutationOutcome {
        if self.state().generation != generation {
            return MutationOutcome::Superseded;
        }
        self.fetch_activities().await;
        MutationOutcome::RolledBack
    }
}

fn map_records(records: Vec<ActivityRecord>) -> Vec<Activity> {
    records
        .into_iter()
        .filter_map(|record| {
            mapping::to_activity(record)
                .inspect_err(|e| warn!("Skipping record: {e}"))
                .ok()
        })
        .collect()
}
