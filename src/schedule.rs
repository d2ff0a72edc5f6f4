//! Day-bucketed resolution schedules.
//!
//! Every infection is given an [`Outcome`] and a resolution day. The entry is appended to the
//! bucket for that outcome and day, where it stays for the rest of the run so renderers can read
//! what resolves on any given day. When the resolution day falls on or before the horizon a plan
//! is also queued on the [`Context`]; when the clock reaches that day the plan moves the
//! individual to the outcome's terminal status and updates the counters.
use std::collections::BTreeMap;
use std::fmt;

use log::{error, trace};
use serde::Serialize;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::health::{ContextHealthExt, HealthStatus};
use crate::population::{ContextPopulationExt, PersonId, Position};

/// Default last simulated day.
pub const DEFAULT_HORIZON: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Mild,
    SevereRecovery,
    Death,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Mild, Outcome::SevereRecovery, Outcome::Death];

    #[must_use]
    pub fn terminal_status(self) -> HealthStatus {
        match self {
            Outcome::Mild => HealthStatus::RecoveredMild,
            Outcome::SevereRecovery => HealthStatus::RecoveredSevere,
            Outcome::Death => HealthStatus::Dead,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Mild => "mild",
            Outcome::SevereRecovery => "severe_recovery",
            Outcome::Death => "death",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub person_id: PersonId,
    pub infection_day: u32,
    pub position: Position,
}

/// Emitted whenever an individual's resolution is scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionScheduledEvent {
    pub person_id: PersonId,
    pub infection_day: u32,
    pub resolution_day: u32,
    pub outcome: Outcome,
    pub position: Position,
}

/// Append-only mappings from resolution day to the individuals resolving that day, one per
/// outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleBuckets {
    horizon: u32,
    mild_due: BTreeMap<u32, Vec<ScheduleEntry>>,
    severe_recovery_due: BTreeMap<u32, Vec<ScheduleEntry>>,
    death_due: BTreeMap<u32, Vec<ScheduleEntry>>,
    beyond_horizon: usize,
}

impl ScheduleBuckets {
    #[must_use]
    pub fn new(horizon: u32) -> ScheduleBuckets {
        ScheduleBuckets {
            horizon,
            ..ScheduleBuckets::default()
        }
    }

    #[must_use]
    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    #[must_use]
    pub fn bucket(&self, outcome: Outcome) -> &BTreeMap<u32, Vec<ScheduleEntry>> {
        match outcome {
            Outcome::Mild => &self.mild_due,
            Outcome::SevereRecovery => &self.severe_recovery_due,
            Outcome::Death => &self.death_due,
        }
    }

    fn bucket_mut(&mut self, outcome: Outcome) -> &mut BTreeMap<u32, Vec<ScheduleEntry>> {
        match outcome {
            Outcome::Mild => &mut self.mild_due,
            Outcome::SevereRecovery => &mut self.severe_recovery_due,
            Outcome::Death => &mut self.death_due,
        }
    }

    /// Entries for `outcome` that resolve on `day`, in scheduling order.
    #[must_use]
    pub fn due_on(&self, outcome: Outcome, day: u32) -> &[ScheduleEntry] {
        self.bucket(outcome).get(&day).map_or(&[], Vec::as_slice)
    }

    /// Appends an entry. Returns `false` if `resolution_day` lies beyond the horizon.
    pub fn push(&mut self, outcome: Outcome, resolution_day: u32, entry: ScheduleEntry) -> bool {
        self.bucket_mut(outcome)
            .entry(resolution_day)
            .or_default()
            .push(entry);
        let within_horizon = resolution_day <= self.horizon;
        if !within_horizon {
            self.beyond_horizon += 1;
        }
        within_horizon
    }

    /// Number of entries scheduled for `outcome` on any day.
    #[must_use]
    pub fn len(&self, outcome: Outcome) -> usize {
        self.bucket(outcome).values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn total_len(&self) -> usize {
        Outcome::ALL.iter().map(|&outcome| self.len(outcome)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Number of entries whose resolution day is past the horizon and will never be reached.
    #[must_use]
    pub fn beyond_horizon_count(&self) -> usize {
        self.beyond_horizon
    }

    /// Iterates over `(resolution_day, entry)` for `outcome` in day order.
    pub fn iter(&self, outcome: Outcome) -> impl Iterator<Item = (u32, &ScheduleEntry)> {
        self.bucket(outcome)
            .iter()
            .flat_map(|(&day, entries)| entries.iter().map(move |entry| (day, entry)))
    }
}

struct ScheduleData {
    buckets: Option<ScheduleBuckets>,
    // First failure raised by a resolution plan, surfaced by the clock after the plans run.
    resolution_error: Option<OutbreakError>,
}

define_data_plugin!(
    SchedulePlugin,
    ScheduleData,
    ScheduleData {
        buckets: None,
        resolution_error: None,
    }
);

pub trait ContextScheduleExt {
    /// Creates empty buckets whose plans stop at `horizon`.
    fn init_schedule(&mut self, horizon: u32);

    /// # Panics
    ///
    /// Panics if the schedule has not been initialized.
    fn get_schedule(&self) -> &ScheduleBuckets;

    /// Records that `person_id`, infected on `infection_day`, resolves with `outcome` on
    /// `resolution_day`, and emits a [`ResolutionScheduledEvent`]. Returns whether a plan that
    /// performs the transition was queued, which happens only for days on or before the horizon.
    ///
    /// # Panics
    ///
    /// Panics if the schedule has not been initialized or `resolution_day` is in the past.
    fn schedule_resolution(
        &mut self,
        person_id: PersonId,
        infection_day: u32,
        resolution_day: u32,
        outcome: Outcome,
    ) -> bool;

    /// Takes the first error raised while running resolution plans, if any.
    fn take_resolution_error(&mut self) -> Option<OutbreakError>;
}

impl ContextScheduleExt for Context {
    fn init_schedule(&mut self, horizon: u32) {
        trace!("Initializing schedule with horizon {horizon}");
        let data = self.get_data_container_mut(SchedulePlugin);
        data.buckets = Some(ScheduleBuckets::new(horizon));
        data.resolution_error = None;
    }

    fn get_schedule(&self) -> &ScheduleBuckets {
        self.get_data_container(SchedulePlugin)
            .and_then(|data| data.buckets.as_ref())
            .expect("Schedule has not been initialized")
    }

    fn schedule_resolution(
        &mut self,
        person_id: PersonId,
        infection_day: u32,
        resolution_day: u32,
        outcome: Outcome,
    ) -> bool {
        let position = self.get_position(person_id);
        let entry = ScheduleEntry {
            person_id,
            infection_day,
            position,
        };
        let within_horizon = self
            .get_data_container_mut(SchedulePlugin)
            .buckets
            .as_mut()
            .expect("Schedule has not been initialized")
            .push(outcome, resolution_day, entry);

        self.emit_event(ResolutionScheduledEvent {
            person_id,
            infection_day,
            resolution_day,
            outcome,
            position,
        });

        if !within_horizon {
            return false;
        }
        self.add_plan(resolution_day, move |context| {
            if let Err(err) = context.resolve_infection(person_id, outcome) {
                error!("failed to resolve person {person_id} on day {resolution_day}: {err}");
                let slot = &mut context
                    .get_data_container_mut(SchedulePlugin)
                    .resolution_error;
                slot.get_or_insert(err);
            }
        });
        true
    }

    fn take_resolution_error(&mut self) -> Option<OutbreakError> {
        self.get_data_container_mut(SchedulePlugin)
            .resolution_error
            .take()
    }
}
