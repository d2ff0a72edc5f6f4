//! Per-individual health status and the aggregate counters derived from it.
//!
//! Every individual moves `Uninfected → Infected` at most once, and `Infected → terminal` at
//! most once. Counters are only touched through this module so they stay consistent with the
//! statuses:
//! * `total_num_infected ≥ num_currently_infected`
//! * `total_num_infected = num_currently_infected + num_recovered + num_deaths`
use log::trace;
use serde::Serialize;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::population::PersonId;
use crate::schedule::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthStatus {
    Uninfected,
    Infected,
    RecoveredMild,
    RecoveredSevere,
    Dead,
}

impl HealthStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HealthStatus::RecoveredMild | HealthStatus::RecoveredSevere | HealthStatus::Dead
        )
    }
}

/// Running totals exposed after every day-step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateCounters {
    pub total_num_infected: usize,
    pub num_currently_infected: usize,
    pub num_recovered: usize,
    pub num_deaths: usize,
}

struct HealthRegistry {
    statuses: Vec<HealthStatus>,
    counters: AggregateCounters,
}

define_data_plugin!(
    HealthPlugin,
    HealthRegistry,
    HealthRegistry {
        statuses: Vec::new(),
        counters: AggregateCounters::default(),
    }
);

fn transition_error(person_id: PersonId, from: HealthStatus, to: HealthStatus) -> OutbreakError {
    OutbreakError::OutbreakError(format!(
        "person {person_id} cannot move from {from:?} to {to:?}"
    ))
}

pub trait ContextHealthExt {
    /// Creates an `Uninfected` record for every individual and zeroes the counters.
    fn init_health(&mut self, population_size: usize);

    /// # Panics
    ///
    /// Panics if `person_id` is out of range.
    fn get_health_status(&self, person_id: PersonId) -> HealthStatus;

    fn get_counters(&self) -> AggregateCounters;

    /// Number of individuals currently in `status`.
    fn count_with_status(&self, status: HealthStatus) -> usize;

    /// Adds a wave of `count` new infections to the running totals.
    fn record_new_infections(&mut self, count: usize);

    /// Moves an individual from `Uninfected` to `Infected`.
    ///
    /// # Errors
    ///
    /// Fails if the individual was already infected.
    fn mark_infected(&mut self, person_id: PersonId) -> Result<(), OutbreakError>;

    /// Moves an infected individual to the terminal status for `outcome` and updates the counters.
    ///
    /// # Errors
    ///
    /// Fails if the individual is not currently infected.
    fn resolve_infection(
        &mut self,
        person_id: PersonId,
        outcome: Outcome,
    ) -> Result<HealthStatus, OutbreakError>;
}

impl ContextHealthExt for Context {
    fn init_health(&mut self, population_size: usize) {
        trace!("Initializing health registry");
        let registry = self.get_data_container_mut(HealthPlugin);
        registry.statuses = vec![HealthStatus::Uninfected; population_size];
        registry.counters = AggregateCounters::default();
    }

    fn get_health_status(&self, person_id: PersonId) -> HealthStatus {
        self.get_data_container(HealthPlugin)
            .and_then(|registry| registry.statuses.get(person_id.index()).copied())
            .unwrap_or_else(|| panic!("No health record for person {person_id}"))
    }

    fn get_counters(&self) -> AggregateCounters {
        self.get_data_container(HealthPlugin)
            .map(|registry| registry.counters)
            .unwrap_or_default()
    }

    fn count_with_status(&self, status: HealthStatus) -> usize {
        self.get_data_container(HealthPlugin).map_or(0, |registry| {
            registry.statuses.iter().filter(|&&s| s == status).count()
        })
    }

    fn record_new_infections(&mut self, count: usize) {
        let counters = &mut self.get_data_container_mut(HealthPlugin).counters;
        counters.num_currently_infected += count;
        counters.total_num_infected += count;
    }

    fn mark_infected(&mut self, person_id: PersonId) -> Result<(), OutbreakError> {
        let registry = self.get_data_container_mut(HealthPlugin);
        let status = registry
            .statuses
            .get_mut(person_id.index())
            .ok_or_else(|| OutbreakError::from(format!("No health record for person {person_id}")))?;
        if *status != HealthStatus::Uninfected {
            return Err(transition_error(person_id, *status, HealthStatus::Infected));
        }
        *status = HealthStatus::Infected;
        Ok(())
    }

    fn resolve_infection(
        &mut self,
        person_id: PersonId,
        outcome: Outcome,
    ) -> Result<HealthStatus, OutbreakError> {
        let terminal = outcome.terminal_status();
        let registry = self.get_data_container_mut(HealthPlugin);
        let status = registry
            .statuses
            .get_mut(person_id.index())
            .ok_or_else(|| OutbreakError::from(format!("No health record for person {person_id}")))?;
        if *status != HealthStatus::Infected {
            return Err(transition_error(person_id, *status, terminal));
        }
        *status = terminal;

        let counters = &mut registry.counters;
        counters.num_currently_infected -= 1;
        match outcome {
            Outcome::Mild | Outcome::SevereRecovery => counters.num_recovered += 1,
            Outcome::Death => counters.num_deaths += 1,
        }
        trace!("person {person_id} resolved as {terminal:?}");
        Ok(terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(population_size: usize) -> Context {
        let mut context = Context::new();
        context.init_health(population_size);
        context
    }

    #[test]
    fn starts_uninfected() {
        let context = setup(5);
        assert_eq!(context.get_health_status(PersonId(4)), HealthStatus::Uninfected);
        assert_eq!(context.count_with_status(HealthStatus::Uninfected), 5);
        assert_eq!(context.get_counters(), AggregateCounters::default());
    }

    #[test]
    fn infection_then_recovery_updates_counters() {
        let mut context = setup(5);
        context.record_new_infections(2);
        context.mark_infected(PersonId(1)).unwrap();
        context.mark_infected(PersonId(2)).unwrap();

        let status = context
            .resolve_infection(PersonId(1), Outcome::SevereRecovery)
            .unwrap();
        assert_eq!(status, HealthStatus::RecoveredSevere);
        context.resolve_infection(PersonId(2), Outcome::Death).unwrap();

        let counters = context.get_counters();
        assert_eq!(counters.total_num_infected, 2);
        assert_eq!(counters.num_currently_infected, 0);
        assert_eq!(counters.num_recovered, 1);
        assert_eq!(counters.num_deaths, 1);
        assert_eq!(context.count_with_status(HealthStatus::Dead), 1);
    }

    #[test]
    fn cannot_infect_twice() {
        let mut context = setup(3);
        context.mark_infected(PersonId(0)).unwrap();
        assert!(context.mark_infected(PersonId(0)).is_err());
    }

    #[test]
    fn cannot_resolve_uninfected_or_resolved() {
        let mut context = setup(3);
        assert!(context.resolve_infection(PersonId(0), Outcome::Mild).is_err());

        context.record_new_infections(1);
        context.mark_infected(PersonId(0)).unwrap();
        context.resolve_infection(PersonId(0), Outcome::Mild).unwrap();
        assert!(context.resolve_infection(PersonId(0), Outcome::Mild).is_err());
        assert!(context.mark_infected(PersonId(0)).is_err());
    }

    #[test]
    fn out_of_range_person_is_an_error() {
        let mut context = setup(3);
        assert!(context.mark_infected(PersonId(3)).is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!HealthStatus::Uninfected.is_terminal());
        assert!(!HealthStatus::Infected.is_terminal());
        assert!(HealthStatus::RecoveredMild.is_terminal());
        assert!(HealthStatus::Dead.is_terminal());
    }
}
