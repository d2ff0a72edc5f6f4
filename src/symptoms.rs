//! Splits a wave of new infections into outcome cohorts and schedules their resolutions.
//!
//! For a wave of `n` infections:
//! 1. `round(percent_mild × n)` individuals are drawn into the mild cohort.
//! 2. From the rest, `round(percent_severe_recovery × round(percent_severe × n))` are drawn into
//!    the severe-recovery cohort.
//! 3. Whoever is left dies.
//!
//! Each member then gets a resolution day drawn uniformly from the cohort's `[fast, slow)`
//! offsets after the infection day. Rounding slack always lands in the death cohort; a draw is
//! never quietly shrunk to fit its pool.
use log::debug;

use crate::context::Context;
use crate::define_rng;
use crate::error::OutbreakError;
use crate::numeric::scale_count;
use crate::parameters::ContextParametersExt;
use crate::population::PersonId;
use crate::random::ContextRandomExt;
use crate::schedule::{ContextScheduleExt, Outcome};

define_rng!(SymptomRng);

/// The outcome cohorts of one wave. Together they partition the wave exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortAssignment {
    pub mild: Vec<PersonId>,
    pub severe_recovery: Vec<PersonId>,
    pub death: Vec<PersonId>,
}

impl CohortAssignment {
    #[must_use]
    pub fn cohort(&self, outcome: Outcome) -> &[PersonId] {
        match outcome {
            Outcome::Mild => &self.mild,
            Outcome::SevereRecovery => &self.severe_recovery,
            Outcome::Death => &self.death,
        }
    }

    /// Total number of individuals across all cohorts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mild.len() + self.severe_recovery.len() + self.death.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn invalid_partition(cohort: &'static str, err: OutbreakError) -> OutbreakError {
    match err {
        OutbreakError::InsufficientPool {
            requested,
            available,
        } => OutbreakError::InvalidPartition {
            cohort,
            requested,
            available,
        },
        other => other,
    }
}

/// Splits `infected` into outcome cohorts without touching any other state.
///
/// # Errors
///
/// `InvalidPartition` if a cohort draw asks for more individuals than remain in its pool.
pub fn partition_cohorts(
    context: &mut Context,
    infected: Vec<PersonId>,
) -> Result<CohortAssignment, OutbreakError> {
    let parameters = context.get_parameters().clone();
    let new_infected_count = infected.len();

    let num_mild = scale_count(new_infected_count, parameters.percent_mild);
    let (mild, severe_pool) = context
        .split_sample(SymptomRng, infected, num_mild)
        .map_err(|err| invalid_partition("mild", err))?;

    let num_severe = scale_count(new_infected_count, parameters.percent_severe);
    let num_severe_recovery = scale_count(num_severe, parameters.percent_severe_recovery());
    let (severe_recovery, death) = if severe_pool.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        context
            .split_sample(SymptomRng, severe_pool, num_severe_recovery)
            .map_err(|err| invalid_partition("severe_recovery", err))?
    };

    Ok(CohortAssignment {
        mild,
        severe_recovery,
        death,
    })
}

/// Draws a resolution day for every cohort member infected on `day` and schedules it.
///
/// # Errors
///
/// `InvalidConfiguration` if a resolution window starting on `day` does not fit the day
/// counter. Nothing is scheduled in that case.
pub fn schedule_cohorts(
    context: &mut Context,
    assignment: &CohortAssignment,
    day: u32,
) -> Result<(), OutbreakError> {
    let parameters = context.get_parameters();
    let mut windows = Vec::with_capacity(Outcome::ALL.len());
    for outcome in Outcome::ALL {
        let (fast, slow) = parameters.resolution_offsets(outcome);
        let window = day
            .checked_add(fast)
            .zip(day.checked_add(slow))
            .ok_or_else(|| {
                OutbreakError::InvalidConfiguration(format!(
                    "{outcome} resolutions for day {day} overflow the day counter"
                ))
            })?;
        windows.push((outcome, window));
    }

    for (outcome, (earliest, latest)) in windows {
        let mut beyond_horizon = 0;
        for &person_id in assignment.cohort(outcome) {
            let resolution_day = context.sample_range(SymptomRng, earliest..latest);
            if !context.schedule_resolution(person_id, day, resolution_day, outcome) {
                beyond_horizon += 1;
            }
        }
        debug!(
            "day {day}: {} {outcome} cases scheduled, {beyond_horizon} beyond the horizon",
            assignment.cohort(outcome).len()
        );
    }
    Ok(())
}

/// Partitions `infected`, all infected on `day`, into cohorts and schedules each member's
/// resolution.
///
/// # Errors
///
/// As [`partition_cohorts`] and [`schedule_cohorts`].
pub fn assign_symptoms(
    context: &mut Context,
    infected: Vec<PersonId>,
    day: u32,
) -> Result<CohortAssignment, OutbreakError> {
    let assignment = partition_cohorts(context, infected)?;
    schedule_cohorts(context, &assignment, day)?;
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ContextHealthExt;
    use crate::parameters::Parameters;
    use crate::population::ContextPopulationExt;
    use crate::HashSet;

    fn setup(parameters: Parameters, population_size: usize) -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context.set_parameters(parameters).unwrap();
        context.init_schedule(365);
        context.init_population(population_size).unwrap();
        context
    }

    fn infect(context: &mut Context, people: &[PersonId]) {
        context.record_new_infections(people.len());
        for &person_id in people {
            context.mark_infected(person_id).unwrap();
        }
    }

    #[test]
    fn cohorts_partition_the_wave() {
        let mut context = setup(Parameters::covid19(), 500);
        let infected: Vec<PersonId> = (1..101).map(PersonId).collect();
        infect(&mut context, &infected);
        let assignment = assign_symptoms(&mut context, infected.clone(), 7).unwrap();

        assert_eq!(assignment.mild.len(), 80);
        // round(0.2 × 100) = 20 severe, round(0.83 × 20) = 17 recover
        assert_eq!(assignment.severe_recovery.len(), 17);
        assert_eq!(assignment.death.len(), 3);
        assert_eq!(assignment.len(), infected.len());

        let all: HashSet<PersonId> = Outcome::ALL
            .iter()
            .flat_map(|&outcome| assignment.cohort(outcome).iter().copied())
            .collect();
        assert_eq!(all, infected.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn resolution_days_fall_in_cohort_windows() {
        let parameters = Parameters::covid19();
        let mut context = setup(parameters.clone(), 1000);
        let infected: Vec<PersonId> = (1..301).map(PersonId).collect();
        infect(&mut context, &infected);
        assign_symptoms(&mut context, infected, 14).unwrap();

        let schedule = context.get_schedule();
        for outcome in Outcome::ALL {
            let (fast, slow) = parameters.resolution_offsets(outcome);
            for (resolution_day, entry) in schedule.iter(outcome) {
                if entry.person_id == PersonId::PATIENT_ZERO {
                    continue;
                }
                assert_eq!(entry.infection_day, 14);
                assert!(resolution_day >= 14 + fast && resolution_day < 14 + slow);
            }
        }
    }

    #[test]
    fn empty_wave_gives_empty_cohorts() {
        let mut context = setup(Parameters::covid19(), 10);
        let assignment = assign_symptoms(&mut context, Vec::new(), 7).unwrap();
        assert!(assignment.is_empty());
    }

    #[test]
    fn single_infection_is_mild() {
        // round(0.8) = 1, so the severe pool is empty
        let mut context = setup(Parameters::covid19(), 10);
        infect(&mut context, &[PersonId(1)]);
        let assignment = assign_symptoms(&mut context, vec![PersonId(1)], 7).unwrap();
        assert_eq!(assignment.mild, vec![PersonId(1)]);
        assert!(assignment.severe_recovery.is_empty());
        assert!(assignment.death.is_empty());
    }

    #[test]
    fn no_severe_share_means_all_mild() {
        let parameters = Parameters {
            percent_mild: 1.0,
            percent_severe: 0.0,
            fatality_rate: 0.0,
            ..Parameters::covid19()
        };
        let mut context = setup(parameters, 50);
        let infected: Vec<PersonId> = (1..21).map(PersonId).collect();
        infect(&mut context, &infected);
        let assignment = assign_symptoms(&mut context, infected, 7).unwrap();
        assert_eq!(assignment.mild.len(), 20);
        assert!(assignment.death.is_empty());
    }

    #[test]
    fn rounding_overflow_is_an_invalid_partition() {
        // Three infections: round(1.5) = 2 mild leaves one, but round(1.5) = 2 severe recover.
        let parameters = Parameters {
            percent_mild: 0.5,
            percent_severe: 0.5,
            fatality_rate: 0.0,
            ..Parameters::covid19()
        };
        let mut context = setup(parameters, 10);
        let infected = vec![PersonId(1), PersonId(2), PersonId(3)];
        infect(&mut context, &infected);
        let result = assign_symptoms(&mut context, infected, 7);
        assert!(matches!(
            result,
            Err(OutbreakError::InvalidPartition {
                cohort: "severe_recovery",
                requested: 2,
                available: 1,
            })
        ));
    }

    #[test]
    fn partition_leaves_schedule_untouched() {
        let mut context = setup(Parameters::covid19(), 200);
        let before = context.get_schedule().total_len();
        let infected: Vec<PersonId> = (1..41).map(PersonId).collect();
        let assignment = partition_cohorts(&mut context, infected).unwrap();
        assert_eq!(assignment.len(), 40);
        assert_eq!(context.get_schedule().total_len(), before);
        assert_eq!(context.get_counters().total_num_infected, 1);
    }

    #[test]
    fn resolution_window_past_day_counter_is_rejected() {
        let parameters = Parameters {
            incubation: u32::MAX - 60,
            ..Parameters::covid19()
        };
        let mut context = setup(parameters, 20);
        let before = context.get_schedule().total_len();
        let infected: Vec<PersonId> = (1..11).map(PersonId).collect();
        infect(&mut context, &infected);
        let assignment = partition_cohorts(&mut context, infected).unwrap();

        let result = schedule_cohorts(&mut context, &assignment, 100);
        assert!(matches!(
            result,
            Err(OutbreakError::InvalidConfiguration(_))
        ));
        assert_eq!(context.get_schedule().total_len(), before);
    }

    #[test]
    fn same_seed_same_assignment() {
        let run = || {
            let mut context = setup(Parameters::covid19(), 200);
            let infected: Vec<PersonId> = (1..51).map(PersonId).collect();
            infect(&mut context, &infected);
            let assignment = assign_symptoms(&mut context, infected, 7).unwrap();
            (assignment, context.get_schedule().clone())
        };
        assert_eq!(run(), run());
    }
}
