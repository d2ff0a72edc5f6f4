//! The fixed population and its spiral layout.
//!
//! Individuals are identified by a stable index into a population of size N. Each individual is
//! placed once, at construction, on a golden-angle spiral so that points are spread with uniform
//! density over the unit disc: for `k = i + 0.5`, `angle = π(1 + √5)·k` and `radius = √(k/N)`.
use std::f64::consts::PI;
use std::fmt;

use log::trace;
use serde::Serialize;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::health::ContextHealthExt;
use crate::parameters::ContextParametersExt;
use crate::schedule::{ContextScheduleExt, Outcome};

/// Default number of individuals in a run.
pub const DEFAULT_POPULATION_SIZE: usize = 4500;

/// Index of an individual in `0..N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonId(pub usize);

impl PersonId {
    /// Patient zero is always the first individual.
    pub const PATIENT_ZERO: PersonId = PersonId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Polar coordinates of an individual. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub angle: f64,
    pub radius: f64,
}

/// Lays out `population_size` individuals on the golden-angle spiral.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn spiral_layout(population_size: usize) -> Vec<Position> {
    let golden_angle = PI * (1.0 + 5f64.sqrt());
    let n = population_size as f64;
    (0..population_size)
        .map(|i| {
            let k = i as f64 + 0.5;
            Position {
                angle: golden_angle * k,
                radius: (k / n).sqrt(),
            }
        })
        .collect()
}

define_data_plugin!(PopulationPlugin, Vec<Position>, Vec::new());

pub trait ContextPopulationExt {
    /// Lays out the population, creates every individual's health record, and seeds patient
    /// zero: infected on day 0 with a mild course that resolves on day
    /// `incubation + mild_recovery.0`. Parameters and the schedule must already be initialized.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `population_size` is zero or the population already exists.
    fn init_population(&mut self, population_size: usize) -> Result<(), OutbreakError>;

    /// Number of individuals, zero before `init_population`.
    fn get_population_size(&self) -> usize;

    /// # Panics
    ///
    /// Panics if `person_id` is out of range.
    fn get_position(&self, person_id: PersonId) -> Position;

    fn get_positions(&self) -> &[Position];
}

impl ContextPopulationExt for Context {
    fn init_population(&mut self, population_size: usize) -> Result<(), OutbreakError> {
        trace!("Initializing population of {population_size}");
        if population_size == 0 {
            return Err(OutbreakError::InvalidConfiguration(
                "population size must be at least one".to_string(),
            ));
        }
        if self.get_population_size() != 0 {
            return Err(OutbreakError::InvalidConfiguration(
                "population has already been initialized".to_string(),
            ));
        }
        *self.get_data_container_mut(PopulationPlugin) = spiral_layout(population_size);
        self.init_health(population_size);

        let patient_zero = PersonId::PATIENT_ZERO;
        let resolution_day = self.get_parameters().mild_fast();
        self.record_new_infections(1);
        self.mark_infected(patient_zero)?;
        self.schedule_resolution(patient_zero, 0, resolution_day, Outcome::Mild);
        Ok(())
    }

    fn get_population_size(&self) -> usize {
        self.get_data_container(PopulationPlugin)
            .map_or(0, Vec::len)
    }

    fn get_position(&self, person_id: PersonId) -> Position {
        self.get_positions()[person_id.index()]
    }

    fn get_positions(&self) -> &[Position] {
        self.get_data_container(PopulationPlugin)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::health::HealthStatus;
    use crate::parameters::Parameters;

    fn setup(population_size: usize) -> Context {
        let mut context = Context::new();
        context.set_parameters(Parameters::covid19()).unwrap();
        context.init_schedule(365);
        context.init_population(population_size).unwrap();
        context
    }

    #[test]
    fn spiral_layout_first_points() {
        let positions = spiral_layout(4500);
        assert_eq!(positions.len(), 4500);
        let golden_angle = PI * (1.0 + 5f64.sqrt());
        assert_approx_eq!(positions[0].angle, golden_angle * 0.5);
        assert_approx_eq!(positions[0].radius, (0.5f64 / 4500.0).sqrt());
        assert_approx_eq!(positions[1].angle, golden_angle * 1.5);
        assert_approx_eq!(positions[1].radius, (1.5f64 / 4500.0).sqrt());
    }

    #[test]
    fn spiral_layout_stays_in_unit_disc() {
        let positions = spiral_layout(1000);
        assert!(positions.iter().all(|p| p.radius > 0.0 && p.radius < 1.0));
        // Radius grows with index
        assert!(positions.windows(2).all(|w| w[0].radius < w[1].radius));
    }

    #[test]
    fn spiral_layout_is_deterministic() {
        assert_eq!(spiral_layout(321), spiral_layout(321));
    }

    #[test]
    fn init_population_seeds_patient_zero() {
        let context = setup(4500);
        assert_eq!(context.get_population_size(), 4500);
        assert_eq!(
            context.get_health_status(PersonId::PATIENT_ZERO),
            HealthStatus::Infected
        );
        assert_eq!(
            context.get_health_status(PersonId(1)),
            HealthStatus::Uninfected
        );

        let counters = context.get_counters();
        assert_eq!(counters.total_num_infected, 1);
        assert_eq!(counters.num_currently_infected, 1);

        let due = context.get_schedule().due_on(Outcome::Mild, 12);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].person_id, PersonId::PATIENT_ZERO);
        assert_eq!(due[0].position, context.get_position(PersonId::PATIENT_ZERO));
    }

    #[test]
    fn init_population_rejects_empty_and_repeat() {
        let mut context = Context::new();
        context.set_parameters(Parameters::covid19()).unwrap();
        context.init_schedule(365);
        assert!(matches!(
            context.init_population(0),
            Err(OutbreakError::InvalidConfiguration(_))
        ));

        context.init_population(10).unwrap();
        assert!(matches!(
            context.init_population(10),
            Err(OutbreakError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn single_person_population() {
        let context = setup(1);
        assert_eq!(context.get_population_size(), 1);
        assert_approx_eq!(context.get_position(PersonId(0)).radius, 0.5f64.sqrt());
    }
}
