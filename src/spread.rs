//! The spread engine: decides on which days a wave of infection happens and who it reaches.
//!
//! Individuals become exposed in contiguous index blocks. The block reached by the previous
//! wave is `[exposed_before, exposed_after)`; the next wave starts at the old ceiling. A wave
//! happens on days that are multiples of the serial interval while some of the population is
//! still unexposed. Its size is `round(r0 × total_num_infected)` and the exposure window grows by
//! `round(1.1 × size)`. If that would run past the end of the population the window is clamped
//! to N and the wave shrinks to `round(0.9 × remaining)`.
use log::{debug, trace};

use crate::context::Context;
use crate::define_data_plugin;
use crate::define_rng;
use crate::error::OutbreakError;
use crate::health::ContextHealthExt;
use crate::numeric::scale_count;
use crate::parameters::ContextParametersExt;
use crate::population::{ContextPopulationExt, PersonId};
use crate::random::ContextRandomExt;
use crate::symptoms::{partition_cohorts, schedule_cohorts};

define_rng!(SpreadRng);

/// Buffer applied to a wave's size when widening the exposure window.
pub const EXPOSURE_BUFFER: f64 = 1.1;
/// Share of the remaining population infected by a wave that saturates the window.
pub const SATURATION_FACTOR: f64 = 0.9;

/// The half-open index range `[exposed_before, exposed_after)` drawn from by the latest wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExposureWindow {
    pub exposed_before: usize,
    pub exposed_after: usize,
}

impl ExposureWindow {
    #[must_use]
    pub fn len(&self) -> usize {
        self.exposed_after - self.exposed_before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One batch of infections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    pub day: u32,
    pub window: ExposureWindow,
    pub infected: Vec<PersonId>,
    /// Whether the window was clamped to the end of the population.
    pub saturated: bool,
}

#[derive(Default)]
struct SpreadState {
    window: ExposureWindow,
    waves: Vec<Wave>,
}

define_data_plugin!(SpreadPlugin, SpreadState, SpreadState::default());

pub trait ContextSpreadExt {
    /// Records the seeding wave: patient zero on day 0, window `[0, 1)`.
    fn init_spread(&mut self);

    fn get_exposure_window(&self) -> ExposureWindow;

    /// Replaces the exposure window, e.g. to start a run part-way through the population.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` unless `exposed_before ≤ exposed_after ≤ N`.
    fn set_exposure_window(&mut self, window: ExposureWindow) -> Result<(), OutbreakError>;

    /// Every wave so far, seeding wave first.
    fn get_waves(&self) -> &[Wave];

    /// Individuals infected on `day`; empty unless a wave happened that day.
    fn get_newly_infected(&self, day: u32) -> &[PersonId];

    /// Runs the spread rule for `day`. Returns the wave, or `None` if no wave was due.
    ///
    /// # Errors
    ///
    /// `InsufficientPool` if the wave is larger than its window, or any error from assigning
    /// the wave's outcomes.
    fn spread_step(&mut self, day: u32) -> Result<Option<Wave>, OutbreakError>;
}

impl ContextSpreadExt for Context {
    fn init_spread(&mut self) {
        trace!("Initializing spread engine");
        let window = ExposureWindow {
            exposed_before: 0,
            exposed_after: 1,
        };
        let state = self.get_data_container_mut(SpreadPlugin);
        state.window = window;
        state.waves = vec![Wave {
            day: 0,
            window,
            infected: vec![PersonId::PATIENT_ZERO],
            saturated: false,
        }];
    }

    fn get_exposure_window(&self) -> ExposureWindow {
        self.get_data_container(SpreadPlugin)
            .map(|state| state.window)
            .unwrap_or_default()
    }

    fn set_exposure_window(&mut self, window: ExposureWindow) -> Result<(), OutbreakError> {
        let population_size = self.get_population_size();
        if window.exposed_before > window.exposed_after || window.exposed_after > population_size
        {
            return Err(OutbreakError::InvalidConfiguration(format!(
                "exposure window [{}, {}) does not fit a population of {population_size}",
                window.exposed_before, window.exposed_after
            )));
        }
        self.get_data_container_mut(SpreadPlugin).window = window;
        Ok(())
    }

    fn get_waves(&self) -> &[Wave] {
        self.get_data_container(SpreadPlugin)
            .map_or(&[], |state| state.waves.as_slice())
    }

    fn get_newly_infected(&self, day: u32) -> &[PersonId] {
        self.get_waves()
            .iter()
            .rev()
            .find(|wave| wave.day == day)
            .map_or(&[], |wave| wave.infected.as_slice())
    }

    fn spread_step(&mut self, day: u32) -> Result<Option<Wave>, OutbreakError> {
        let population_size = self.get_population_size();
        let (r0, serial_interval) = {
            let parameters = self.get_parameters();
            (parameters.r0, parameters.serial_interval)
        };
        let previous = self.get_exposure_window();
        if day % serial_interval != 0 || previous.exposed_after >= population_size {
            return Ok(None);
        }

        let exposed_before = previous.exposed_after;
        let total_num_infected = self.get_counters().total_num_infected;
        let free = population_size - exposed_before;
        let wanted = scale_count(total_num_infected, r0);
        let growth = scale_count(wanted, EXPOSURE_BUFFER);
        let saturated = growth > free;
        let (new_infected_count, exposed_after) = if saturated {
            let reduced = scale_count(free, SATURATION_FACTOR);
            debug!("day {day}: exposure window saturated, wave reduced to {reduced}");
            (reduced, population_size)
        } else {
            (wanted, exposed_before + growth)
        };

        let window = ExposureWindow {
            exposed_before,
            exposed_after,
        };
        let infected: Vec<PersonId> = self
            .sample_without_replacement(
                SpreadRng,
                exposed_before..exposed_after,
                new_infected_count,
            )?
            .into_iter()
            .map(PersonId)
            .collect();
        let assignment = partition_cohorts(self, infected.clone())?;
        trace!(
            "day {day}: {} mild, {} severe recovery, {} death",
            assignment.mild.len(),
            assignment.severe_recovery.len(),
            assignment.death.len()
        );

        self.get_data_container_mut(SpreadPlugin).window = window;
        self.record_new_infections(new_infected_count);
        for &person_id in &infected {
            self.mark_infected(person_id)?;
        }
        debug!(
            "day {day}: wave of {new_infected_count} over [{exposed_before}, {exposed_after})"
        );
        schedule_cohorts(self, &assignment, day)?;

        let wave = Wave {
            day,
            window,
            infected,
            saturated,
        };
        self.get_data_container_mut(SpreadPlugin)
            .waves
            .push(wave.clone());
        Ok(Some(wave))
    }
}
