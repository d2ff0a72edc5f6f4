//! The day stepper.
//!
//! A run is set up once by [`ContextClockExt::init_simulation`]. That call validates the
//! inputs, lays out the population, seeds patient zero on day 0 and records the seeding wave.
//! Each [`ContextClockExt::step_day`] then advances the clock by exactly one day:
//! 1. resolutions due that day move their individuals to a terminal status,
//! 2. the spread rule runs for that day,
//! 3. a [`DayCompletedEvent`] carrying the day's snapshot is emitted and handled.
//!
//! The clock never passes the horizon.
use log::{info, trace};
use serde::Serialize;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::health::{AggregateCounters, ContextHealthExt};
use crate::parameters::{ContextParametersExt, Parameters};
use crate::population::{ContextPopulationExt, DEFAULT_POPULATION_SIZE};
use crate::random::ContextRandomExt;
use crate::render::RenderFrame;
use crate::report::ContextReportExt;
use crate::schedule::{ContextScheduleExt, ScheduleBuckets, DEFAULT_HORIZON};
use crate::spread::{ContextSpreadExt, ExposureWindow};

/// Run options that are not disease parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    pub population_size: usize,
    /// Last day the clock can reach.
    pub horizon: u32,
    pub random_seed: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            population_size: DEFAULT_POPULATION_SIZE,
            horizon: DEFAULT_HORIZON,
            random_seed: 0,
        }
    }
}

/// State exposed after a day completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySnapshot {
    pub day: u32,
    pub new_infections: usize,
    pub counters: AggregateCounters,
}

/// Emitted once the seeding on day 0 and every later day-step have finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCompletedEvent {
    pub snapshot: DaySnapshot,
}

struct ClockState {
    horizon: Option<u32>,
}

define_data_plugin!(ClockPlugin, ClockState, ClockState { horizon: None });

// Failures raised inside plans and event handlers, resolution errors first.
fn take_deferred_error(context: &mut Context) -> Option<OutbreakError> {
    context
        .take_resolution_error()
        .or_else(|| context.take_report_error())
}

pub trait ContextClockExt {
    /// Sets up a run. Any reports should be added beforehand so they see day 0.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the parameters or options are invalid, or the context has
    /// already been initialized. Any error raised by a report while recording day 0.
    fn init_simulation(
        &mut self,
        parameters: Parameters,
        options: SimulationOptions,
    ) -> Result<(), OutbreakError>;

    /// The last day the clock can reach, `None` before initialization.
    fn get_horizon(&self) -> Option<u32>;

    /// Advances one day.
    ///
    /// # Errors
    ///
    /// `HorizonReached` once the clock is on the horizon, or any error raised while resolving
    /// or spreading infections or writing reports.
    fn step_day(&mut self) -> Result<DaySnapshot, OutbreakError>;

    /// Steps until the horizon and returns the final snapshot.
    ///
    /// # Errors
    ///
    /// As [`ContextClockExt::step_day`], except `HorizonReached`.
    fn run_to_horizon(&mut self) -> Result<DaySnapshot, OutbreakError>;

    /// The state as of the end of the current day.
    fn snapshot(&self) -> DaySnapshot;
}

impl ContextClockExt for Context {
    fn init_simulation(
        &mut self,
        parameters: Parameters,
        options: SimulationOptions,
    ) -> Result<(), OutbreakError> {
        trace!("Initializing simulation");
        if self.get_horizon().is_some() {
            return Err(OutbreakError::InvalidConfiguration(
                "simulation has already been initialized".to_string(),
            ));
        }
        if options.horizon == 0 {
            return Err(OutbreakError::InvalidConfiguration(
                "horizon must be at least one day".to_string(),
            ));
        }
        if options.population_size == 0 {
            return Err(OutbreakError::InvalidConfiguration(
                "population size must be at least one".to_string(),
            ));
        }

        self.set_parameters(parameters)?;
        self.get_parameters().validate_horizon(options.horizon)?;
        self.init_random(options.random_seed);
        self.init_schedule(options.horizon);
        self.init_population(options.population_size)?;
        self.init_spread();
        self.get_data_container_mut(ClockPlugin).horizon = Some(options.horizon);

        info!(
            "Simulation initialized: population {}, horizon {}, seed {}",
            options.population_size, options.horizon, options.random_seed
        );
        let snapshot = self.snapshot();
        self.emit_event(DayCompletedEvent { snapshot });
        self.execute_through(0);
        take_deferred_error(self).map_or(Ok(()), Err)
    }

    fn get_horizon(&self) -> Option<u32> {
        self.get_data_container(ClockPlugin)
            .and_then(|state| state.horizon)
    }

    fn step_day(&mut self) -> Result<DaySnapshot, OutbreakError> {
        let horizon = self.get_horizon().ok_or_else(|| {
            OutbreakError::OutbreakError("simulation has not been initialized".to_string())
        })?;
        let current_day = self.get_current_day();
        if current_day >= horizon {
            return Err(OutbreakError::HorizonReached(horizon));
        }
        let day = current_day + 1;

        self.execute_through(day);
        if let Some(err) = take_deferred_error(self) {
            return Err(err);
        }

        self.spread_step(day)?;

        let snapshot = self.snapshot();
        self.emit_event(DayCompletedEvent { snapshot });
        self.execute_through(day);
        take_deferred_error(self).map_or(Ok(snapshot), Err)
    }

    fn run_to_horizon(&mut self) -> Result<DaySnapshot, OutbreakError> {
        let horizon = self.get_horizon().ok_or_else(|| {
            OutbreakError::OutbreakError("simulation has not been initialized".to_string())
        })?;
        let mut snapshot = self.snapshot();
        while self.get_current_day() < horizon {
            snapshot = self.step_day()?;
        }
        info!(
            "Simulation reached day {}: {} infected in total, {} recovered, {} dead",
            snapshot.day,
            snapshot.counters.total_num_infected,
            snapshot.counters.num_recovered,
            snapshot.counters.num_deaths
        );
        Ok(snapshot)
    }

    fn snapshot(&self) -> DaySnapshot {
        let day = self.get_current_day();
        DaySnapshot {
            day,
            new_infections: self.get_newly_infected(day).len(),
            counters: self.get_counters(),
        }
    }
}

/// An initialized run that owns its [`Context`].
pub struct Simulation {
    context: Context,
}

impl Simulation {
    /// Builds and initializes a run with no reports.
    ///
    /// # Errors
    ///
    /// As [`ContextClockExt::init_simulation`].
    pub fn new(
        parameters: Parameters,
        options: SimulationOptions,
    ) -> Result<Simulation, OutbreakError> {
        Simulation::with_context(Context::new(), parameters, options)
    }

    /// Initializes a run on a prepared context, e.g. one with reports already added.
    ///
    /// # Errors
    ///
    /// As [`ContextClockExt::init_simulation`].
    pub fn with_context(
        mut context: Context,
        parameters: Parameters,
        options: SimulationOptions,
    ) -> Result<Simulation, OutbreakError> {
        context.init_simulation(parameters, options)?;
        Ok(Simulation { context })
    }

    /// # Errors
    ///
    /// As [`ContextClockExt::step_day`].
    pub fn step_day(&mut self) -> Result<DaySnapshot, OutbreakError> {
        self.context.step_day()
    }

    /// # Errors
    ///
    /// As [`ContextClockExt::run_to_horizon`].
    pub fn run_to_horizon(&mut self) -> Result<DaySnapshot, OutbreakError> {
        self.context.run_to_horizon()
    }

    #[must_use]
    pub fn snapshot(&self) -> DaySnapshot {
        self.context.snapshot()
    }

    #[must_use]
    pub fn day(&self) -> u32 {
        self.context.get_current_day()
    }

    #[must_use]
    pub fn counters(&self) -> AggregateCounters {
        self.context.get_counters()
    }

    #[must_use]
    pub fn schedule(&self) -> &ScheduleBuckets {
        self.context.get_schedule()
    }

    #[must_use]
    pub fn exposure_window(&self) -> ExposureWindow {
        self.context.get_exposure_window()
    }

    /// Recolor instructions for the current day.
    #[must_use]
    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame::for_day(&self.context, self.day())
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    #[must_use]
    pub fn into_context(self) -> Context {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::population::PersonId;
    use crate::schedule::Outcome;

    fn options(horizon: u32) -> SimulationOptions {
        SimulationOptions {
            horizon,
            random_seed: 11,
            ..SimulationOptions::default()
        }
    }

    #[test]
    fn day_zero_after_construction() {
        let simulation = Simulation::new(Parameters::covid19(), options(365)).unwrap();
        let snapshot = simulation.snapshot();
        assert_eq!(snapshot.day, 0);
        assert_eq!(snapshot.new_infections, 1);
        assert_eq!(snapshot.counters.total_num_infected, 1);
        assert_eq!(snapshot.counters.num_currently_infected, 1);
        let due = simulation.schedule().due_on(Outcome::Mild, 12);
        assert_eq!(due[0].person_id, PersonId::PATIENT_ZERO);
    }

    #[test]
    fn step_advances_one_day() {
        let mut simulation = Simulation::new(Parameters::covid19(), options(365)).unwrap();
        for expected in 1..=6 {
            let snapshot = simulation.step_day().unwrap();
            assert_eq!(snapshot.day, expected);
            assert_eq!(snapshot.new_infections, 0);
        }
        let snapshot = simulation.step_day().unwrap();
        assert_eq!(snapshot.day, 7);
        assert_eq!(snapshot.new_infections, 2);
        assert_eq!(snapshot.counters.total_num_infected, 3);
    }

    #[test]
    fn patient_zero_recovers_on_day_twelve() {
        let mut simulation = Simulation::new(Parameters::covid19(), options(365)).unwrap();
        for _ in 0..11 {
            simulation.step_day().unwrap();
        }
        assert_eq!(simulation.counters().num_recovered, 0);
        simulation.step_day().unwrap();
        assert_eq!(simulation.counters().num_recovered, 1);
    }

    #[test]
    fn horizon_is_never_passed() {
        let mut simulation = Simulation::new(Parameters::covid19(), options(3)).unwrap();
        let snapshot = simulation.run_to_horizon().unwrap();
        assert_eq!(snapshot.day, 3);
        assert!(matches!(
            simulation.step_day(),
            Err(OutbreakError::HorizonReached(3))
        ));
        assert_eq!(simulation.day(), 3);
    }

    #[test]
    fn offsets_overflowing_the_day_counter_are_rejected() {
        let parameters = Parameters {
            incubation: u32::MAX - 3,
            ..Parameters::covid19()
        };
        assert!(matches!(
            Simulation::new(parameters, options(365)),
            Err(OutbreakError::InvalidConfiguration(_))
        ));

        // Offsets fit on their own but not after the horizon.
        let parameters = Parameters {
            incubation: u32::MAX - 100,
            ..Parameters::covid19()
        };
        assert!(parameters.validate().is_ok());
        assert!(matches!(
            Simulation::new(parameters, options(365)),
            Err(OutbreakError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn huge_r0_saturates_instead_of_overflowing() {
        let parameters = Parameters {
            r0: 1e20,
            ..Parameters::covid19()
        };
        let mut simulation = Simulation::new(parameters, options(30)).unwrap();
        for _ in 0..7 {
            simulation.step_day().unwrap();
        }
        let population_size = SimulationOptions::default().population_size;
        let window = simulation.exposure_window();
        assert_eq!(window.exposed_before, 1);
        assert_eq!(window.exposed_after, population_size);
        // round(0.9 × (N - 1)) = 4049
        let snapshot = simulation.snapshot();
        assert_eq!(snapshot.new_infections, 4049);
        assert_eq!(snapshot.counters.total_num_infected, 4050);
    }

    #[test]
    fn invalid_options_rejected() {
        assert!(matches!(
            Simulation::new(Parameters::covid19(), options(0)),
            Err(OutbreakError::InvalidConfiguration(_))
        ));
        let empty = SimulationOptions {
            population_size: 0,
            ..SimulationOptions::default()
        };
        assert!(Simulation::new(Parameters::covid19(), empty).is_err());

        let bad_parameters = Parameters {
            percent_mild: 0.5,
            ..Parameters::covid19()
        };
        assert!(matches!(
            Simulation::new(bad_parameters, options(10)),
            Err(OutbreakError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn init_twice_rejected() {
        let mut context = Context::new();
        context
            .init_simulation(Parameters::covid19(), options(10))
            .unwrap();
        assert!(context
            .init_simulation(Parameters::covid19(), options(10))
            .is_err());
    }

    #[test]
    fn step_before_init_is_an_error() {
        let mut context = Context::new();
        assert!(context.step_day().is_err());
    }

    #[test]
    fn day_completed_events() {
        let days = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&days);
        let mut context = Context::new();
        context.subscribe_to_event(move |_, event: DayCompletedEvent| {
            sink.borrow_mut().push(event.snapshot.day);
        });
        let mut simulation =
            Simulation::with_context(context, Parameters::covid19(), options(4)).unwrap();
        simulation.run_to_horizon().unwrap();
        assert_eq!(*days.borrow(), vec![0, 1, 2, 3, 4]);
    }
}
