//! Adapter from simulation state to drawing instructions.
//!
//! Nothing here draws. A [`RenderFrame`] lists which points change color on a given day so a
//! front end can repaint only those, in the order given.
use serde::Serialize;

use crate::context::Context;
use crate::health::{ContextHealthExt, HealthStatus};
use crate::population::{ContextPopulationExt, PersonId, Position};
use crate::schedule::{ContextScheduleExt, Outcome};
use crate::spread::ContextSpreadExt;

/// An RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub const GREY: Rgb = Rgb(0.78, 0.78, 0.78);
    pub const RED: Rgb = Rgb(0.96, 0.15, 0.15);
    pub const GREEN: Rgb = Rgb(0.0, 0.86, 0.03);
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
}

impl HealthStatus {
    #[must_use]
    pub fn color(self) -> Rgb {
        match self {
            HealthStatus::Uninfected => Rgb::GREY,
            HealthStatus::Infected => Rgb::RED,
            HealthStatus::RecoveredMild | HealthStatus::RecoveredSevere => Rgb::GREEN,
            HealthStatus::Dead => Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recolor {
    pub person_id: PersonId,
    pub position: Position,
    pub color: Rgb,
}

/// Points to repaint for one day: new infections first, then resolutions by outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub day: u32,
    pub recolors: Vec<Recolor>,
}

impl RenderFrame {
    /// Reads the day's wave and schedule buckets. Does not modify the context.
    #[must_use]
    pub fn for_day(context: &Context, day: u32) -> RenderFrame {
        let infected = context
            .get_newly_infected(day)
            .iter()
            .map(|&person_id| Recolor {
                person_id,
                position: context.get_position(person_id),
                color: HealthStatus::Infected.color(),
            });

        let schedule = context.get_schedule();
        let resolved = Outcome::ALL.into_iter().flat_map(|outcome| {
            let color = outcome.terminal_status().color();
            schedule
                .due_on(outcome, day)
                .iter()
                .map(move |entry| Recolor {
                    person_id: entry.person_id,
                    position: entry.position,
                    color,
                })
        });

        RenderFrame {
            day,
            recolors: infected.chain(resolved).collect(),
        }
    }

    /// Colors of the whole population as of the current day.
    #[must_use]
    pub fn full(context: &Context) -> RenderFrame {
        let recolors = context
            .get_positions()
            .iter()
            .enumerate()
            .map(|(index, &position)| {
                let person_id = PersonId(index);
                Recolor {
                    person_id,
                    position,
                    color: context.get_health_status(person_id).color(),
                }
            })
            .collect();
        RenderFrame {
            day: context.get_current_day(),
            recolors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Simulation, SimulationOptions};
    use crate::parameters::Parameters;

    fn simulation() -> Simulation {
        Simulation::new(
            Parameters::covid19(),
            SimulationOptions {
                population_size: 500,
                horizon: 60,
                random_seed: 3,
            },
        )
        .unwrap()
    }

    #[test]
    fn palette() {
        assert_eq!(HealthStatus::Uninfected.color(), Rgb::GREY);
        assert_eq!(HealthStatus::RecoveredSevere.color(), Rgb::GREEN);
        assert_eq!(HealthStatus::Dead.color(), Rgb::BLACK);
    }

    #[test]
    fn day_zero_frame_shows_patient_zero() {
        let simulation = simulation();
        let frame = simulation.render_frame();
        assert_eq!(frame.day, 0);
        assert_eq!(frame.recolors.len(), 1);
        assert_eq!(frame.recolors[0].person_id, PersonId::PATIENT_ZERO);
        assert_eq!(frame.recolors[0].color, Rgb::RED);
    }

    #[test]
    fn resolution_day_frame_shows_recovery() {
        let mut simulation = simulation();
        for _ in 0..12 {
            simulation.step_day().unwrap();
        }
        let frame = simulation.render_frame();
        assert!(frame
            .recolors
            .iter()
            .any(|r| r.person_id == PersonId::PATIENT_ZERO && r.color == Rgb::GREEN));
    }

    #[test]
    fn full_frame_matches_statuses() {
        let mut simulation = simulation();
        simulation.run_to_horizon().unwrap();
        let frame = RenderFrame::full(simulation.context());
        assert_eq!(frame.recolors.len(), 500);
        let red = frame.recolors.iter().filter(|r| r.color == Rgb::RED).count();
        assert_eq!(red, simulation.counters().num_currently_infected);
    }
}
