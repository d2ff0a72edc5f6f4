//! A discrete-time epidemic progression engine
//!
//! Outbreak models the day-by-day spread of an infectious disease through a
//! fixed population laid out on a golden-angle spiral. Every newly infected
//! individual is assigned a randomized clinical trajectory (mild recovery,
//! severe recovery, or death) together with the day on which it resolves.
//!
//! The central object is the [`Context`], which owns all of the simulation
//! state in type-keyed data containers and a queue of plans keyed by day.
//! Each concern is a module that extends `Context` with a trait:
//! * [`population`] lays out the individuals and seeds patient zero.
//! * [`health`] tracks per-individual status and the aggregate counters.
//! * [`schedule`] holds the day-bucketed resolution schedules.
//! * [`symptoms`] partitions a batch of new infections into outcome cohorts.
//! * [`spread`] decides on each day whether a wave of infection occurs.
//! * [`clock`] owns the day counter and sequences one simulated day.
//! * [`report`] and [`incidence_report`] write CSV output driven by events.
//!
//! A rendering collaborator only reads snapshots between steps; the
//! [`render`] module adapts the core state into recolor instructions and
//! never draws anything itself.
pub mod clock;
pub mod context;
pub mod error;
pub mod hashing;
pub mod health;
pub mod incidence_report;
pub mod log;
pub mod numeric;
pub mod parameters;
pub mod plan;
pub mod population;
pub mod prelude;
pub mod random;
pub mod render;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod spread;
pub mod symptoms;

pub use clock::{ContextClockExt, DayCompletedEvent, DaySnapshot, Simulation, SimulationOptions};
pub use context::{Context, DataPlugin};
pub use error::OutbreakError;
pub use hashing::{HashMap, HashMapExt, HashSet, HashSetExt};
pub use health::{AggregateCounters, ContextHealthExt, HealthStatus};
pub use incidence_report::ContextIncidenceReportExt;
pub use parameters::{ContextParametersExt, Parameters};
pub use population::{ContextPopulationExt, PersonId, Position};
pub use random::{ContextRandomExt, RngId};
pub use render::{RenderFrame, Rgb};
pub use report::{ContextReportExt, Report, ReportOptions};
pub use schedule::{
    ContextScheduleExt, Outcome, ResolutionScheduledEvent, ScheduleBuckets, ScheduleEntry,
};
pub use spread::{ContextSpreadExt, ExposureWindow, Wave};
pub use symptoms::CohortAssignment;

// Re-exports for use in the exported macros.
pub use csv;
pub use paste;
pub use rand;
