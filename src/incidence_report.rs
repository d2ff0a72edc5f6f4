//! Built-in reports: daily counts and the resolution schedule.
use log::{error, trace};
use serde::Serialize;

use crate::clock::DayCompletedEvent;
use crate::context::Context;
use crate::define_report;
use crate::error::OutbreakError;
use crate::population::PersonId;
use crate::report::ContextReportExt;
use crate::schedule::{Outcome, ResolutionScheduledEvent};

pub const DAILY_COUNTS_REPORT: &str = "daily_counts";
pub const RESOLUTION_REPORT: &str = "resolutions";

#[derive(Debug, Serialize)]
pub struct DailyCountsReport {
    pub day: u32,
    pub new_infections: usize,
    pub total_infected: usize,
    pub currently_infected: usize,
    pub recovered: usize,
    pub deaths: usize,
}

define_report!(DailyCountsReport);

#[derive(Debug, Serialize)]
pub struct ResolutionReport {
    pub person_id: PersonId,
    pub infection_day: u32,
    pub resolution_day: u32,
    pub outcome: Outcome,
    pub angle: f64,
    pub radius: f64,
}

define_report!(ResolutionReport);

fn handle_day_completed(context: &mut Context, event: DayCompletedEvent) {
    let snapshot = event.snapshot;
    trace!("Writing daily counts for day {}", snapshot.day);
    let result = context.send_report(DailyCountsReport {
        day: snapshot.day,
        new_infections: snapshot.new_infections,
        total_infected: snapshot.counters.total_num_infected,
        currently_infected: snapshot.counters.num_currently_infected,
        recovered: snapshot.counters.num_recovered,
        deaths: snapshot.counters.num_deaths,
    });
    if let Err(err) = result {
        error!("failed to write daily counts for day {}: {err}", snapshot.day);
        context.record_report_error(err);
    }
}

fn handle_resolution_scheduled(context: &mut Context, event: ResolutionScheduledEvent) {
    let result = context.send_report(ResolutionReport {
        person_id: event.person_id,
        infection_day: event.infection_day,
        resolution_day: event.resolution_day,
        outcome: event.outcome,
        angle: event.position.angle,
        radius: event.position.radius,
    });
    if let Err(err) = result {
        error!(
            "failed to write resolution of person {}: {err}",
            event.person_id
        );
        context.record_report_error(err);
    }
}

pub trait ContextIncidenceReportExt {
    /// Adds the daily counts report and subscribes it to day completion.
    ///
    /// # Errors
    ///
    /// As [`ContextReportExt::add_report`].
    fn add_daily_counts_report(&mut self) -> Result<(), OutbreakError>;

    /// Adds the resolution report and subscribes it to scheduling events.
    ///
    /// # Errors
    ///
    /// As [`ContextReportExt::add_report`].
    fn add_resolution_report(&mut self) -> Result<(), OutbreakError>;

    /// Adds both built-in reports. Call before the simulation is initialized.
    ///
    /// # Errors
    ///
    /// As [`ContextReportExt::add_report`].
    fn add_standard_reports(&mut self) -> Result<(), OutbreakError>;
}

impl ContextIncidenceReportExt for Context {
    fn add_daily_counts_report(&mut self) -> Result<(), OutbreakError> {
        trace!("Initializing daily counts report");
        self.add_report::<DailyCountsReport>(DAILY_COUNTS_REPORT)?;
        self.subscribe_to_event::<DayCompletedEvent>(handle_day_completed);
        Ok(())
    }

    fn add_resolution_report(&mut self) -> Result<(), OutbreakError> {
        trace!("Initializing resolution report");
        self.add_report::<ResolutionReport>(RESOLUTION_REPORT)?;
        self.subscribe_to_event::<ResolutionScheduledEvent>(handle_resolution_scheduled);
        Ok(())
    }

    fn add_standard_reports(&mut self) -> Result<(), OutbreakError> {
        self.add_daily_counts_report()?;
        self.add_resolution_report()
    }
}
