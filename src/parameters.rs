//! Disease parameters for a run.
//!
//! `Parameters` is a single immutable structure supplied at construction. Every field is
//! required; nothing is defaulted internally. Parameters are validated before they are stored on
//! the `Context`, so every later stage can rely on the domain constraints below.
use std::fs;
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::numeric::{almost_eq, FRACTION_TOLERANCE};
use crate::schedule::Outcome;

/// Disease progression parameters. Ranges are `(low, high)` day offsets from the end of
/// incubation; the high end is exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Basic reproduction number applied once per serial interval.
    pub r0: f64,
    /// Days between infection and the start of any recovery or death window.
    pub incubation: u32,
    pub percent_mild: f64,
    pub mild_recovery: (u32, u32),
    pub percent_severe: f64,
    pub severe_recovery: (u32, u32),
    pub severe_death: (u32, u32),
    /// Fraction of all infections that end in death. Never exceeds `percent_severe`.
    pub fatality_rate: f64,
    /// Days between successive infection waves.
    pub serial_interval: u32,
}

impl Parameters {
    /// COVID-19-like reference parameters.
    #[must_use]
    pub fn covid19() -> Parameters {
        Parameters {
            r0: 2.28,
            incubation: 5,
            percent_mild: 0.8,
            mild_recovery: (7, 14),
            percent_severe: 0.2,
            severe_recovery: (21, 42),
            severe_death: (14, 56),
            fatality_rate: 0.034,
            serial_interval: 7,
        }
    }

    /// Parses and validates parameters from a JSON document.
    ///
    /// # Errors
    ///
    /// `JsonError` if the document is malformed or misses a field, `InvalidConfiguration` if a
    /// value violates the domain constraints.
    pub fn from_json_str(json: &str) -> Result<Parameters, OutbreakError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Reads, parses and validates parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// `IoError` if the file cannot be read, otherwise as [`Parameters::from_json_str`].
    pub fn from_json_file(path: &Path) -> Result<Parameters, OutbreakError> {
        trace!("loading parameters from {}", path.display());
        let json = fs::read_to_string(path)?;
        Parameters::from_json_str(&json)
    }

    /// Checks every domain constraint.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` naming the first violated constraint.
    pub fn validate(&self) -> Result<(), OutbreakError> {
        let invalid = |message: String| Err(OutbreakError::InvalidConfiguration(message));

        if !self.r0.is_finite() || self.r0 < 0.0 {
            return invalid(format!("r0 must be a non-negative number, got {}", self.r0));
        }
        for (name, value) in [
            ("percent_mild", self.percent_mild),
            ("percent_severe", self.percent_severe),
            ("fatality_rate", self.fatality_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must lie in [0, 1], got {value}"));
            }
        }
        if !almost_eq(
            self.percent_mild + self.percent_severe,
            1.0,
            FRACTION_TOLERANCE,
        ) {
            return invalid(format!(
                "percent_mild + percent_severe must equal 1, got {}",
                self.percent_mild + self.percent_severe
            ));
        }
        if self.fatality_rate > self.percent_severe {
            return invalid(format!(
                "fatality_rate ({}) cannot exceed percent_severe ({})",
                self.fatality_rate, self.percent_severe
            ));
        }
        if self.serial_interval == 0 {
            return invalid("serial_interval must be at least one day".to_string());
        }
        for (name, (low, high)) in [
            ("mild_recovery", self.mild_recovery),
            ("severe_recovery", self.severe_recovery),
            ("severe_death", self.severe_death),
        ] {
            if low >= high {
                return invalid(format!(
                    "{name} must be a non-empty range, got ({low}, {high})"
                ));
            }
            if self.incubation.checked_add(high).is_none() {
                return invalid(format!(
                    "incubation + {name} overflows the day counter, got {} + {high}",
                    self.incubation
                ));
            }
            if self.incubation + low == 0 {
                return invalid(format!(
                    "{name} would resolve an infection on the day it starts"
                ));
            }
        }
        Ok(())
    }

    /// Checks that every resolution drawn on or before `horizon` fits the day counter.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `horizon` plus the latest resolution offset overflows.
    pub fn validate_horizon(&self, horizon: u32) -> Result<(), OutbreakError> {
        let latest = self.latest_resolution_offset();
        if horizon.checked_add(latest).is_none() {
            return Err(OutbreakError::InvalidConfiguration(format!(
                "horizon {horizon} plus the latest resolution offset {latest} overflows the day counter"
            )));
        }
        Ok(())
    }

    /// The `[fast, slow)` window of resolution offsets, in days after infection, for a cohort.
    #[must_use]
    pub fn resolution_offsets(&self, outcome: Outcome) -> (u32, u32) {
        let (low, high) = match outcome {
            Outcome::Mild => self.mild_recovery,
            Outcome::SevereRecovery => self.severe_recovery,
            Outcome::Death => self.severe_death,
        };
        (
            self.incubation.saturating_add(low),
            self.incubation.saturating_add(high),
        )
    }

    /// Exclusive upper bound of every cohort's resolution offsets.
    #[must_use]
    pub fn latest_resolution_offset(&self) -> u32 {
        Outcome::ALL
            .iter()
            .map(|&outcome| self.resolution_offsets(outcome).1)
            .max()
            .unwrap_or_default()
    }

    /// Day on which patient zero's mild course resolves.
    #[must_use]
    pub fn mild_fast(&self) -> u32 {
        self.resolution_offsets(Outcome::Mild).0
    }

    /// Share of severe cases that recover, `1 - fatality_rate / percent_severe`. With no severe
    /// cases there are no deaths either, so every severe case (there are none) recovers.
    #[must_use]
    pub fn percent_severe_recovery(&self) -> f64 {
        if self.percent_severe == 0.0 {
            return 1.0;
        }
        1.0 - self.fatality_rate / self.percent_severe
    }
}

define_data_plugin!(ParametersPlugin, Option<Parameters>, None);

pub trait ContextParametersExt {
    /// Validates and stores the run's parameters.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if validation fails; nothing is stored in that case.
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), OutbreakError>;

    /// Loads, validates and stores parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// As [`Parameters::from_json_file`].
    fn load_parameters(&mut self, path: &Path) -> Result<(), OutbreakError>;

    /// Returns the stored parameters.
    ///
    /// # Panics
    ///
    /// Panics if no parameters have been set.
    fn get_parameters(&self) -> &Parameters;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), OutbreakError> {
        parameters.validate()?;
        *self.get_data_container_mut(ParametersPlugin) = Some(parameters);
        Ok(())
    }

    fn load_parameters(&mut self, path: &Path) -> Result<(), OutbreakError> {
        let parameters = Parameters::from_json_file(path)?;
        self.set_parameters(parameters)
    }

    fn get_parameters(&self) -> &Parameters {
        self.get_data_container(ParametersPlugin)
            .and_then(Option::as_ref)
            .expect("Parameters have not been set")
    }
}
