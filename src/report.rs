//! CSV reports.
//!
//! A report is a `Serialize` row type registered with [`define_report!`]. Each registered type
//! gets its own file, `{directory}/{file_prefix}{short_name}.csv`, and every
//! [`ContextReportExt::send_report`] call appends one row to it.
use std::any::TypeId;
use std::cell::RefCell;
use std::env;
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use csv::Writer;
use log::trace;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::{HashMap, HashMapExt};

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), csv::Error>;
}

/// Use this macro to define a unique report type
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::csv::Error> {
                writer.serialize(self)
            }
        }
    };
}
pub use define_report;

/// Where report files go and whether existing files may be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub directory: PathBuf,
    pub overwrite: bool,
}

impl ReportOptions {
    /// Reports go to the current working directory, with no prefix, and never overwrite.
    #[must_use]
    pub fn new() -> ReportOptions {
        ReportOptions {
            file_prefix: String::new(),
            directory: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            overwrite: false,
        }
    }

    pub fn file_prefix(&mut self, file_prefix: &str) -> &mut ReportOptions {
        self.file_prefix = file_prefix.to_string();
        self
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut ReportOptions {
        self.directory = directory;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    /// Full path of the file for a report named `short_name`.
    #[must_use]
    pub fn path_for(&self, short_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{short_name}.csv", self.file_prefix))
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

struct ReportData {
    file_writers: RefCell<HashMap<TypeId, Writer<File>>>,
    config: ReportOptions,
    write_error: Option<OutbreakError>,
}

// Registers a data container that stores
// * file_writers: Maps report type to file writer
// * config: Contains all the customizable filename options that the user supplies
// * write_error: First failure raised by an event-driven report, until the clock collects it
define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: RefCell::new(HashMap::new()),
        config: ReportOptions::new(),
        write_error: None,
    }
);

// Creates the directory if needed and opens the report file, refusing to replace an existing
// file unless overwriting is enabled.
fn create_report_file(options: &ReportOptions, short_name: &str) -> Result<File, OutbreakError> {
    let path = options.path_for(short_name);
    if path.exists() && !options.overwrite {
        return Err(OutbreakError::ReportError(format!(
            "File already exists: {}. Please set `overwrite` to true in the file configuration \
             and rerun.",
            path.display()
        )));
    }
    create_dir_all(&options.directory)?;
    Ok(File::create(&path)?)
}

pub trait ContextReportExt {
    /// Returns the report options for further configuration. Options must be set before the
    /// reports they apply to are added.
    fn report_options(&mut self) -> &mut ReportOptions;

    /// Call `add_report` with each report type, passing the short name of the report. The file
    /// is `{directory}/{file_prefix}{short_name}.csv`.
    ///
    /// # Errors
    ///
    /// `ReportError` if the file exists and overwriting is disabled, `IoError` if it cannot be
    /// created.
    fn add_report<T: Report + 'static>(&mut self, short_name: &str) -> Result<(), OutbreakError>;

    /// Write a new row with columns following items in the report struct
    /// to the report file associated with the report type struct.
    ///
    /// # Errors
    ///
    /// `ReportError` if no report of this type was added, `CsvError` if the row cannot be
    /// written.
    fn send_report<T: Report>(&self, report: T) -> Result<(), OutbreakError>;

    /// Keeps `err` for [`ContextReportExt::take_report_error`]. Only the first error is kept.
    fn record_report_error(&mut self, err: OutbreakError);

    /// Takes the first error recorded by a report handler, if any.
    fn take_report_error(&mut self) -> Option<OutbreakError>;
}

impl ContextReportExt for Context {
    fn report_options(&mut self) -> &mut ReportOptions {
        &mut self.get_data_container_mut(ReportPlugin).config
    }

    fn add_report<T: Report + 'static>(&mut self, short_name: &str) -> Result<(), OutbreakError> {
        trace!("adding report {short_name}");
        let data_container = self.get_data_container_mut(ReportPlugin);
        let file = create_report_file(&data_container.config, short_name)?;
        let writer = Writer::from_writer(file);
        data_container
            .file_writers
            .borrow_mut()
            .insert(TypeId::of::<T>(), writer);
        Ok(())
    }

    fn send_report<T: Report>(&self, report: T) -> Result<(), OutbreakError> {
        let missing =
            || OutbreakError::ReportError("No writer found for the report type".to_string());
        // No data container will exist if no reports have been added
        let data_container = self.get_data_container(ReportPlugin).ok_or_else(missing)?;
        let mut writers = data_container.file_writers.borrow_mut();
        let writer = writers.get_mut(&report.type_id()).ok_or_else(missing)?;
        report.serialize(writer)?;
        writer.flush()?;
        Ok(())
    }

    fn record_report_error(&mut self, err: OutbreakError) {
        self.get_data_container_mut(ReportPlugin)
            .write_error
            .get_or_insert(err);
    }

    fn take_report_error(&mut self) -> Option<OutbreakError> {
        self.get_data_container_mut(ReportPlugin).write_error.take()
    }
}
