//! log4rs backend: one stderr console appender, a root level and one logger per module filter.
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::runtime::ConfigErrors;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogConfiguration;

const CONSOLE_APPENDER: &str = "stderr";
// ISO 8601 timestamp, highlighted level, module path
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl LogConfiguration {
    fn build_log4rs_config(&self) -> Result<Config, ConfigErrors> {
        // stdout carries the run summary
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();

        let loggers = self.module_configurations.values().map(|filter| {
            Logger::builder().build(filter.module.clone(), filter.level)
        });

        Config::builder()
            .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)))
            .loggers(loggers)
            .build(
                Root::builder()
                    .appender(CONSOLE_APPENDER)
                    .build(self.global_log_level),
            )
    }

    /// Installs the log4rs logger on first use and swaps its configuration afterwards.
    pub(in crate::log) fn set_config(&mut self) {
        let config = match self.build_log4rs_config() {
            Ok(config) => config,
            Err(errors) => {
                eprintln!("invalid logging configuration: {errors}");
                return;
            }
        };

        if let Some(handle) = &self.root_handle {
            handle.set_config(config);
            return;
        }
        match log4rs::init_config(config) {
            Ok(handle) => self.root_handle = Some(handle),
            Err(err) => eprintln!("could not install the logger: {err}"),
        }
    }
}
