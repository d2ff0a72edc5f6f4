//! Backend used when the `logging` feature is off. Nothing is printed; only the `log` crate's
//! max level follows the configuration.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        let max_level = self
            .module_configurations
            .values()
            .map(|module| module.level)
            .fold(self.global_log_level, std::cmp::max);
        log::set_max_level(max_level);
    }
}
