pub use crate::clock::{ContextClockExt, DaySnapshot, Simulation, SimulationOptions};
pub use crate::context::Context;
pub use crate::error::OutbreakError;
pub use crate::health::{ContextHealthExt, HealthStatus};
pub use crate::incidence_report::ContextIncidenceReportExt;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{ContextParametersExt, Parameters};
pub use crate::population::{ContextPopulationExt, PersonId};
pub use crate::random::ContextRandomExt;
pub use crate::render::RenderFrame;
pub use crate::report::ContextReportExt;
pub use crate::schedule::{ContextScheduleExt, Outcome};
pub use crate::spread::ContextSpreadExt;
pub use crate::{define_data_plugin, define_report, define_rng};
