//! Services built on the coordinators.

mod context;
mod schedule;

pub use context::CoordinatorContext;
pub use schedule::{ArtifactListing, CommercialScheduleService, PersistReport, ScheduleStatements};
