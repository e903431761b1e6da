//! Core data model for the crew.
//!
//! These types describe everything that travels over the bus:
//! roles, entries and their line grammar, test reports, build hints,
//! and the lifecycle stage a task is derived to be in.

mod entry;
mod hint;
mod report;
mod role;
mod stage;

pub use entry::{BusEntry, Status};
pub use hint::BuildHint;
pub use report::Report;
pub use role::Role;
pub use stage::Stage;
