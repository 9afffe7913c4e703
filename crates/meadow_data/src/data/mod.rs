pub mod actor;
pub mod delta;
pub mod environment;
pub mod report;
