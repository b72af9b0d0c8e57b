// Domain layer - Pure dashboard models and rules
pub mod directory;
pub mod filters;
pub mod formatters;
pub mod performance;
pub mod project_table;
pub mod snapshot;
