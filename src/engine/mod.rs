pub mod assignment;
pub mod completion;
pub mod eligibility;
pub mod import;
pub mod rating;
pub mod reconciliation;
pub mod time_window;
