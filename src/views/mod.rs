//! Read-side projections. Nothing here writes to the store.

pub mod dashboard;
pub mod duration;
pub mod public;

pub use dashboard::{DashboardFilter, DashboardStats};
pub use duration::{HistoryRow, format_duration, history_timeline};
pub use public::PublicQuery;
