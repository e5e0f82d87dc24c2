pub mod document;
pub mod history;
pub mod reference;
pub mod site_config;

pub use document::{Document, DocumentFields, NewDocument};
pub use history::{HistoryAction, HistoryEntry, NewHistoryEntry};
pub use reference::{Department, Status};
pub use site_config::SiteConfig;
