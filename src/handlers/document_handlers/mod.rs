pub mod actions;
pub mod crud;
pub mod list;

pub use actions::apply_action;
pub use crud::{create, delete, detail, update};
pub use list::{history, list};
