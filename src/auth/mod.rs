pub mod identity;
pub mod middleware;
pub mod password;
pub mod role;
pub mod session;

pub use identity::{AccountDirectory, AuthError, Identity, IdentityProvider, StaticAccounts};
pub use role::{Role, RoleMap};
