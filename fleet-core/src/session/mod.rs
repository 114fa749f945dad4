pub mod role;
pub mod store;

pub use role::RoleResolver;
pub use store::SessionStore;
