pub mod backend_client;
pub mod gotrue_client;
pub mod metrics;
pub mod profile_client;

pub use backend_client::BackendClient;
pub use gotrue_client::GoTrueClient;
pub use profile_client::ProfileClient;
