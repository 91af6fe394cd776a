pub mod auth;
pub mod metrics;

pub use auth::authenticate;
pub use metrics::track_metrics;
