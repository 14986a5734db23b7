//! HTTP and CLI surface for the Shepherd parking status service.

pub mod error;
pub mod report;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
