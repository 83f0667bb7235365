//! Mock REST backend.
//!
//! Serves the hospital REST paths from an in-memory `MockBackend` so the
//! dashboards (and `HttpBackend`) can run without the real service.
//! Routes are nested under `/api/`; an optional bearer token can be
//! required to mimic an authenticated deployment.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::mock_api_router;
pub use server::{start_mock_server, start_mock_server_on, MockServer};
pub use types::ApiContext;
