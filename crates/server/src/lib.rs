//! Server crate for the RecFlow recommendation engine.
//!
//! The driver around the core pipeline: accepts batch trigger requests over
//! HTTP, pulls datasets from object storage, runs the pipeline on a blocking
//! thread, uploads the result, and reports completion via callback.

pub mod callback;
pub mod config;
pub mod error;
pub mod http;
pub mod process;
pub mod schemas;
pub mod state;
pub mod storage;

// Re-export main types
pub use config::Settings;
pub use http::create_router;
pub use state::AppState;
