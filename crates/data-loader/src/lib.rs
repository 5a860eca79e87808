//! # Data Loader Crate
//!
//! This crate handles the dataset files of the recommendation engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (User, Course, Recommendation)
//! - **loader**: Load Parquet/CSV input tables into Rust structs
//! - **writer**: Write Parquet result and fixture tables
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{load_courses, load_users, write_recommendations};
//! use std::path::Path;
//!
//! let users = load_users(Path::new("data/users.parquet"))?;
//! let courses = load_courses(Path::new("data/courses.parquet"))?;
//!
//! // ... run the pipeline ...
//!
//! write_recommendations(Path::new("out/recommendations.parquet"), &result)?;
//! ```

// Public modules
pub mod error;
pub mod loader;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use loader::{COURSES_REQUIRED_COLUMNS, USERS_REQUIRED_COLUMNS, load_courses, load_users};
pub use types::{Course, Level, MAX_LEVEL, Recommendation, TagId, User};
pub use writer::{write_courses, write_recommendations, write_users};
