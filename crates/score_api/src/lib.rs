//! Credit Scoring HTTP Service
//!
//! Serves the scoring core over JSON:
//! - single, thresholded and batch predictions
//! - model metadata and feature importance
//! - health and Prometheus metrics

pub mod config;
pub mod errors;
pub mod server;
pub mod state;

pub use config::{ArtifactPaths, ConfigManager, Environment, ServerConfig, ServiceConfig};
pub use errors::{ApiError, ServiceError};
pub use server::{build_router, start_server};
pub use state::{LoadedArtifacts, ServingState, SharedState};
