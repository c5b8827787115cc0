//! HTTP client for hosted biomolecular inference services.
//!
//! Provides explicit client configuration, a REST wrapper around the
//! model listing, sequence lookup, generation, folding, docking and task
//! status endpoints, and an asynchronous task poller that turns a
//! submitted job into its final payload.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;

pub use api::InferenceApi;
pub use client::InferenceClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use poller::{TaskPoller, TaskStatusSource};
