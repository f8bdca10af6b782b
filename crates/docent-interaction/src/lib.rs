//! HTTP implementations of the backend service ports.
//!
//! [`BackendClient`] talks to the document comprehension backend over HTTP
//! and implements every service trait the application layer consumes, so
//! the engines never see a URL or a status code.

pub mod client;
pub mod config;

pub use client::BackendClient;
pub use config::BackendConfig;
