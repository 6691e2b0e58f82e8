//! loc-reconcile: OpenRefine reconciliation service for Library of Congress
//! authorities.
//!
//! The matching core lives in the `loc-suggest` crate. This crate adds the
//! service configuration file and the HTTP endpoint:
//!
//! - `GET|POST /` answers the OpenRefine reconciliation protocol
//!   (metadata, single and batch queries, JSONP)
//! - `GET /health` is a liveness probe

pub mod config;
pub mod error;
pub mod server;

pub use config::{CacheConfig, ServerConfig, ServiceConfig};
pub use error::{Result, ServiceError};
pub use server::{ReconcileServer, SharedReconciler, build_reconciler, router, serve};
