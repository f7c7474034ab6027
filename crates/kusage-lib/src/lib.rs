//! Core library for kusage
//!
//! This crate provides:
//! - Kubernetes quantity parsing and normalization
//! - Live usage lookup through the metrics API
//! - Low-usage detection against container requests
//! - Report assembly with per-pod error isolation

pub mod cluster;
pub mod error;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod report;
pub mod threshold;

pub use cluster::{ConnectOptions, KubeCluster};
pub use error::{ClusterError, ConfigError, FetchError, QuantityError};
pub use metrics::{fetch_usage, PodUsage, UsageSource};
pub use models::*;
pub use observability::ReportLogger;
pub use quantity::{parse_cpu, parse_memory, ResourceQuantity, ResourceUnit};
pub use report::ReportBuilder;
pub use threshold::is_underutilized;
