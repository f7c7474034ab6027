//! Live container usage from the metrics API
//!
//! The metrics API answers per pod, so a single [`UsageSource::fetch_pod`]
//! call covers every container of that pod.

mod pod_metrics;

pub use pod_metrics::{ContainerMetrics, PodMetrics, RawUsage};

use crate::error::FetchError;
use crate::models::{ContainerUsage, FieldError};
use crate::quantity::{parse_cpu, parse_memory};
use async_trait::async_trait;
use tracing::debug;

/// Source of live pod usage
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Fetch usage for every container of one pod
    async fn fetch_pod(&self, namespace: &str, pod: &str) -> Result<PodUsage, FetchError>;
}

/// Usage reported for the containers of one pod
#[derive(Debug, Clone, Default)]
pub struct PodUsage {
    containers: Vec<ContainerMetrics>,
}

impl PodUsage {
    pub fn new(containers: Vec<ContainerMetrics>) -> Self {
        Self { containers }
    }

    /// Normalized usage for the named container.
    ///
    /// Returns `None` when the container is not in the response. A metric
    /// that fails to parse is left unknown and reported in the error list.
    pub fn container(&self, name: &str) -> Option<(ContainerUsage, Vec<FieldError>)> {
        let entry = self.containers.iter().find(|c| c.name == name)?;
        let mut errors = Vec::new();

        let cpu = parse_cpu(entry.usage.cpu.as_deref()).unwrap_or_else(|error| {
            errors.push(FieldError {
                field: "cpu usage",
                error,
            });
            None
        });
        let memory = parse_memory(entry.usage.memory.as_deref()).unwrap_or_else(|error| {
            errors.push(FieldError {
                field: "memory usage",
                error,
            });
            None
        });

        Some((ContainerUsage { cpu, memory }, errors))
    }
}

impl From<PodMetrics> for PodUsage {
    fn from(metrics: PodMetrics) -> Self {
        Self::new(metrics.containers)
    }
}

/// Fetch normalized usage for a single container.
///
/// Performs one metrics call; callers reporting on several containers of
/// the same pod should use [`UsageSource::fetch_pod`] once instead.
pub async fn fetch_usage(
    source: &dyn UsageSource,
    namespace: &str,
    pod: &str,
    container: &str,
) -> Result<Option<ContainerUsage>, FetchError> {
    let usage = source.fetch_pod(namespace, pod).await?;

    Ok(usage.container(container).map(|(usage, errors)| {
        for e in &errors {
            debug!(
                namespace = %namespace,
                pod = %pod,
                container = %container,
                field = e.field,
                error = %e.error,
                "Ignoring unparsable usage"
            );
        }
        usage
    }))
}
