//! Core data models for a usage report

use crate::error::{ConfigError, FetchError, QuantityError};
use crate::quantity::{parse_cpu, parse_memory, ResourceQuantity};
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Observed usage of one container at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ContainerUsage {
    pub cpu: Option<ResourceQuantity>,
    pub memory: Option<ResourceQuantity>,
}

/// Memory and CPU values of a request or limit block
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ResourcePair {
    pub memory: Option<ResourceQuantity>,
    pub cpu: Option<ResourceQuantity>,
}

/// Requests and limits declared for a container in its pod spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSpec {
    pub name: String,
    pub requests: ResourcePair,
    pub limits: ResourcePair,
}

/// A named quantity that could not be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: QuantityError,
}

impl ContainerSpec {
    /// Read requests and limits from a container definition.
    ///
    /// Values that fail to parse are left unset and returned alongside.
    pub fn from_container(container: &Container) -> (Self, Vec<FieldError>) {
        let resources = container.resources.as_ref();
        let mut errors = Vec::new();

        let requests = read_pair(
            resources.and_then(|r| r.requests.as_ref()),
            ("memory request", "cpu request"),
            &mut errors,
        );
        let limits = read_pair(
            resources.and_then(|r| r.limits.as_ref()),
            ("memory limit", "cpu limit"),
            &mut errors,
        );

        let spec = Self {
            name: container.name.clone(),
            requests,
            limits,
        };
        (spec, errors)
    }
}

fn read_pair(
    values: Option<&BTreeMap<String, Quantity>>,
    fields: (&'static str, &'static str),
    errors: &mut Vec<FieldError>,
) -> ResourcePair {
    let raw = |key: &str| values.and_then(|v| v.get(key)).map(|q| q.0.as_str());

    let memory = parse_memory(raw("memory")).unwrap_or_else(|error| {
        errors.push(FieldError {
            field: fields.0,
            error,
        });
        None
    });
    let cpu = parse_cpu(raw("cpu")).unwrap_or_else(|error| {
        errors.push(FieldError {
            field: fields.1,
            error,
        });
        None
    });

    ResourcePair { memory, cpu }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    /// `None` when the metrics API had no entry for this container
    pub usage: Option<ContainerUsage>,
    pub requests: ResourcePair,
    pub limits: ResourcePair,
    /// Memory usage is below the threshold share of its request
    pub mem_high: bool,
    /// CPU usage is below the threshold share of its request
    pub cpu_high: bool,
}

impl ReportRow {
    pub fn memory_used(&self) -> Option<&ResourceQuantity> {
        self.usage.as_ref().and_then(|u| u.memory.as_ref())
    }

    pub fn cpu_used(&self) -> Option<&ResourceQuantity> {
        self.usage.as_ref().and_then(|u| u.cpu.as_ref())
    }

    pub fn is_flagged(&self) -> bool {
        self.mem_high || self.cpu_high
    }
}

/// Settings for a single report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    namespace: String,
    low_usage_only: bool,
    threshold_percent: u8,
}

impl ReportConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "default";
    pub const DEFAULT_THRESHOLD: u8 = 30;

    pub fn new(
        namespace: impl Into<String>,
        low_usage_only: bool,
        threshold_percent: u8,
    ) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        if namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if threshold_percent > 100 {
            return Err(ConfigError::InvalidThreshold(threshold_percent));
        }
        Ok(Self {
            namespace,
            low_usage_only,
            threshold_percent,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn low_usage_only(&self) -> bool {
        self.low_usage_only
    }

    pub fn threshold_percent(&self) -> u8 {
        self.threshold_percent
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            low_usage_only: false,
            threshold_percent: Self::DEFAULT_THRESHOLD,
        }
    }
}

/// Something that was skipped or degraded while building a report
#[derive(Debug)]
pub enum ReportIssue {
    /// Pod metrics could not be fetched; none of its rows were produced
    PodSkipped { pod: String, error: FetchError },
    /// Pod at this position in the list has no name
    UnnamedPod { index: usize },
    /// A quantity could not be parsed and was treated as unset
    InvalidQuantity {
        pod: String,
        container: String,
        field: &'static str,
        error: QuantityError,
    },
    /// The metrics response did not list this container
    NoUsageData { pod: String, container: String },
}

impl fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PodSkipped { pod, error } => write!(f, "skipped pod {}: {}", pod, error),
            Self::UnnamedPod { index } => write!(f, "skipped unnamed pod at position {}", index),
            Self::InvalidQuantity {
                pod,
                container,
                field,
                error,
            } => write!(f, "{}/{}: ignoring {}: {}", pod, container, field, error),
            Self::NoUsageData { pod, container } => {
                write!(f, "{}/{}: no usage data reported", pod, container)
            }
        }
    }
}

/// Result of a report run
#[derive(Debug, Default)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub issues: Vec<ReportIssue>,
}

impl Report {
    pub fn flagged_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_flagged()).count()
    }
}
