//! Structured logging for report runs
//!
//! The report builder holds a [`ReportLogger`] rather than logging ad hoc,
//! so every event carries the namespace it belongs to. Verbosity is set
//! once by whoever installs the tracing subscriber.

use crate::error::{FetchError, QuantityError};
use tracing::{debug, info, warn};

/// Structured logger scoped to one namespace
#[derive(Debug, Clone)]
pub struct ReportLogger {
    namespace: String,
}

impl ReportLogger {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Log the start of a report run
    pub fn log_report_started(
        &self,
        pod_count: usize,
        threshold_percent: u8,
        low_usage_only: bool,
    ) {
        info!(
            event = "report_started",
            namespace = %self.namespace,
            pod_count = pod_count,
            threshold_percent = threshold_percent,
            low_usage_only = low_usage_only,
            "Building usage report"
        );
    }

    /// Log a pod left out because it is not running
    pub fn log_pod_not_running(&self, pod: &str, phase: Option<&str>) {
        debug!(
            event = "pod_not_running",
            namespace = %self.namespace,
            pod = %pod,
            phase = phase.unwrap_or("Unknown"),
            "Skipping pod that is not running"
        );
    }

    /// Log the metrics call for a pod
    pub fn log_fetch(&self, pod: &str) {
        info!(
            event = "metrics_fetch",
            namespace = %self.namespace,
            pod = %pod,
            "Fetching pod metrics"
        );
    }

    /// Log a pod whose metrics could not be fetched
    pub fn log_fetch_failed(&self, pod: &str, error: &FetchError) {
        warn!(
            event = "pod_skipped",
            namespace = %self.namespace,
            pod = %pod,
            error = %error,
            "Metrics fetch failed, skipping pod"
        );
    }

    /// Log a pod without a name in the pod list
    pub fn log_unnamed_pod(&self, index: usize) {
        warn!(
            event = "pod_skipped",
            namespace = %self.namespace,
            index = index,
            "Pod has no name, skipping"
        );
    }

    /// Log a quantity that was treated as unset
    pub fn log_invalid_quantity(
        &self,
        pod: &str,
        container: &str,
        field: &str,
        error: &QuantityError,
    ) {
        info!(
            event = "invalid_quantity",
            namespace = %self.namespace,
            pod = %pod,
            container = %container,
            field = %field,
            error = %error,
            "Treating unparsable quantity as unset"
        );
    }

    /// Log a container missing from the metrics response
    pub fn log_no_usage(&self, pod: &str, container: &str) {
        info!(
            event = "no_usage_data",
            namespace = %self.namespace,
            pod = %pod,
            container = %container,
            "Container not present in metrics response"
        );
    }

    /// Log an evaluated container
    pub fn log_row(
        &self,
        pod: &str,
        container: &str,
        mem_high: bool,
        cpu_high: bool,
        included: bool,
    ) {
        info!(
            event = "row_evaluated",
            namespace = %self.namespace,
            pod = %pod,
            container = %container,
            mem_high = mem_high,
            cpu_high = cpu_high,
            included = included,
            "Evaluated container usage"
        );
    }

    /// Log the end of a report run
    pub fn log_report_finished(&self, rows: usize, flagged: usize, issues: usize) {
        info!(
            event = "report_finished",
            namespace = %self.namespace,
            rows = rows,
            flagged = flagged,
            issues = issues,
            "Usage report built"
        );
    }
}
