//! Report assembly
//!
//! Walks the pod list in order, fetches usage once per running pod, and
//! turns each container into a [`ReportRow`]. Problems with a single pod or
//! container are recorded as [`ReportIssue`]s and never abort the report.


use crate::error::FetchError;
use crate::metrics::{PodUsage, UsageSource};
use crate::models::{
    ContainerSpec, ContainerUsage, FieldError, Report, ReportConfig, ReportIssue, ReportRow,
};
use crate::observability::ReportLogger;
use crate::threshold::is_underutilized;
use futures::stream::{self, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;

/// Only pods in exactly this phase are reported
pub const RUNNING_PHASE: &str = "Running";

/// Builds usage reports for one namespace
pub struct ReportBuilder {
    config: ReportConfig,
    source: Arc<dyn UsageSource>,
    logger: ReportLogger,
    concurrency: usize,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig, source: Arc<dyn UsageSource>, logger: ReportLogger) -> Self {
        Self {
            config,
            source,
            logger,
            concurrency: 1,
        }
    }

    /// Fetch metrics for up to `n` pods at once. Row order is unaffected.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Build the report for the given pod list
    pub async fn build(&self, pods: &[Pod]) -> Report {
        self.logger.log_report_started(
            pods.len(),
            self.config.threshold_percent(),
            self.config.low_usage_only(),
        );

        let mut report = Report::default();
        let running = self.running_pods(pods, &mut report);

        let fetched: Vec<Result<PodUsage, FetchError>> = stream::iter(running.iter())
            .map(|(name, _)| self.fetch(name))
            .buffered(self.concurrency)
            .collect()
            .await;

        for ((name, pod), usage) in running.iter().zip(fetched) {
            match usage {
                Ok(usage) => self.add_pod_rows(name, pod, &usage, &mut report),
                Err(error) => {
                    self.logger.log_fetch_failed(name, &error);
                    report.issues.push(ReportIssue::PodSkipped {
                        pod: name.to_string(),
                        error,
                    });
                }
            }
        }

        self.logger.log_report_finished(
            report.rows.len(),
            report.flagged_count(),
            report.issues.len(),
        );
        report
    }

    fn running_pods<'a>(&self, pods: &'a [Pod], report: &mut Report) -> Vec<(&'a str, &'a Pod)> {
        let mut running = Vec::new();

        for (index, pod) in pods.iter().enumerate() {
            let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
            let name = pod.metadata.name.as_deref();

            if phase != Some(RUNNING_PHASE) {
                self.logger.log_pod_not_running(name.unwrap_or_default(), phase);
                continue;
            }

            match name {
                Some(name) => running.push((name, pod)),
                None => {
                    self.logger.log_unnamed_pod(index);
                    report.issues.push(ReportIssue::UnnamedPod { index });
                }
            }
        }

        running
    }

    async fn fetch(&self, pod: &str) -> Result<PodUsage, FetchError> {
        self.logger.log_fetch(pod);
        self.source.fetch_pod(self.config.namespace(), pod).await
    }

    fn add_pod_rows(&self, pod_name: &str, pod: &Pod, usage: &PodUsage, report: &mut Report) {
        let containers = pod
            .spec
            .as_ref()
            .map(|s| s.containers.as_slice())
            .unwrap_or_default();

        for container in containers {
            let (spec, spec_errors) = ContainerSpec::from_container(container);
            self.record_invalid(pod_name, &spec.name, spec_errors, report);

            let container_usage = match usage.container(&spec.name) {
                Some((container_usage, usage_errors)) => {
                    self.record_invalid(pod_name, &spec.name, usage_errors, report);
                    Some(container_usage)
                }
                None => {
                    self.logger.log_no_usage(pod_name, &spec.name);
                    report.issues.push(ReportIssue::NoUsageData {
                        pod: pod_name.to_string(),
                        container: spec.name.clone(),
                    });
                    None
                }
            };

            let row = self.evaluate(pod_name, spec, container_usage);
            let included = !self.config.low_usage_only() || row.is_flagged();
            self.logger
                .log_row(pod_name, &row.container, row.mem_high, row.cpu_high, included);

            if included {
                report.rows.push(row);
            }
        }
    }

    fn evaluate(&self, pod: &str, spec: ContainerSpec, usage: Option<ContainerUsage>) -> ReportRow {
        let threshold = self.config.threshold_percent();

        let mem_high = usage
            .and_then(|u| u.memory)
            .map(|used| is_underutilized(&used, spec.requests.memory.as_ref(), threshold))
            .unwrap_or(false);
        let cpu_high = usage
            .and_then(|u| u.cpu)
            .map(|used| is_underutilized(&used, spec.requests.cpu.as_ref(), threshold))
            .unwrap_or(false);

        ReportRow {
            namespace: self.config.namespace().to_string(),
            pod: pod.to_string(),
            container: spec.name,
            usage,
            requests: spec.requests,
            limits: spec.limits,
            mem_high,
            cpu_high,
        }
    }

    fn record_invalid(
        &self,
        pod: &str,
        container: &str,
        errors: Vec<FieldError>,
        report: &mut Report,
    ) {
        for FieldError { field, error } in errors {
            self.logger.log_invalid_quantity(pod, container, field, &error);
            report.issues.push(ReportIssue::InvalidQuantity {
                pod: pod.to_string(),
                container: container.to_string(),
                field,
                error,
            });
        }
    }
}
