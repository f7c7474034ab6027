//! `metrics.k8s.io/v1beta1` PodMetrics as a kube resource
//!
//! The metrics API is not part of k8s-openapi, so the resource traits are
//! implemented by hand to make it usable through `kube::Api`.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Raw usage strings as returned by the metrics API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUsage {
    /// Nanocores, e.g. "2154726n"
    #[serde(default)]
    pub cpu: Option<String>,
    /// Kibibytes, e.g. "10344Ki"
    #[serde(default)]
    pub memory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default)]
    pub usage: RawUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodMetrics {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
}

impl k8s_openapi::Resource for PodMetrics {
    const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
    const GROUP: &'static str = "metrics.k8s.io";
    const KIND: &'static str = "PodMetrics";
    const VERSION: &'static str = "v1beta1";
    const URL_PATH_SEGMENT: &'static str = "pods";
    type Scope = k8s_openapi::NamespaceResourceScope;
}

impl k8s_openapi::Metadata for PodMetrics {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &Self::Ty {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Self::Ty {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_metrics_response() {
        let body = r#"{
            "kind": "PodMetrics",
            "apiVersion": "metrics.k8s.io/v1beta1",
            "metadata": { "name": "web-0", "namespace": "default" },
            "timestamp": "2024-05-01T10:00:00Z",
            "window": "15s",
            "containers": [
                { "name": "nginx", "usage": { "cpu": "2154726n", "memory": "10344Ki" } }
            ]
        }"#;

        let metrics: PodMetrics = serde_json::from_str(body).unwrap();
        assert_eq!(metrics.metadata.name.as_deref(), Some("web-0"));
        assert_eq!(metrics.containers.len(), 1);
        assert_eq!(metrics.containers[0].usage.cpu.as_deref(), Some("2154726n"));
        assert_eq!(metrics.window.as_deref(), Some("15s"));
    }
}
