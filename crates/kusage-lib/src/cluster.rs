//! Kubernetes API access
//!
//! Lists pods through the core API and reads live usage through the
//! `metrics.k8s.io` API, both via a single kube client.

use crate::error::{ClusterError, FetchError};
use crate::metrics::{PodMetrics, PodUsage, UsageSource};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::{debug, info};

/// How to reach the cluster
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Kubeconfig file; the default lookup is used when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context; the current context is used when unset
    pub context: Option<String>,
}

/// Cluster client for pod listing and pod metrics
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connect using the given kubeconfig file, else the named context from
    /// the default kubeconfig. With neither set, the usual inference applies:
    /// `KUBECONFIG`, then `~/.kube/config`, then in-cluster configuration.
    pub async fn connect(options: &ConnectOptions) -> Result<Self, ClusterError> {
        let config = load_config(options).await?;
        info!(cluster_url = %config.cluster_url, "Connecting to cluster");

        let client = Client::try_from(config).map_err(ClusterError::Client)?;
        Ok(Self { client })
    }

    /// List all pods in a namespace, in API server order
    pub async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|source| ClusterError::ListPods {
                namespace: namespace.to_string(),
                source,
            })?;

        info!(namespace = %namespace, count = list.items.len(), "Listed pods");
        Ok(list.items)
    }
}

#[async_trait]
impl UsageSource for KubeCluster {
    async fn fetch_pod(&self, namespace: &str, pod: &str) -> Result<PodUsage, FetchError> {
        let metrics: Api<PodMetrics> = Api::namespaced(self.client.clone(), namespace);
        debug!(namespace = %namespace, pod = %pod, "Requesting pod metrics");

        metrics
            .get(pod)
            .await
            .map(PodUsage::from)
            .map_err(|err| FetchError::from_kube(namespace, pod, err))
    }
}

async fn load_config(options: &ConnectOptions) -> Result<Config, ClusterError> {
    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..Default::default()
    };

    let config = match (&options.kubeconfig, &options.context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                ClusterError::Kubeconfig(format!("{}: {}", path.display(), e))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &kube_options)
                .await
                .map_err(|e| ClusterError::Kubeconfig(e.to_string()))?
        }
        (None, Some(_)) => Config::from_kubeconfig(&kube_options)
            .await
            .map_err(|e| ClusterError::Kubeconfig(e.to_string()))?,
        (None, None) => Config::infer()
            .await
            .map_err(|e| ClusterError::Kubeconfig(e.to_string()))?,
    };

    Ok(config)
}
