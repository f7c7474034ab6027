//! Error types for quantity parsing, metrics fetching and cluster access

use thiserror::Error;

/// Failure to interpret a Kubernetes quantity string
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    #[error("unrecognized unit suffix '{suffix}' in quantity '{raw}'")]
    UnknownSuffix { raw: String, suffix: String },

    #[error("'{raw}' is not a valid quantity")]
    InvalidNumber { raw: String },

    #[error("quantity '{raw}' is negative")]
    Negative { raw: String },
}

/// Failure to retrieve live usage for a pod from the metrics API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no metrics available for pod {namespace}/{pod}")]
    NotFound { namespace: String, pod: String },

    #[error("not authorized to read metrics for {namespace}/{pod}: {message}")]
    Unauthorized {
        namespace: String,
        pod: String,
        message: String,
    },

    #[error("metrics API returned {code} for {namespace}/{pod}: {message}")]
    Api {
        namespace: String,
        pod: String,
        code: u16,
        message: String,
    },

    #[error("metrics request for {namespace}/{pod} failed: {source}")]
    Transport {
        namespace: String,
        pod: String,
        #[source]
        source: kube::Error,
    },
}

impl FetchError {
    /// Classify a kube client error for the given pod
    pub fn from_kube(namespace: &str, pod: &str, err: kube::Error) -> Self {
        let namespace = namespace.to_string();
        let pod = pod.to_string();
        match err {
            kube::Error::Api(resp) => match resp.code {
                404 => Self::NotFound { namespace, pod },
                401 | 403 => Self::Unauthorized {
                    namespace,
                    pod,
                    message: resp.message,
                },
                code => Self::Api {
                    namespace,
                    pod,
                    code,
                    message: resp.message,
                },
            },
            source => Self::Transport {
                namespace,
                pod,
                source,
            },
        }
    }
}

/// Invalid report settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold must be between 0 and 100 percent, got {0}")]
    InvalidThreshold(u8),

    #[error("namespace must not be empty")]
    EmptyNamespace,
}

/// Fatal errors reaching the cluster
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("failed to create Kubernetes client: {0}")]
    Client(#[source] kube::Error),

    #[error("failed to list pods in namespace '{namespace}': {source}")]
    ListPods {
        namespace: String,
        #[source]
        source: kube::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "denied".to_string(),
            reason: "Forbidden".to_string(),
            code,
        })
    }

    #[test]
    fn test_fetch_error_classification() {
        assert!(matches!(
            FetchError::from_kube("default", "web", api_error(404)),
            FetchError::NotFound { .. }
        ));
        assert!(matches!(
            FetchError::from_kube("default", "web", api_error(403)),
            FetchError::Unauthorized { .. }
        ));
        assert!(matches!(
            FetchError::from_kube("default", "web", api_error(500)),
            FetchError::Api { code: 500, .. }
        ));
    }

    #[test]
    fn test_fetch_error_message_names_pod() {
        let err = FetchError::from_kube("shop", "cart-0", api_error(404));
        assert_eq!(err.to_string(), "no metrics available for pod shop/cart-0");
    }
}
