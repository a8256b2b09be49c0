use thiserror::Error;

pub type Result<T> = std::result::Result<T, MutationError>;

/// Failures of the mutation pipeline. None of them rejects the pod: they are
/// reported inside of the AdmissionResponse status message.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("admission request does not carry an object")]
    MissingObject,

    #[error("failed to decode raw object: {0}")]
    DecodeObject(#[source] serde_json::Error),

    #[error("failed to encode the mutated Pod object: {0}")]
    EncodeObject(#[source] serde_json::Error),

    #[error("failed to encode the JSON patch: {0}")]
    EncodePatch(#[source] serde_json::Error),
}

/// Failures of the PersistentVolumeClaim lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("cannot get PersistentVolumeClaim {namespace}/{name}: {source}")]
    Kube {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("timed out after {timeout_secs}s while getting PersistentVolumeClaim {namespace}/{name}")]
    Timeout {
        namespace: String,
        name: String,
        timeout_secs: u64,
    },

    #[error("no connection to the Kubernetes API server")]
    ClientUnavailable,
}
