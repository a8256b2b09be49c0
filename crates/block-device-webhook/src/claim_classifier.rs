use async_trait::async_trait;
use futures::future::join_all;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::Api;
use regex::Regex;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::errors::LookupError;

/// Annotation set by the PersistentVolume controller on the claim, it holds
/// the name of the provisioner backing the claim.
pub const PROVISIONER_ANNOTATION: &str = "volume.beta.kubernetes.io/storage-provisioner";

/// Fetches PersistentVolumeClaim objects from the cluster.
///
/// The same instance is shared by all the concurrent admission exchanges.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClaimLookup: Send + Sync {
    async fn get_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<PersistentVolumeClaim, LookupError>;
}

/// Looks up claims through the Kubernetes API server, each request is
/// bounded by `timeout`.
pub struct KubeClaimLookup {
    client: kube::Client,
    timeout: Duration,
}

impl KubeClaimLookup {
    pub fn new(client: kube::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ClaimLookup for KubeClaimLookup {
    async fn get_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<PersistentVolumeClaim, LookupError> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);

        match tokio::time::timeout(self.timeout, api.get(name)).await {
            Ok(claim) => claim.map_err(|source| LookupError::Kube {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
                source,
            }),
            Err(_) => Err(LookupError::Timeout {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }
}

/// Used when the connection with Kubernetes could not be established at
/// boot time and the user asked to carry on anyway.
pub struct UnavailableClaimLookup;

#[async_trait]
impl ClaimLookup for UnavailableClaimLookup {
    async fn get_claim(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<PersistentVolumeClaim, LookupError> {
        Err(LookupError::ClientUnavailable)
    }
}

/// Decides whether a PersistentVolumeClaim is backed by block storage.
pub struct ClaimClassifier {
    lookup: Arc<dyn ClaimLookup>,
    provisioner_regex: Regex,
}

impl ClaimClassifier {
    pub fn new(lookup: Arc<dyn ClaimLookup>, provisioner_regex: Regex) -> Self {
        Self {
            lookup,
            provisioner_regex,
        }
    }

    /// Returns `true` when the claim is provisioned by one of the allowed
    /// provisioners.
    ///
    /// A claim that cannot be fetched is always considered a block device:
    /// it's better to account a volume too much than to miss one.
    pub async fn classify(&self, namespace: &str, claim_name: &str) -> bool {
        let claim = match self.lookup.get_claim(namespace, claim_name).await {
            Ok(claim) => claim,
            Err(e) => {
                warn!(
                    error = %e,
                    namespace,
                    claim = claim_name,
                    "failed to get PersistentVolumeClaim, will assume block storage"
                );
                return true;
            }
        };

        let provisioner = claim
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(PROVISIONER_ANNOTATION));

        match provisioner {
            Some(provisioner) => {
                let is_block_device = self.provisioner_regex.is_match(provisioner);
                debug!(
                    namespace,
                    claim = claim_name,
                    provisioner = provisioner.as_str(),
                    is_block_device,
                    "PersistentVolumeClaim classified"
                );
                is_block_device
            }
            None => {
                debug!(
                    namespace,
                    claim = claim_name,
                    "PersistentVolumeClaim has no provisioner annotation"
                );
                false
            }
        }
    }

    /// Count the volumes of the Pod that reference a block storage claim.
    /// The lookups are done concurrently, the total is returned once all of
    /// them are done.
    pub async fn count_block_devices(&self, namespace: &str, pod: &Pod) -> u64 {
        let claims = claim_names(pod);
        let results = join_all(
            claims
                .iter()
                .map(|claim_name| self.classify(namespace, claim_name)),
        )
        .await;

        results.into_iter().filter(|is_block| *is_block).count() as u64
    }
}

fn claim_names(pod: &Pod) -> Vec<&str> {
    pod.spec
        .iter()
        .flat_map(|spec| spec.volumes.iter().flatten())
        .filter_map(|volume| volume.persistent_volume_claim.as_ref())
        .map(|source| source.claim_name.as_str())
        .collect()
}
