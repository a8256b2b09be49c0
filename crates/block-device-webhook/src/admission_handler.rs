use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    claim_classifier::ClaimClassifier,
    errors::{MutationError, Result},
    patch,
    quota_injector::ResourceQuotaInjector,
};

/// Processes one AdmissionRequest at a time, the handler doesn't keep any
/// state between two requests.
///
/// The Pod is never rejected: when something goes wrong the request is
/// allowed without any patch and the error is reported inside of the
/// response message.
pub struct AdmissionHandler {
    classifier: ClaimClassifier,
    injector: ResourceQuotaInjector,
}

impl AdmissionHandler {
    pub fn new(classifier: ClaimClassifier, injector: ResourceQuotaInjector) -> Self {
        Self {
            classifier,
            injector,
        }
    }

    pub async fn mutate(&self, request: &AdmissionRequest) -> AdmissionResponse {
        match self.compute_patch(request).await {
            Ok(patch) => AdmissionResponse::allow(request.uid.clone(), patch),
            Err(e) => {
                error!(error = %e, "failed to mutate");
                AdmissionResponse::allow_with_message(request.uid.clone(), e.to_string())
            }
        }
    }

    async fn compute_patch(&self, request: &AdmissionRequest) -> Result<Option<String>> {
        let object = request
            .object
            .as_ref()
            .ok_or(MutationError::MissingObject)?;
        let pod = Pod::deserialize(&object.0).map_err(MutationError::DecodeObject)?;

        let namespace = request
            .namespace
            .clone()
            .or_else(|| pod.metadata.namespace.clone())
            .unwrap_or_default();

        let block_devices = self.classifier.count_block_devices(&namespace, &pod).await;
        if block_devices > 0 {
            info!(
                block_devices,
                resource = self.injector.resource_name(),
                pod = %format!("{namespace}/{}", pod_name(&pod)),
                "adding block devices resource limit"
            );
        }

        let mutated = self.injector.inject(&pod, block_devices);
        let patch = patch::diff(&pod, &mutated)?;
        debug!(operations = patch.0.len(), "patch computed");

        patch::encode(&patch)
    }
}

// Pods created by controllers have only `generateName` set at admission time
fn pod_name(pod: &Pod) -> &str {
    pod.metadata
        .name
        .as_deref()
        .or(pod.metadata.generate_name.as_deref())
        .unwrap_or_default()
}
