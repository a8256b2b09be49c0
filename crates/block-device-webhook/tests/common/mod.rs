use async_trait::async_trait;
use axum::Router;
use block_device_webhook::{
    claim_classifier::{ClaimLookup, PROVISIONER_ANNOTATION},
    config::{Config, DEFAULT_PROVISIONER_REGEX},
    errors::LookupError,
    quota_injector::BLOCK_DEVICE_RESOURCE,
    BlockDeviceWebhook,
};
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

/// Serves the claims registered at creation time, every other
/// lookup fails as if the API server could not be reached.
pub(crate) struct StaticClaimLookup {
    provisioners: HashMap<(String, String), String>,
}

impl StaticClaimLookup {
    pub(crate) fn new(claims: &[(&str, &str, &str)]) -> Self {
        let provisioners = claims
            .iter()
            .map(|(namespace, name, provisioner)| {
                (
                    (namespace.to_string(), name.to_string()),
                    provisioner.to_string(),
                )
            })
            .collect();

        Self { provisioners }
    }
}

#[async_trait]
impl ClaimLookup for StaticClaimLookup {
    async fn get_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<PersistentVolumeClaim, LookupError> {
        let provisioner = self
            .provisioners
            .get(&(namespace.to_owned(), name.to_owned()))
            .ok_or(LookupError::ClientUnavailable)?;

        Ok(PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                namespace: Some(namespace.to_owned()),
                annotations: Some(BTreeMap::from([(
                    PROVISIONER_ANNOTATION.to_owned(),
                    provisioner.to_owned(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        })
    }
}

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        provisioner_regex: Regex::new(DEFAULT_PROVISIONER_REGEX).unwrap(),
        block_device_resource: BLOCK_DEVICE_RESOURCE.to_owned(),
        lookup_timeout: Duration::from_secs(1),
        ignore_kubernetes_connection_failure: true,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

/// Claims known by the cluster used in the integration tests, all of them
/// live inside of the `default` Namespace.
pub(crate) fn default_claim_lookup() -> StaticClaimLookup {
    StaticClaimLookup::new(&[
        ("default", "data", "kubernetes.io/cinder"),
        ("default", "logs", "csi.vsphere.vmware.com"),
        ("default", "shared", "nfs.csi.k8s.io"),
    ])
}

pub(crate) fn app(config: Config) -> Router {
    BlockDeviceWebhook::new_with_claim_lookup(config, Arc::new(default_claim_lookup())).router()
}
