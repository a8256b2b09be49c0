pub mod admission_handler;
pub mod admission_request;
pub mod admission_response;
pub mod api;
mod certs;
pub mod claim_classifier;
pub mod cli;
pub mod config;
pub mod errors;
pub mod patch;
pub mod quota_injector;
pub mod tracing;

use ::tracing::{info, warn};
use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::{
    admission_handler::AdmissionHandler,
    api::{
        handlers::{mutate_handler, readiness_handler},
        state::ApiServerState,
    },
    claim_classifier::{ClaimClassifier, ClaimLookup, KubeClaimLookup, UnavailableClaimLookup},
    config::{Config, TlsConfig},
    quota_injector::ResourceQuotaInjector,
};

pub struct BlockDeviceWebhook {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
}

impl BlockDeviceWebhook {
    /// Connect to the Kubernetes API server and build the webhook.
    ///
    /// When the connection cannot be established and
    /// `ignore_kubernetes_connection_failure` is set, every
    /// PersistentVolumeClaim lookup fails and is therefore counted
    /// as a block device.
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let claim_lookup: Arc<dyn ClaimLookup> = match kube::Client::try_default().await {
            Ok(client) => Arc::new(KubeClaimLookup::new(client, config.lookup_timeout)),
            Err(e) if config.ignore_kubernetes_connection_failure => {
                warn!(
                    error = %e,
                    "cannot connect to Kubernetes cluster, all the PersistentVolumeClaims will be counted as block devices"
                );
                Arc::new(UnavailableClaimLookup)
            }
            Err(e) => return Err(anyhow!("Cannot connect to Kubernetes cluster: {e}")),
        };

        Ok(Self::new_with_claim_lookup(config, claim_lookup))
    }

    pub fn new_with_claim_lookup(config: Config, claim_lookup: Arc<dyn ClaimLookup>) -> Self {
        let classifier = ClaimClassifier::new(claim_lookup, config.provisioner_regex);
        let injector = ResourceQuotaInjector::new(config.block_device_resource);
        let state = Arc::new(ApiServerState {
            admission_handler: AdmissionHandler::new(classifier, injector),
        });

        let router = Router::new()
            .route("/mutate", post(mutate_handler))
            .route("/readiness", get(readiness_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        Self {
            router,
            addr: config.addr,
            tls_config: config.tls_config,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        match self.tls_config {
            Some(tls_config) => {
                let rustls_config =
                    certs::create_tls_config_and_watch_certificate_changes(tls_config).await?;
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}
