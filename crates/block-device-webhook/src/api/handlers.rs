use axum::{
    extract::{self, FromRequest},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, Span};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    api::{
        admission_review::{AdmissionReviewRequest, AdmissionReviewResponse},
        api_error::ApiError,
        state::ApiServerState,
    },
};

// create an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(T);

#[tracing::instrument(
    name = "mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Inject the block devices resource into the Pod carried by the AdmissionReview.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> Result<Json<AdmissionReviewResponse>, (StatusCode, ApiError)> {
    debug!(admission_review = %serde_json::to_string(&admission_review).unwrap_or_default());

    let request = admission_review.request.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            ApiError::bad_request("AdmissionReview does not contain a request"),
        )
    })?;

    populate_span_with_admission_request_data(&request);

    let response = state.admission_handler.mutate(&request).await;

    populate_span_with_mutation_results(&response);

    Ok(Json(AdmissionReviewResponse::new(
        admission_review.api_version,
        response,
    )))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("resource", adm_req.resource.resource.as_str());
}

fn populate_span_with_mutation_results(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    if let Some(message) = response.status.as_ref().and_then(|s| s.message.as_ref()) {
        Span::current().record("response_message", message.as_str());
    }
}
