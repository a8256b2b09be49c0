use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;

pub const DEFAULT_ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    /// The API server expects the response envelope to use the same
    /// apiVersion it sent.
    pub fn new(api_version: Option<String>, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(
                api_version
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| String::from(DEFAULT_ADMISSION_REVIEW_API_VERSION)),
            ),
            kind: Some(String::from("AdmissionReview")),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::v1(Some("admission.k8s.io/v1"), "admission.k8s.io/v1")]
    #[case::v1beta1(Some("admission.k8s.io/v1beta1"), "admission.k8s.io/v1beta1")]
    #[case::missing(None, DEFAULT_ADMISSION_REVIEW_API_VERSION)]
    #[case::empty(Some(""), DEFAULT_ADMISSION_REVIEW_API_VERSION)]
    fn response_echoes_api_version(#[case] requested: Option<&str>, #[case] expected: &str) {
        let response = AdmissionReviewResponse::new(
            requested.map(String::from),
            AdmissionResponse::allow("uid".to_string(), None),
        );

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "apiVersion": expected,
                "kind": "AdmissionReview",
                "response": {"uid": "uid", "allowed": true}
            })
        );
    }

    #[test]
    fn review_without_request_is_decoded() {
        let review: AdmissionReviewRequest = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .unwrap();

        assert!(review.request.is_none());
    }
}
