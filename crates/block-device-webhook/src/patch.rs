use base64::{engine::general_purpose, Engine as _};
use json_patch::Patch;
use serde::Serialize;

use crate::errors::{MutationError, Result};

/// Compute the RFC 6902 patch that turns `original` into `mutated`.
///
/// Both objects go through the same serialization: fields the typed model
/// drops or normalizes are absent on both sides and never show up in the
/// patch, which can then be applied to the object as originally submitted.
pub fn diff<T: Serialize>(original: &T, mutated: &T) -> Result<Patch> {
    let original = serde_json::to_value(original).map_err(MutationError::EncodeObject)?;
    let mutated = serde_json::to_value(mutated).map_err(MutationError::EncodeObject)?;
    Ok(json_patch::diff(&original, &mutated))
}

/// Encode the patch the way the AdmissionResponse expects it. An empty patch
/// is not sent at all.
pub fn encode(patch: &Patch) -> Result<Option<String>> {
    if patch.0.is_empty() {
        return Ok(None);
    }

    let serialized = serde_json::to_string(patch).map_err(MutationError::EncodePatch)?;
    Ok(Some(general_purpose::STANDARD.encode(serialized)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{json, Value};

    fn apply(original: &Value, patch: &Patch) -> Value {
        let mut doc = original.clone();
        json_patch::patch(&mut doc, &patch.0).expect("patch should apply");
        doc
    }

    #[rstest]
    #[case::add_resources(
        json!({"spec": {"containers": [{"name": "app"}]}}),
        json!({"spec": {"containers": [{"name": "app", "resources": {
            "limits": {"cloudflight.io/block-devices": "1"},
            "requests": {"cloudflight.io/block-devices": "1"}
        }}]}}),
    )]
    #[case::replace_quantity(
        json!({"spec": {"containers": [{"name": "app", "resources": {
            "limits": {"cloudflight.io/block-devices": "4"}
        }}]}}),
        json!({"spec": {"containers": [{"name": "app", "resources": {
            "limits": {"cloudflight.io/block-devices": "2"},
            "requests": {"cloudflight.io/block-devices": "2"}
        }}]}}),
    )]
    #[case::remove_from_sidecar(
        json!({"spec": {"containers": [
            {"name": "app"},
            {"name": "sidecar", "resources": {"limits": {"cloudflight.io/block-devices": "1", "cpu": "1"}}}
        ]}}),
        json!({"spec": {"containers": [
            {"name": "app"},
            {"name": "sidecar", "resources": {"limits": {"cpu": "1"}}}
        ]}}),
    )]
    fn applying_the_diff_yields_the_mutated_object(
        #[case] original: Value,
        #[case] mutated: Value,
    ) {
        let patch = diff(&original, &mutated).unwrap();

        assert!(!patch.0.is_empty());
        assert_eq!(mutated, apply(&original, &patch));
    }

    #[test]
    fn identical_objects_produce_no_patch() {
        let original = json!({"spec": {"containers": [{"name": "app", "image": "nginx"}]}});

        let patch = diff(&original, &original).unwrap();

        assert!(patch.0.is_empty());
        assert_eq!(None, encode(&patch).unwrap());
    }

    #[test]
    fn keys_with_slashes_are_escaped() {
        let original = json!({"limits": {}});
        let mutated = json!({"limits": {"cloudflight.io/block-devices": "1"}});

        let patch = diff(&original, &mutated).unwrap();

        assert_eq!(
            json!([{"op": "add", "path": "/limits/cloudflight.io~1block-devices", "value": "1"}]),
            serde_json::to_value(&patch).unwrap()
        );
    }

    #[test]
    fn encoded_patch_is_a_base64_json_array() {
        let original = json!({"a": 1});
        let mutated = json!({"a": 2});
        let patch = diff(&original, &mutated).unwrap();

        let encoded = encode(&patch).unwrap().expect("patch should not be empty");
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        let operations: Value = serde_json::from_slice(&decoded).unwrap();

        assert_eq!(json!([{"op": "replace", "path": "/a", "value": 2}]), operations);
    }
}
