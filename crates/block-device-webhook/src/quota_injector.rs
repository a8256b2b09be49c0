use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Extended resource used to account the block devices attached to a Pod.
pub const BLOCK_DEVICE_RESOURCE: &str = "cloudflight.io/block-devices";

/// Writes the block device count inside of the resource requests and limits
/// of the containers.
///
/// All the block devices are attributed to the first container of the Pod,
/// the volumes are assumed to be mounted by the main container only.
#[derive(Clone, Debug)]
pub struct ResourceQuotaInjector {
    resource_name: String,
}

impl Default for ResourceQuotaInjector {
    fn default() -> Self {
        Self::new(BLOCK_DEVICE_RESOURCE)
    }
}

impl ResourceQuotaInjector {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Returns a copy of `pod` where the first container requests and limits
    /// `block_devices` units of the block device resource, while all the
    /// other containers do not reference the resource at all.
    pub fn inject(&self, pod: &Pod, block_devices: u64) -> Pod {
        let mut mutated = pod.clone();
        if let Some(spec) = mutated.spec.as_mut() {
            spec.containers = self.inject_containers(&spec.containers, block_devices);
        }
        mutated
    }

    fn inject_containers(&self, containers: &[Container], block_devices: u64) -> Vec<Container> {
        containers
            .iter()
            .enumerate()
            .map(|(index, container)| {
                let assigned = if index == 0 { block_devices } else { 0 };
                self.inject_container(container, assigned)
            })
            .collect()
    }

    fn inject_container(&self, container: &Container, block_devices: u64) -> Container {
        let mut container = container.clone();

        if block_devices == 0 {
            if let Some(resources) = container.resources.as_mut() {
                if let Some(limits) = resources.limits.as_mut() {
                    limits.remove(&self.resource_name);
                }
                if let Some(requests) = resources.requests.as_mut() {
                    requests.remove(&self.resource_name);
                }
            }
            return container;
        }

        let quantity = Quantity(block_devices.to_string());
        let resources = container.resources.get_or_insert_with(Default::default);
        resources
            .limits
            .get_or_insert_with(BTreeMap::new)
            .insert(self.resource_name.clone(), quantity.clone());
        resources
            .requests
            .get_or_insert_with(BTreeMap::new)
            .insert(self.resource_name.clone(), quantity);

        container
    }
}
