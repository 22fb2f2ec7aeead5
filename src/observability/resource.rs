//! Resource descriptor shared by every pipeline.

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;

use super::error::ResourceError;

/// Build the resource identifying this process.
///
/// Starts from the SDK's detected defaults (including `OTEL_RESOURCE_ATTRIBUTES`),
/// then applies `attributes`, then the service name. Later values win.
pub fn build_resource(
    service_name: &str,
    attributes: &[(String, String)],
) -> Result<Resource, ResourceError> {
    if service_name.trim().is_empty() {
        return Err(ResourceError::EmptyServiceName);
    }

    let mut extra = Vec::with_capacity(attributes.len() + 1);
    extra.push(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")));
    for (key, value) in attributes {
        if key.trim().is_empty() {
            return Err(ResourceError::EmptyAttributeKey(value.clone()));
        }
        extra.push(KeyValue::new(key.clone(), value.clone()));
    }

    Ok(Resource::builder()
        .with_attributes(extra)
        .with_service_name(service_name.to_string())
        .build())
}
