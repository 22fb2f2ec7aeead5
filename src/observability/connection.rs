//! gRPC channel to the OpenTelemetry collector.
//!
//! The channel is plaintext and connects lazily: building it never touches the
//! network, and clones share one underlying connection.

use tonic::transport::{Channel, Endpoint};

use super::error::ConnectionError;

/// Build the channel both exporters send through.
///
/// `target` is either `host:port` or an `http://` URI.
///
/// Must be called from within a Tokio runtime.
pub fn connect(target: &str) -> Result<Channel, ConnectionError> {
    let uri = endpoint_uri(target)?;
    let endpoint = Endpoint::from_shared(uri).map_err(|source| ConnectionError::InvalidUri {
        target: target.to_string(),
        source,
    })?;

    tracing::debug!(collector = target, "Creating lazy gRPC channel to collector");
    Ok(endpoint.connect_lazy())
}

/// Normalize a collector target into an `http://` URI.
pub(crate) fn endpoint_uri(target: &str) -> Result<String, ConnectionError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ConnectionError::EmptyTarget);
    }

    match target.split_once("://") {
        Some(("http", _)) => Ok(target.to_string()),
        Some((scheme, _)) => Err(ConnectionError::UnsupportedScheme(scheme.to_string())),
        None => Ok(format!("http://{target}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_target_gets_http_scheme() {
        assert_eq!(
            endpoint_uri("localhost:4317").unwrap(),
            "http://localhost:4317"
        );
        assert_eq!(
            endpoint_uri(" http://10.0.0.1:4317 ").unwrap(),
            "http://10.0.0.1:4317"
        );
    }

    #[test]
    fn test_rejects_empty_and_tls_targets() {
        assert!(matches!(endpoint_uri("  "), Err(ConnectionError::EmptyTarget)));
        assert!(matches!(
            endpoint_uri("https://collector:4317"),
            Err(ConnectionError::UnsupportedScheme(scheme)) if scheme == "https"
        ));
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        // Nothing listens on this port; a lazy channel must still be built.
        assert!(connect("127.0.0.1:1").is_ok());
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let err = connect("not a valid target").unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidUri { .. }), "{err}");
    }
}
