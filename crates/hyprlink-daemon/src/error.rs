//! Error types for the HyprLink daemon.

use std::net::SocketAddr;

/// Errors that can occur in the daemon
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] hyprlink_rpc::CodecError),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] hyprlink_core::Error),

    /// The discovery socket could not be bound
    #[error("Failed to bind discovery socket on {addr}: {source}")]
    DiscoveryBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DaemonError::Io(io_err);
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_daemon_error_from_codec() {
        let err: DaemonError = hyprlink_rpc::CodecError::InvalidFrame(b'x').into();
        assert!(matches!(err, DaemonError::Codec(_)));
    }

    #[test]
    fn test_daemon_error_from_core() {
        let err: DaemonError = hyprlink_core::Error::Config("bad".to_string()).into();
        assert!(err.to_string().contains("Core error"));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_discovery_bind_display() {
        let err = DaemonError::DiscoveryBind {
            addr: SocketAddr::from(([0, 0, 0, 0], 9999)),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("0.0.0.0:9999"));
        assert!(err.to_string().contains("in use"));
    }
}
