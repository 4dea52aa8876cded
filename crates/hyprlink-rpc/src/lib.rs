//! Wire protocol for HyprLink.
//!
//! This crate provides the message types, transport codec, and query client
//! for communication between the daemon, paired devices and the local CLI
//! over TCP.
//!
//! # Architecture
//!
//! - [`protocol`]: Inbound and outbound message shapes, discovery datagrams
//! - [`transport`]: Brace-delimited codec for JSON object framing
//! - [`client`]: One-shot `get_request` client used by the CLI
//! - [`error`]: Codec and client errors
//!
//! # Example
//!
//! ```no_run
//! use hyprlink_rpc::{QUERY_TIMEOUT, local_addr, query};
//!
//! # async fn example() -> Result<(), hyprlink_rpc::ClientError> {
//! let reply = query(local_addr(8080), "all", QUERY_TIMEOUT).await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

pub use client::{DEFAULT_PORT, QUERY_TIMEOUT, is_listening, local_addr, query};

pub use error::{ClientError, CodecError, Result};

pub use protocol::{
    ACK_PREFIX, Beacon, ClientMessage, GET_REQUEST, INVALID_PIN, MediaStatus, NO_DEVICE,
    NOTHING_PLAYING, Outbound, PIN_REQUIRED, PairingRequest, PinSubmission, Response, STATUS_ERROR,
    STATUS_OK, STATUS_UNAUTHORIZED, STATUS_UPDATE, SYS_INFO, TIMEOUT, discovery_ack, message_type,
    parse_discovery_ack,
};

pub use transport::{JsonObjectCodec, MAX_MESSAGE_SIZE};

pub use hyprlink_types::{ActionMap, Module, Tab, TrustedDevice, UiDescription};
