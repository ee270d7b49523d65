//! # portal-protocol
//!
//! Wire types for the configuration portal's HTTP API and the WebSocket
//! command channel.
//!
//! The response documents keep the exact key sets the device has always
//! served, so existing clients keep working against this implementation.

pub mod codec;
pub mod messages;

pub use codec::{validate_command, CodecError};
pub use messages::*;
