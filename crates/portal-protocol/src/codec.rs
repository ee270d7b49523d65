//! WebSocket command frame validation.
//!
//! The command channel carries opaque text commands, one per frame. Frames
//! are required to be newline-free: a newline inside a command would let a
//! single frame masquerade as several commands to line-oriented handlers.

use thiserror::Error;

/// Errors raised while validating an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Received a binary frame where a text command was expected.
    #[error("expected text frame, received binary")]
    BinaryFrame,

    #[error("empty command frame")]
    EmptyFrame,

    #[error("command frames must not contain newlines")]
    EmbeddedNewline,
}

/// Validate an inbound text frame as a single command.
///
/// The command text is returned untouched — commands are opaque to the hub
/// and interpreted only by the registered handlers.
pub fn validate_command(text: &str) -> Result<&str, CodecError> {
    if text.is_empty() {
        return Err(CodecError::EmptyFrame);
    }
    if text.contains('\n') || text.contains('\r') {
        return Err(CodecError::EmbeddedNewline);
    }
    Ok(text)
}
