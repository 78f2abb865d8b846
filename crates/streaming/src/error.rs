//! Error types for the wire protocol.

use crate::protocol::MessageType;

pub type Result<T> = std::result::Result<T, StreamingError>;

#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// The payload could not be serialized or deserialized.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    /// The length prefix announces more than [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN) bytes.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
    /// The buffer ended before a whole frame arrived.
    #[error("incomplete frame")]
    Incomplete,
    /// A message arrived where the protocol does not allow it.
    #[error("unexpected {0} message")]
    UnexpectedMessage(MessageType),
}
