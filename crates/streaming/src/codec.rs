//! Length-prefixed framing.
//!
//! A frame is a big-endian `u32` payload length followed by the
//! bincode-encoded [`Message`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, StreamingError};
use crate::protocol::Message;

/// Largest payload accepted in a single frame.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const HEADER_LEN: usize = 4;

/// Encode `message` as one frame.
pub fn encode(message: &Message) -> Result<BytesMut> {
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(StreamingError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }

    let mut frame = BytesMut::with_capacity(HEADER_LEN + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame)
}

/// Take one frame off the front of `buf`.
///
/// Returns `Ok(None)` and leaves `buf` untouched when it does not yet hold a
/// whole frame.
pub fn decode(buf: &mut BytesMut) -> Result<Option<Message>> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(StreamingError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    if buf.len() < HEADER_LEN + len {
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    let payload = buf.split_to(len);
    Ok(Some(bincode::deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AccessRequest;
    use corelib::{Access, Gossip, Node, NodeStatus, Reply, Token};

    fn get(key: i64) -> Message {
        Message::Request(AccessRequest::from(&Access::Get { key }))
    }

    #[test]
    fn test_frame_header_is_payload_length() {
        let frame = encode(&get(1)).unwrap();
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - HEADER_LEN);
    }

    #[test]
    fn test_decode_waits_for_whole_frame() {
        let frame = encode(&get(7)).unwrap();
        let mut buf = BytesMut::new();

        buf.extend_from_slice(&frame[..2]);
        assert!(decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&frame[2..frame.len() - 1]);
        assert!(decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), frame.len() - 1);

        buf.extend_from_slice(&frame[frame.len() - 1..]);
        assert_eq!(decode(&mut buf).unwrap(), Some(get(7)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_consecutive_frames() {
        let gossip = Message::Gossip(Gossip::new(
            Node::named("node-1"),
            NodeStatus::Bootstrapping,
            vec![Token::murmur3(-3), Token::murmur3(12)],
        ));
        let reply = Message::Reply(Ok(Reply::Done));

        let mut buf = encode(&gossip).unwrap();
        buf.extend_from_slice(&encode(&reply).unwrap());

        assert_eq!(decode(&mut buf).unwrap(), Some(gossip));
        assert_eq!(decode(&mut buf).unwrap(), Some(reply));
        assert_eq!(decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32((MAX_FRAME_LEN + 1) as u32);
        buf.put_slice(&[0; 8]);

        assert!(matches!(
            decode(&mut buf),
            Err(StreamingError::FrameTooLarge { len, .. }) if len == MAX_FRAME_LEN + 1
        ));
    }

    #[test]
    fn test_garbage_payload_is_codec_error() {
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_slice(&[0xff, 0xff]);
        assert!(matches!(decode(&mut buf), Err(StreamingError::Codec(_))));
    }
}
