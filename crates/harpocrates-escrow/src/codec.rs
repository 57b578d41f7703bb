// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MessagePack framing for [`ExchangeMessage`].
//!
//! Messages are written back to back with no length prefix; the decoder
//! waits until a complete MessagePack value is buffered.

use std::io;

use bytes::{Buf, BytesMut};
use harpocrates_core::HarpocratesError;
use serde::Deserialize;
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{ExchangeMessage, WireMessage};

/// Largest message accepted from a peer.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ExchangeCodec {
    max_frame_len: usize,
}

impl ExchangeCodec {
    pub fn new() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
        }
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }
}

impl Default for ExchangeCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether decoding stopped only because the buffer ran out.
fn is_incomplete(err: &rmp_serde::decode::Error) -> bool {
    use rmp_serde::decode::Error;

    match err {
        Error::InvalidMarkerRead(e) | Error::InvalidDataRead(e) => {
            e.kind() == io::ErrorKind::UnexpectedEof
        }
        _ => false,
    }
}

impl Decoder for ExchangeCodec {
    type Item = ExchangeMessage;
    type Error = HarpocratesError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut remaining: &[u8] = &src[..];
        let decoded = {
            let mut de = rmp_serde::Deserializer::new(&mut remaining);
            WireMessage::deserialize(&mut de)
        };

        match decoded {
            Ok(wire) => {
                let consumed = src.len() - remaining.len();
                if consumed > self.max_frame_len {
                    return Err(frame_too_large(consumed, self.max_frame_len));
                }
                src.advance(consumed);
                ExchangeMessage::try_from(wire).map(Some)
            }
            Err(e) if is_incomplete(&e) => {
                if src.len() >= self.max_frame_len {
                    return Err(frame_too_large(src.len(), self.max_frame_len));
                }
                src.reserve(1024);
                Ok(None)
            }
            Err(e) => Err(HarpocratesError::Protocol(format!("malformed message: {e}"))),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(HarpocratesError::Protocol(format!(
                "connection closed mid-message with {} bytes buffered",
                src.len()
            ))),
        }
    }
}

impl Encoder<ExchangeMessage> for ExchangeCodec {
    type Error = HarpocratesError;

    fn encode(&mut self, item: ExchangeMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = rmp_serde::to_vec_named(&item.to_wire())
            .map_err(|e| HarpocratesError::Protocol(format!("failed to encode message: {e}")))?;
        if bytes.len() > self.max_frame_len {
            return Err(frame_too_large(bytes.len(), self.max_frame_len));
        }
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

fn frame_too_large(len: usize, max: usize) -> HarpocratesError {
    HarpocratesError::Protocol(format!("message of {len} bytes exceeds the {max}-byte limit"))
}

#[cfg(test)]
mod tests {
    use harpocrates_crypto::EncodedKey;

    use super::*;
    use crate::message::MessageKind;

    fn encoded(message: ExchangeMessage) -> BytesMut {
        let mut buf = BytesMut::new();
        ExchangeCodec::new().encode(message, &mut buf).unwrap();
        buf
    }

    #[test]
    fn encodes_a_named_map() {
        let buf = encoded(ExchangeMessage::get_request("abc"));
        // fixmap with three entries.
        assert_eq!(buf[0], 0x83);
        let text = String::from_utf8_lossy(&buf);
        for field in ["PasswordHash", "PrivateKey", "Type", "GET_PRIVATE_KEY"] {
            assert!(text.contains(field), "missing {field}");
        }
    }

    #[test]
    fn decodes_what_it_encodes() {
        let message = ExchangeMessage::store_request("abc", EncodedKey::new("PEM TEXT"));
        let mut buf = encoded(message.clone());
        let decoded = ExchangeCodec::new().decode(&mut buf).unwrap();
        assert_eq!(decoded, Some(message));
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_a_complete_message() {
        let full = encoded(ExchangeMessage::get_request("abc"));
        let mut codec = ExchangeCodec::new();

        let mut partial = BytesMut::from(&full[..full.len() - 3]);
        assert_eq!(codec.decode(&mut partial).unwrap(), None);
        assert_eq!(partial.len(), full.len() - 3);

        partial.extend_from_slice(&full[full.len() - 3..]);
        assert_eq!(
            codec.decode(&mut partial).unwrap().map(|m| m.kind),
            Some(MessageKind::GetPrivateKey)
        );
    }

    #[test]
    fn decodes_back_to_back_messages() {
        let mut buf = encoded(ExchangeMessage::reply(MessageKind::Banned));
        buf.extend_from_slice(&encoded(ExchangeMessage::reply(MessageKind::KeySaved)));
        let mut codec = ExchangeCodec::new();

        assert_eq!(codec.decode(&mut buf).unwrap().map(|m| m.kind), Some(MessageKind::Banned));
        assert_eq!(codec.decode(&mut buf).unwrap().map(|m| m.kind), Some(MessageKind::KeySaved));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn accepts_foreign_encoders_that_omit_fields() {
        // {"Type": "KEY_SAVED"}
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0x81, 0xa4]);
        buf.extend_from_slice(b"Type");
        buf.extend_from_slice(&[0xa9]);
        buf.extend_from_slice(b"KEY_SAVED");

        let decoded = ExchangeCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, ExchangeMessage::reply(MessageKind::KeySaved));
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        let mut buf = BytesMut::from(&b"\xc1\xc1\xc1"[..]);
        assert!(matches!(
            ExchangeCodec::new().decode(&mut buf),
            Err(HarpocratesError::Protocol(_))
        ));
    }

    #[test]
    fn oversized_partial_frame_is_rejected() {
        // str32 header claiming 1 MiB, followed by a little data.
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0x81, 0xa4]);
        buf.extend_from_slice(b"Type");
        buf.extend_from_slice(&[0xdb, 0x00, 0x10, 0x00, 0x00]);
        buf.extend_from_slice(&[b'A'; 128]);

        let mut codec = ExchangeCodec::with_max_frame_len(64);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "got {err}");
    }

    #[test]
    fn truncated_stream_at_eof_is_a_protocol_error() {
        let full = encoded(ExchangeMessage::get_request("abc"));
        let mut partial = BytesMut::from(&full[..4]);
        assert!(matches!(
            ExchangeCodec::new().decode_eof(&mut partial),
            Err(HarpocratesError::Protocol(_))
        ));
    }
}
