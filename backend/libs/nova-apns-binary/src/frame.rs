//! Binary notification frame
//!
//! ```text
//! offset  size  field
//!      0     1  command (0)
//!      1     2  token length, big-endian (32)
//!      3    16  device token
//!     19     2  payload length, big-endian
//!     21     N  JSON payload
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

pub const COMMAND_SIMPLE: u8 = 0;
/// Value written in the token-length field
pub const TOKEN_LENGTH_FIELD: u16 = 32;
/// Raw device token size carried in the frame
pub const DEVICE_TOKEN_LEN: usize = 16;
pub const HEADER_LEN: usize = 1 + 2 + DEVICE_TOKEN_LEN + 2;
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("device token is not valid hex: {0}")]
    InvalidDeviceToken(#[from] hex::FromHexError),

    #[error("device token must decode to {expected} bytes, got {actual}")]
    DeviceTokenLength { expected: usize, actual: usize },

    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Strip all whitespace and hex-decode into exactly [`DEVICE_TOKEN_LEN`] bytes
pub fn decode_device_token(token: &str) -> Result<[u8; DEVICE_TOKEN_LEN], FrameError> {
    let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    let raw = hex::decode(compact)?;

    raw.as_slice()
        .try_into()
        .map_err(|_| FrameError::DeviceTokenLength {
            expected: DEVICE_TOKEN_LEN,
            actual: raw.len(),
        })
}

/// Encoded frame, ready for a single socket write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame(Bytes);

impl WireFrame {
    pub fn encode(token: &[u8; DEVICE_TOKEN_LEN], payload: &[u8]) -> Result<Self, FrameError> {
        let payload_len = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        })?;

        let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
        buf.put_u8(COMMAND_SIMPLE);
        buf.put_u16(TOKEN_LENGTH_FIELD);
        buf.put_slice(token);
        buf.put_u16(payload_len);
        buf.put_slice(payload);

        Ok(Self(buf.freeze()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "00112233 44556677 8899aabb ccddeeff";

    #[test]
    fn test_decode_strips_whitespace() {
        let token = decode_device_token(" 0011 2233\t4455\n6677 8899 AABB ccdd EEFF ").unwrap();
        assert_eq!(
            token,
            [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]
        );
    }

    #[test]
    fn test_decode_rejects_short_token() {
        match decode_device_token("abcd") {
            Err(FrameError::DeviceTokenLength { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected DeviceTokenLength, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_long_token() {
        let token = "ab".repeat(32);
        assert!(matches!(
            decode_device_token(&token),
            Err(FrameError::DeviceTokenLength { actual: 32, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_hex() {
        let token = "zz".repeat(16);
        assert!(matches!(
            decode_device_token(&token),
            Err(FrameError::InvalidDeviceToken(_))
        ));
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        assert!(matches!(
            decode_device_token("abc"),
            Err(FrameError::InvalidDeviceToken(_))
        ));
    }

    #[test]
    fn test_frame_layout() {
        let token = decode_device_token(TOKEN).unwrap();
        let payload = br#"{"aps":{}}"#;

        let frame = WireFrame::encode(&token, payload).unwrap();
        let bytes = frame.as_bytes();

        assert_eq!(frame.len(), HEADER_LEN + payload.len());
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..3], &[0x00, 0x20]);
        assert_eq!(&bytes[3..19], &token);
        assert_eq!(u16::from_be_bytes([bytes[19], bytes[20]]) as usize, payload.len());
        assert_eq!(&bytes[21..], payload);
    }

    #[test]
    fn test_payload_length_counts_bytes() {
        let token = decode_device_token(TOKEN).unwrap();
        // "é" and "✓" are multi-byte in UTF-8
        let payload = "{\"k\":\"é✓\"}".as_bytes();
        assert_eq!("{\"k\":\"é✓\"}".chars().count(), 10);

        let frame = WireFrame::encode(&token, payload).unwrap();
        let bytes = frame.as_bytes();

        assert_eq!(u16::from_be_bytes([bytes[19], bytes[20]]), 13);
    }

    #[test]
    fn test_payload_too_large() {
        let token = decode_device_token(TOKEN).unwrap();
        let payload = vec![b'x'; MAX_PAYLOAD_LEN + 1];

        assert!(matches!(
            WireFrame::encode(&token, &payload),
            Err(FrameError::PayloadTooLarge { len, .. }) if len == MAX_PAYLOAD_LEN + 1
        ));
    }

    #[test]
    fn test_max_payload_fits() {
        let token = decode_device_token(TOKEN).unwrap();
        let payload = vec![b'x'; MAX_PAYLOAD_LEN];

        let frame = WireFrame::encode(&token, &payload).unwrap();
        assert_eq!(&frame.as_bytes()[19..21], &[0xff, 0xff]);
    }
}
