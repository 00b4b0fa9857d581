//! Per-term payloads.
//!
//! Every posting carries the effective boost of the field it was indexed
//! from (policy boost × field boost) and the document's policy score, as a
//! big-endian `f32` followed by a big-endian `i64`. Scoring decodes both
//! inline instead of looking the policy or the document up again.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{FathomError, Result};

const BOOST_LEN: usize = 4;

pub const PAYLOAD_LEN: usize = BOOST_LEN + 8;

pub type Payload = [u8; PAYLOAD_LEN];

/// Decoded contents of a posting payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermPayload {
    pub boost: f32,
    pub score: i64,
}

impl TermPayload {
    pub fn new(boost: f32, score: i64) -> Self {
        TermPayload { boost, score }
    }

    pub fn encode(&self) -> Payload {
        let mut payload = [0u8; PAYLOAD_LEN];
        BigEndian::write_f32(&mut payload[..BOOST_LEN], self.boost);
        BigEndian::write_i64(&mut payload[BOOST_LEN..], self.score);
        payload
    }

    /// Decode a payload; anything that is not exactly [`PAYLOAD_LEN`] bytes is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAYLOAD_LEN {
            return Err(FathomError::query(format!(
                "payload must be {PAYLOAD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(TermPayload {
            boost: BigEndian::read_f32(&bytes[..BOOST_LEN]),
            score: BigEndian::read_i64(&bytes[BOOST_LEN..]),
        })
    }
}

impl Default for TermPayload {
    fn default() -> Self {
        TermPayload::new(1.0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_and_score_share_one_payload() {
        let payload = TermPayload::new(2.5, 42).encode();
        assert_eq!(&payload[..4], &[0x40, 0x20, 0x00, 0x00]);
        assert_eq!(&payload[4..], &42i64.to_be_bytes());

        let decoded = TermPayload::decode(&payload).unwrap();
        assert_eq!(decoded.boost, 2.5);
        assert_eq!(decoded.score, 42);
    }

    #[test]
    fn test_negative_score_survives() {
        let decoded = TermPayload::decode(&TermPayload::new(1.1, -7).encode()).unwrap();
        assert_eq!(decoded, TermPayload::new(1.1, -7));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(TermPayload::decode(&[0, 1]).is_err());
        assert!(TermPayload::decode(&[0x3f, 0x80, 0x00, 0x00]).is_err());
    }
}
