//! Timestamps, the ext type reserved by the format (`-1`).
//!
//! Three payload layouts exist, selected by the encoder as the smallest one
//! that represents the value:
//!
//! | bytes | layout |
//! |---|---|
//! | 4  | `u32` seconds since the epoch, nanoseconds = 0 |
//! | 8  | `u64`: top 30 bits nanoseconds, bottom 34 bits seconds |
//! | 12 | `u32` nanoseconds then `i64` seconds |
//!
//! All fields are big-endian.  Nanoseconds are valid in
//! `[0, 999_999_999]`; anything else decodes as `invalid`.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Highest valid nanosecond field value.
pub const MAX_NANOSECONDS: u32 = 999_999_999;

/// Seconds bound of the 8-byte layout: 34 unsigned bits.
const SECONDS_34_BIT: i64 = 1 << 34;

/// A point in time: seconds since the Unix epoch plus nanoseconds.
///
/// Negative `seconds` are before the epoch.  `nanoseconds` always counts
/// forward from the whole second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Builds a timestamp, rejecting an out-of-range nanosecond field.
    pub fn new(seconds: i64, nanoseconds: u32) -> Result<Timestamp> {
        if nanoseconds > MAX_NANOSECONDS {
            return Err(Error::Invalid);
        }
        Ok(Timestamp {
            seconds,
            nanoseconds,
        })
    }

    /// Encodes into the smallest payload layout, returning its length.
    ///
    /// `out` must hold at least 12 bytes.
    pub fn pack(&self, out: &mut [u8]) -> usize {
        debug_assert!(self.nanoseconds <= MAX_NANOSECONDS);
        if self.nanoseconds == 0 && (0..=u32::MAX as i64).contains(&self.seconds) {
            BigEndian::write_u32(out, self.seconds as u32);
            4
        } else if (0..SECONDS_34_BIT).contains(&self.seconds) {
            let packed = ((self.nanoseconds as u64) << 34) | (self.seconds as u64);
            BigEndian::write_u64(out, packed);
            8
        } else {
            BigEndian::write_u32(out, self.nanoseconds);
            BigEndian::write_i64(&mut out[4..], self.seconds);
            12
        }
    }

    /// Decodes a timestamp payload of length 4, 8, or 12.
    ///
    /// Any other length, and any nanosecond field above
    /// [`MAX_NANOSECONDS`], is `invalid`.
    pub fn unpack(payload: &[u8]) -> Result<Timestamp> {
        match payload.len() {
            4 => Ok(Timestamp {
                seconds: BigEndian::read_u32(payload) as i64,
                nanoseconds: 0,
            }),
            8 => {
                let packed = BigEndian::read_u64(payload);
                let nanoseconds = (packed >> 34) as u32;
                if nanoseconds > MAX_NANOSECONDS {
                    return Err(Error::Invalid);
                }
                Ok(Timestamp {
                    seconds: (packed & ((1u64 << 34) - 1)) as i64,
                    nanoseconds,
                })
            }
            12 => {
                let nanoseconds = BigEndian::read_u32(payload);
                if nanoseconds > MAX_NANOSECONDS {
                    return Err(Error::Invalid);
                }
                Ok(Timestamp {
                    seconds: BigEndian::read_i64(&payload[4..]),
                    nanoseconds,
                })
            }
            _ => Err(Error::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_smallest_form() {
        let mut buf = [0u8; 12];
        // Seconds fit u32, nanos zero: 4 bytes.
        assert_eq!(Timestamp::new(1, 0).unwrap().pack(&mut buf), 4);
        // Nonzero nanos force the 8-byte form.
        assert_eq!(Timestamp::new(1, 1).unwrap().pack(&mut buf), 8);
        // Seconds past 34 bits force the full form.
        assert_eq!(Timestamp::new(1 << 34, 0).unwrap().pack(&mut buf), 12);
        // Negative seconds only fit the full form.
        assert_eq!(Timestamp::new(-1, 0).unwrap().pack(&mut buf), 12);
    }

    #[test]
    fn roundtrip_all_forms() {
        for ts in [
            Timestamp::new(0, 0).unwrap(),
            Timestamp::new(u32::MAX as i64, 0).unwrap(),
            Timestamp::new(5, MAX_NANOSECONDS).unwrap(),
            Timestamp::new((1 << 34) - 1, 7).unwrap(),
            Timestamp::new(i64::MIN, 999).unwrap(),
            Timestamp::new(i64::MAX, 0).unwrap(),
        ] {
            let mut buf = [0u8; 12];
            let n = ts.pack(&mut buf);
            assert_eq!(Timestamp::unpack(&buf[..n]).unwrap(), ts);
        }
    }

    #[test]
    fn rejects_bad_nanoseconds() {
        assert_eq!(Timestamp::new(0, MAX_NANOSECONDS + 1), Err(Error::Invalid));
        // 8-byte payload with nanos = 2^30 - 1 (> 999_999_999).
        let packed = ((0x3fff_ffffu64) << 34) | 5;
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, packed);
        assert_eq!(Timestamp::unpack(&buf), Err(Error::Invalid));
        // 12-byte payload with bad nanos.
        let mut buf = [0u8; 12];
        BigEndian::write_u32(&mut buf, 1_000_000_000);
        assert_eq!(Timestamp::unpack(&buf), Err(Error::Invalid));
    }

    #[test]
    fn rejects_bad_lengths() {
        for len in [0usize, 1, 3, 5, 7, 9, 11, 13, 16] {
            let buf = vec![0u8; len];
            assert_eq!(Timestamp::unpack(&buf), Err(Error::Invalid));
        }
    }
}
