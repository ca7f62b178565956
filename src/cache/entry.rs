//! Cache entry definitions.
//!
//! A [`CacheEntry`] associates a file's size and modification time with
//! a previously computed digest. The modification time is carried as
//! whole seconds plus a nanosecond remainder ([`FileTimestamp`]) rather
//! than a single floating-point value, so sub-second mtimes survive a
//! round trip through the cache exactly.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::scanner::Digest;

/// A file modification time split into whole epoch seconds and a
/// nanosecond remainder.
///
/// `seconds` may be negative for pre-epoch timestamps; `subsec_nanos`
/// is always in `0..1_000_000_000` and counts forward from `seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileTimestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Nanoseconds past `seconds`.
    pub subsec_nanos: u32,
}

impl FileTimestamp {
    /// Millisecond representation used by the portable snapshot format.
    ///
    /// Sub-millisecond precision is dropped; the snapshot is a transfer
    /// format, and bulk imports validate by size only.
    #[must_use]
    pub fn to_epoch_millis(self) -> i64 {
        self.seconds * 1000 + i64::from(self.subsec_nanos / 1_000_000)
    }

    /// Rebuild a timestamp from snapshot milliseconds.
    #[must_use]
    pub fn from_epoch_millis(millis: i64) -> Self {
        let seconds = millis.div_euclid(1000);
        let subsec_nanos = (millis.rem_euclid(1000) as u32) * 1_000_000;
        Self {
            seconds,
            subsec_nanos,
        }
    }
}

impl From<SystemTime> for FileTimestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self {
                seconds: since.as_secs() as i64,
                subsec_nanos: since.subsec_nanos(),
            },
            Err(err) => {
                // Pre-epoch mtime: count backwards, keeping the
                // remainder in 0..1e9.
                let before: Duration = err.duration();
                if before.subsec_nanos() == 0 {
                    Self {
                        seconds: -(before.as_secs() as i64),
                        subsec_nanos: 0,
                    }
                } else {
                    Self {
                        seconds: -(before.as_secs() as i64) - 1,
                        subsec_nanos: 1_000_000_000 - before.subsec_nanos(),
                    }
                }
            }
        }
    }
}

/// A single file entry in the fingerprint cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// File size in bytes at the time the digest was computed.
    pub size: u64,
    /// File modification time at the time the digest was computed.
    pub mtime: FileTimestamp,
    /// SHA-512 digest of the file content.
    pub digest: Digest,
}

impl CacheEntry {
    /// An entry is valid for a file iff the stored size matches.
    /// Passing `mtime` additionally requires an exact timestamp match,
    /// including the sub-second remainder.
    #[must_use]
    pub fn matches(&self, size: u64, mtime: Option<FileTimestamp>) -> bool {
        if self.size != size {
            return false;
        }
        match mtime {
            Some(mtime) => self.mtime == mtime,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DIGEST_LEN;

    fn entry(size: u64, seconds: i64, subsec_nanos: u32) -> CacheEntry {
        CacheEntry {
            size,
            mtime: FileTimestamp {
                seconds,
                subsec_nanos,
            },
            digest: Digest::new([1u8; DIGEST_LEN]),
        }
    }

    #[test]
    fn test_matches_by_size_only() {
        let e = entry(100, 1_700_000_000, 500_000_000);
        assert!(e.matches(100, None));
        assert!(!e.matches(101, None));
    }

    #[test]
    fn test_matches_strict_mtime() {
        let e = entry(100, 1_700_000_000, 500_000_000);
        let exact = FileTimestamp {
            seconds: 1_700_000_000,
            subsec_nanos: 500_000_000,
        };
        let off_by_a_nano = FileTimestamp {
            seconds: 1_700_000_000,
            subsec_nanos: 500_000_001,
        };
        assert!(e.matches(100, Some(exact)));
        assert!(!e.matches(100, Some(off_by_a_nano)));
    }

    #[test]
    fn test_epoch_millis_round_trip() {
        let ts = FileTimestamp {
            seconds: 1_700_000_123,
            subsec_nanos: 456_000_000,
        };
        let millis = ts.to_epoch_millis();
        assert_eq!(millis, 1_700_000_123_456);
        assert_eq!(FileTimestamp::from_epoch_millis(millis), ts);
    }

    #[test]
    fn test_epoch_millis_negative() {
        let ts = FileTimestamp::from_epoch_millis(-1_500);
        assert_eq!(ts.seconds, -2);
        assert_eq!(ts.subsec_nanos, 500_000_000);
        assert_eq!(ts.to_epoch_millis(), -1_500);
    }

    #[test]
    fn test_from_system_time_sub_second() {
        let time = UNIX_EPOCH + Duration::new(10, 123_456_789);
        let ts = FileTimestamp::from(time);
        assert_eq!(ts.seconds, 10);
        assert_eq!(ts.subsec_nanos, 123_456_789);
    }

    #[test]
    fn test_from_system_time_pre_epoch() {
        let time = UNIX_EPOCH - Duration::new(1, 250_000_000);
        let ts = FileTimestamp::from(time);
        assert_eq!(ts.seconds, -2);
        assert_eq!(ts.subsec_nanos, 750_000_000);
    }
}
