// ezsign/src/utils.rs
//! Small helpers shared across the crate: hex formatting for log output and
//! a millisecond-to-Duration shorthand.

use std::time::Duration;

/// Convert a byte slice to a lowercase hex string without separators.
///
/// Example: `&[0xde, 0xad]` -> `"dead"`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // write! to a String cannot fail
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

/// Convert milliseconds to a Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
