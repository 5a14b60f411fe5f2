//! Deterministic subscriber identity hashing
//!
//! Subscriber ids are derived from the lower-cased email with a 32-bit SDBM
//! hash. The result must stay bit-for-bit stable across runs and releases,
//! since persisted ids and unsubscribe tokens are both built from it.

/// Compute the SDBM hash of `text` after ASCII lower-casing.
///
/// Arithmetic wraps modulo 2^32 at every step and the final value is
/// reinterpreted as a signed 32-bit integer. `None` hashes to `0`.
pub fn sdbm_lower<'a>(text: impl Into<Option<&'a str>>) -> i32 {
    let Some(text) = text.into() else {
        return 0;
    };

    let mut value: u32 = 0;
    for c in text.chars() {
        let code = c.to_ascii_lowercase() as u32;
        value = code
            .wrapping_add(value << 6)
            .wrapping_add(value << 16)
            .wrapping_sub(value);
    }

    value as i32
}
