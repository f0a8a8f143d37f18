/*!
 * Bucket Sizing
 * Rounds request sizes up to power-of-two arena buckets
 */

use crate::core::limits::{EMPTY_BUCKET, MIN_BUCKET};
use crate::core::types::Size;

/// Bucket capacity for a request of `n` bytes
///
/// - `0` maps to the empty bucket
/// - `1` maps to [`MIN_BUCKET`]; there is no 1-byte bucket
/// - otherwise the smallest power of two `>= n`, taken from the highest set
///   bit of `n - 1` shifted up by one
///
/// When that power of two is not representable the request size itself is
/// returned, so the caller gets an exact-size buffer instead of a wrapped
/// bucket.
#[inline]
pub fn next_pow2(n: Size) -> Size {
    match n {
        0 => EMPTY_BUCKET,
        1 => MIN_BUCKET,
        _ => {
            let shift = Size::BITS - (n - 1).leading_zeros();
            (1 as Size).checked_shl(shift).unwrap_or(n)
        }
    }
}
