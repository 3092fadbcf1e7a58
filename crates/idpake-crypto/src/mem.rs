//! Constant-time comparisons for secret material

use subtle::ConstantTimeEq;

/// Constant-time equality comparison.
///
/// Used for key-confirmation tags and MACs; public values such as point
/// encodings may be compared with ordinary `==`. Always returns `false` for
/// slices of different lengths.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ct_eq() {
        assert!(ct_eq(b"hello", b"hello"));
        assert!(!ct_eq(b"hello", b"world"));
        assert!(!ct_eq(b"hello", b"hello!"));
    }
}
