//! Aux-tag type table.
//!
//! Each aux tag is a 2-byte name, a 1-byte type code, and a value whose
//! length follows from the type. The transcoder only interprets `OQ` and
//! `ZQ`; every other tag is copied verbatim, so all it needs from the type
//! code is how many bytes to move.
//!
//! # Type codes
//!
//! | Code | Value |
//! |---|---|
//! | `A`, `c`, `C` | 1 byte |
//! | `s`, `S` | 2 bytes |
//! | `i`, `I`, `f` | 4 bytes |
//! | `Z`, `H` | null-terminated (copied through the terminator) |
//! | `B` | 1-byte element code + 4-byte count + count * element size |

/// Shape of an aux-tag value, keyed by its type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagBody {
    /// Fixed-width scalar of the given byte size
    Fixed(usize),
    /// Null-terminated string (`Z` or `H`)
    NulTerminated,
    /// Typed array (`B`): element code, count, then elements
    Array,
}

/// Look up the value shape for a tag type code.
///
/// Returns `None` for an unknown code, which is a fatal input error.
pub fn body_kind(type_code: u8) -> Option<TagBody> {
    match type_code {
        b'Z' | b'H' => Some(TagBody::NulTerminated),
        b'B' => Some(TagBody::Array),
        other => fixed_size(other).map(TagBody::Fixed),
    }
}

/// Byte size of a fixed-width scalar type code, also used for `B` array
/// elements. `None` for variable-length or unknown codes.
pub fn fixed_size(type_code: u8) -> Option<usize> {
    match type_code {
        b'A' | b'c' | b'C' => Some(1),
        b's' | b'S' => Some(2),
        b'i' | b'I' | b'f' => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(fixed_size(b'A'), Some(1));
        assert_eq!(fixed_size(b'c'), Some(1));
        assert_eq!(fixed_size(b'C'), Some(1));
        assert_eq!(fixed_size(b's'), Some(2));
        assert_eq!(fixed_size(b'S'), Some(2));
        assert_eq!(fixed_size(b'i'), Some(4));
        assert_eq!(fixed_size(b'I'), Some(4));
        assert_eq!(fixed_size(b'f'), Some(4));
    }

    #[test]
    fn test_variable_kinds() {
        assert_eq!(body_kind(b'Z'), Some(TagBody::NulTerminated));
        assert_eq!(body_kind(b'H'), Some(TagBody::NulTerminated));
        assert_eq!(body_kind(b'B'), Some(TagBody::Array));
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert_eq!(body_kind(b'x'), None);
        assert_eq!(body_kind(0), None);
        // Z/H/B are not valid array element codes
        assert_eq!(fixed_size(b'Z'), None);
        assert_eq!(fixed_size(b'B'), None);
    }
}
