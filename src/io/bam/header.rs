//! BAM header and reference-dictionary passthrough.
//!
//! The transcoder never edits anything ahead of the alignments, so the
//! header is validated just enough to be copied: the magic is checked, and
//! the SAM text plus the reference dictionary move to the output verbatim.
//!
//! # Format
//!
//! ```text
//! BAM header:
//! - 4 bytes: magic ("BAM\1")
//! - 4 bytes: SAM header text length (l_text)
//! - l_text bytes: SAM header text
//! - 4 bytes: number of reference sequences (n_ref)
//! - for each reference:
//!   - 4 bytes: name length (l_name, includes null terminator)
//!   - l_name bytes: name
//!   - 4 bytes: reference length
//! ```

use crate::error::{OqpackError, Result};
use std::io::{self, Read, Write};

/// BAM magic bytes ("BAM\1", i.e. 0x014D4142 little-endian).
pub const BAM_MAGIC: [u8; 4] = *b"BAM\x01";

/// Validate the magic and copy the header plus reference dictionary from
/// `reader` to `writer` byte for byte.
///
/// # Errors
///
/// Fails on a wrong magic, a short read at any structural boundary, or a
/// write failure.
pub fn copy_header<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<()> {
    let mut magic = [0u8; 4];
    read_field(reader, &mut magic, "magic")?;
    if magic != BAM_MAGIC {
        return Err(OqpackError::InvalidMagic { found: magic });
    }
    writer.write_all(&magic)?;

    let mut scratch = Vec::with_capacity(2048);
    let text_len = copy_u32(reader, writer, "header text length")?;
    copy_bytes(reader, writer, &mut scratch, text_len as usize, "header text")?;

    let mut n_refs = copy_u32(reader, writer, "reference count")?;
    while n_refs > 0 {
        let name_len = copy_u32(reader, writer, "reference name length")?;
        copy_bytes(reader, writer, &mut scratch, name_len as usize, "reference name")?;
        copy_u32(reader, writer, "reference length")?;
        n_refs -= 1;
    }

    Ok(())
}

fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            OqpackError::TruncatedHeader { what }
        } else {
            OqpackError::Io(e)
        }
    })
}

/// Copy one little-endian u32, returning its value.
fn copy_u32<R: Read, W: Write>(reader: &mut R, writer: &mut W, what: &'static str) -> Result<u32> {
    let mut raw = [0u8; 4];
    read_field(reader, &mut raw, what)?;
    writer.write_all(&raw)?;
    Ok(u32::from_le_bytes(raw))
}

fn copy_bytes<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    scratch: &mut Vec<u8>,
    len: usize,
    what: &'static str,
) -> Result<()> {
    scratch.resize(len, 0);
    read_field(reader, scratch, what)?;
    writer.write_all(scratch)?;
    Ok(())
}
