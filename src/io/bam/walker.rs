//! Streaming BAM transcoder.
//!
//! Walks an uncompressed BAM stream one alignment at a time, copying
//! everything verbatim except the quality tags: an `OQ:Z` tag (ASCII
//! Phred+33 original qualities) is replaced by a packed `ZQ:B:C` tag, and a
//! `ZQ:B:C` tag is expanded back to `OQ:Z`. The direction is decided per
//! tag by the tag actually encountered, so one pass over a file performs
//! whichever rewrite its alignments call for.
//!
//! The alignment body is rebuilt in a reusable buffer because the rewrite
//! changes its length; the fixed header's block size is recomputed before
//! the record is emitted.

use super::header::copy_header;
use super::record::{AlignHead, FIXED_LEN};
use super::tags::{self, TagBody};
use crate::codec::QualCodec;
use crate::error::{OqpackError, Result};
use std::io::{self, BufRead, Write};

/// ASCII offset of Phred+33 quality characters.
const PHRED_OFFSET: u8 = 33;

/// One-pass OQ↔ZQ transcoder over an uncompressed BAM stream.
///
/// The reader must yield the decompressed BAM bytes (see
/// [`crate::io::source::open_input`]); the writer receives the rewritten
/// stream and is typically a [`crate::io::bgzf::BgzfSink`].
pub struct Transcoder<R, W> {
    reader: R,
    writer: W,
    codec: QualCodec,
    /// Verbatim-copy staging buffer, reused across fields and alignments
    scratch: Vec<u8>,
    /// Rebuilt alignment body (name through aux tags)
    body: Vec<u8>,
    /// Index of the alignment being processed, for diagnostics
    alignment: u64,
}

impl<R: BufRead, W: Write> Transcoder<R, W> {
    /// Create a transcoder over the given streams.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            codec: QualCodec::new(),
            scratch: Vec::with_capacity(512),
            body: Vec::with_capacity(512),
            alignment: 0,
        }
    }

    /// Run the transcode to end of input.
    ///
    /// Copies the header, then rewrites alignments until EOF. Returns the
    /// number of alignments processed.
    ///
    /// # Errors
    ///
    /// Any structural, schema, or I/O problem is fatal; see
    /// [`OqpackError`] for the taxonomy. Errors raised inside an alignment
    /// carry its index.
    pub fn run(&mut self) -> Result<u64> {
        copy_header(&mut self.reader, &mut self.writer)?;
        while !self.reader.fill_buf()?.is_empty() {
            self.transcode_alignment()?;
            self.alignment += 1;
        }
        Ok(self.alignment)
    }

    /// Consume the transcoder and hand back the writer (so a BGZF sink can
    /// be finished).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn transcode_alignment(&mut self) -> Result<()> {
        let mut raw = [0u8; FIXED_LEN];
        self.read_field(&mut raw, "alignment header")?;
        let mut head = AlignHead::parse(&raw);

        let mut aux_len = head.aux_len();
        if aux_len < 0 {
            return Err(OqpackError::SizeMismatch {
                alignment: self.alignment,
                message: format!(
                    "block size {} too small for the fixed-position fields",
                    head.remaining_block_size
                ),
            });
        }

        self.body.clear();
        self.copy_to_body(usize::from(head.name_len), "read name")?;
        self.copy_to_body(head.cigar_bytes(), "cigar")?;
        self.copy_to_body(head.packed_seq_bytes(), "packed sequence")?;
        self.copy_to_body(head.seq_len as usize, "base qualities")?;

        while aux_len > 0 {
            aux_len -= self.rewrite_tag(head.seq_len as usize)?;
        }
        if aux_len < 0 {
            return Err(OqpackError::SizeMismatch {
                alignment: self.alignment,
                message: "aux tags overrun the declared block size".to_string(),
            });
        }

        head.set_body_len(self.body.len());
        self.writer.write_all(&head.to_bytes())?;
        self.writer.write_all(&self.body)?;
        Ok(())
    }

    /// Rewrite or copy one aux tag into the body buffer.
    ///
    /// Returns the number of *input* bytes the tag occupied, which the
    /// caller charges against the alignment's declared aux length.
    fn rewrite_tag(&mut self, seq_len: usize) -> Result<i64> {
        let mut tag = [0u8; 3];
        self.read_field(&mut tag, "tag header")?;

        if tag[0] == b'O' && tag[1] == b'Q' {
            if tag[2] != b'Z' {
                return Err(self.tag_schema("OQ tag with non-Z data type"));
            }
            self.read_scratch(seq_len, "OQ tag data")?;
            let mut nul = [0u8; 1];
            self.read_field(&mut nul, "OQ tag terminator")?;
            if nul[0] != 0 {
                return Err(self.tag_schema("OQ tag with the wrong length"));
            }
            // Phred+33 to raw; out-of-range characters wrap above 63 and
            // are rejected by the encoder
            for q in &mut self.scratch {
                *q = q.wrapping_sub(PHRED_OFFSET);
            }
            let packed = self.codec.encode(&self.scratch)?;
            self.body.extend_from_slice(b"ZQBC");
            self.body.extend_from_slice(&(packed.len() as u32).to_le_bytes());
            self.body.extend_from_slice(packed);
            return Ok(seq_len as i64 + 1 + 3);
        }

        if tag[0] == b'Z' && tag[1] == b'Q' {
            if tag[2] != b'B' {
                return Err(self.tag_schema("ZQ tag with non-B data type"));
            }
            let mut subtype = [0u8; 1];
            self.read_field(&mut subtype, "ZQ tag element type")?;
            if subtype[0] != b'C' {
                return Err(self.tag_schema("ZQ tag with non-C element type"));
            }
            let mut len_raw = [0u8; 4];
            self.read_field(&mut len_raw, "ZQ tag length")?;
            let packed_len = u32::from_le_bytes(len_raw) as usize;
            self.read_scratch(packed_len, "ZQ tag data")?;
            let quals = self.codec.decode(&self.scratch)?;
            if quals.len() != seq_len {
                return Err(OqpackError::SizeMismatch {
                    alignment: self.alignment,
                    message: format!(
                        "unpacked ZQ tag holds {} qualities, expected {}",
                        quals.len(),
                        seq_len
                    ),
                });
            }
            self.body.extend_from_slice(b"OQZ");
            self.body.extend(quals.iter().map(|&q| q + PHRED_OFFSET));
            self.body.push(0);
            return Ok(packed_len as i64 + 4 + 4);
        }

        // Anything else is copied verbatim
        self.body.extend_from_slice(&tag);
        let mut consumed: i64 = 3;
        match tags::body_kind(tag[2]) {
            None => {
                return Err(self.tag_schema(&format!(
                    "unknown data type {:?} in tag header",
                    tag[2] as char
                )))
            }
            Some(TagBody::Fixed(n)) => {
                self.copy_to_body(n, "tag data")?;
                consumed += n as i64;
            }
            Some(TagBody::NulTerminated) => loop {
                let mut byte = [0u8; 1];
                self.read_field(&mut byte, "null-terminated tag data")?;
                self.body.push(byte[0]);
                consumed += 1;
                if byte[0] == 0 {
                    break;
                }
            },
            Some(TagBody::Array) => {
                let mut array_head = [0u8; 5];
                self.read_field(&mut array_head, "B tag header")?;
                self.body.extend_from_slice(&array_head);
                consumed += 5;
                let elem = tags::fixed_size(array_head[0])
                    .ok_or_else(|| self.tag_schema("bad element type in B tag header"))?;
                let count =
                    u32::from_le_bytes([array_head[1], array_head[2], array_head[3], array_head[4]]);
                let data_len = elem.checked_mul(count as usize).ok_or_else(|| {
                    OqpackError::SizeMismatch {
                        alignment: self.alignment,
                        message: format!("B tag element count {} overflows", count),
                    }
                })?;
                self.copy_to_body(data_len, "B tag data")?;
                consumed += data_len as i64;
            }
        }
        Ok(consumed)
    }

    /// Read exactly `len` bytes through the scratch buffer and append them
    /// to the body unchanged.
    fn copy_to_body(&mut self, len: usize, what: &'static str) -> Result<()> {
        self.read_scratch(len, what)?;
        self.body.extend_from_slice(&self.scratch);
        Ok(())
    }

    fn read_scratch(&mut self, len: usize, what: &'static str) -> Result<()> {
        self.scratch.resize(len, 0);
        let res = self.reader.read_exact(&mut self.scratch);
        res.map_err(|e| self.truncated(e, what))
    }

    fn read_field(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        let res = self.reader.read_exact(buf);
        res.map_err(|e| self.truncated(e, what))
    }

    fn truncated(&self, e: io::Error, what: &'static str) -> OqpackError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            OqpackError::Truncated {
                what,
                alignment: self.alignment,
            }
        } else {
            OqpackError::Io(e)
        }
    }

    fn tag_schema(&self, message: &str) -> OqpackError {
        OqpackError::TagSchema {
            alignment: self.alignment,
            message: message.to_string(),
        }
    }
}
