//! BGZF-framed output sink.
//!
//! BGZF is a restricted gzip variant: the stream is a concatenation of
//! independent gzip members, each at most 64 KiB long and carrying a `BC`
//! extra subfield with the member's serialized length. The length field
//! makes the format seekable for downstream BAM tooling; this writer only
//! needs it to keep every member within the 16-bit size budget.
//!
//! # Member layout
//!
//! ```text
//! - 10 bytes: gzip header (ID1=31, ID2=139, CM=8, FLG=4 FEXTRA,
//!             MTIME=0, XFL=0, OS=255)
//! -  2 bytes: XLEN = 6
//! -  4 bytes: BC subfield header (SI1='B', SI2='C', SLEN=2)
//! -  2 bytes: BSIZE = total member length - 1 (little-endian u16)
//! -  N bytes: raw deflate body
//! -  4 bytes: CRC32 of the uncompressed data
//! -  4 bytes: ISIZE (uncompressed length)
//! ```

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Largest run of input bytes attempted per member.
///
/// Leaves room for the 26 bytes of framing plus deflate's stored-block
/// overhead on incompressible data, so a full chunk almost always fits.
pub const MAX_BLOCK_INPUT: usize = 65_498;

/// Hard cap on a serialized member: BSIZE is 16 bits.
const MAX_MEMBER_LEN: usize = 65_536;

/// Framing bytes around the deflate body (18-byte header + 8-byte trailer).
const MEMBER_OVERHEAD: usize = 26;

/// Step by which the candidate chunk shrinks when a member comes out too
/// large to frame.
const RETRY_SHRINK: usize = 1_024;

/// Conventional empty member marking end-of-stream, recognized by BAM
/// readers as an explicit EOF.
const BGZF_EOF: [u8; 28] = [
    31, 139, 8, 4, 0, 0, 0, 0, 0, 255, // gzip header
    6, 0, 66, 67, 2, 0, 27, 0, // extra field, BSIZE = 27
    3, 0, // empty deflate block
    0, 0, 0, 0, // CRC32
    0, 0, 0, 0, // ISIZE
];

/// Buffering BGZF writer.
///
/// Bytes written through the [`Write`] impl accumulate until a full chunk
/// is available, then leave as one gzip member. [`BgzfSink::finish`] must
/// be called to drain the tail and append the EOF member; dropping the
/// sink without finishing truncates the stream.
pub struct BgzfSink<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> BgzfSink<W> {
    /// Wrap a byte sink in BGZF framing.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(MAX_BLOCK_INPUT),
        }
    }

    /// Compress a prefix of the pending buffer into one member.
    ///
    /// Starts from a full chunk and retries with fewer input bytes until
    /// the serialized member fits the 16-bit length field, consuming
    /// exactly the bytes that fit.
    fn emit_member(&mut self) -> io::Result<()> {
        let mut take = self.pending.len().min(MAX_BLOCK_INPUT);
        let body = loop {
            let body = deflate_body(&self.pending[..take])?;
            if MEMBER_OVERHEAD + body.len() <= MAX_MEMBER_LEN {
                break body;
            }
            // incompressible chunk blew the budget; stored deflate blocks
            // cost only a few bytes, so this converges fast
            take -= RETRY_SHRINK.min(take - 1);
        };
        let total = MEMBER_OVERHEAD + body.len();

        let mut header = [0u8; 18];
        header[0] = 31; // ID1
        header[1] = 139; // ID2
        header[2] = 8; // CM: deflate
        header[3] = 4; // FLG: FEXTRA
        header[9] = 255; // OS: unknown
        header[10..12].copy_from_slice(&6u16.to_le_bytes()); // XLEN
        header[12] = b'B';
        header[13] = b'C';
        header[14..16].copy_from_slice(&2u16.to_le_bytes()); // SLEN
        header[16..18].copy_from_slice(&((total - 1) as u16).to_le_bytes());

        self.inner.write_all(&header)?;
        self.inner.write_all(&body)?;
        self.inner
            .write_all(&crc32fast::hash(&self.pending[..take]).to_le_bytes())?;
        self.inner.write_all(&(take as u32).to_le_bytes())?;
        self.pending.drain(..take);
        Ok(())
    }

    /// Drain buffered data, append the EOF member, and flush.
    ///
    /// Returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        while !self.pending.is_empty() {
            self.emit_member()?;
        }
        self.inner.write_all(&BGZF_EOF)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for BgzfSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while self.pending.len() >= MAX_BLOCK_INPUT {
            self.emit_member()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Raw-deflate a chunk (no zlib or gzip wrapper; the member supplies the
/// framing).
fn deflate_body(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::MultiGzDecoder;
    use std::io::Read;

    fn decompress(framed: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        MultiGzDecoder::new(framed)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    /// Walk the member chain via BSIZE and return per-member lengths.
    fn member_lengths(framed: &[u8]) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut pos = 0;
        while pos < framed.len() {
            assert_eq!(framed[pos], 31);
            assert_eq!(framed[pos + 1], 139);
            assert_eq!(framed[pos + 3] & 0x04, 0x04, "FEXTRA flag");
            assert_eq!(&framed[pos + 12..pos + 14], b"BC");
            let bsize =
                u16::from_le_bytes([framed[pos + 16], framed[pos + 17]]) as usize;
            lengths.push(bsize + 1);
            pos += bsize + 1;
        }
        assert_eq!(pos, framed.len());
        lengths
    }

    #[test]
    fn test_member_format() {
        let mut sink = BgzfSink::new(Vec::new());
        sink.write_all(b"BGZF framing check").unwrap();
        let framed = sink.finish().unwrap();

        assert_eq!(framed[0], 31);
        assert_eq!(framed[1], 139);
        assert_eq!(framed[2], 8);
        assert_eq!(framed[3], 4);
        assert_eq!(framed[9], 255);
        let xlen = u16::from_le_bytes([framed[10], framed[11]]);
        assert_eq!(xlen, 6);
        assert_eq!(framed[12], b'B');
        assert_eq!(framed[13], b'C');
        assert_eq!(u16::from_le_bytes([framed[14], framed[15]]), 2);

        assert_eq!(decompress(&framed), b"BGZF framing check");
    }

    #[test]
    fn test_round_trip_multiple_members() {
        // enough data for several full chunks plus a tail
        let mut data = Vec::new();
        for i in 0u32..60_000 {
            data.extend_from_slice(&i.to_le_bytes());
        }
        let mut sink = BgzfSink::new(Vec::new());
        sink.write_all(&data).unwrap();
        let framed = sink.finish().unwrap();

        let lengths = member_lengths(&framed);
        assert!(lengths.len() >= 3, "expected several members + EOF");
        assert!(lengths.iter().all(|&l| l <= MAX_MEMBER_LEN));
        assert_eq!(decompress(&framed), data);
    }

    #[test]
    fn test_eof_member_appended() {
        let mut sink = BgzfSink::new(Vec::new());
        sink.write_all(b"x").unwrap();
        let framed = sink.finish().unwrap();
        assert!(framed.len() > BGZF_EOF.len());
        assert_eq!(&framed[framed.len() - BGZF_EOF.len()..], &BGZF_EOF);
    }

    #[test]
    fn test_empty_stream_is_just_eof() {
        let sink = BgzfSink::new(Vec::new());
        let framed = sink.finish().unwrap();
        assert_eq!(framed, &BGZF_EOF);
        assert_eq!(decompress(&framed), b"");
    }

    #[test]
    fn test_incompressible_data_stays_within_budget() {
        // pseudo-random bytes deflate poorly; members must still fit
        let mut lcg: u64 = 7;
        let data: Vec<u8> = (0..200_000)
            .map(|_| {
                lcg = lcg.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (lcg >> 56) as u8
            })
            .collect();
        let mut sink = BgzfSink::new(Vec::new());
        sink.write_all(&data).unwrap();
        let framed = sink.finish().unwrap();
        assert!(member_lengths(&framed).iter().all(|&l| l <= MAX_MEMBER_LEN));
        assert_eq!(decompress(&framed), data);
    }
}
