//! BAM stream handling for the transcoder.
//!
//! A BAM file is a BGZF-compressed binary stream: a header (magic, SAM
//! text, reference dictionary) followed by one binary record per
//! alignment. The transcoder treats almost all of it as opaque bytes; the
//! modules here parse exactly as much structure as the OQ↔ZQ rewrite
//! needs:
//!
//! - [`header`]: validates the magic and copies the header verbatim
//! - [`record`]: the fixed alignment header, whose block size must be
//!   recomputed after the rewrite
//! - [`tags`]: the aux-tag type table driving verbatim tag copies
//! - [`walker`]: the per-alignment transcode loop
//!
//! # Example
//!
//! ```no_run
//! use oqpack::io::bam::Transcoder;
//! use oqpack::io::bgzf::BgzfSink;
//! use oqpack::io::source::open_input;
//! use std::fs::File;
//! use std::io::BufWriter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let reader = open_input("in.bam")?;
//! let sink = BgzfSink::new(BufWriter::new(File::create("out.bam")?));
//! let mut transcoder = Transcoder::new(reader, sink);
//! let alignments = transcoder.run()?;
//! transcoder.into_writer().finish()?;
//! println!("{alignments} alignments transcoded");
//! # Ok(())
//! # }
//! ```

pub mod header;
pub mod record;
pub mod tags;
pub mod walker;

pub use header::copy_header;
pub use record::AlignHead;
pub use walker::Transcoder;
