//! oqpack: lossless BAM original-quality tag transcoding
//!
//! # Overview
//!
//! BAM files produced by base-quality recalibration often keep the
//! pre-recalibration qualities in an `OQ:Z` aux tag, one ASCII Phred+33
//! character per base. That tag is pure redundancy dressed as text; oqpack
//! replaces it with a compact `ZQ:B:C` tag holding a losslessly packed
//! representation, and converts back on demand. Everything else in the
//! file (header, reference dictionary, alignments, other tags) passes
//! through byte-identical.
//!
//! The packing is an adaptive block code: the quality vector is split into
//! contiguous blocks, each storing a shared minimum and a per-element bit
//! width, with the split chosen by dynamic programming to minimize total
//! serialized length. See [`codec`] for the format.
//!
//! # Quick start
//!
//! ```no_run
//! use oqpack::io::bgzf::BgzfSink;
//! use oqpack::io::source::open_input;
//! use oqpack::Transcoder;
//! use std::fs::File;
//! use std::io::BufWriter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let reader = open_input("in.bam")?;
//! let sink = BgzfSink::new(BufWriter::new(File::create("out.bam")?));
//! let mut transcoder = Transcoder::new(reader, sink);
//! transcoder.run()?;
//! transcoder.into_writer().finish()?;
//! # Ok(())
//! # }
//! ```
//!
//! The direction is implicit: alignments carrying `OQ` are packed,
//! alignments carrying `ZQ` are expanded, so running the tool twice
//! restores the original content.
//!
//! # Module organization
//!
//! - [`codec`]: the adaptive quality-score block packer
//! - [`io`]: input decompression, the BAM walker, BGZF output framing
//! - [`error`]: the fatal-error taxonomy

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod codec;
pub mod error;
pub mod io;

// Re-export commonly used types
pub use codec::QualCodec;
pub use error::{OqpackError, Result};
pub use io::bam::Transcoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
