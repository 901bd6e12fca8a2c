//! I/O module: input decompression, BAM walking, BGZF output framing

pub mod bam;
pub mod bgzf;
pub mod source;

pub use bam::Transcoder;
pub use bgzf::BgzfSink;
pub use source::{open_input, MMAP_THRESHOLD};
