use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

use oqpack::io::bgzf::BgzfSink;
use oqpack::io::source::open_input;
use oqpack::Transcoder;

/// Losslessly pack BAM original-quality (OQ) tags into ZQ tags, and back.
///
/// Alignments carrying an OQ tag are packed; alignments carrying a ZQ tag
/// are expanded. Running the tool on its own output restores the original
/// content.
#[derive(Parser)]
#[command(name = "oqpack", version, about)]
struct Cli {
    /// Input BAM file (BGZF/gzip framed, or uncompressed)
    input: PathBuf,

    /// Output BAM file (BGZF framed)
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let reader = open_input(&cli.input)
        .with_context(|| format!("failed to open BAM file {}", cli.input.display()))?;
    let out = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let sink = BgzfSink::new(BufWriter::new(out));

    let mut transcoder = Transcoder::new(reader, sink);
    let alignments = transcoder
        .run()
        .with_context(|| format!("BAM file {}", cli.input.display()))?;
    transcoder
        .into_writer()
        .finish()
        .with_context(|| format!("failed to finalize {}", cli.output.display()))?;

    info!(alignments, "transcode complete");
    Ok(())
}
