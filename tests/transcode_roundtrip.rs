//! End-to-end pipeline tests: BGZF-framed BAM in, BGZF-framed BAM out.
//!
//! BGZF block boundaries depend on buffering, so the assertions compare
//! the *uncompressed* content of the streams, which is what the format
//! guarantees.

use flate2::read::MultiGzDecoder;
use oqpack::io::bgzf::BgzfSink;
use oqpack::io::source::open_input;
use oqpack::Transcoder;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::TempDir;

fn bam_header(references: &[(&str, u32)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"BAM\x01");
    let text = b"@HD\tVN:1.6\tSO:coordinate\n";
    data.extend_from_slice(&(text.len() as u32).to_le_bytes());
    data.extend_from_slice(text);
    data.extend_from_slice(&(references.len() as u32).to_le_bytes());
    for (name, len) in references {
        data.extend_from_slice(&((name.len() + 1) as u32).to_le_bytes());
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(&len.to_le_bytes());
    }
    data
}

fn alignment(name: &[u8], seq_len: usize, pos: i32, aux: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(name);
    body.push(0);
    body.extend_from_slice(&(((seq_len as u32) << 4) | 0).to_le_bytes());
    body.extend(std::iter::repeat(0x48).take((seq_len + 1) / 2));
    body.extend((0..seq_len).map(|i| (i % 42) as u8));
    body.extend_from_slice(aux);

    let mut data = Vec::new();
    data.extend_from_slice(&((32 + body.len()) as u32).to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes());
    data.extend_from_slice(&pos.to_le_bytes());
    data.push((name.len() + 1) as u8);
    data.push(60);
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&(seq_len as u32).to_le_bytes());
    data.extend_from_slice(&(-1i32).to_le_bytes());
    data.extend_from_slice(&(-1i32).to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes());
    data.extend_from_slice(&body);
    data
}

fn oq_tag(raw_quals: &[u8]) -> Vec<u8> {
    let mut aux = Vec::new();
    aux.extend_from_slice(b"OQZ");
    aux.extend(raw_quals.iter().map(|&q| q + 33));
    aux.push(0);
    aux
}

/// Typical sample content: a mix of OQ-carrying, plain, and tag-heavy
/// alignments.
fn sample_bam_content(with_oq: bool) -> Vec<u8> {
    let mut content = bam_header(&[("chr1", 248_956_422), ("chr2", 242_193_529)]);

    let quals: Vec<u8> = (0..150).map(|i| ((i * 7) % 64) as u8).collect();
    let mut aux = Vec::new();
    aux.extend_from_slice(b"NMi");
    aux.extend_from_slice(&3i32.to_le_bytes());
    if with_oq {
        aux.extend_from_slice(&oq_tag(&quals));
    }
    aux.extend_from_slice(b"RGZsample1\0");
    content.extend_from_slice(&alignment(b"frag/1", 150, 1_000, &aux));

    // no quality tags at all
    content.extend_from_slice(&alignment(b"frag/2", 75, 2_000, &[]));

    // B-array and hex tags around a second OQ
    let mut aux = Vec::new();
    aux.extend_from_slice(b"XBBi");
    aux.extend_from_slice(&2u32.to_le_bytes());
    aux.extend_from_slice(&(-7i32).to_le_bytes());
    aux.extend_from_slice(&1_000_000i32.to_le_bytes());
    if with_oq {
        aux.extend_from_slice(&oq_tag(&vec![40u8; 75]));
    }
    aux.extend_from_slice(b"MDH1A2F\0");
    content.extend_from_slice(&alignment(b"frag/3", 75, 3_000, &aux));

    content
}

fn write_bgzf(path: &Path, content: &[u8]) {
    let mut sink = BgzfSink::new(BufWriter::new(File::create(path).unwrap()));
    sink.write_all(content).unwrap();
    sink.finish().unwrap().flush().unwrap();
}

fn read_bgzf(path: &Path) -> Vec<u8> {
    let mut content = Vec::new();
    MultiGzDecoder::new(File::open(path).unwrap())
        .read_to_end(&mut content)
        .unwrap();
    content
}

fn transcode_file(input: &Path, output: &Path) -> u64 {
    let reader = open_input(input).unwrap();
    let sink = BgzfSink::new(BufWriter::new(File::create(output).unwrap()));
    let mut transcoder = Transcoder::new(reader, sink);
    let alignments = transcoder.run().unwrap();
    transcoder.into_writer().finish().unwrap().flush().unwrap();
    alignments
}

#[test]
fn test_pack_then_unpack_restores_content() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("in.bam");
    let packed = dir.path().join("packed.bam");
    let restored = dir.path().join("restored.bam");

    let content = sample_bam_content(true);
    write_bgzf(&original, &content);

    assert_eq!(transcode_file(&original, &packed), 3);
    assert_eq!(transcode_file(&packed, &restored), 3);

    let packed_content = read_bgzf(&packed);
    assert_ne!(packed_content, content);
    assert!(packed_content.windows(4).any(|w| w == b"ZQBC"));
    assert!(!packed_content.windows(3).any(|w| w == b"OQZ"));
    // packing strictly shrinks these alignments
    assert!(packed_content.len() < content.len());

    assert_eq!(read_bgzf(&restored), content);
}

#[test]
fn test_passthrough_without_quality_tags() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("in.bam");
    let output = dir.path().join("out.bam");

    let content = sample_bam_content(false);
    write_bgzf(&original, &content);

    assert_eq!(transcode_file(&original, &output), 3);
    assert_eq!(read_bgzf(&output), content);
}

#[test]
fn test_uncompressed_input_accepted() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("in.bam");
    let output = dir.path().join("out.bam");

    let content = sample_bam_content(false);
    std::fs::write(&original, &content).unwrap();

    assert_eq!(transcode_file(&original, &output), 3);
    assert_eq!(read_bgzf(&output), content);
}

#[test]
fn test_large_stream_spans_many_bgzf_members() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("in.bam");
    let packed = dir.path().join("packed.bam");
    let restored = dir.path().join("restored.bam");

    // enough alignments that the uncompressed stream is several BGZF
    // members long in both directions
    let mut content = bam_header(&[("chr1", 1_000_000)]);
    let mut n = 0u64;
    for i in 0..2_000 {
        let quals: Vec<u8> = (0..151).map(|j| ((i + j) % 60) as u8).collect();
        content.extend_from_slice(&alignment(
            format!("read{i}").as_bytes(),
            151,
            i as i32,
            &oq_tag(&quals),
        ));
        n += 1;
    }
    write_bgzf(&original, &content);

    assert_eq!(transcode_file(&original, &packed), n);
    assert_eq!(transcode_file(&packed, &restored), n);
    assert_eq!(read_bgzf(&restored), content);
}
