//! Fixed-size BAM alignment header.
//!
//! Every alignment starts with a fixed little-endian header followed by
//! the variable-length body (name, CIGAR, packed sequence, qualities, aux
//! tags). The transcoder keeps the body opaque except for the aux tags, so
//! only this fixed prefix is parsed into fields.
//!
//! # Binary format
//!
//! ```text
//! BAM alignment header (little-endian, 36 bytes):
//! - block_size (uint32): bytes remaining in the record after this field
//!   (32 fixed bytes below + the variable-length body)
//! - refID (int32): reference sequence ID (-1 for unmapped)
//! - pos (int32): 0-based leftmost position (-1 for unmapped)
//! - l_read_name (uint8): read name length, including null terminator
//! - mapq (uint8): mapping quality
//! - bin (uint16): BAI index bin
//! - n_cigar_op (uint16): number of CIGAR operations
//! - flag (uint16): bitwise FLAGS
//! - l_seq (uint32): sequence length
//! - next_refID (int32): mate reference ID
//! - next_pos (int32): mate position
//! - tlen (int32): template length
//! ```

/// Serialized size of the fixed alignment header, including the leading
/// block-size field.
pub const FIXED_LEN: usize = 36;

/// The fixed prefix of a BAM alignment.
///
/// Fields pass through the transcoder untouched except for
/// `remaining_block_size`, which is recomputed after the aux tags are
/// rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignHead {
    /// Bytes remaining in the record after this length field
    pub remaining_block_size: u32,
    /// Reference sequence ID (-1 for unmapped)
    pub ref_id: i32,
    /// 0-based leftmost position (-1 for unmapped)
    pub pos: i32,
    /// Read name length, including the null terminator
    pub name_len: u8,
    /// Mapping quality
    pub map_q: u8,
    /// BAI index bin
    pub bin: u16,
    /// Number of CIGAR operations
    pub cigar_len: u16,
    /// Bitwise FLAGS
    pub flags: u16,
    /// Sequence length in bases
    pub seq_len: u32,
    /// Mate reference ID
    pub mate_ref_id: i32,
    /// Mate position
    pub mate_pos: i32,
    /// Template length
    pub template_len: i32,
}

impl AlignHead {
    /// Decode the fixed header from its serialized bytes.
    pub fn parse(raw: &[u8; FIXED_LEN]) -> Self {
        Self {
            remaining_block_size: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            ref_id: i32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            pos: i32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
            name_len: raw[12],
            map_q: raw[13],
            bin: u16::from_le_bytes([raw[14], raw[15]]),
            cigar_len: u16::from_le_bytes([raw[16], raw[17]]),
            flags: u16::from_le_bytes([raw[18], raw[19]]),
            seq_len: u32::from_le_bytes([raw[20], raw[21], raw[22], raw[23]]),
            mate_ref_id: i32::from_le_bytes([raw[24], raw[25], raw[26], raw[27]]),
            mate_pos: i32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
            template_len: i32::from_le_bytes([raw[32], raw[33], raw[34], raw[35]]),
        }
    }

    /// Encode the fixed header back to its serialized form.
    pub fn to_bytes(&self) -> [u8; FIXED_LEN] {
        let mut raw = [0u8; FIXED_LEN];
        raw[0..4].copy_from_slice(&self.remaining_block_size.to_le_bytes());
        raw[4..8].copy_from_slice(&self.ref_id.to_le_bytes());
        raw[8..12].copy_from_slice(&self.pos.to_le_bytes());
        raw[12] = self.name_len;
        raw[13] = self.map_q;
        raw[14..16].copy_from_slice(&self.bin.to_le_bytes());
        raw[16..18].copy_from_slice(&self.cigar_len.to_le_bytes());
        raw[18..20].copy_from_slice(&self.flags.to_le_bytes());
        raw[20..24].copy_from_slice(&self.seq_len.to_le_bytes());
        raw[24..28].copy_from_slice(&self.mate_ref_id.to_le_bytes());
        raw[28..32].copy_from_slice(&self.mate_pos.to_le_bytes());
        raw[32..36].copy_from_slice(&self.template_len.to_le_bytes());
        raw
    }

    /// Bytes occupied by the CIGAR operations.
    pub fn cigar_bytes(&self) -> usize {
        4 * usize::from(self.cigar_len)
    }

    /// Bytes occupied by the 4-bit packed sequence.
    pub fn packed_seq_bytes(&self) -> usize {
        (self.seq_len as usize + 1) / 2
    }

    /// Bytes of aux-tag data declared by the block size.
    ///
    /// Negative when the declared block size cannot even hold the
    /// fixed-position fields, which is a fatal input error.
    pub fn aux_len(&self) -> i64 {
        i64::from(self.remaining_block_size) + 4
            - FIXED_LEN as i64
            - i64::from(self.name_len)
            - self.cigar_bytes() as i64
            - self.packed_seq_bytes() as i64
            - i64::from(self.seq_len)
    }

    /// Recompute `remaining_block_size` for a rebuilt body of `body_len`
    /// bytes (name through aux tags).
    pub fn set_body_len(&mut self, body_len: usize) {
        self.remaining_block_size = (body_len + FIXED_LEN - 4) as u32;
    }
}
