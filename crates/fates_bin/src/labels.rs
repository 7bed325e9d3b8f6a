//! Label text encoding and label pool construction.

use encoding_rs::SHIFT_JIS;
use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Encode label text as Shift-JIS
pub fn encode_label(text: &str) -> Result<Vec<u8>> {
    if text.contains('\0') {
        return Err(Error::Encoding(text.to_string()));
    }

    let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
    if had_errors {
        return Err(Error::Encoding(text.to_string()));
    }

    Ok(bytes.into_owned())
}

/// Decode Shift-JIS label bytes, without the terminator
pub fn decode_label(bytes: &[u8]) -> String {
    SHIFT_JIS
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

/// Builder for a run of NUL terminated labels.
///
/// Offsets handed out are relative to the start of the label region, so a pool
/// that is appended after existing labels starts at their length.
#[derive(Debug, Clone, Default)]
pub struct LabelPool {
    base: u32,
    bytes: Vec<u8>,
    offsets: IndexMap<Vec<u8>, u32>,
}

impl LabelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool whose first label will be placed `base` bytes into the label region
    pub fn starting_at(base: u32) -> Self {
        LabelPool {
            base,
            ..Default::default()
        }
    }

    /// Add encoded label bytes, reusing the offset of an identical label
    pub fn intern_bytes(&mut self, raw: &[u8]) -> u32 {
        if let Some(offset) = self.offsets.get(raw) {
            return *offset;
        }

        let offset = self.next_offset();
        self.bytes.extend_from_slice(raw);
        self.bytes.push(0);
        self.offsets.insert(raw.to_vec(), offset);
        offset
    }

    /// Add a label, reusing the offset of an identical label
    pub fn intern(&mut self, text: &str) -> Result<u32> {
        let raw = encode_label(text)?;
        Ok(self.intern_bytes(&raw))
    }

    /// Add a label even if identical text is already present
    pub fn push(&mut self, text: &str) -> Result<u32> {
        let raw = encode_label(text)?;
        let offset = self.next_offset();
        self.bytes.extend_from_slice(&raw);
        self.bytes.push(0);
        self.offsets.entry(raw).or_insert(offset);
        Ok(offset)
    }

    fn next_offset(&self) -> u32 {
        self.base + self.bytes.len() as u32
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
