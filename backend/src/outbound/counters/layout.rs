//! Versioned on-disk layout of the shared counter segment.
//!
//! ```text
//! offset  size  field
//! 0       8     magic "MESSCNTR"
//! 8       4     layout version (u32 LE)
//! 12      4     slot count (u32 LE, always 15)
//! 16      60    slots: i32 LE at (meal_index * 3 + type_index) * 4
//! ```

use crate::domain::{COUNTER_SLOTS, CounterTable, FeedbackType, Meal};

/// Identifies a counter segment file.
pub const SEGMENT_MAGIC: [u8; 8] = *b"MESSCNTR";
/// Layout revision written by this build.
pub const SEGMENT_VERSION: u32 = 1;
/// Header size in bytes.
pub const HEADER_LEN: usize = 16;
/// Counter table size in bytes.
pub const TABLE_LEN: usize = COUNTER_SLOTS * SLOT_LEN;
/// Total segment size in bytes.
pub const SEGMENT_LEN: usize = HEADER_LEN + TABLE_LEN;

const SLOT_LEN: usize = 4;

/// Reasons a segment fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentLayoutError {
    #[error("segment is {len} bytes, expected {SEGMENT_LEN}")]
    Truncated { len: u64 },
    #[error("segment magic does not match")]
    BadMagic,
    #[error("segment layout version {found} is not supported (expected {SEGMENT_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("segment holds {found} slots, expected {COUNTER_SLOTS}")]
    SlotCountMismatch { found: u32 },
}

/// Decoded segment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u32,
    pub slot_count: u32,
}

impl SegmentHeader {
    /// Header written by this build.
    pub const CURRENT: Self = Self {
        version: SEGMENT_VERSION,
        slot_count: COUNTER_SLOTS as u32,
    };

    /// Serialise to the on-disk representation.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0_u8; HEADER_LEN];
        bytes[..8].copy_from_slice(&SEGMENT_MAGIC);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.slot_count.to_le_bytes());
        bytes
    }

    /// Parse and validate an on-disk header.
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, SegmentLayoutError> {
        if bytes[..8] != SEGMENT_MAGIC {
            return Err(SegmentLayoutError::BadMagic);
        }
        let version = read_u32(&bytes[8..12]);
        if version != SEGMENT_VERSION {
            return Err(SegmentLayoutError::UnsupportedVersion { found: version });
        }
        let slot_count = read_u32(&bytes[12..16]);
        if slot_count != Self::CURRENT.slot_count {
            return Err(SegmentLayoutError::SlotCountMismatch { found: slot_count });
        }
        Ok(Self {
            version,
            slot_count,
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut word = [0_u8; 4];
    word.copy_from_slice(bytes);
    u32::from_le_bytes(word)
}

/// Absolute file offset of the slot for `(meal, feedback_type)`.
pub fn slot_offset(meal: Meal, feedback_type: FeedbackType) -> u64 {
    (HEADER_LEN + CounterTable::slot_index(meal, feedback_type) * SLOT_LEN) as u64
}

/// Serialise a counter table into its slot bytes.
pub fn encode_table(table: &CounterTable) -> [u8; TABLE_LEN] {
    let mut bytes = [0_u8; TABLE_LEN];
    for (meal, feedback_type, value) in table.iter() {
        let start = CounterTable::slot_index(meal, feedback_type) * SLOT_LEN;
        bytes[start..start + SLOT_LEN].copy_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Parse slot bytes into a counter table.
pub fn decode_table(bytes: &[u8; TABLE_LEN]) -> CounterTable {
    let mut table = CounterTable::zeroed();
    for meal in Meal::ALL {
        for feedback_type in FeedbackType::ALL {
            let start = CounterTable::slot_index(meal, feedback_type) * SLOT_LEN;
            table.set(meal, feedback_type, decode_slot(&bytes[start..start + SLOT_LEN]));
        }
    }
    table
}

/// Parse one little-endian slot.
pub fn decode_slot(bytes: &[u8]) -> i32 {
    let mut word = [0_u8; SLOT_LEN];
    word.copy_from_slice(bytes);
    i32::from_le_bytes(word)
}
