// Stride-based decimation over a sample range

use std::io::{Read, Seek};

use crate::core::error::Result;
use crate::core::format::SampleSet;
use crate::core::records::RecordStore;

// Header sample counts are not trusted for allocation; series grow past this.
const MAX_PREALLOCATED_POINTS: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decimation {
    /// Fixed step between indices; 0 is treated as 1.
    Stride(u64),
    /// Derive the stride from a point budget; 0 means unbounded.
    MaxPoints(u64),
}

impl Default for Decimation {
    fn default() -> Self {
        Decimation::Stride(1)
    }
}

impl Decimation {
    pub fn stride_for(&self, range_len: u64) -> u64 {
        match *self {
            Decimation::Stride(n) => n.max(1),
            Decimation::MaxPoints(0) => 1,
            Decimation::MaxPoints(m) => range_len.div_ceil(m).max(1),
        }
    }
}

/// Number of points `sample` yields for an inclusive range at `stride`.
pub fn output_len(start: u64, end: u64, stride: u64) -> u64 {
    if start > end {
        0
    } else {
        (end - start) / stride.max(1) + 1
    }
}

/// Read every `stride`-th record of `[start, end]` into per-channel series.
///
/// Only the selected records are read. `channel_count` may be smaller than
/// the record width when the channel table was truncated.
pub fn sample<R: Read + Seek>(
    store: &mut RecordStore<'_, R>,
    channel_count: usize,
    start: u64,
    end: u64,
    decimation: Decimation,
) -> Result<SampleSet> {
    let (start, end) = match store.layout().clamp(start, end) {
        Some(range) => range,
        None => return Ok(SampleSet::new(channel_count)),
    };

    let stride = decimation.stride_for(end - start + 1);
    let expected = output_len(start, end, stride).min(MAX_PREALLOCATED_POINTS) as usize;
    let mut set = SampleSet::with_capacity(channel_count, expected);

    for record in store.read_records(start, end, stride) {
        let mut record = record?;
        record.values.truncate(channel_count);
        set.push(record);
    }

    Ok(set)
}
