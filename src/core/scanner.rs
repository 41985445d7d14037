// Chunked min/max scan over the whole data section

use std::io::{Read, Seek};

use tracing::debug;

use crate::core::constants::{INVALID, OVERRANGE};
use crate::core::error::Result;
use crate::core::format::ChannelRange;
use crate::core::records::RecordStore;
use crate::core::sampler::{sample, Decimation};

// SENSOR_CHANGE and UNIT_CHANGE are deliberately counted here; only the
// display path masks them.
fn excluded(val: f64) -> bool {
    val == INVALID || val == OVERRANGE
}

#[derive(Debug, Clone, Copy)]
struct RunningRange {
    min: f64,
    max: f64,
}

impl RunningRange {
    fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn fold(&mut self, val: f64) {
        if excluded(val) {
            return;
        }
        if val < self.min {
            self.min = val;
        }
        if val > self.max {
            self.max = val;
        }
    }

    fn finish(self) -> ChannelRange {
        if self.min > self.max {
            ChannelRange { min: 0.0, max: 0.0 }
        } else {
            ChannelRange {
                min: self.min,
                max: self.max,
            }
        }
    }
}

/// Scan `sample_count` records in chunks of `chunk_size` and return each
/// channel's min/max.
///
/// Memory stays at one chunk regardless of file size. A channel with no
/// usable values reports `(0.0, 0.0)`. A data section shorter than
/// `sample_count` ends the scan at the last complete record.
pub fn scan_ranges<R: Read + Seek>(
    store: &mut RecordStore<'_, R>,
    channel_count: usize,
    sample_count: u64,
    chunk_size: usize,
) -> Result<Vec<ChannelRange>> {
    let chunk = chunk_size.max(1) as u64;
    let mut ranges = vec![RunningRange::new(); channel_count];
    let mut start = 0u64;
    let mut scanned = 0u64;

    while start < sample_count {
        let end = (start + chunk - 1).min(sample_count - 1);
        let set = sample(store, channel_count, start, end, Decimation::Stride(1))?;

        for (range, series) in ranges.iter_mut().zip(&set.channels) {
            for &val in series {
                range.fold(val);
            }
        }

        scanned += set.len() as u64;
        if (set.len() as u64) < end - start + 1 {
            debug!("data ends after {} of {} samples", scanned, sample_count);
            break;
        }
        start = end + 1;
    }

    Ok(ranges.into_iter().map(RunningRange::finish).collect())
}
