// In-place header repair
//
// Each patch opens its own write handle, writes exactly the bytes of the
// fields being corrected and syncs before returning.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use tracing::info;

use crate::core::constants::*;
use crate::core::error::{CsdError, Result};

/// Whole records that fit after the header: `floor((file - header) / record)`.
pub fn recompute_sample_count(file_size: u64, header_size: u64, record_length: u64) -> u64 {
    if record_length == 0 {
        return 0;
    }
    file_size.saturating_sub(header_size) / record_length
}

/// `start + ceil(samples / rate) * 1000`, with `rate` in samples per second.
pub fn compute_stop_time(start_ms: i64, sample_count: u64, sample_rate: i32) -> Result<i64> {
    if sample_rate <= 0 {
        return Err(CsdError::InvalidRange(format!(
            "sample rate {} cannot be used to derive a stop time",
            sample_rate
        )));
    }
    let seconds = sample_count.div_ceil(sample_rate as u64);
    i64::try_from(seconds)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| start_ms.checked_add(ms))
        .filter(|stop| *stop <= MAX_SANE_TIMESTAMP_MS)
        .ok_or_else(|| {
            CsdError::InvalidRange(format!(
                "stop time for {} samples overflows the timestamp range",
                sample_count
            ))
        })
}

pub fn channel_block_offset(channel_index: usize) -> u64 {
    (CHANNEL_HEADERS_START + CHANNEL_HEADER_SIZE * channel_index) as u64
}

fn patch(path: &Path, edits: &[(u64, &[u8])]) -> Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    for (offset, bytes) in edits {
        file.seek(SeekFrom::Start(*offset))?;
        file.write_all(bytes)?;
    }
    file.sync_data()?;
    Ok(())
}

/// Write the sample count (4 bytes at 3054) and stop time (8 bytes at 3074).
pub fn patch_sample_count(path: &Path, sample_count: u64, stop_time_ms: i64) -> Result<()> {
    let count = i32::try_from(sample_count).map_err(|_| {
        CsdError::InvalidRange(format!(
            "sample count {} does not fit the header field",
            sample_count
        ))
    })?;

    let count_bytes = count.to_be_bytes();
    let stop_bytes = stop_time_ms.to_be_bytes();
    patch(
        path,
        &[
            (NUM_SAMPLES_ABS, &count_bytes[..]),
            (STOP_TIME_ABS, &stop_bytes[..]),
        ],
    )?;

    info!(
        "patched {}: num_samples={}, stop_time={}",
        path.display(),
        sample_count,
        stop_time_ms
    );
    Ok(())
}

/// Write min and max (16 contiguous bytes) into one channel block.
pub fn patch_channel_range(path: &Path, channel_index: usize, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(CsdError::InvalidRange(format!(
            "channel range [{}, {}] is not a valid interval",
            min, max
        )));
    }

    let mut field = [0u8; 16];
    field[..8].copy_from_slice(&min.to_be_bytes());
    field[8..].copy_from_slice(&max.to_be_bytes());

    patch(
        path,
        &[(channel_block_offset(channel_index) + CH_MIN_VALUE as u64, &field[..])],
    )?;

    info!(
        "patched {}: channel {} range [{}, {}]",
        path.display(),
        channel_index,
        min,
        max
    );
    Ok(())
}
