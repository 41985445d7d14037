// Example usage of CSD reader
//
// cargo run --example read_csd -- <file.csd> [--repair]

use anyhow::{bail, Context, Result};
use csd_reader::CsdReader;
use tracing::{debug, info, warn, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: read_csd <file.csd> [--repair]");
    };
    let repair = args.any(|a| a == "--repair");

    let mut reader = CsdReader::open(&path).with_context(|| format!("opening {}", path))?;

    info!("Recording {}", path);
    info!("  Device: {}", reader.protocol_header().device_name);
    info!("  Samples: {} at {} Hz", reader.sample_count(), reader.sample_rate());
    info!("  Start: {}", reader.start_time());
    info!("  Stop: {}", reader.stop_time());
    for degradation in reader.degradations() {
        warn!("  Header issue: {}", degradation);
    }

    info!("Channels:");
    let units = reader.unit_texts();
    for (idx, desc) in reader.channel_descriptions().iter().enumerate() {
        info!("  [{}] {} ({})", idx, desc, units[idx]);
    }

    // Downsampled overview of the whole recording
    let last = reader.sample_count().saturating_sub(1);
    let overview = reader.sample_for_display(0, last)?;
    info!("Overview: {} points per channel", overview.len());
    if let (Some(first), Some(series)) = (overview.indices.first(), overview.channel(0)) {
        debug!("  first point: index={} value={:?}", first, series.first());
    }

    let actual = reader.actual_sample_count()?;
    if actual != reader.sample_count() {
        warn!(
            "Header claims {} samples, file holds {}",
            reader.sample_count(),
            actual
        );
    }

    if repair {
        if actual != reader.sample_count() {
            let header = reader.repair_sample_count(actual)?;
            info!("Sample count repaired, new stop time {}", header.stop_time());
        }
        for (idx, range) in reader.repair_channel_ranges_from_scan()?.iter().enumerate() {
            info!("  [{}] range [{}, {}]", idx, range.min, range.max);
        }
    } else {
        let ranges = reader.scan_channel_ranges()?;
        let header_mins = reader.channel_mins();
        let header_maxs = reader.channel_maxs();
        for (idx, range) in ranges.iter().enumerate() {
            info!(
                "  [{}] scanned [{}, {}], header [{}, {}]",
                idx, range.min, range.max, header_mins[idx], header_maxs[idx]
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(reader.protocol_header())?);

    reader.close();
    Ok(())
}
