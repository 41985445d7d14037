// Main CSD reader implementation

use crate::core::constants::*;
use crate::core::error::{CsdError, Degradation, Result};
use crate::core::format::*;
use crate::core::records::{read_up_to, RecordLayout, RecordStore};
use crate::core::repair;
use crate::core::sampler::{self, Decimation};
use crate::core::scanner;
use crate::models::reader_config::ReaderConfig;
use crate::utils::conf_helper::get_cached_config;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

struct DecodedHeaders {
    file_header: FileHeader,
    protocol: ProtocolHeader,
    channels: Vec<ChannelHeader>,
    degradations: Vec<Degradation>,
}

/// An open CSD recording.
///
/// Holding a `CsdReader` means the headers were decoded; there is no
/// half-open state. `close` consumes the handle.
pub struct CsdReader {
    path: PathBuf,
    file: File,
    config: ReaderConfig,
    headers: DecodedHeaders,
}

impl CsdReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, get_cached_config().clone())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let headers = Self::read_headers(&mut file, &config)?;

        debug!(
            "Opened {}: {} channels, {} samples at {} Hz",
            path.display(),
            headers.channels.len(),
            headers.protocol.num_samples,
            headers.protocol.sample_rate
        );
        for degradation in &headers.degradations {
            warn!("{}: {}", path.display(), degradation);
        }

        Ok(Self {
            path,
            file,
            config,
            headers,
        })
    }

    fn read_headers(file: &mut File, config: &ReaderConfig) -> Result<DecodedHeaders> {
        let mut prefix = vec![0u8; CHANNEL_HEADERS_START];
        let got = read_up_to(file, &mut prefix)?;
        prefix.truncate(got);

        let file_header = FileHeader::decode(&prefix)?;
        let (protocol, mut degradations) = ProtocolHeader::decode(
            prefix.get(PROTOCOL_HEADER_START..).unwrap_or(&[]),
            config.fallback_channel_count,
        )?;

        // Never allocate more than the file can actually hold.
        let declared = protocol.num_channels as usize;
        let file_len = file.metadata()?.len();
        let available = file_len.saturating_sub(CHANNEL_HEADERS_START as u64);
        let table_len = (declared as u64 * CHANNEL_HEADER_SIZE as u64).min(available) as usize;

        let mut table = vec![0u8; table_len];
        let got = read_up_to(file, &mut table)?;
        table.truncate(got);

        let (channels, mut found) = decode_channel_table(&table, declared)?;
        degradations.append(&mut found);

        Ok(DecodedHeaders {
            file_header,
            protocol,
            channels,
            degradations,
        })
    }

    /// Re-decode from disk after a patch.
    fn refresh(&mut self) -> Result<()> {
        let mut file = File::open(&self.path)?;
        let headers = Self::read_headers(&mut file, &self.config)?;
        self.file = file;
        self.headers = headers;
        Ok(())
    }

    pub fn close(self) {
        debug!("Closing {}", self.path.display());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.headers.file_header
    }

    pub fn protocol_header(&self) -> &ProtocolHeader {
        &self.headers.protocol
    }

    pub fn channel_headers(&self) -> &[ChannelHeader] {
        &self.headers.channels
    }

    pub fn degradations(&self) -> &[Degradation] {
        &self.headers.degradations
    }

    pub fn num_channels(&self) -> usize {
        self.headers.channels.len()
    }

    pub fn sample_count(&self) -> u64 {
        u64::from(self.headers.protocol.num_samples)
    }

    pub fn sample_rate(&self) -> i32 {
        self.headers.protocol.sample_rate
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.headers.protocol.start_time()
    }

    pub fn stop_time(&self) -> DateTime<Utc> {
        self.headers.protocol.stop_time()
    }

    /// Milliseconds since epoch of sample `index`, if the rate is usable.
    pub fn sample_time_ms(&self, index: u64) -> Option<i64> {
        let rate = self.sample_rate();
        if rate <= 0 {
            return None;
        }
        let offset = i64::try_from(index).ok()?.checked_mul(1000)? / i64::from(rate);
        self.headers.protocol.start_time_ms.checked_add(offset)
    }

    pub fn channel_descriptions(&self) -> Vec<String> {
        self.headers.channels.iter().map(|c| c.description.clone()).collect()
    }

    pub fn unit_texts(&self) -> Vec<String> {
        self.headers.channels.iter().map(|c| c.unit_text.clone()).collect()
    }

    pub fn resolutions(&self) -> Vec<i32> {
        self.headers.channels.iter().map(|c| c.resolution).collect()
    }

    pub fn channel_mins(&self) -> Vec<f64> {
        self.headers.channels.iter().map(|c| c.min_value).collect()
    }

    pub fn channel_maxs(&self) -> Vec<f64> {
        self.headers.channels.iter().map(|c| c.max_value).collect()
    }

    pub fn layout(&self) -> RecordLayout {
        RecordLayout::new(
            self.headers.protocol.num_channels as usize,
            self.sample_count(),
        )
    }

    // A short channel table means the data section starts past end of file.
    fn data_reachable(&self) -> bool {
        self.headers.channels.len() == self.headers.protocol.num_channels as usize
    }

    pub fn sample(&mut self, start: u64, end: u64, decimation: Decimation) -> Result<SampleSet> {
        let channel_count = self.num_channels();
        if !self.data_reachable() {
            return Ok(SampleSet::new(channel_count));
        }
        let layout = self.layout();
        let mut store = RecordStore::new(&mut self.file, layout);
        sampler::sample(&mut store, channel_count, start, end, decimation)
    }

    /// Sample using the configured display point budget.
    pub fn sample_for_display(&mut self, start: u64, end: u64) -> Result<SampleSet> {
        let decimation = match self.config.max_display_points {
            Some(points) => Decimation::MaxPoints(points),
            None => Decimation::Stride(1),
        };
        self.sample(start, end, decimation)
    }

    pub fn scan_channel_ranges(&mut self) -> Result<Vec<ChannelRange>> {
        let channel_count = self.num_channels();
        if !self.data_reachable() {
            return Ok(vec![ChannelRange { min: 0.0, max: 0.0 }; channel_count]);
        }
        let layout = self.layout();
        let chunk = self.config.scan_chunk_size;
        let mut store = RecordStore::new(&mut self.file, layout);
        scanner::scan_ranges(&mut store, channel_count, layout.sample_count, chunk)
    }

    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Complete records actually present on disk.
    pub fn actual_sample_count(&self) -> Result<u64> {
        let layout = self.layout();
        Ok(repair::recompute_sample_count(
            self.file_size()?,
            layout.data_start,
            layout.record_length as u64,
        ))
    }

    pub fn needs_sample_count_repair(&self) -> Result<bool> {
        Ok(self.actual_sample_count()? != self.sample_count())
    }

    /// Patch the stored sample count and derived stop time, then re-decode.
    ///
    /// Refuses counts larger than the number of complete records on disk.
    pub fn repair_sample_count(&mut self, sample_count: u64) -> Result<ProtocolHeader> {
        let actual = self.actual_sample_count()?;
        if sample_count > actual {
            return Err(CsdError::InvalidRange(format!(
                "{} samples requested but file only holds {}",
                sample_count, actual
            )));
        }

        let protocol = &self.headers.protocol;
        let stop_time = repair::compute_stop_time(protocol.start_time_ms, sample_count, protocol.sample_rate)?;

        info!(
            "Repairing {}: num_samples {} -> {}",
            self.path.display(),
            protocol.num_samples,
            sample_count
        );
        repair::patch_sample_count(&self.path, sample_count, stop_time)?;
        self.refresh()?;

        Ok(self.headers.protocol.clone())
    }

    pub fn repair_sample_count_from_file_size(&mut self) -> Result<ProtocolHeader> {
        let actual = self.actual_sample_count()?;
        self.repair_sample_count(actual)
    }

    /// Patch one channel's min/max on disk and in memory.
    pub fn repair_channel_range(&mut self, channel_index: usize, min: f64, max: f64) -> Result<ChannelHeader> {
        if channel_index >= self.headers.channels.len() {
            return Err(CsdError::InvalidRange(format!(
                "channel {} out of range, file has {}",
                channel_index,
                self.headers.channels.len()
            )));
        }

        repair::patch_channel_range(&self.path, channel_index, min, max)?;

        let channel = &mut self.headers.channels[channel_index];
        channel.min_value = min;
        channel.max_value = max;
        Ok(channel.clone())
    }

    /// Full scan followed by a min/max patch of every channel.
    ///
    /// Nothing is written when there are no records to scan.
    pub fn repair_channel_ranges_from_scan(&mut self) -> Result<Vec<ChannelRange>> {
        if !self.data_reachable() {
            return Err(CsdError::InvalidRange(format!(
                "channel table holds {} of {} channels, data section unreachable",
                self.headers.channels.len(),
                self.headers.protocol.num_channels
            )));
        }
        if self.sample_count() == 0 {
            return Err(CsdError::InvalidRange("no samples to scan".to_string()));
        }

        let ranges = self.scan_channel_ranges()?;
        for (idx, range) in ranges.iter().enumerate() {
            self.repair_channel_range(idx, range.min, range.max)?;
        }
        Ok(ranges)
    }
}
