// Data structures for CSD format

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::bytes::{ByteWindow, DecodedText};
use crate::core::constants::*;
use crate::core::error::{Degradation, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileHeader {
    pub version: i32,
    pub identifier: String,
    pub timestamp: i64,
    pub dummy: i64,
    pub record_position: i32,
}

impl FileHeader {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let w = ByteWindow::new(bytes, "file header", FILE_HEADER_SIZE)?;

        Ok(Self {
            version: w.i32(FH_VERSION)?,
            identifier: w.fixed_text(FH_IDENTIFIER, FH_IDENTIFIER_LEN, "").text,
            timestamp: w.i64(FH_TIMESTAMP)?,
            dummy: w.i64(FH_DUMMY)?,
            record_position: w.i32(FH_RECORD_POSITION)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolHeader {
    pub preference: i64,
    pub device_id: i32,
    pub description: String,
    pub tester_name: String,
    pub company_name: String,
    pub company_address: String,
    pub service_company_name: String,
    pub service_company_address: String,
    pub device_name: String,
    pub calibration_date: f64,
    pub num_devices: i32,
    pub num_channels: u32,
    pub num_samples: u32,
    /// Samples per second.
    pub sample_rate: i32,
    pub sample_rate_factor: i32,
    pub start_time_ms: i64,
    pub stop_time_ms: i64,
    pub status: i32,
    pub firmware_version: i32,
    pub first_sample_pointer: i32,
    pub crc: i32,
    pub device_type: i16,
    pub origin: i16,
}

fn text(
    decoded: DecodedText,
    field: &'static str,
    channel: Option<usize>,
    degradations: &mut Vec<Degradation>,
) -> String {
    if decoded.fell_back {
        degradations.push(Degradation::TextDecodeFallback { field, channel });
    }
    decoded.text
}

fn sane_timestamp(field: &'static str, raw: i64, degradations: &mut Vec<Degradation>) -> i64 {
    if (0..=MAX_SANE_TIMESTAMP_MS).contains(&raw) {
        raw
    } else {
        degradations.push(Degradation::DegradedHeader {
            field,
            raw,
            replacement: 0,
        });
        0
    }
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

impl ProtocolHeader {
    /// Decode the 3552-byte protocol block.
    ///
    /// Only a short buffer is an error. A non-positive channel count becomes
    /// `fallback_channels`, a negative sample count becomes 0 and timestamps
    /// outside the sane range become the epoch; each substitution is returned
    /// as a [`Degradation`].
    pub fn decode(bytes: &[u8], fallback_channels: u32) -> Result<(Self, Vec<Degradation>)> {
        let w = ByteWindow::new(bytes, "protocol header", PROTOCOL_HEADER_SIZE)?;
        let mut degradations = Vec::new();
        let d = &mut degradations;

        let raw_channels = w.i32(PH_NUM_CHANNELS)?;
        let num_channels = if raw_channels > 0 {
            raw_channels as u32
        } else {
            d.push(Degradation::DegradedHeader {
                field: "num_channels",
                raw: i64::from(raw_channels),
                replacement: i64::from(fallback_channels),
            });
            fallback_channels
        };

        let raw_samples = w.i32(PH_NUM_SAMPLES)?;
        let num_samples = if raw_samples >= 0 {
            raw_samples as u32
        } else {
            d.push(Degradation::DegradedHeader {
                field: "num_samples",
                raw: i64::from(raw_samples),
                replacement: 0,
            });
            0
        };

        let header = Self {
            preference: w.i64(PH_PREFERENCE)?,
            device_id: w.i32(PH_DEVICE_ID)?,
            description: text(
                w.fixed_text(PH_DESCRIPTION, PH_DESCRIPTION_LEN, ""),
                "description",
                None,
                d,
            ),
            tester_name: text(
                w.fixed_text(PH_TESTER_NAME, PH_TESTER_NAME_LEN, ""),
                "tester_name",
                None,
                d,
            ),
            company_name: text(
                w.fixed_text(PH_COMPANY_NAME, PH_COMPANY_NAME_LEN, ""),
                "company_name",
                None,
                d,
            ),
            company_address: text(
                w.fixed_text(PH_COMPANY_ADDRESS, PH_COMPANY_ADDRESS_LEN, ""),
                "company_address",
                None,
                d,
            ),
            service_company_name: text(
                w.fixed_text(PH_SERVICE_COMPANY_NAME, PH_SERVICE_COMPANY_NAME_LEN, ""),
                "service_company_name",
                None,
                d,
            ),
            service_company_address: text(
                w.fixed_text(
                    PH_SERVICE_COMPANY_ADDRESS,
                    PH_SERVICE_COMPANY_ADDRESS_LEN,
                    "",
                ),
                "service_company_address",
                None,
                d,
            ),
            device_name: text(
                w.fixed_text(PH_DEVICE_NAME, PH_DEVICE_NAME_LEN, ""),
                "device_name",
                None,
                d,
            ),
            calibration_date: w.f64(PH_CALIBRATION_DATE)?,
            num_devices: w.i32(PH_NUM_DEVICES)?,
            num_channels,
            num_samples,
            sample_rate: w.i32(PH_SAMPLE_RATE)?,
            sample_rate_factor: w.i32(PH_SAMPLE_RATE_FACTOR)?,
            start_time_ms: sane_timestamp("start_time", w.i64(PH_START_TIME)?, d),
            stop_time_ms: sane_timestamp("stop_time", w.i64(PH_STOP_TIME)?, d),
            status: w.i32(PH_STATUS)?,
            firmware_version: w.i32(PH_FIRMWARE_VERSION)?,
            first_sample_pointer: w.i32(PH_FIRST_SAMPLE_POINTER)?,
            crc: w.i32(PH_CRC)?,
            device_type: w.i16(PH_DEVICE_TYPE)?,
            origin: w.i16(PH_ORIGIN)?,
        };

        Ok((header, degradations))
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        millis_to_datetime(self.start_time_ms)
    }

    pub fn stop_time(&self) -> DateTime<Utc> {
        millis_to_datetime(self.stop_time_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelHeader {
    pub preference: i64,
    pub description: String,
    pub sub_device_description: String,
    pub device_description: String,
    pub sensor_description: String,
    pub channel_number: i32,
    pub unit_code: i32,
    pub unit_text: String,
    /// Decimal digits to display.
    pub resolution: i32,
    pub min_value: f64,
    pub max_value: f64,
    pub device_id: i32,
    pub sub_device_id: i32,
    pub sensor_id: i32,
    pub channel_id: i32,
    pub channel_config: u8,
    pub slave_address: u8,
    pub device_type: i16,
    pub device_unique_id: i64,
}

impl ChannelHeader {
    pub fn decode(bytes: &[u8], channel_index: usize) -> Result<(Self, Vec<Degradation>)> {
        let w = ByteWindow::new(bytes, "channel header", CHANNEL_HEADER_SIZE)?;
        let mut degradations = Vec::new();
        let d = &mut degradations;
        let ch = Some(channel_index);
        let default_name = format!("Channel {}", channel_index + 1);

        let header = Self {
            preference: w.i64(CH_PREFERENCE)?,
            description: text(
                w.prefixed_text(CH_DESCRIPTION, CH_DESCRIPTION_CAPACITY, &default_name),
                "description",
                ch,
                d,
            ),
            sub_device_description: text(
                w.prefixed_text(CH_SUB_DEVICE_DESCRIPTION, CH_DESCRIPTION_CAPACITY, ""),
                "sub_device_description",
                ch,
                d,
            ),
            device_description: text(
                w.prefixed_text(CH_DEVICE_DESCRIPTION, CH_DESCRIPTION_CAPACITY, ""),
                "device_description",
                ch,
                d,
            ),
            sensor_description: text(
                w.prefixed_text(CH_SENSOR_DESCRIPTION, CH_DESCRIPTION_CAPACITY, ""),
                "sensor_description",
                ch,
                d,
            ),
            channel_number: w.i32(CH_CHANNEL_NUMBER)?,
            unit_code: w.i32(CH_UNIT_CODE)?,
            unit_text: text(
                w.prefixed_text(CH_UNIT_TEXT, CH_UNIT_TEXT_CAPACITY, ""),
                "unit_text",
                ch,
                d,
            ),
            resolution: w.i32(CH_RESOLUTION)?,
            min_value: w.f64(CH_MIN_VALUE)?,
            max_value: w.f64(CH_MAX_VALUE)?,
            device_id: w.i32(CH_DEVICE_ID)?,
            sub_device_id: w.i32(CH_SUB_DEVICE_ID)?,
            sensor_id: w.i32(CH_SENSOR_ID)?,
            channel_id: w.i32(CH_CHANNEL_ID)?,
            channel_config: w.u8(CH_CHANNEL_CONFIG)?,
            slave_address: w.u8(CH_SLAVE_ADDRESS)?,
            device_type: w.i16(CH_DEVICE_TYPE)?,
            device_unique_id: w.i64(CH_DEVICE_UNIQUE_ID)?,
        };

        Ok((header, degradations))
    }
}

/// Decode up to `declared` consecutive channel blocks.
///
/// Stops at the last complete block; a short table is reported, not fatal.
pub fn decode_channel_table(
    bytes: &[u8],
    declared: usize,
) -> Result<(Vec<ChannelHeader>, Vec<Degradation>)> {
    let usable = declared.min(bytes.len() / CHANNEL_HEADER_SIZE);
    let mut channels = Vec::with_capacity(usable);
    let mut degradations = Vec::new();

    for (idx, block) in bytes.chunks_exact(CHANNEL_HEADER_SIZE).take(usable).enumerate() {
        let (channel, mut found) = ChannelHeader::decode(block, idx)?;
        degradations.append(&mut found);
        channels.push(channel);
    }

    if usable < declared {
        degradations.push(Degradation::TruncatedChannelTable { declared, usable });
    }

    Ok((channels, degradations))
}

/// One sample: the stored record id and one value per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub index: u64,
    pub record_id: u32,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelRange {
    pub min: f64,
    pub max: f64,
}

/// Per-channel sample sequences returned by the sampler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSet {
    pub indices: Vec<u64>,
    pub record_ids: Vec<u32>,
    pub channels: Vec<Vec<f64>>,
}

impl SampleSet {
    pub fn new(channel_count: usize) -> Self {
        Self::with_capacity(channel_count, 0)
    }

    pub fn with_capacity(channel_count: usize, cap: usize) -> Self {
        Self {
            indices: Vec::with_capacity(cap),
            record_ids: Vec::with_capacity(cap),
            channels: (0..channel_count).map(|_| Vec::with_capacity(cap)).collect(),
        }
    }

    pub fn push(&mut self, record: DataRecord) {
        self.indices.push(record.index);
        self.record_ids.push(record.record_id);
        for (series, val) in self.channels.iter_mut().zip(record.values) {
            series.push(val);
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, idx: usize) -> Option<&[f64]> {
        self.channels.get(idx).map(Vec::as_slice)
    }

    /// Channel values for plotting: every sentinel code becomes NaN so it
    /// renders as a gap.
    pub fn display_values(&self, idx: usize) -> Option<Vec<f64>> {
        self.channel(idx).map(|series| {
            series
                .iter()
                .map(|&v| if is_sentinel(v) { f64::NAN } else { v })
                .collect()
        })
    }
}
