// Synthetic CSD recordings written to temp files

#![allow(dead_code)]

use csd_reader::core::constants::*;
use tempfile::NamedTempFile;

pub struct Recording {
    pub channels: usize,
    pub declared_samples: i32,
    pub records: usize,
    pub sample_rate: i32,
    pub start_ms: i64,
    pub stop_ms: i64,
    pub descriptions: Vec<Vec<u8>>,
    pub value: fn(usize, usize) -> f64,
}

pub fn ramp(record: usize, channel: usize) -> f64 {
    record as f64 * 0.5 - channel as f64
}

impl Recording {
    pub fn new(channels: usize, records: usize) -> Self {
        Self {
            channels,
            declared_samples: records as i32,
            records,
            sample_rate: 1,
            start_ms: 1_700_000_000_000,
            stop_ms: 1_700_000_000_000 + records as i64 * 1000,
            descriptions: (0..channels)
                .map(|i| format!("Pressure {}", i).into_bytes())
                .collect(),
            value: ramp,
        }
    }

    pub fn header_size(&self) -> usize {
        CHANNEL_HEADERS_START + CHANNEL_HEADER_SIZE * self.channels
    }

    pub fn record_size(&self) -> usize {
        RECORD_ID_SIZE + VALUE_SIZE * self.channels
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.header_size()];

        buf[FH_VERSION..FH_VERSION + 4].copy_from_slice(&2i32.to_be_bytes());
        buf[FH_IDENTIFIER..FH_IDENTIFIER + 3].copy_from_slice(b"CSD");

        let ph = PROTOCOL_HEADER_START;
        buf[ph + PH_DEVICE_NAME..ph + PH_DEVICE_NAME + 5].copy_from_slice(b"Probe");
        buf[ph + PH_NUM_CHANNELS..ph + PH_NUM_CHANNELS + 4]
            .copy_from_slice(&(self.channels as i32).to_be_bytes());
        buf[ph + PH_NUM_SAMPLES..ph + PH_NUM_SAMPLES + 4]
            .copy_from_slice(&self.declared_samples.to_be_bytes());
        buf[ph + PH_SAMPLE_RATE..ph + PH_SAMPLE_RATE + 4]
            .copy_from_slice(&self.sample_rate.to_be_bytes());
        buf[ph + PH_START_TIME..ph + PH_START_TIME + 8].copy_from_slice(&self.start_ms.to_be_bytes());
        buf[ph + PH_STOP_TIME..ph + PH_STOP_TIME + 8].copy_from_slice(&self.stop_ms.to_be_bytes());

        for (i, desc) in self.descriptions.iter().enumerate() {
            let base = CHANNEL_HEADERS_START + CHANNEL_HEADER_SIZE * i;
            let len = desc.len().min(CH_DESCRIPTION_CAPACITY);
            buf[base + CH_DESCRIPTION..base + CH_DESCRIPTION + 2]
                .copy_from_slice(&(len as u16).to_be_bytes());
            buf[base + CH_DESCRIPTION + 2..base + CH_DESCRIPTION + 2 + len]
                .copy_from_slice(&desc[..len]);
            buf[base + CH_UNIT_TEXT..base + CH_UNIT_TEXT + 2].copy_from_slice(&3u16.to_be_bytes());
            buf[base + CH_UNIT_TEXT + 2..base + CH_UNIT_TEXT + 5].copy_from_slice(b"bar");
            buf[base + CH_RESOLUTION..base + CH_RESOLUTION + 4].copy_from_slice(&1i32.to_be_bytes());
        }

        for rec in 0..self.records {
            buf.extend_from_slice(&(rec as u32).to_be_bytes());
            for ch in 0..self.channels {
                buf.extend_from_slice(&(self.value)(rec, ch).to_be_bytes());
            }
        }
        buf
    }

    pub fn write(&self) -> NamedTempFile {
        let file = NamedTempFile::new().expect("create temp file");
        std::fs::write(file.path(), self.bytes()).expect("write recording");
        file
    }
}
