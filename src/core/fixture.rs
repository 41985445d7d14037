// Synthetic CSD files for unit tests

use crate::core::constants::*;

fn put_i16(buf: &mut [u8], offset: usize, val: i16) {
    buf[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn put_i32(buf: &mut [u8], offset: usize, val: i32) {
    buf[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
}

fn put_i64(buf: &mut [u8], offset: usize, val: i64) {
    buf[offset..offset + 8].copy_from_slice(&val.to_be_bytes());
}

fn put_f64(buf: &mut [u8], offset: usize, val: f64) {
    buf[offset..offset + 8].copy_from_slice(&val.to_be_bytes());
}

fn put_text(buf: &mut [u8], offset: usize, text: &str) {
    buf[offset..offset + text.len()].copy_from_slice(text.as_bytes());
}

fn put_prefixed(buf: &mut [u8], offset: usize, text: &str) {
    put_i16(buf, offset, text.len() as i16);
    put_text(buf, offset + 2, text);
}

pub fn value_at(record: usize, channel: usize) -> f64 {
    record as f64 + channel as f64 * 1000.0
}

pub struct CsdBuilder {
    pub channels: usize,
    pub declared_channels: i32,
    pub declared_samples: i32,
    pub records: usize,
    pub sample_rate: i32,
    pub start_ms: i64,
    pub stop_ms: i64,
    pub values: fn(usize, usize) -> f64,
}

impl CsdBuilder {
    pub fn new(channels: usize, records: usize) -> Self {
        Self {
            channels,
            declared_channels: channels as i32,
            declared_samples: records as i32,
            records,
            sample_rate: 1,
            start_ms: 1_600_000_000_000,
            stop_ms: 1_600_000_000_000 + records as i64 * 1000,
            values: value_at,
        }
    }

    pub fn file_header(&self) -> Vec<u8> {
        let mut buf = vec![0u8; FILE_HEADER_SIZE];
        put_i32(&mut buf, FH_VERSION, 3);
        put_text(&mut buf, FH_IDENTIFIER, "CSD-LOGGER");
        put_i64(&mut buf, FH_TIMESTAMP, self.start_ms);
        put_i32(&mut buf, FH_RECORD_POSITION, 1);
        buf
    }

    pub fn protocol_header(&self) -> Vec<u8> {
        let mut buf = vec![0u8; PROTOCOL_HEADER_SIZE];
        put_i64(&mut buf, PH_PREFERENCE, 7);
        put_i32(&mut buf, PH_DEVICE_ID, 42);
        put_text(&mut buf, PH_DESCRIPTION, "Boiler room run");
        put_text(&mut buf, PH_TESTER_NAME, "J. Doe");
        put_text(&mut buf, PH_COMPANY_NAME, "ACME");
        put_text(&mut buf, PH_DEVICE_NAME, "Logger 9");
        put_f64(&mut buf, PH_CALIBRATION_DATE, 44_000.5);
        put_i32(&mut buf, PH_NUM_DEVICES, 1);
        put_i32(&mut buf, PH_NUM_CHANNELS, self.declared_channels);
        put_i32(&mut buf, PH_NUM_SAMPLES, self.declared_samples);
        put_i32(&mut buf, PH_SAMPLE_RATE, self.sample_rate);
        put_i32(&mut buf, PH_SAMPLE_RATE_FACTOR, 1);
        put_i64(&mut buf, PH_START_TIME, self.start_ms);
        put_i64(&mut buf, PH_STOP_TIME, self.stop_ms);
        put_i16(&mut buf, PH_DEVICE_TYPE, 5);
        buf
    }

    pub fn channel_header(&self, idx: usize) -> Vec<u8> {
        let mut buf = vec![0u8; CHANNEL_HEADER_SIZE];
        put_prefixed(&mut buf, CH_DESCRIPTION, &format!("Temp {}", idx + 1));
        put_prefixed(&mut buf, CH_SENSOR_DESCRIPTION, "PT100");
        put_i32(&mut buf, CH_CHANNEL_NUMBER, idx as i32 + 1);
        put_prefixed(&mut buf, CH_UNIT_TEXT, "degC");
        put_i32(&mut buf, CH_RESOLUTION, 2);
        put_f64(&mut buf, CH_MIN_VALUE, -1.0);
        put_f64(&mut buf, CH_MAX_VALUE, 1.0);
        put_i32(&mut buf, CH_CHANNEL_ID, idx as i32);
        buf[CH_SLAVE_ADDRESS] = 3;
        buf
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = self.file_header();
        buf.extend(self.protocol_header());
        for idx in 0..self.channels {
            buf.extend(self.channel_header(idx));
        }
        for rec in 0..self.records {
            buf.extend((rec as u32).to_be_bytes());
            for ch in 0..self.channels {
                buf.extend((self.values)(rec, ch).to_be_bytes());
            }
        }
        buf
    }
}
