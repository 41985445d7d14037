// Format constants for CSD recordings
//
// Offsets named *_ABS are absolute file offsets, everything else is relative
// to the start of the region it belongs to.

// File header: version(i32) id(10) timestamp(i64) dummy(i64) record_position(i32)
pub const FILE_HEADER_SIZE: usize = 4 + 10 + 8 + 8 + 4; // 34 bytes

pub const FH_VERSION: usize = 0;
pub const FH_IDENTIFIER: usize = 4;
pub const FH_IDENTIFIER_LEN: usize = 10;
pub const FH_TIMESTAMP: usize = 14;
pub const FH_DUMMY: usize = 22;
pub const FH_RECORD_POSITION: usize = 30;

pub const PROTOCOL_HEADER_START: usize = FILE_HEADER_SIZE;
pub const PROTOCOL_HEADER_SIZE: usize = 3552;

pub const PH_PREFERENCE: usize = 0;
pub const PH_DEVICE_ID: usize = 8;
pub const PH_DESCRIPTION: usize = 12;
pub const PH_DESCRIPTION_LEN: usize = 1000;
pub const PH_TESTER_NAME: usize = 1012;
pub const PH_TESTER_NAME_LEN: usize = 100;
pub const PH_COMPANY_NAME: usize = 1112;
pub const PH_COMPANY_NAME_LEN: usize = 100;
pub const PH_COMPANY_ADDRESS: usize = 1212;
pub const PH_COMPANY_ADDRESS_LEN: usize = 500;
pub const PH_SERVICE_COMPANY_NAME: usize = 1712;
pub const PH_SERVICE_COMPANY_NAME_LEN: usize = 100;
pub const PH_SERVICE_COMPANY_ADDRESS: usize = 1812;
pub const PH_SERVICE_COMPANY_ADDRESS_LEN: usize = 500;
pub const PH_DEVICE_NAME: usize = 2312;
pub const PH_DEVICE_NAME_LEN: usize = 100;
pub const PH_CALIBRATION_DATE: usize = 2412;
pub const PH_NUM_DEVICES: usize = 3012;
pub const PH_NUM_CHANNELS: usize = 3016;
pub const PH_NUM_SAMPLES: usize = 3020;
pub const PH_SAMPLE_RATE: usize = 3024;
pub const PH_SAMPLE_RATE_FACTOR: usize = 3028;
pub const PH_START_TIME: usize = 3032;
pub const PH_STOP_TIME: usize = 3040;
pub const PH_STATUS: usize = 3048;
pub const PH_FIRMWARE_VERSION: usize = 3052;
pub const PH_FIRST_SAMPLE_POINTER: usize = 3056;
pub const PH_CRC: usize = 3060;
pub const PH_DEVICE_TYPE: usize = 3064;
pub const PH_ORIGIN: usize = 3066;

pub const NUM_CHANNELS_ABS: u64 = (PROTOCOL_HEADER_START + PH_NUM_CHANNELS) as u64; // 3050
pub const NUM_SAMPLES_ABS: u64 = (PROTOCOL_HEADER_START + PH_NUM_SAMPLES) as u64; // 3054
pub const SAMPLE_RATE_ABS: u64 = (PROTOCOL_HEADER_START + PH_SAMPLE_RATE) as u64; // 3058
pub const START_TIME_ABS: u64 = (PROTOCOL_HEADER_START + PH_START_TIME) as u64; // 3066
pub const STOP_TIME_ABS: u64 = (PROTOCOL_HEADER_START + PH_STOP_TIME) as u64; // 3074

pub const CHANNEL_HEADERS_START: usize = PROTOCOL_HEADER_START + PROTOCOL_HEADER_SIZE; // 3586
pub const CHANNEL_HEADER_SIZE: usize = 918;

pub const CH_PREFERENCE: usize = 0;
pub const CH_DESCRIPTION: usize = 8;
pub const CH_SUB_DEVICE_DESCRIPTION: usize = 110;
pub const CH_DEVICE_DESCRIPTION: usize = 212;
pub const CH_SENSOR_DESCRIPTION: usize = 314;
pub const CH_DESCRIPTION_CAPACITY: usize = 100;
pub const CH_CHANNEL_NUMBER: usize = 448;
pub const CH_UNIT_CODE: usize = 452;
pub const CH_UNIT_TEXT: usize = 456;
pub const CH_UNIT_TEXT_CAPACITY: usize = 20;
pub const CH_RESOLUTION: usize = 478;
pub const CH_MIN_VALUE: usize = 482;
pub const CH_MAX_VALUE: usize = 490;
pub const CH_DEVICE_ID: usize = 498;
pub const CH_SUB_DEVICE_ID: usize = 502;
pub const CH_SENSOR_ID: usize = 506;
pub const CH_CHANNEL_ID: usize = 510;
pub const CH_CHANNEL_CONFIG: usize = 514;
pub const CH_SLAVE_ADDRESS: usize = 515;
pub const CH_DEVICE_TYPE: usize = 516;
pub const CH_DEVICE_UNIQUE_ID: usize = 518;

// Record format: record_id(u32) + channel_count * f64
pub const RECORD_ID_SIZE: usize = 4;
pub const VALUE_SIZE: usize = 8;

// Sentinel codes stored in place of a measurement
pub const INVALID: f64 = -9999.0;
pub const OVERRANGE: f64 = -8888.0;
pub const SENSOR_CHANGE: f64 = -8887.0;
pub const UNIT_CHANGE: f64 = -8886.0;

pub const DEFAULT_FALLBACK_CHANNELS: u32 = 1;
pub const DEFAULT_SCAN_CHUNK: usize = 1000;

// 9999-12-31T23:59:59.999Z
pub const MAX_SANE_TIMESTAMP_MS: i64 = 253_402_300_799_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Sentinel {
    Invalid,
    Overrange,
    SensorChange,
    UnitChange,
}

impl Sentinel {
    pub fn from_value(val: f64) -> Option<Self> {
        if val == INVALID {
            Some(Sentinel::Invalid)
        } else if val == OVERRANGE {
            Some(Sentinel::Overrange)
        } else if val == SENSOR_CHANGE {
            Some(Sentinel::SensorChange)
        } else if val == UNIT_CHANGE {
            Some(Sentinel::UnitChange)
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Sentinel::Invalid => INVALID,
            Sentinel::Overrange => OVERRANGE,
            Sentinel::SensorChange => SENSOR_CHANGE,
            Sentinel::UnitChange => UNIT_CHANGE,
        }
    }
}

pub fn is_sentinel(val: f64) -> bool {
    Sentinel::from_value(val).is_some()
}
