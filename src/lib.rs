// CSD Rust Reader
// Main library entry point

pub mod core;
pub mod models;
pub mod utils;

// Re-export main types
pub use crate::core::constants::Sentinel;
pub use crate::core::error::{CsdError, Degradation, Result};
pub use crate::core::format::{
    ChannelHeader, ChannelRange, DataRecord, FileHeader, ProtocolHeader, SampleSet,
};
pub use crate::core::reader::CsdReader;
pub use crate::core::sampler::Decimation;
pub use models::reader_config::ReaderConfig;

#[cfg(feature = "async")]
pub use crate::core::data_handle::SharedReader;

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(FILE_HEADER_SIZE, 34);
        assert_eq!(PROTOCOL_HEADER_SIZE, 3552);
        assert_eq!(CHANNEL_HEADER_SIZE, 918);
    }
}
