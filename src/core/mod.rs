pub mod bytes;
pub mod constants;
#[cfg(feature = "async")]
pub mod data_handle;
pub mod error;
pub mod format;
pub mod reader;
pub mod records;
pub mod repair;
pub mod sampler;
pub mod scanner;

#[cfg(test)]
pub(crate) mod fixture;
