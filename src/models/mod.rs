pub mod reader_config;
