pub mod annotation;
pub mod calibrate;
pub mod codec;
pub mod constants;
pub mod error;
pub mod format;
pub mod header;
pub mod reader;
