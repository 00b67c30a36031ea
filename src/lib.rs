// WFDB record reader
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::annotation::{decode_annotations, find_annotation_interval};
pub use crate::core::calibrate::scale_signals;
pub use crate::core::codec::{decode_16, decode_212, decode_samples, encode_16, verify_checksums, Encoded};
pub use crate::core::constants::{annotation_code, AnnotationCode};
pub use crate::core::error::{Result, WfdbError};
pub use crate::core::format::{Adc, Annotation, Dataset, Header, SampleFormat, SignalSpec, TimeseriesChunk};
pub use crate::core::header::parse_header;
pub use crate::core::reader::{assemble, ByteSource, FileSource, HttpSource, WfdbReader};
