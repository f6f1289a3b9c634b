//! File format codecs.

pub mod common;
pub mod lsf;
