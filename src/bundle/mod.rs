//! Bundle container: a fixed header, a table of compressed chunk sizes
//! and the chunks themselves, each an independently compressed block.
mod decode;
mod fs;
mod parse;

pub use self::decode::decode_segments;
pub use self::fs::{BundleFs, BundleFsError, LocalBundleFs, MemoryBundleFs};
pub use self::parse::{Directory, Encoding, Head, HeadPayload, Segment, HEAD_SIZE};

use crate::block::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to parse bundle header: {0}")]
    Parse(nom::Err<nom::error::Error<()>>),
    #[error("bundle declares {declared} payload bytes but only {available} are available")]
    PayloadTruncated { declared: u64, available: usize },
    #[error("segment {index} ends at {end}, past the end of the bundle ({available} bytes)")]
    SegmentOutOfRange {
        index: usize,
        end: u64,
        available: usize,
    },
    #[error("{segments} segments do not cover the declared size of {declared} bytes")]
    SegmentsMismatch { declared: u64, segments: usize },
    #[error("bundle has segments but a chunk size of zero")]
    ZeroChunkSize,
    #[error("failed to decompress segment {index}: {source}")]
    Segment {
        index: usize,
        #[source]
        source: DecodeError,
    },
    #[error("bundle needs {needed} bytes, output buffer only has {capacity}")]
    OutputTooSmall { needed: u64, capacity: usize },
}

impl<T> From<nom::Err<nom::error::Error<T>>> for BundleError {
    fn from(err: nom::Err<nom::error::Error<T>>) -> Self {
        Self::Parse(err.map_input(|_| ()))
    }
}

pub type BundleResult<T> = Result<T, BundleError>;
