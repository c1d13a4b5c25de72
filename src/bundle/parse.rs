use std::ops::Range;

use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::{le_u32, le_u64};
use nom::sequence::Tuple;
use nom::IResult;

use super::{BundleError, BundleResult};

/// Size of the fixed part of the bundle header.
pub const HEAD_SIZE: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Kraken,
    Mermaid,
    Leviathan,
    Unknown(u32),
}

impl From<u32> for Encoding {
    fn from(value: u32) -> Self {
        match value {
            8 => Self::Kraken,
            9 => Self::Mermaid,
            13 => Self::Leviathan,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Head {
    pub uncompressed_size: u32,
    pub total_payload_size: u32,
    pub head_payload_size: u32,
    pub payload: HeadPayload,
}

impl Head {
    /// Parses the fixed header, without the chunk size table.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (uncompressed_size, total_payload_size, head_payload_size)) =
            (le_u32, le_u32, le_u32).parse(input)?;
        let (input, payload) = HeadPayload::parse(input)?;

        Ok((
            input,
            Self {
                uncompressed_size,
                total_payload_size,
                head_payload_size,
                payload,
            },
        ))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HeadPayload {
    pub first_file_encode: Encoding,
    // unk10: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub chunk_count: u32,
    pub chunk_unpacked_size: u32,
    // unk28: [u32; 4],
}

impl HeadPayload {
    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (
            input,
            (
                first_file_encode,
                _,
                uncompressed_size,
                compressed_size,
                chunk_count,
                chunk_unpacked_size,
                _,
            ),
        ) = (
            le_u32,
            le_u32,
            le_u64,
            le_u64,
            le_u32,
            le_u32,
            take(16usize),
        )
            .parse(input)?;

        Ok((
            input,
            Self {
                first_file_encode: first_file_encode.into(),
                uncompressed_size,
                compressed_size,
                chunk_count,
                chunk_unpacked_size,
            },
        ))
    }
}

/// One independently compressed segment of a bundle.
///
/// `compressed` is relative to the start of the bundle,
/// `decompressed` to the start of the decoded output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Segment {
    pub compressed: Range<usize>,
    pub decompressed: Range<usize>,
}

impl Segment {
    pub fn decompressed_len(&self) -> usize {
        self.decompressed.len()
    }
}

/// Validated header and segment table of a bundle.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Directory {
    pub head: Head,
    pub segments: Vec<Segment>,
}

impl Directory {
    /// Parses and validates the directory of the bundle in `src`.
    ///
    /// All segment ranges of a successfully parsed directory are within `src`
    /// and the decompressed ranges exactly cover the declared uncompressed size.
    pub fn parse(src: &[u8]) -> BundleResult<Self> {
        let (input, head) = Head::parse(src)?;

        let chunk_count = head.payload.chunk_count as usize;
        let (input, chunk_sizes) = parse_chunk_sizes(input, chunk_count)?;

        let payload_start = src.len() - input.len();
        if head.payload.compressed_size > input.len() as u64 {
            return Err(BundleError::PayloadTruncated {
                declared: head.payload.compressed_size,
                available: input.len(),
            });
        }

        let total = head.payload.uncompressed_size;
        let chunk_unpacked_size = u64::from(head.payload.chunk_unpacked_size);
        if chunk_unpacked_size == 0 && chunk_count > 0 {
            return Err(BundleError::ZeroChunkSize);
        }

        let mut segments = Vec::with_capacity(chunk_count);
        let mut compressed_offset = payload_start;
        let mut covered = 0u64;
        for (index, &chunk_size) in chunk_sizes.iter().enumerate() {
            let compressed_end = compressed_offset
                .checked_add(chunk_size as usize)
                .filter(|&end| end <= src.len())
                .ok_or(BundleError::SegmentOutOfRange {
                    index,
                    end: compressed_offset as u64 + u64::from(chunk_size),
                    available: src.len(),
                })?;

            // The last chunk may be smaller than `chunk_unpacked_size`.
            let unpacked = chunk_unpacked_size.min(total - covered);
            if unpacked == 0 {
                return Err(BundleError::SegmentsMismatch {
                    declared: total,
                    segments: chunk_count,
                });
            }

            // `covered + unpacked <= total`, the caller checks `total` fits before allocating.
            let decompressed = covered as usize..(covered + unpacked) as usize;
            segments.push(Segment {
                compressed: compressed_offset..compressed_end,
                decompressed,
            });

            compressed_offset = compressed_end;
            covered += unpacked;
        }

        if covered != total {
            return Err(BundleError::SegmentsMismatch {
                declared: total,
                segments: chunk_count,
            });
        }

        Ok(Self { head, segments })
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.head.payload.uncompressed_size
    }
}

fn parse_chunk_sizes(input: &[u8], chunk_count: usize) -> IResult<&[u8], Vec<u32>> {
    // Request the whole table at once, a bogus count fails here instead of
    // allocating a huge vector.
    let (input, table) = take(chunk_count.saturating_mul(std::mem::size_of::<u32>()))(input)?;
    let (_, chunk_sizes) = count(le_u32, chunk_count)(table)?;
    Ok((input, chunk_sizes))
}
