use super::{BundleError, Directory};
use crate::block::{BlockCodec, DecodeError};

/// Decodes all segments of a bundle into `dst`.
///
/// `dst` must hold at least [`Directory::uncompressed_size`] bytes, only that
/// prefix is written and its length returned. Every segment is decoded
/// directly into its final position and has to produce exactly its declared
/// length, the first failing segment aborts decoding.
pub fn decode_segments<C: BlockCodec>(
    codec: &C,
    directory: &Directory,
    src: &[u8],
    dst: &mut [u8],
) -> Result<usize, BundleError> {
    let needed = directory.uncompressed_size();
    let size = usize::try_from(needed)
        .ok()
        .filter(|&size| size <= dst.len())
        .ok_or(BundleError::OutputTooSmall {
            needed,
            capacity: dst.len(),
        })?;
    let dst = &mut dst[..size];

    tracing::trace!(
        "decoding {} segments into {size} bytes",
        directory.segments.len(),
    );

    for (index, segment) in directory.segments.iter().enumerate() {
        let input = src
            .get(segment.compressed.clone())
            .ok_or(BundleError::SegmentOutOfRange {
                index,
                end: segment.compressed.end as u64,
                available: src.len(),
            })?;
        let out = dst
            .get_mut(segment.decompressed.clone())
            .ok_or(BundleError::OutputTooSmall {
                needed: segment.decompressed.end as u64,
                capacity: size,
            })?;

        let n = codec
            .decode(input, out)
            .map_err(|source| BundleError::Segment { index, source })?;

        if n != segment.decompressed_len() {
            return Err(BundleError::Segment {
                index,
                source: DecodeError::LengthMismatch {
                    expected: segment.decompressed_len(),
                    actual: n,
                },
            });
        }
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Lz, Writer};

    fn bundle(payload: &[u8]) -> Vec<u8> {
        let mut w = Writer::new();
        w.literal(payload);
        let block = w.finish();

        let mut data = Vec::new();
        data.extend((payload.len() as u32).to_le_bytes());
        data.extend((block.len() as u32).to_le_bytes());
        data.extend(52u32.to_le_bytes());
        data.extend(8u32.to_le_bytes());
        data.extend(1u32.to_le_bytes());
        data.extend((payload.len() as u64).to_le_bytes());
        data.extend((block.len() as u64).to_le_bytes());
        data.extend(1u32.to_le_bytes());
        data.extend(256u32.to_le_bytes());
        data.extend([0u8; 16]);
        data.extend((block.len() as u32).to_le_bytes());
        data.extend(block);
        data
    }

    #[test]
    fn decode_into_larger_buffer() {
        let data = bundle(b"abc");
        let directory = Directory::parse(&data).unwrap();

        let mut dst = [0xffu8; 5];
        assert_eq!(decode_segments(&Lz, &directory, &data, &mut dst).unwrap(), 3);
        assert_eq!(&dst, b"abc\xff\xff");
    }

    #[test]
    fn short_destination_is_an_error() {
        let data = bundle(b"abc");
        let directory = Directory::parse(&data).unwrap();

        assert!(matches!(
            decode_segments(&Lz, &directory, &data, &mut [0u8; 2]),
            Err(BundleError::OutputTooSmall {
                needed: 3,
                capacity: 2
            })
        ));
    }

    #[test]
    fn foreign_source_is_an_error() {
        let data = bundle(b"abc");
        let directory = Directory::parse(&data).unwrap();

        assert!(matches!(
            decode_segments(&Lz, &directory, &data[..data.len() - 1], &mut [0u8; 3]),
            Err(BundleError::SegmentOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn segment_outside_destination() {
        let data = bundle(b"abc");
        let mut directory = Directory::parse(&data).unwrap();
        directory.segments[0].decompressed = 1..4;

        assert!(matches!(
            decode_segments(&Lz, &directory, &data, &mut [0u8; 3]),
            Err(BundleError::OutputTooSmall {
                needed: 4,
                capacity: 3
            })
        ));
    }
}
