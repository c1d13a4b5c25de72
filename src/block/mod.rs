//! Single block decompression.
//!
//! A block is one independently compressed unit without any framing, the
//! caller has to know the decompressed size (or at least an upper bound).
//!
//! The built-in [`Lz`] codec decodes a stream of byte oriented instructions:
//!
//! ```text
//! 0x00                       end of stream
//! 0b01LLLLLL                 literal run of L+1 bytes (L < 63) or 64+varint bytes (L = 63),
//!                            the raw bytes follow the token
//! 0b10LLLLLL varint(offset)  back-reference of L+3 bytes (L < 63) or 66+varint bytes (L = 63),
//!                            copying from `offset` bytes before the current output position
//! ```
//!
//! Varints are LEB128 encoded and limited to 32 bits.
mod decode;
mod instruction;

pub use self::decode::{decode, DecodeError};
pub use self::instruction::{Instruction, Instructions, Writer, MIN_MATCH};

/// A block codec decodes one compressed block into a destination of fixed capacity.
///
/// Implementations must never write past `dst.len()` and must return the
/// amount of bytes written only after the block was completely decoded.
pub trait BlockCodec {
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError>;
}

impl<C: BlockCodec + ?Sized> BlockCodec for &C {
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
        (**self).decode(src, dst)
    }
}

impl<C: BlockCodec + ?Sized> BlockCodec for Box<C> {
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
        self.as_ref().decode(src, dst)
    }
}

/// The built-in LZ codec, see the [module documentation](self) for the format.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz;

impl BlockCodec for Lz {
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
        decode(src, dst)
    }
}
