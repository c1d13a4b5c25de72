use crate::block::{BlockCodec, DecodeError, Lz};
use crate::bundle::{self, BundleError, Directory};
use crate::mem::{AllocError, Mem};

/// Largest output the engine allocates by default (2 GiB).
pub const DEFAULT_MAX_OUTPUT: u64 = 1 << 31;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error("failed to decompress block: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error("output of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl Error {
    /// Whether the operation failed because the output did not fit.
    ///
    /// A caller-supplied buffer that is too small surfaces through the same
    /// `Err` as every other decode failure, this tells them apart.
    pub fn is_capacity(&self) -> bool {
        match self {
            Self::Decode(err) => err.is_capacity(),
            Self::Bundle(BundleError::OutputTooSmall { .. }) => true,
            Self::Bundle(BundleError::Segment { source, .. }) => source.is_capacity(),
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Upper bound for engine allocated outputs.
    pub max_output: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

/// Decompression entry points.
///
/// The engine holds no mutable state, all calls are independent and can be
/// made concurrently from multiple threads if the codec allows it.
#[derive(Debug, Default, Clone)]
pub struct Engine<C = Lz> {
    codec: C,
    limits: Limits,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: BlockCodec> Engine<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn alloc(&self, size: usize) -> Result<Mem> {
        self.check_limit(size as u64)?;
        Ok(Mem::alloc(size)?)
    }

    pub fn size_of(&self, mem: &Mem) -> usize {
        mem.len()
    }

    pub fn free(&self, mem: Mem) {
        mem.free()
    }

    /// Decompresses a block into a caller supplied buffer.
    ///
    /// Returns the number of bytes written, `dst` must be large enough
    /// to hold the whole decompressed block.
    pub fn decompress_block(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        Ok(self.codec.decode(src, dst)?)
    }

    /// Decompresses a block which decompresses to exactly `size` bytes.
    pub fn decompress_block_alloc(&self, src: &[u8], size: usize) -> Result<Mem> {
        let mut mem = self.alloc(size)?;

        let n = self.codec.decode(src, &mut mem)?;
        if n != size {
            return Err(DecodeError::LengthMismatch {
                expected: size,
                actual: n,
            }
            .into());
        }

        Ok(mem)
    }

    /// Decompresses a whole bundle into a freshly allocated buffer.
    ///
    /// Either all segments decode or the call fails, a partially decoded
    /// bundle is never returned.
    pub fn decompress_bundle(&self, src: &[u8]) -> Result<Mem> {
        let directory = Directory::parse(src)?;
        let size = self.output_size(directory.uncompressed_size())?;

        let mut mem = Mem::alloc(size)?;
        bundle::decode_segments(&self.codec, &directory, src, &mut mem)?;

        tracing::trace!(
            encoding = ?directory.head.payload.first_file_encode,
            "decompressed bundle with {} segments to {size} bytes",
            directory.segments.len(),
        );

        Ok(mem)
    }

    /// Returns the decompressed size of a bundle, reading only its header.
    pub fn bundle_size(&self, src: &[u8]) -> Result<u64> {
        let (_, head) = bundle::Head::parse(src).map_err(BundleError::from)?;
        Ok(head.payload.uncompressed_size)
    }

    /// Decompresses a bundle into a caller supplied buffer.
    ///
    /// `dst` must be at least [`Engine::bundle_size`] bytes long,
    /// returns the amount of bytes written.
    pub fn decompress_bundle_into(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        let directory = Directory::parse(src)?;
        Ok(bundle::decode_segments(&self.codec, &directory, src, dst)?)
    }

    fn check_limit(&self, size: u64) -> Result<()> {
        if size > self.limits.max_output {
            return Err(Error::TooLarge {
                size,
                limit: self.limits.max_output,
            });
        }
        Ok(())
    }

    fn output_size(&self, size: u64) -> Result<usize> {
        self.check_limit(size)?;
        usize::try_from(size).map_err(|_| Error::TooLarge {
            size,
            limit: usize::MAX as u64,
        })
    }
}
