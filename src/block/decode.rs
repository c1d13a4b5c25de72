use super::{Instruction, Instructions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("compressed block ended before its end marker")]
    Truncated,
    #[error("invalid instruction 0x{0:02x}")]
    InvalidInstruction(u8),
    #[error("back-reference offset {offset} at output position {position} is out of range")]
    OffsetOutOfRange { offset: usize, position: usize },
    #[error("variable length integer exceeds 32 bits")]
    VarintOverflow,
    #[error("decompressed data exceeds the output capacity")]
    OutputOverrun,
    #[error("unexpected data after the end marker")]
    TrailingData,
    #[error("decompressed {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl DecodeError {
    /// Whether decoding failed only because the destination was too small.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::OutputOverrun)
    }
}

/// Decodes a single block from `src` into `dst`.
///
/// Returns the amount of bytes written once the end marker is reached.
/// On error the output written so far stays in `dst` but must be
/// considered garbage.
///
/// Runs in time linear to `src.len() + dst.len()`, every instruction
/// consumes input and every copy is bounded by the output capacity.
pub fn decode(src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
    let mut instructions = Instructions::new(src);
    let mut pos = 0usize;

    loop {
        match instructions.next_instruction()? {
            Instruction::Literal(bytes) => {
                let end = reserve(pos, bytes.len(), dst.len())?;
                dst[pos..end].copy_from_slice(bytes);
                pos = end;
            }
            Instruction::Match { offset, len } => {
                if offset > pos {
                    return Err(DecodeError::OffsetOutOfRange {
                        offset,
                        position: pos,
                    });
                }
                let end = reserve(pos, len, dst.len())?;
                copy_match(dst, pos, offset, len);
                pos = end;
            }
            Instruction::End => {
                if !instructions.remaining().is_empty() {
                    return Err(DecodeError::TrailingData);
                }
                return Ok(pos);
            }
        }
    }
}

fn reserve(pos: usize, len: usize, capacity: usize) -> Result<usize, DecodeError> {
    pos.checked_add(len)
        .filter(|&end| end <= capacity)
        .ok_or(DecodeError::OutputOverrun)
}

fn copy_match(dst: &mut [u8], pos: usize, offset: usize, len: usize) {
    let start = pos - offset;

    if offset >= len {
        dst.copy_within(start..start + len, pos);
        return;
    }

    // Overlapping copy, the already copied part becomes the source of the rest.
    // Doubling the chunk keeps this at O(log(len / offset)) memmoves.
    let mut copied = 0;
    while copied < len {
        let chunk = (offset + copied).min(len - copied);
        dst.copy_within(start..start + chunk, pos + copied);
        copied += chunk;
    }
}
