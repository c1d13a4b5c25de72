use super::DecodeError;

/// Shortest back-reference that can be encoded.
pub const MIN_MATCH: usize = 3;

const TOKEN_END: u8 = 0x00;
const KIND_MASK: u8 = 0b1100_0000;
const KIND_LITERAL: u8 = 0b0100_0000;
const KIND_MATCH: u8 = 0b1000_0000;
const LEN_MASK: u8 = 0b0011_1111;

const LITERAL_BASE: usize = 1;
const MATCH_BASE: usize = MIN_MATCH;

const MAX_VARINT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Copy the contained bytes to the output.
    Literal(&'a [u8]),
    /// Copy `len` bytes starting `offset` bytes before the current output position.
    ///
    /// The source and destination may overlap, which repeats the last `offset` bytes.
    Match { offset: usize, len: usize },
    End,
}

/// Iterator over the instructions of a compressed block.
///
/// Stops after the end marker or the first error.
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    input: &'a [u8],
    done: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, done: false }
    }

    /// Input which has not been consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        self.input
    }

    /// Parses the next instruction.
    ///
    /// Every successfully parsed instruction consumes at least one byte of input.
    pub fn next_instruction(&mut self) -> Result<Instruction<'a>, DecodeError> {
        let (&token, rest) = self.input.split_first().ok_or(DecodeError::Truncated)?;
        self.input = rest;

        if token == TOKEN_END {
            return Ok(Instruction::End);
        }

        match token & KIND_MASK {
            KIND_LITERAL => {
                let len = self.read_len(token, LITERAL_BASE)?;
                if self.input.len() < len {
                    return Err(DecodeError::Truncated);
                }
                let (literal, rest) = self.input.split_at(len);
                self.input = rest;
                Ok(Instruction::Literal(literal))
            }
            KIND_MATCH => {
                let len = self.read_len(token, MATCH_BASE)?;
                let offset = read_varint(&mut self.input)? as usize;
                if offset == 0 {
                    return Err(DecodeError::OffsetOutOfRange {
                        offset,
                        position: 0,
                    });
                }
                Ok(Instruction::Match { offset, len })
            }
            _ => Err(DecodeError::InvalidInstruction(token)),
        }
    }

    fn read_len(&mut self, token: u8, base: usize) -> Result<usize, DecodeError> {
        let short = (token & LEN_MASK) as usize;
        if short < LEN_MASK as usize {
            return Ok(base + short);
        }

        let extra = read_varint(&mut self.input)? as usize;
        (base + short)
            .checked_add(extra)
            .ok_or(DecodeError::VarintOverflow)
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.next_instruction();
        self.done = !matches!(result, Ok(Instruction::Literal(_) | Instruction::Match { .. }));
        Some(result)
    }
}

fn read_varint(input: &mut &[u8]) -> Result<u32, DecodeError> {
    let mut value = 0u32;

    for i in 0..MAX_VARINT_LEN {
        let (&byte, rest) = input.split_first().ok_or(DecodeError::Truncated)?;
        *input = rest;

        let bits = u32::from(byte & 0x7f);
        // Only 4 bits of the fifth byte fit into an u32.
        if i == MAX_VARINT_LEN - 1 && bits > 0x0f {
            return Err(DecodeError::VarintOverflow);
        }
        value |= bits << (7 * i);

        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }

    Err(DecodeError::VarintOverflow)
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Serializes instructions into a block.
///
/// This only frames instructions, it does not search for matches.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a literal run, empty runs are skipped.
    ///
    /// # Panics
    ///
    /// Panics if the literal is longer than the format can express.
    pub fn literal(&mut self, bytes: &[u8]) -> &mut Self {
        if bytes.is_empty() {
            return self;
        }
        self.token(KIND_LITERAL, bytes.len() - LITERAL_BASE);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Appends a back-reference.
    ///
    /// # Panics
    ///
    /// Panics if `len` is shorter than [`MIN_MATCH`] or `offset` is zero.
    pub fn copy(&mut self, offset: u32, len: usize) -> &mut Self {
        assert!(len >= MIN_MATCH, "match length {len} below minimum");
        assert!(offset > 0, "match offset must not be zero");
        self.token(KIND_MATCH, len - MATCH_BASE);
        write_varint(&mut self.buf, offset);
        self
    }

    /// Appends a parsed instruction.
    ///
    /// [`Instruction::End`] is ignored, the end marker is written by [`Writer::finish`].
    pub fn push(&mut self, instruction: Instruction<'_>) -> &mut Self {
        match instruction {
            Instruction::Literal(bytes) => self.literal(bytes),
            Instruction::Match { offset, len } => {
                let offset = u32::try_from(offset).expect("match offset exceeds 32 bits");
                self.copy(offset, len)
            }
            Instruction::End => self,
        }
    }

    /// Appends the end marker and returns the encoded block.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(TOKEN_END);
        self.buf
    }

    fn token(&mut self, kind: u8, len: usize) {
        let mask = LEN_MASK as usize;
        if len < mask {
            self.buf.push(kind | len as u8);
        } else {
            let extra = u32::try_from(len - mask).expect("length exceeds 32 bits");
            self.buf.push(kind | LEN_MASK);
            write_varint(&mut self.buf, extra);
        }
    }
}
