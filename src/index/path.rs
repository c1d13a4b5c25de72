//! Expansion of the path representation data of the index.
//!
//! Paths are stored as a little program of u32 command words and
//! NUL-terminated UTF-8 fragments, alternating between two phases:
//!
//! - A zero word toggles the phase. Entering the base phase clears all bases.
//!   The data starts in the generation phase, usually immediately toggled.
//! - In the base phase a non-zero word `n` adds a new base: the fragment
//!   appended to base `n` (one-based), or the fragment alone if there is no
//!   such base.
//! - In the generation phase a non-zero word `n` emits a path built the same way.
use byteorder::{LittleEndian, ReadBytesExt};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path representation data ends in the middle of a command")]
    Truncated,
    #[error("path fragment at offset {0} is not terminated")]
    Unterminated(usize),
    #[error("path fragment at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),
    #[error("path representation {offset}+{size} exceeds the data ({available} bytes)")]
    OutOfRange {
        offset: usize,
        size: usize,
        available: usize,
    },
}

/// Iterator over all paths generated by one path representation.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct Paths<'a> {
    rest: &'a [u8],
    end: usize,
    base_phase: bool,
    bases: Vec<String>,
}

impl<'a> Paths<'a> {
    /// `data` must be exactly the bytes of one path representation.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Like [`Paths::new`], `offset` is the position of `data` in the
    /// complete path data and only used for error reporting.
    pub(crate) fn with_offset(data: &'a [u8], offset: usize) -> Self {
        Self {
            rest: data,
            end: offset + data.len(),
            base_phase: false,
            bases: Vec::new(),
        }
    }

    fn next_path(&mut self) -> Result<Option<String>, PathError> {
        while !self.rest.is_empty() {
            let cmd = self
                .rest
                .read_u32::<LittleEndian>()
                .map_err(|_| PathError::Truncated)?;

            if cmd == 0 {
                self.base_phase = !self.base_phase;
                if self.base_phase {
                    self.bases.clear();
                }
                continue;
            }

            let position = self.end - self.rest.len();
            let len = self
                .rest
                .iter()
                .position(|&b| b == 0)
                .ok_or(PathError::Unterminated(position))?;
            let fragment = std::str::from_utf8(&self.rest[..len])
                .map_err(|_| PathError::InvalidUtf8(position))?;
            self.rest = &self.rest[len + 1..];

            let path = match self.bases.get(cmd as usize - 1) {
                Some(base) => format!("{base}{fragment}"),
                None => fragment.to_owned(),
            };

            if self.base_phase {
                self.bases.push(path);
            } else {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }
}

impl<'a> Iterator for Paths<'a> {
    type Item = Result<String, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.next_path();
        if result.is_err() {
            self.rest = &[];
        }
        result.transpose()
    }
}
