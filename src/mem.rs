use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to allocate {size} bytes")]
pub struct AllocError {
    pub size: usize,
}

/// Engine owned block of memory, returned from all allocating decode calls.
///
/// The handle tracks its own size and releases its memory when dropped or
/// passed to [`Mem::free`]. Since `free` consumes the handle, freeing twice
/// or reading after a free does not compile.
pub struct Mem {
    data: Vec<u8>,
}

impl Mem {
    /// Reserves `size` zeroed bytes.
    ///
    /// Fails instead of aborting the process if the allocator can not
    /// satisfy the request.
    pub fn alloc(size: usize) -> Result<Self, AllocError> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| AllocError { size })?;
        data.resize(size, 0);
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lowers the tracked size to `len`, a larger `len` is ignored.
    pub fn shrink(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn free(self) {
        drop(self)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for Mem {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Mem {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for Mem {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for Mem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mem")
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}
