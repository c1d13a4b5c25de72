/// Hash of the root directory in indices using [`HashStrategy::Fnv3_11_2`].
pub const FNV_ROOT_HASH: u64 = 0x07e4_7507_b4a9_2e53;

/// Multiplicative inverse of the MurmurHash64A constant `m` modulo 2^64.
const MURMUR_M_INV: u64 = 0x5f7a_0ea7_e59b_19bd;
const MURMUR_R: u32 = 47;

/// Path hashing scheme used by an index, it changed with game patch 3.21.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStrategy {
    /// FNV-1a over the lowercase path followed by `++`.
    Fnv3_11_2,
    /// MurmurHash64A over the lowercase path, seeded per index.
    Murmur3_21_2 { seed: u64 },
}

impl HashStrategy {
    /// Hash of a file path.
    pub fn path(&self, path: &str) -> u64 {
        match self {
            Self::Fnv3_11_2 => {
                let mut hasher = Fnv1a64::new();
                hasher.update(path.to_lowercase().as_bytes());
                hasher.update(b"++");
                hasher.finalize()
            }
            Self::Murmur3_21_2 { seed } => {
                let path = path.trim_end_matches('/');
                murmur2::murmur64a(path.to_lowercase().as_bytes(), *seed)
            }
        }
    }

    /// Hash of a directory path, trailing slashes are ignored.
    pub fn directory(&self, path: &str) -> u64 {
        let path = path.trim_end_matches('/');
        match self {
            Self::Fnv3_11_2 => {
                let mut hasher = Fnv1a64::new();
                hasher.update(path.as_bytes());
                hasher.update(b"++");
                hasher.finalize()
            }
            Self::Murmur3_21_2 { .. } => self.path(path),
        }
    }

    /// Whether paths are stored in lowercase in the path representations.
    pub fn lowercase(&self) -> bool {
        matches!(self, Self::Murmur3_21_2 { .. })
    }
}

/// Recovers the MurmurHash64A seed from the hash of the empty root path.
///
/// For an empty input the hash only consists of the finalizer applied
/// to the seed, which is invertible.
pub fn murmur_seed_from_root(root_hash: u64) -> u64 {
    let mut h = root_hash;
    h ^= h >> MURMUR_R;
    h = h.wrapping_mul(MURMUR_M_INV);
    h ^= h >> MURMUR_R;
    h
}

pub struct Fnv1a64(u64);

impl Fnv1a64 {
    pub fn new() -> Self {
        const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
        Self(FNV_OFFSET_BASIS)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        const FNV_PRIME: u64 = 1099511628211;

        let mut hash = self.0;
        for byte in bytes {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        self.0 = hash;
    }

    pub fn finalize(self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self::new()
    }
}
