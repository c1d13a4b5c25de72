pub mod block;
pub mod bundle;
mod engine;
pub mod index;
mod mem;

pub use self::block::{BlockCodec, DecodeError, Lz};
pub use self::bundle::{BundleError, BundleFs, LocalBundleFs};
pub use self::engine::{Engine, Error, Limits, Result, DEFAULT_MAX_OUTPUT};
pub use self::index::{BundleIndex, Index, IndexError};
pub use self::mem::{AllocError, Mem};
