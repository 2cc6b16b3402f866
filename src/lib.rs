//! An insert-and-lookup hash map specialized for very large key
//! populations whose storage must stay invisible to a tracing garbage
//! collector.
//!
//! Combines two classical techniques, leaves-first:
//!
//! - [`group`]: a fixed 8-slot open-addressed cell, searched with SWAR
//!   ("SIMD within a register") byte tricks over its 64-bit control word.
//! - [`table`]: 4096 inline groups probed at group granularity, owning
//!   the per-table local-depth/used bookkeeping that decides when it
//!   needs to split.
//! - [`directory`]: the outer [`Map`] — a power-of-two directory of table
//!   pointers addressed by the high bits of the hash, owning global depth
//!   and the one-slot spare-table pool.
//! - [`location`]: the cursor [`Map::entry`] returns, naming the exact
//!   slot an insert lands in or a value may be read/overwritten through.
//!
//! Deliberately does not support removal, does not guarantee iteration
//! order, and performs no internal synchronization — wrap a [`Map`] in a
//! `Mutex` for cross-thread use, the way a caller would wrap any other
//! unsynchronized collection.
//!
//! ```
//! use reef_map::Map;
//! use reef_map::Location;
//!
//! let mut map: Map<&str, i32> = Map::new();
//! if let Location::Vacant(loc) = map.entry("answer") {
//!     loc.insert("answer", 42).unwrap();
//! }
//! if let Location::Occupied(loc) = map.entry("answer") {
//!     assert_eq!(*loc.get(), 42);
//! }
//! ```

mod alloc;
mod directory;
mod entry;
mod error;
mod group;
mod hash;
mod location;
mod table;

#[cfg(feature = "mmap-alloc")]
pub use alloc::MmapAlloc;
pub use alloc::{BoxAlloc, RawAlloc};
pub use directory::Map;
pub use error::{MapError, Result};
pub use hash::DefaultHashBuilder;
pub use location::{Location, OccupiedLocation, VacantLocation};
pub use table::{GROUPS_PER_TABLE, GROWTH_THRESHOLD, TABLE_CAPACITY};
