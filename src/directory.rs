//! The outer extensible-hashing layer: a power-of-two directory of table
//! pointers indexed by the high bits of the hash, plus global-depth and
//! spare-pool bookkeeping. This is the public [`Map`] type.
//!
//! Deliberately unsynchronized: there is no internal locking around the
//! directory or global depth, so growth and lookups are only safe from one
//! owning thread at a time.

use std::alloc::Layout;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::ptr::NonNull;

use crate::alloc::{BoxAlloc, RawAlloc};
use crate::error::Result;
use crate::hash::{self, DefaultHashBuilder};
use crate::location::{Location, OccupiedLocation, VacantLocation};
use crate::table::{self, Table, TABLE_CAPACITY};

/// An insert-and-lookup hash map combining extensible hashing (a directory
/// of tables addressed by the high bits of the hash) with Swiss-table
/// style open-addressed groups (the low bits, matched via SWAR). See
/// `group`/`table` for the two probing layers this type orchestrates.
///
/// Does not support removal, does not guarantee iteration order, and is
/// not internally synchronized — wrap it in a `Mutex` for cross-thread use.
pub struct Map<K, V, S = DefaultHashBuilder, A = BoxAlloc>
where
    A: RawAlloc,
{
    directory: Box<[NonNull<Table<K, V>>]>,
    /// `32 - global_depth`; `hash >> shift` yields the directory index
    /// directly. `shift == 32` means global depth 0 (one table).
    shift: u32,
    spare: Option<NonNull<Table<K, V>>>,
    pub(crate) build_hasher: S,
    alloc: A,
    len: usize,
    table_count: usize,
}

impl<K, V> Map<K, V, DefaultHashBuilder, BoxAlloc> {
    /// A new, empty map: directory of size 1, one empty table, the
    /// default `ahash`-backed hasher and the global allocator.
    pub fn new() -> Self {
        Self::with_hasher_in(DefaultHashBuilder::default(), BoxAlloc)
    }
}

impl<K, V> Default for Map<K, V, DefaultHashBuilder, BoxAlloc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Map<K, V, S, BoxAlloc>
where
    S: BuildHasher,
{
    /// A new, empty map using `build_hasher` in place of the default.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self::with_hasher_in(build_hasher, BoxAlloc)
    }
}

impl<K, V, A> Map<K, V, DefaultHashBuilder, A>
where
    A: RawAlloc,
{
    /// A new, empty map using `alloc` as its off-heap storage capability
    /// in place of the global allocator (see `alloc::MmapAlloc`, behind
    /// the `mmap-alloc` feature).
    pub fn with_alloc(alloc: A) -> Self {
        Self::with_hasher_in(DefaultHashBuilder::default(), alloc)
    }
}

impl<K, V, S, A> Map<K, V, S, A>
where
    S: BuildHasher,
    A: RawAlloc,
{
    /// A new, empty map using both a custom hasher and a custom off-heap
    /// allocator. Panics if the initial table allocation fails; see
    /// [`Self::try_with_hasher_in`] for a fallible constructor.
    pub fn with_hasher_in(build_hasher: S, alloc: A) -> Self {
        Self::try_with_hasher_in(build_hasher, alloc).expect("allocation failed")
    }

    /// Fallible form of [`Self::with_hasher_in`]. The only way construction
    /// can fail is the underlying allocator rejecting the first table's
    /// allocation.
    pub fn try_with_hasher_in(build_hasher: S, alloc: A) -> Result<Self> {
        let table = unsafe { alloc_table::<K, V, A>(&alloc, 0, 0)? };
        Ok(Map {
            directory: vec![table].into_boxed_slice(),
            shift: 32,
            spare: None,
            build_hasher,
            alloc,
            len: 0,
            table_count: 1,
        })
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slot capacity across every distinct table currently in the
    /// directory (not all of it necessarily reachable without probing —
    /// this is raw capacity, not load).
    pub fn capacity(&self) -> usize {
        self.table_count * TABLE_CAPACITY
    }

    /// Current global depth (`log2` of the directory size).
    pub fn global_depth(&self) -> u32 {
        32 - self.shift
    }
}

impl<K, V, S, A> Map<K, V, S, A>
where
    K: Hash + Eq,
    S: BuildHasher,
    A: RawAlloc,
{
    /// Locate `key`, returning a handle that either reads/updates the
    /// existing value (`Location::Occupied`) or can insert a new one
    /// (`Location::Vacant`). Mirrors `std::collections::HashMap::entry`.
    ///
    /// Takes `&mut self`, not `&self`: a vacant location may later trigger
    /// a directory growth and table split, which invalidate any other
    /// outstanding location on the map. Taking `&mut self` makes the borrow
    /// checker enforce that statically instead of relying on a documented
    /// precondition.
    pub fn entry<Q>(&mut self, key: &Q) -> Location<'_, K, V, S, A>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash::hash_one(&self.build_hasher, key);
        let dir_index = self.dir_index(hash);
        let table = self.directory[dir_index];
        let result = unsafe { Table::find(table.as_ptr(), key, hash) };

        if result.found {
            Location::Occupied(OccupiedLocation::new(result.group, result.slot))
        } else {
            Location::Vacant(VacantLocation::new(self, table, result.group, result.slot, hash))
        }
    }

    /// Alias for [`Self::entry`], naming the lookup operation directly.
    pub fn find<Q>(&mut self, key: &Q) -> Location<'_, K, V, S, A>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entry(key)
    }

    #[inline]
    fn dir_index(&self, hash: u32) -> usize {
        if self.shift >= 32 {
            0
        } else {
            (hash >> self.shift) as usize
        }
    }

    /// Called by a [`VacantLocation`] once it has crossed the growth
    /// threshold on its table: doubles the directory if needed, splits
    /// the table, and installs both halves.
    pub(crate) fn on_growth_needed(&mut self, table: NonNull<Table<K, V>>) -> Result<()> {
        let local_depth = unsafe { (*table.as_ptr()).local_depth };
        if local_depth == self.global_depth() {
            self.grow();
        }

        let (old_tab, new_tab) = unsafe { table::split(self, table) }?;
        self.install_table(old_tab);
        self.install_table(new_tab);
        unsafe { self.free_table(table) };
        self.table_count += 1;
        Ok(())
    }

    /// Double the directory, duplicating each existing pointer into the
    /// two slots it now covers.
    fn grow(&mut self) {
        let old_depth = self.global_depth();
        let mut next = Vec::with_capacity(self.directory.len() * 2);
        for &t in self.directory.iter() {
            next.push(t);
            next.push(t);
        }
        self.directory = next.into_boxed_slice();
        self.shift -= 1;
        log::trace!("directory grow: depth {old_depth} -> {}", self.global_depth());
    }

    /// Write `table`'s pointer into every directory slot its
    /// `(index, local_depth)` owns: `w = 2^(D - local_depth)` contiguous
    /// slots starting at `index * w`. Must use this shift form rather than
    /// `index * (depth_difference + 1)`, which only agrees with it when
    /// `depth_difference` is 0 or 1.
    pub(crate) fn install_table(&mut self, table: NonNull<Table<K, V>>) {
        let local_depth = unsafe { (*table.as_ptr()).local_depth };
        let index = unsafe { (*table.as_ptr()).index } as usize;
        let w = 1usize << (self.global_depth() - local_depth);
        let base = index * w;
        for slot in &mut self.directory[base..base + w] {
            *slot = table;
        }
    }

    /// Take a table for `split` to populate: reuse the single spare-pool
    /// slot if one is parked, otherwise allocate fresh.
    pub(crate) fn take_table(&mut self, local_depth: u32, index: u32) -> Result<NonNull<Table<K, V>>> {
        if let Some(spare) = self.spare.take() {
            unsafe {
                Table::init_at(spare.as_ptr(), local_depth, index);
            }
            Ok(spare)
        } else {
            unsafe { alloc_table(&self.alloc, local_depth, index) }
        }
    }

    /// Retire a table that has just been fully redistributed by `split`
    /// (or, on map drop, one that may still hold live entries): drop any
    /// entries it still holds, then either park it as the spare or return
    /// its memory to the allocator.
    pub(crate) unsafe fn free_table(&mut self, ptr: NonNull<Table<K, V>>) {
        std::ptr::drop_in_place(ptr.as_ptr());
        if self.spare.is_none() {
            Table::init_at(ptr.as_ptr(), 0, 0);
            self.spare = Some(ptr);
        } else {
            self.alloc.dealloc(ptr.cast(), Layout::new::<Table<K, V>>());
        }
    }

    pub(crate) fn bump_len(&mut self) {
        self.len += 1;
    }

    #[cfg(test)]
    pub(crate) fn table_count(&self) -> usize {
        self.table_count
    }
}

/// Allocate and initialize one empty table via `alloc`.
unsafe fn alloc_table<K, V, A: RawAlloc>(
    alloc: &A,
    local_depth: u32,
    index: u32,
) -> Result<NonNull<Table<K, V>>> {
    let layout = Layout::new::<Table<K, V>>();
    let ptr = alloc.alloc_zeroed(layout)?;
    let table_ptr = ptr.as_ptr() as *mut Table<K, V>;
    Table::init_at(table_ptr, local_depth, index);
    Ok(NonNull::new_unchecked(table_ptr))
}

// The directory and spare pool hold `NonNull<Table<K, V>>` purely as owned,
// exclusively-reachable storage (the same role `Box<Table<K, V>>` would
// play); nothing aliases them from elsewhere. So `Map` is `Send` whenever
// its contents and allocator are, exactly as it would be if every
// `NonNull` here were a `Box`. Deliberately not `Sync`: callers needing
// shared access must wrap a `Map` in a `Mutex` themselves.
unsafe impl<K: Send, V: Send, S: Send, A: RawAlloc + Send> Send for Map<K, V, S, A> {}

impl<K, V, S, A> Drop for Map<K, V, S, A>
where
    A: RawAlloc,
{
    fn drop(&mut self) {
        let layout = Layout::new::<Table<K, V>>();
        let width_at = |local_depth: u32| -> usize { 1usize << (self.global_depth() - local_depth) };

        let mut i = 0;
        while i < self.directory.len() {
            let table = self.directory[i];
            let local_depth = unsafe { (*table.as_ptr()).local_depth };
            unsafe {
                std::ptr::drop_in_place(table.as_ptr());
                self.alloc.dealloc(table.cast(), layout);
            }
            i += width_at(local_depth);
        }

        if let Some(spare) = self.spare.take() {
            unsafe {
                std::ptr::drop_in_place(spare.as_ptr());
                self.alloc.dealloc(spare.cast(), layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_map_has_one_table_and_is_empty() {
        let map: Map<u32, u32> = Map::new();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.table_count(), 1);
        assert_eq!(map.global_depth(), 0);
    }

    #[test]
    fn single_insert_then_lookup() {
        let mut map: Map<&str, i32> = Map::new();
        match map.entry("k") {
            Location::Vacant(loc) => loc.insert("k", 7).unwrap(),
            Location::Occupied(_) => panic!("fresh map should not have the key"),
        }

        match map.entry("k") {
            Location::Occupied(loc) => assert_eq!(*loc.get(), 7),
            Location::Vacant(_) => panic!("key should be present"),
        }

        assert!(matches!(map.entry("missing"), Location::Vacant(_)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn set_value_updates_in_place() {
        let mut map: Map<&str, i32> = Map::new();
        match map.entry("k") {
            Location::Vacant(loc) => loc.insert("k", 1).unwrap(),
            Location::Occupied(_) => unreachable!(),
        }

        match map.entry("k") {
            Location::Occupied(loc) => {
                let old = loc.replace(2);
                assert_eq!(old, 1);
            }
            Location::Vacant(_) => unreachable!(),
        }

        match map.entry("k") {
            Location::Occupied(loc) => assert_eq!(*loc.get(), 2),
            Location::Vacant(_) => unreachable!(),
        }
        assert_eq!(map.len(), 1);
    }
}
