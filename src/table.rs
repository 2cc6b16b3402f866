//! A single extensible-hashing table: 4096 inline [`Group`]s probed
//! linearly at group granularity, plus the local-depth/used bookkeeping
//! that tells the directory how many of its slots this table owns.
//!
//! Allocated as one fixed, `#[repr(C)]`-shaped region and initialized by
//! zeroing then stamping its fields through raw pointer writes rather than
//! a struct literal, since a bare stack value would be megabytes wide; see
//! [`Table::init_at`].

use std::hash::{BuildHasher, Hash};
use std::ptr::{addr_of_mut, NonNull};

use crate::directory::Map;
use crate::entry::Entry;
use crate::error::{MapError, Result};
use crate::group::{Group, GROUP_SIZE};
use crate::hash;

/// Groups per table. The table is probed modulo this constant and never
/// resized in place.
pub const GROUPS_PER_TABLE: usize = 4096;

/// Total slot capacity of one table.
pub const TABLE_CAPACITY: usize = GROUPS_PER_TABLE * GROUP_SIZE;

/// Growth fires once a table's occupancy passes 75% of its capacity.
pub const GROWTH_THRESHOLD: usize = TABLE_CAPACITY * 3 / 4;

/// One table in the extensible-hashing directory: a fixed array of groups
/// plus the depth/occupancy bookkeeping `split` and the directory need.
///
/// Always lives behind a raw pointer handed out by [`Map::take_table`] —
/// never constructed as a bare Rust value, since `size_of::<Table<K, V>>()`
/// is megabytes and a stack-allocated struct literal of 4096 non-`Copy`
/// groups would blow the stack. [`Table::init_at`] writes every field
/// through a raw pointer into allocator-provided memory instead.
#[repr(C)]
pub struct Table<K, V> {
    pub local_depth: u32,
    pub used: u32,
    pub index: u32,
    groups: [Group<K, V>; GROUPS_PER_TABLE],
}

/// The outcome of probing a table for `key`: which group/slot the search
/// landed on, and whether it was a hit.
pub struct FindResult<K, V> {
    pub found: bool,
    pub group: NonNull<Group<K, V>>,
    pub slot: usize,
}

impl<K, V> Table<K, V> {
    /// Initialize freshly allocated (or recycled) memory at `ptr` into an
    /// empty table with the given depth/index.
    ///
    /// # Safety
    /// `ptr` must point to a `size_of::<Table<K, V>>()`-byte region, valid
    /// for writes, not currently holding a live `Table<K, V>` (any
    /// previous occupant must already have been dropped).
    pub unsafe fn init_at(ptr: *mut Table<K, V>, local_depth: u32, index: u32) {
        addr_of_mut!((*ptr).local_depth).write(local_depth);
        addr_of_mut!((*ptr).used).write(0);
        addr_of_mut!((*ptr).index).write(index);
        let groups = addr_of_mut!((*ptr).groups) as *mut Group<K, V>;
        for i in 0..GROUPS_PER_TABLE {
            groups.add(i).write(Group::empty());
        }
    }

    /// Probe for `key` under precomputed `hash`, starting at group
    /// `(hash >> 7) mod 4096` and scanning linearly.
    ///
    /// # Safety
    /// `table` must point to a live, initialized `Table<K, V>`.
    pub unsafe fn find<Q>(table: *mut Table<K, V>, key: &Q, hash: u32) -> FindResult<K, V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let tag = (hash & 0x7f) as u8;
        let groups = addr_of_mut!((*table).groups) as *mut Group<K, V>;
        let mut g = (hash >> 7) as usize % GROUPS_PER_TABLE;

        for _ in 0..GROUPS_PER_TABLE {
            let group_ptr = groups.add(g);
            let group = &*group_ptr;

            for slot in group.find_matches(tag) {
                let entry = group.entry_unchecked(slot);
                if entry.key.borrow() == key {
                    return FindResult {
                        found: true,
                        group: NonNull::new_unchecked(group_ptr),
                        slot,
                    };
                }
            }

            let empty = group.find_empty();
            if empty.any() {
                return FindResult {
                    found: false,
                    group: NonNull::new_unchecked(group_ptr),
                    slot: empty.first_set(),
                };
            }

            g = (g + 1) % GROUPS_PER_TABLE;
        }

        panic!("{}", MapError::TableFull);
    }

    /// Record that a new entry was written into this table. Returns
    /// whether the table has now crossed the growth threshold.
    ///
    /// # Safety
    /// `table` must point to a live, initialized `Table<K, V>`.
    pub unsafe fn on_set(table: *mut Table<K, V>) -> bool {
        (*table).used += 1;
        (*table).used as usize > GROWTH_THRESHOLD
    }
}

/// Redistribute every entry of `table` into two freshly taken tables, one
/// per value of the newly significant hash bit, then return them. The
/// caller (`Map::on_growth_needed`) installs both into the directory and
/// frees `table`.
///
/// # Safety
/// `table` must point to a live, initialized `Table<K, V>` whose
/// `local_depth < map`'s current global depth (true immediately after
/// `Map::grow`, or already true without growing).
pub unsafe fn split<K, V, S, A>(
    map: &mut Map<K, V, S, A>,
    table: NonNull<Table<K, V>>,
) -> Result<(NonNull<Table<K, V>>, NonNull<Table<K, V>>)>
where
    K: Hash + Eq,
    S: BuildHasher,
    A: crate::alloc::RawAlloc,
{
    let t = table.as_ptr();
    let local_depth = (*t).local_depth;
    let index = (*t).index;
    let new_local_depth = local_depth + 1;

    let old_tab = map.take_table(new_local_depth, index * 2)?;
    let new_tab = map.take_table(new_local_depth, index * 2 + 1)?;

    // The single hash bit that decides which child an entry lands in.
    let mask = 1u32 << (32 - new_local_depth);

    let groups = addr_of_mut!((*t).groups) as *mut Group<K, V>;
    for gi in 0..GROUPS_PER_TABLE {
        let group = &mut *groups.add(gi);
        let full = group.find_full();
        for slot in full {
            let Entry { key, value } = group.take_at(slot);
            let h = hash::hash_one(&map.build_hasher, &key);
            let target = if h & mask != 0 { new_tab } else { old_tab };

            let result = Table::find(target.as_ptr(), &key, h);
            if result.found {
                panic!("{}", MapError::DuplicateOnSplit);
            }
            (*result.group.as_ptr()).insert_at(result.slot, (h & 0x7f) as u8, Entry::new(key, value));
            (*target.as_ptr()).used += 1;
        }
    }

    log::trace!(
        "split table index={index} local_depth={local_depth} -> {new_local_depth}, used={}",
        (*t).used
    );

    Ok((old_tab, new_tab))
}
