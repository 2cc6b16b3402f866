//! The handle [`Map::find`]/[`Map::entry`] return: a cursor naming the
//! exact group slot an insert must land in, or that a found value may be
//! read/overwritten through.
//!
//! `VacantLocation` holds `&'a mut Map<...>` so the borrow checker, not a
//! runtime flag, prevents any other map access between `find` and
//! `insert` — a reusable cursor in place of repeating lock+probe+write at
//! every call site.

use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::alloc::RawAlloc;
use crate::directory::Map;
use crate::entry::Entry;
use crate::error::Result;
use crate::group::Group;
use crate::table::Table;

/// The result of [`Map::find`]/[`Map::entry`]: either the key was already
/// present ([`Location::Occupied`]) or a landing slot was found for it
/// ([`Location::Vacant`]).
pub enum Location<'a, K, V, S, A>
where
    A: RawAlloc,
{
    Occupied(OccupiedLocation<'a, K, V, S, A>),
    Vacant(VacantLocation<'a, K, V, S, A>),
}

impl<'a, K, V, S, A> Location<'a, K, V, S, A>
where
    A: RawAlloc,
{
    pub fn is_occupied(&self) -> bool {
        matches!(self, Location::Occupied(_))
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Location::Vacant(_))
    }
}

/// A location naming a slot that already holds `key`'s entry. Safe to
/// read ([`Self::get`]) or overwrite the value of ([`Self::replace`]).
pub struct OccupiedLocation<'a, K, V, S, A>
where
    A: RawAlloc,
{
    group: NonNull<Group<K, V>>,
    slot: usize,
    _marker: PhantomData<&'a mut Map<K, V, S, A>>,
}

impl<'a, K, V, S, A> OccupiedLocation<'a, K, V, S, A>
where
    A: RawAlloc,
{
    pub(crate) fn new(group: NonNull<Group<K, V>>, slot: usize) -> Self {
        OccupiedLocation {
            group,
            slot,
            _marker: PhantomData,
        }
    }

    /// The key stored at this location.
    pub fn key(&self) -> &K {
        unsafe { &self.group.as_ref().entry_unchecked(self.slot).key }
    }

    /// Read the stored value.
    pub fn get(&self) -> &V {
        unsafe { &self.group.as_ref().entry_unchecked(self.slot).value }
    }

    /// Mutably borrow the stored value in place.
    pub fn get_mut(&mut self) -> &mut V {
        unsafe { &mut self.group.as_mut().entry_unchecked_mut(self.slot).value }
    }

    /// Overwrite the stored value, returning the value it replaces. The
    /// key and control byte are left untouched.
    pub fn replace(mut self, value: V) -> V {
        unsafe { self.group.as_mut().set_value_unchecked(self.slot, value) }
    }
}

/// A location naming an empty slot where `key`'s entry may be inserted.
/// Consumed by [`Self::insert`].
pub struct VacantLocation<'a, K, V, S, A>
where
    A: RawAlloc,
{
    map: &'a mut Map<K, V, S, A>,
    table: NonNull<Table<K, V>>,
    group: NonNull<Group<K, V>>,
    slot: usize,
    hash: u32,
}

impl<'a, K, V, S, A> VacantLocation<'a, K, V, S, A>
where
    A: RawAlloc,
{
    pub(crate) fn new(
        map: &'a mut Map<K, V, S, A>,
        table: NonNull<Table<K, V>>,
        group: NonNull<Group<K, V>>,
        slot: usize,
        hash: u32,
    ) -> Self {
        VacantLocation {
            map,
            table,
            group,
            slot,
            hash,
        }
    }
}

impl<'a, K, V, S, A> VacantLocation<'a, K, V, S, A>
where
    K: std::hash::Hash + Eq,
    S: std::hash::BuildHasher,
    A: RawAlloc,
{
    /// Write `key`/`value` into this slot, stamp its control byte with the
    /// tag bits of the hash computed at `find` time, and notify the
    /// owning table — which may, at most once, trigger a table split and
    /// (at most once within that) a directory doubling.
    ///
    /// The only way this can fail is the off-heap allocator refusing a
    /// table allocation during that growth; the map is left usable (the
    /// new entry is already durably stored) even if growth partway fails,
    /// except for the narrow window between the directory doubling and
    /// every split table being installed into it — callers that see `Err`
    /// here should treat the map as needing to be rebuilt.
    pub fn insert(self, key: K, value: V) -> Result<()> {
        let tag = (self.hash & 0x7f) as u8;
        unsafe {
            let mut group = self.group;
            group.as_mut().insert_at(self.slot, tag, Entry::new(key, value));
        }
        self.map.bump_len();

        let needs_growth = unsafe { Table::on_set(self.table.as_ptr()) };
        if needs_growth {
            self.map.on_growth_needed(self.table)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Map;

    #[test]
    fn vacant_insert_is_visible_as_occupied() {
        let mut map: Map<u32, u32> = Map::new();
        match map.entry(&1u32) {
            Location::Vacant(loc) => loc.insert(1, 10).unwrap(),
            Location::Occupied(_) => unreachable!(),
        }
        match map.entry(&1u32) {
            Location::Occupied(loc) => assert_eq!(*loc.get(), 10),
            Location::Vacant(_) => panic!("expected occupied"),
        }
    }
}
