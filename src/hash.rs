use std::hash::{BuildHasher, Hash, Hasher};

/// Default hasher for [`crate::Map`] when no [`BuildHasher`] is supplied.
///
/// `ahash` gives good avalanche behavior for the 32-bit fold below without
/// pulling in a cryptographic hash; the map has no adversarial-input
/// guarantee to make beyond "don't use `DefaultHasher`."
pub type DefaultHashBuilder = ahash::RandomState;

/// Fold a 64-bit hash down to 32 bits by xoring the halves together, rather
/// than truncating, so both halves of the hasher's output still influence
/// every bit the map consumes (directory index bits and control-byte tag
/// bits come from opposite ends of the 32-bit result).
#[inline]
pub(crate) fn fold_to_u32(h: u64) -> u32 {
    ((h >> 32) as u32) ^ (h as u32)
}

/// Hash `key` with `build_hasher` and fold the result to 32 bits.
#[inline]
pub(crate) fn hash_one<K, S>(build_hasher: &S, key: &K) -> u32
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    let mut hasher = build_hasher.build_hasher();
    key.hash(&mut hasher);
    fold_to_u32(hasher.finish())
}
