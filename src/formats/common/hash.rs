//! FNV-1a hashing used by the static string table

const FNV_SEED: u32 = 0x811C9DC5;
const FNV_PRIME: u32 = 0x01000193;

/// 32-bit FNV-1a over raw bytes.
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_SEED;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Values that hash as their raw little-endian byte representation.
///
/// A scalar and the byte slice of its `to_le_bytes` produce the same hash,
/// as do a `&str` and its UTF-8 bytes.
pub trait Fnv1aHash {
    fn fnv1a_hash(&self) -> u32;
}

impl Fnv1aHash for [u8] {
    fn fnv1a_hash(&self) -> u32 {
        fnv1a(self)
    }
}

impl Fnv1aHash for str {
    fn fnv1a_hash(&self) -> u32 {
        fnv1a(self.as_bytes())
    }
}

impl Fnv1aHash for String {
    fn fnv1a_hash(&self) -> u32 {
        fnv1a(self.as_bytes())
    }
}

macro_rules! impl_fnv1a_scalar {
    ($($t:ty),*) => {
        $(impl Fnv1aHash for $t {
            fn fnv1a_hash(&self) -> u32 {
                fnv1a(&self.to_le_bytes())
            }
        })*
    };
}

impl_fnv1a_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(fnv1a(b""), 0x811C9DC5);
        assert_eq!(fnv1a(b"a"), 0xE40C292C);
        assert_eq!(fnv1a(b"foobar"), 0xBF9CF968);
        assert_eq!(fnv1a(b"hello"), 0x4F9F2CAB);
        assert_eq!(fnv1a(b"abcdefghijklmnopqrstuvwxyz"), 0xB0BC0C82);
    }

    #[test]
    fn scalars_hash_as_raw_bytes() {
        let v: u32 = 0xDEADBEEF;
        assert_eq!(v.fnv1a_hash(), fnv1a(&v.to_le_bytes()));
        assert_eq!("hello".fnv1a_hash(), fnv1a(b"hello"));
        assert_eq!("hello".to_string().fnv1a_hash(), "hello".fnv1a_hash());
    }
}
