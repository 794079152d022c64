//! Deterministic hash-based identities for foreign classes and signatures.
//!
//! [`TypeHash`] is a 64-bit hash computed from names, so the same module and
//! class name always produce the same identity regardless of registration
//! order. Signatures are hashed within their owning class and split into
//! instance and static domains, so `new(_)` on the class and `new(_)` on an
//! instance never collide.
//!
//! # Examples
//!
//! ```
//! use foreignbind_core::TypeHash;
//!
//! let a = TypeHash::from_class("game", "Vector3");
//! let b = TypeHash::from_class("game", "Vector3");
//! assert_eq!(a, b);
//!
//! let instance = TypeHash::from_signature(a, "length()", false);
//! let fixed = TypeHash::from_signature(a, "length()", true);
//! assert_ne!(instance, fixed);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator mixed between path components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for class hashes.
    pub const CLASS: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for instance member signatures.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for static member signatures (including constructors).
    pub const STATIC: u64 = 0x5ea77ffbcdf5f302;
}

/// A deterministic 64-bit identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// The empty hash, never produced by the constructors below.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a bare name.
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::CLASS))
    }

    /// Hash a class within its module.
    pub fn from_class(module: &str, class: &str) -> Self {
        let module_hash = xxh64(module.as_bytes(), hash_constants::CLASS);
        let class_hash = xxh64(class.as_bytes(), hash_constants::CLASS);
        TypeHash(
            module_hash
                .rotate_left(17)
                .wrapping_mul(hash_constants::SEP)
                ^ class_hash,
        )
    }

    /// Hash a member signature within its class.
    pub fn from_signature(class: TypeHash, signature: &str, is_static: bool) -> Self {
        let domain = if is_static {
            hash_constants::STATIC
        } else {
            hash_constants::METHOD
        };
        let sig_hash = xxh64(signature.as_bytes(), domain);
        TypeHash(class.0.wrapping_mul(hash_constants::SEP) ^ sig_hash)
    }

    /// Check whether this is the empty hash.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash(0x{:016x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_deterministic() {
        assert_eq!(TypeHash::from_name("Vector3"), TypeHash::from_name("Vector3"));
        assert_ne!(TypeHash::from_name("Vector3"), TypeHash::from_name("Vector2"));
    }

    #[test]
    fn class_hash_depends_on_module() {
        let a = TypeHash::from_class("a", "Thing");
        let b = TypeHash::from_class("b", "Thing");
        assert_ne!(a, b);
    }

    #[test]
    fn class_hash_is_not_swappable() {
        let a = TypeHash::from_class("x", "y");
        let b = TypeHash::from_class("y", "x");
        assert_ne!(a, b);
    }

    #[test]
    fn signature_hash_separates_static_and_instance() {
        let class = TypeHash::from_class("m", "C");
        assert_ne!(
            TypeHash::from_signature(class, "new(_)", true),
            TypeHash::from_signature(class, "new(_)", false)
        );
    }

    #[test]
    fn signature_hash_depends_on_class() {
        let a = TypeHash::from_class("m", "A");
        let b = TypeHash::from_class("m", "B");
        assert_ne!(
            TypeHash::from_signature(a, "len()", false),
            TypeHash::from_signature(b, "len()", false)
        );
    }

    #[test]
    fn display_and_debug() {
        let hash = TypeHash(0xff);
        assert_eq!(format!("{}", hash), "00000000000000ff");
        assert_eq!(format!("{:?}", hash), "TypeHash(0x00000000000000ff)");
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!hash.is_empty());
    }
}
