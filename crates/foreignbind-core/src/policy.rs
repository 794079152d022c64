//! Lifetime policy for values crossing into the runtime.
//!
//! The passing mode chosen at the crossing point alone decides how the value
//! is stored inside runtime memory and which side releases it:
//!
//! | Mode        | Storage                 | Ownership | Collector releases |
//! |-------------|-------------------------|-----------|--------------------|
//! | `Value`     | inline copy             | runtime   | yes                |
//! | `Pointer`   | non-owning wrapper      | native    | no                 |
//! | `Reference` | non-owning wrapper      | native    | no                 |
//! | `Shared`    | shared control block    | shared    | its share only     |
//!
//! The binding is fixed for the lifetime of the wrapper.

use std::fmt;

/// How a native value is handed to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassingMode {
    /// The value is moved or copied into runtime memory.
    Value,
    /// A raw pointer to native storage.
    Pointer,
    /// A reference to native storage.
    Reference,
    /// A shared-ownership handle.
    Shared,
}

/// What the runtime-side wrapper physically holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// A full copy of the value lives inside the wrapper.
    InlineCopy,
    /// The wrapper points at storage it does not own.
    NonOwning,
    /// The wrapper holds one share of a reference-counted block.
    SharedControlBlock,
}

/// Which side is authoritative for releasing the underlying storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The runtime frees the value when the wrapper is collected.
    Runtime,
    /// Native code frees the value; the runtime never does.
    Native,
    /// Freed once both sides have released their share.
    Shared,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ownership::Runtime => "runtime",
            Ownership::Native => "native",
            Ownership::Shared => "shared",
        };
        f.write_str(name)
    }
}

/// The resolved lifetime decision for one crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LifetimePolicy {
    pub storage: Storage,
    pub ownership: Ownership,
    /// Whether collecting the wrapper frees the value itself.
    pub collector_releases: bool,
}

impl PassingMode {
    /// Resolve the lifetime policy for this mode.
    pub const fn policy(self) -> LifetimePolicy {
        match self {
            PassingMode::Value => LifetimePolicy {
                storage: Storage::InlineCopy,
                ownership: Ownership::Runtime,
                collector_releases: true,
            },
            PassingMode::Pointer | PassingMode::Reference => LifetimePolicy {
                storage: Storage::NonOwning,
                ownership: Ownership::Native,
                collector_releases: false,
            },
            // The collector drops the runtime's share; the value goes away
            // only when that was the last one.
            PassingMode::Shared => LifetimePolicy {
                storage: Storage::SharedControlBlock,
                ownership: Ownership::Shared,
                collector_releases: false,
            },
        }
    }

    pub const fn ownership(self) -> Ownership {
        self.policy().ownership
    }

    pub fn name(self) -> &'static str {
        match self {
            PassingMode::Value => "value",
            PassingMode::Pointer => "pointer",
            PassingMode::Reference => "reference",
            PassingMode::Shared => "shared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_mode_is_runtime_owned() {
        let policy = PassingMode::Value.policy();
        assert_eq!(policy.storage, Storage::InlineCopy);
        assert_eq!(policy.ownership, Ownership::Runtime);
        assert!(policy.collector_releases);
    }

    #[test]
    fn pointer_and_reference_share_a_policy() {
        assert_eq!(
            PassingMode::Pointer.policy(),
            PassingMode::Reference.policy()
        );
        let policy = PassingMode::Pointer.policy();
        assert_eq!(policy.storage, Storage::NonOwning);
        assert_eq!(policy.ownership, Ownership::Native);
        assert!(!policy.collector_releases);
    }

    #[test]
    fn shared_mode_is_shared() {
        let policy = PassingMode::Shared.policy();
        assert_eq!(policy.storage, Storage::SharedControlBlock);
        assert_eq!(policy.ownership, Ownership::Shared);
    }

    #[test]
    fn policy_is_const() {
        const POLICY: LifetimePolicy = PassingMode::Value.policy();
        assert!(POLICY.collector_releases);
    }

    #[test]
    fn ownership_display() {
        assert_eq!(Ownership::Runtime.to_string(), "runtime");
        assert_eq!(Ownership::Native.to_string(), "native");
        assert_eq!(Ownership::Shared.to_string(), "shared");
    }
}
