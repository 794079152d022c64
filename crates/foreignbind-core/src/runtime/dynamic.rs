//! Runtime value type for slots and module variables.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::ObjectHandle;
use crate::TypeHash;
use crate::error::ConversionError;

/// A dynamic value that can be stored in a slot or module variable.
///
/// Foreign values never live inline: they are always heap objects reached
/// through an [`ObjectHandle`], so the collector sees every wrapper.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    /// Null (also the result of a call with no return value)
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (every integer width is stored as i64)
    Int(i64),
    /// Floating point value (f32 and f64 are stored as f64)
    Float(f64),
    /// String value (owned)
    String(String),
    /// Handle to a heap object (foreign instance, list or map)
    Object(ObjectHandle),
    /// A registered foreign class
    Class(ClassRef),
}

/// Reference to a registered foreign class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassRef(pub TypeHash);

impl Dynamic {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::String(_) => "string",
            Dynamic::Object(_) => "object",
            Dynamic::Class(_) => "class",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// The heap handle, if this is an object.
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Dynamic::Object(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// A value usable as a map key.
///
/// Keys must hash and compare exactly, so floats, objects and classes are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl MapKey {
    pub fn type_name(&self) -> &'static str {
        match self {
            MapKey::Null => "null",
            MapKey::Bool(_) => "bool",
            MapKey::Int(_) => "int",
            MapKey::String(_) => "string",
        }
    }
}

impl TryFrom<Dynamic> for MapKey {
    type Error = ConversionError;

    fn try_from(value: Dynamic) -> Result<Self, Self::Error> {
        match value {
            Dynamic::Null => Ok(MapKey::Null),
            Dynamic::Bool(b) => Ok(MapKey::Bool(b)),
            Dynamic::Int(i) => Ok(MapKey::Int(i)),
            Dynamic::String(s) => Ok(MapKey::String(s)),
            other => Err(ConversionError::TypeMismatch {
                expected: "map key",
                actual: other.type_name(),
            }),
        }
    }
}

impl From<MapKey> for Dynamic {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Null => Dynamic::Null,
            MapKey::Bool(b) => Dynamic::Bool(b),
            MapKey::Int(i) => Dynamic::Int(i),
            MapKey::String(s) => Dynamic::String(s),
        }
    }
}

/// Slot kinds reported by the embedding API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SlotType {
    Bool = 0,
    Num = 1,
    Foreign = 2,
    List = 3,
    Map = 4,
    Null = 5,
    String = 6,
    Unknown = 7,
}
