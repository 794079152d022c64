//! Member signature strings.
//!
//! Members are looked up by signature, following the slot-runtime
//! convention: the name plus one `_` per parameter. Getters are the bare
//! name, setters take exactly one parameter, and constructors carry an
//! `init ` prefix so they never collide with a static method of the same
//! name.

/// `name(_,_)` for a method taking `arity` arguments.
pub fn method_signature(name: &str, arity: usize) -> String {
    format!("{}({})", name, placeholders(arity))
}

/// `name` for a property getter.
pub fn getter_signature(name: &str) -> String {
    name.to_string()
}

/// `name=(_)` for a property setter.
pub fn setter_signature(name: &str) -> String {
    format!("{}=(_)", name)
}

/// `init name(_,_)` for a constructor taking `arity` arguments.
pub fn constructor_signature(name: &str, arity: usize) -> String {
    format!("init {}", method_signature(name, arity))
}

fn placeholders(arity: usize) -> String {
    vec!["_"; arity].join(",")
}
