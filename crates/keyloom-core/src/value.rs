//! Typed values and signal signatures.
//!
//! Action signals carry a fixed parameter list declared at class
//! registration. [`ParamType`] describes one parameter, [`Value`] is a
//! concrete argument of that type, and [`SignalSignature`] bundles a name,
//! parameter list, return kind, and the action flag.

use std::fmt;

/// One named value of an enumeration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    /// Integer value.
    pub value: i32,
    /// Full name, e.g. `SCROLL_STEP_LEFT`.
    pub name: &'static str,
    /// Short nickname, e.g. `step-left`.
    pub nick: &'static str,
}

/// A runtime description of an enumeration type.
///
/// Enumeration types are declared as statics so that parameter types can
/// reference them by `&'static` pointer.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumType {
    name: &'static str,
    values: &'static [EnumValue],
}

impl EnumType {
    /// Declare a new enumeration type.
    pub const fn new(name: &'static str, values: &'static [EnumValue]) -> Self {
        Self { name, values }
    }

    /// The type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All values, in declaration order.
    pub fn values(&self) -> &'static [EnumValue] {
        self.values
    }

    /// Look up a value by its full name or its nickname.
    pub fn lookup(&self, ident: &str) -> Option<&'static EnumValue> {
        self.values
            .iter()
            .find(|v| v.name == ident)
            .or_else(|| self.values.iter().find(|v| v.nick == ident))
    }

    /// Look up a value by its integer.
    pub fn from_value(&self, value: i32) -> Option<&'static EnumValue> {
        self.values.iter().find(|v| v.value == value)
    }
}

/// The declared type of one signal parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Boolean.
    Bool,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// Signed 64-bit integer.
    Int64,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Owned string.
    String,
    /// A value of the given enumeration type.
    Enum(&'static EnumType),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::UInt => f.write_str("uint"),
            Self::Int64 => f.write_str("int64"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::String => f.write_str("string"),
            Self::Enum(ty) => f.write_str(ty.name()),
        }
    }
}

/// A concrete argument passed to a signal handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// An enumeration value and the type it belongs to.
    Enum {
        ty: &'static EnumType,
        value: i32,
    },
}

impl Value {
    /// The type this value inhabits.
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Bool,
            Self::Int(_) => ParamType::Int,
            Self::UInt(_) => ParamType::UInt,
            Self::Int64(_) => ParamType::Int64,
            Self::Float(_) => ParamType::Float,
            Self::Double(_) => ParamType::Double,
            Self::String(_) => ParamType::String,
            Self::Enum { ty, .. } => ParamType::Enum(ty),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer of an enum value, if this is one of `ty`.
    pub fn as_enum(&self, ty: &EnumType) -> Option<i32> {
        match self {
            Self::Enum { ty: t, value } if *t == ty => Some(*value),
            _ => None,
        }
    }
}

/// What a signal handler returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnType {
    /// No return value; every emission counts as handled.
    #[default]
    None,
    /// A boolean; only a `true` return counts as handled.
    Bool,
}

/// The registered signature of a named signal on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSignature {
    name: String,
    params: Vec<ParamType>,
    returns: ReturnType,
    action: bool,
}

impl SignalSignature {
    /// Start a signature for a plain (non-action) signal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnType::None,
            action: false,
        }
    }

    /// Start a signature for an action signal, which key bindings may emit.
    pub fn action(name: impl Into<String>) -> Self {
        Self {
            action: true,
            ..Self::new(name)
        }
    }

    /// Append a parameter.
    pub fn param(mut self, ty: ParamType) -> Self {
        self.params.push(ty);
        self
    }

    /// Declare a boolean return.
    pub fn returns_bool(mut self) -> Self {
        self.returns = ReturnType::Bool;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> ReturnType {
        self.returns
    }

    pub fn is_action(&self) -> bool {
        self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static EDGE: EnumType = EnumType::new(
        "Edge",
        &[
            EnumValue { value: 0, name: "EDGE_START", nick: "start" },
            EnumValue { value: 1, name: "EDGE_END", nick: "end" },
        ],
    );

    #[test]
    fn test_enum_lookup_by_name_and_nick() {
        assert_eq!(EDGE.lookup("EDGE_END").map(|v| v.value), Some(1));
        assert_eq!(EDGE.lookup("start").map(|v| v.value), Some(0));
        assert!(EDGE.lookup("middle").is_none());
        assert_eq!(EDGE.from_value(1).map(|v| v.name), Some("EDGE_END"));
    }

    #[test]
    fn test_value_as_enum_checks_type() {
        static OTHER: EnumType = EnumType::new("Other", &[]);
        let v = Value::Enum { ty: &EDGE, value: 1 };
        assert_eq!(v.as_enum(&EDGE), Some(1));
        assert_eq!(v.as_enum(&OTHER), None);
        assert_eq!(v.param_type(), ParamType::Enum(&EDGE));
    }

    #[test]
    fn test_signature_builder() {
        let sig = SignalSignature::action("move")
            .param(ParamType::Enum(&EDGE))
            .param(ParamType::Int)
            .returns_bool();
        assert_eq!(sig.name(), "move");
        assert_eq!(sig.arity(), 2);
        assert_eq!(sig.returns(), ReturnType::Bool);
        assert!(sig.is_action());
        assert!(!SignalSignature::new("changed").is_action());
    }
}
