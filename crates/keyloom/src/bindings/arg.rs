//! Typed binding arguments and signal descriptions.
//!
//! A binding stores its arguments in a loose form ([`Arg`]) that does not yet
//! know the signal it will be emitted on. At emission the dispatch adapter
//! coerces each `Arg` to the parameter type declared by the target's class
//! via [`Arg::coerce`].

use std::fmt;

use keyloom_core::{EnumType, ParamType, Value};

/// An enumeration argument.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumArg {
    /// An unquoted identifier, resolved against the parameter's enum type at
    /// emission time by value name or nickname.
    Named(String),
    /// A value already tied to its enumeration type.
    Typed { ty: &'static EnumType, value: i32 },
}

/// One argument of a binding signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int64(i64),
    Float64(f64),
    String(String),
    Enum(EnumArg),
}

impl Arg {
    pub fn int(value: i64) -> Self {
        Self::Int64(value)
    }

    pub fn float(value: f64) -> Self {
        Self::Float64(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// A boolean, stored as the integers 1 and 0.
    pub fn bool(value: bool) -> Self {
        Self::Int64(i64::from(value))
    }

    /// An enum identifier resolved at emission time.
    pub fn enum_named(ident: impl Into<String>) -> Self {
        Self::Enum(EnumArg::Named(ident.into()))
    }

    /// An enum value of a known type.
    pub fn enum_value(ty: &'static EnumType, value: i32) -> Self {
        Self::Enum(EnumArg::Typed { ty, value })
    }

    /// Short description of the argument's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int64(_) => "integer",
            Self::Float64(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
        }
    }

    /// Convert to a value of the declared parameter type.
    ///
    /// Integers widen to floats and cross signedness when the value fits;
    /// floats never narrow to integers. Returns `None` when the argument is
    /// not representable as `ty`.
    pub fn coerce(&self, ty: ParamType) -> Option<Value> {
        match (self, ty) {
            (Self::Int64(v), ParamType::Bool) => Some(Value::Bool(*v != 0)),
            (Self::Int64(v), ParamType::Int) => i32::try_from(*v).ok().map(Value::Int),
            (Self::Int64(v), ParamType::UInt) => u32::try_from(*v).ok().map(Value::UInt),
            (Self::Int64(v), ParamType::Int64) => Some(Value::Int64(*v)),
            (Self::Int64(v), ParamType::Float) => Some(Value::Float(*v as f32)),
            (Self::Int64(v), ParamType::Double) => Some(Value::Double(*v as f64)),
            (Self::Int64(v), ParamType::Enum(enum_ty)) => {
                let v = i32::try_from(*v).ok()?;
                enum_ty
                    .from_value(v)
                    .map(|e| Value::Enum { ty: enum_ty, value: e.value })
            }
            (Self::Float64(v), ParamType::Float) => Some(Value::Float(*v as f32)),
            (Self::Float64(v), ParamType::Double) => Some(Value::Double(*v)),
            (Self::String(s), ParamType::String) => Some(Value::String(s.clone())),
            (Self::String(s) | Self::Enum(EnumArg::Named(s)), ParamType::Enum(enum_ty)) => enum_ty
                .lookup(s)
                .map(|e| Value::Enum { ty: enum_ty, value: e.value }),
            (Self::Enum(EnumArg::Named(s)), ParamType::String) => Some(Value::String(s.clone())),
            (Self::Enum(EnumArg::Typed { ty: arg_ty, value }), ParamType::Enum(enum_ty))
                if *arg_ty == enum_ty =>
            {
                Some(Value::Enum { ty: enum_ty, value: *value })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    /// Formats the argument in binding grammar syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            // Debug formatting keeps a decimal point so the value re-parses as a float.
            Self::Float64(v) => write!(f, "{v:?}"),
            Self::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Self::Enum(EnumArg::Named(name)) => f.write_str(name),
            Self::Enum(EnumArg::Typed { ty, value }) => match ty.from_value(*value) {
                Some(v) => f.write_str(v.name),
                None => write!(f, "{value}"),
            },
        }
    }
}

/// A named signal emission with its arguments, as stored in a binding entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    signal_name: String,
    args: Vec<Arg>,
}

impl SignalSpec {
    pub fn new(signal_name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            signal_name: signal_name.into(),
            args,
        }
    }

    /// Start building a signal description argument by argument.
    pub fn builder(signal_name: impl Into<String>) -> SignalBuilder {
        SignalBuilder {
            spec: Self::new(signal_name, Vec::new()),
        }
    }

    pub fn signal_name(&self) -> &str {
        &self.signal_name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Number of arguments.
    pub fn n_args(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for SignalSpec {
    /// Formats as `name (arg, arg)`, the form the grammar parses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.signal_name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Accumulates typed arguments for a [`SignalSpec`].
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    spec: SignalSpec,
}

impl SignalBuilder {
    pub fn arg(mut self, arg: Arg) -> Self {
        self.spec.args.push(arg);
        self
    }

    /// Append every argument of a slice.
    pub fn args(mut self, args: &[Arg]) -> Self {
        self.spec.args.extend_from_slice(args);
        self
    }

    pub fn int(self, value: i64) -> Self {
        self.arg(Arg::int(value))
    }

    pub fn float(self, value: f64) -> Self {
        self.arg(Arg::float(value))
    }

    pub fn bool(self, value: bool) -> Self {
        self.arg(Arg::bool(value))
    }

    pub fn string(self, value: impl Into<String>) -> Self {
        self.arg(Arg::string(value))
    }

    pub fn enum_named(self, ident: impl Into<String>) -> Self {
        self.arg(Arg::enum_named(ident))
    }

    pub fn enum_value(self, ty: &'static EnumType, value: i32) -> Self {
        self.arg(Arg::enum_value(ty, value))
    }

    pub fn build(self) -> SignalSpec {
        self.spec
    }
}

impl From<SignalBuilder> for SignalSpec {
    fn from(builder: SignalBuilder) -> Self {
        builder.build()
    }
}
