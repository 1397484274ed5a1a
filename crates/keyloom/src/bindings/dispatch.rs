//! The signal dispatch adapter.
//!
//! Turns a stored [`SignalSpec`] into a typed emission on a target object.
//! The host object system is reached only through [`SignalHost`].

use keyloom_core::{ClassId, ObjectId, ParamType, ReturnType, SignalSignature, Value};
use thiserror::Error;

use super::arg::SignalSpec;

/// The capabilities the binding engine needs from a host object system.
pub trait SignalHost {
    /// The target's class chain, most-derived first, ending in the universal base.
    fn class_chain(&self, target: ObjectId) -> Vec<ClassId>;

    /// The signature of `name` as registered on the target's class chain.
    fn find_signal(&self, target: ObjectId, name: &str) -> Option<&SignalSignature>;

    /// Run the handler for `name` on `target` with already-coerced arguments.
    ///
    /// Returns the handler's boolean result; hosts return `true` for signals
    /// without a return value.
    fn emit_signal(&mut self, target: ObjectId, name: &str, args: &[Value]) -> bool;
}

/// Why a binding signal could not be emitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("signal '{0}' is not registered on the target's class chain")]
    UnknownSignal(String),
    #[error("signal '{0}' is not an action signal")]
    NotAction(String),
    #[error("signal '{signal}' takes {expected} argument(s), binding supplies {got}")]
    ArgumentArity {
        signal: String,
        expected: usize,
        got: usize,
    },
    #[error("argument {index} of signal '{signal}': cannot convert {got} to {expected}")]
    ArgumentType {
        signal: String,
        index: usize,
        expected: ParamType,
        got: &'static str,
    },
}

/// Validate `spec` against the target's registered signature and emit it.
///
/// Returns whether the emission counts as handled: always for signals with
/// no return value, and only on a `true` return for boolean signals.
#[tracing::instrument(skip(host), target = "keyloom::bindings", level = "trace", fields(signal = spec.signal_name()))]
pub fn emit<H: SignalHost + ?Sized>(
    host: &mut H,
    target: ObjectId,
    spec: &SignalSpec,
) -> Result<bool, DispatchError> {
    let name = spec.signal_name();
    let (values, returns) = {
        let signature = host
            .find_signal(target, name)
            .ok_or_else(|| DispatchError::UnknownSignal(name.to_string()))?;
        if !signature.is_action() {
            return Err(DispatchError::NotAction(name.to_string()));
        }
        if signature.arity() != spec.n_args() {
            return Err(DispatchError::ArgumentArity {
                signal: name.to_string(),
                expected: signature.arity(),
                got: spec.n_args(),
            });
        }
        let values = spec
            .args()
            .iter()
            .zip(signature.params())
            .enumerate()
            .map(|(index, (arg, &ty))| {
                arg.coerce(ty).ok_or_else(|| DispatchError::ArgumentType {
                    signal: name.to_string(),
                    index,
                    expected: ty,
                    got: arg.kind(),
                })
            })
            .collect::<Result<Vec<Value>, _>>()?;
        (values, signature.returns())
    };

    let result = host.emit_signal(target, name, &values);
    Ok(match returns {
        ReturnType::None => true,
        ReturnType::Bool => result,
    })
}
