//! Capability registry: the closed table of operations an algorithm exposes.
//!
//! Each entry is keyed by name plus the ordered primitive kinds of its
//! parameters, and carries a typed callable. Resolution filters by name,
//! then arity, then an exact kind match per argument (no widening between
//! `int` and `float`). The first entry in registration order that survives
//! the filters wins.
//!
//! ```
//! use signal_dispatch_bot::registry::CapabilityRegistry;
//! use signal_dispatch_bot::types::ParamValue;
//!
//! struct Algo;
//! impl Algo {
//!     fn cancel_trades(&self) {}
//!     fn do_algo(&self) {}
//!     fn set_algo_param(&self, _param: i32, _value: i32) {}
//! }
//!
//! let registry = CapabilityRegistry::builder()
//!     .action("cancelTrades", Algo::cancel_trades)
//!     .action("doAlgo", Algo::do_algo)
//!     .action("setAlgoParam", Algo::set_algo_param)
//!     .build()
//!     .unwrap();
//! registry
//!     .invoke(&Algo, "setAlgoParam", &[ParamValue::Int(1), ParamValue::Int(60)])
//!     .unwrap();
//! ```

use std::fmt;

use thiserror::Error;

use crate::types::{kinds_of, ParamKind, ParamValue};

/// Zero-argument action run when no rule matches a signal.
pub const FALLBACK_ACTION: &str = "cancelTrades";
/// Zero-argument action run after every successful dispatch.
pub const FINALIZER_ACTION: &str = "doAlgo";

/// Failure raised by a capability while it runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct InvocationError {
    message: String,
}

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no capability named {method}")]
    CapabilityNotFound { method: String },
    #[error("no overload of {method} accepts {arity} argument(s) ({})", fmt_kinds(.kinds))]
    ArgumentMismatch {
        method: String,
        arity: usize,
        kinds: Vec<ParamKind>,
    },
    #[error("{method} failed: {source}")]
    InvocationFailed {
        method: String,
        #[source]
        source: InvocationError,
    },
}

impl ActionError {
    pub fn method(&self) -> &str {
        match self {
            ActionError::CapabilityNotFound { method }
            | ActionError::ArgumentMismatch { method, .. }
            | ActionError::InvocationFailed { method, .. } => method,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("required zero-argument capability {0} is not registered")]
    MissingRequired(&'static str),
    #[error("capability {name}({}) registered more than once", fmt_kinds(.kinds))]
    Duplicate { name: String, kinds: Vec<ParamKind> },
}

fn fmt_kinds(kinds: &[ParamKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A Rust type a configured argument can be handed to a capability as.
pub trait FromParam: Sized {
    const KIND: ParamKind;

    fn from_param(value: &ParamValue) -> Option<Self>;
}

impl FromParam for i64 {
    const KIND: ParamKind = ParamKind::Int;

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParam for i32 {
    const KIND: ParamKind = ParamKind::Int;

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromParam for f64 {
    const KIND: ParamKind = ParamKind::Float;

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParam for bool {
    const KIND: ParamKind = ParamKind::Bool;

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParam for String {
    const KIND: ParamKind = ParamKind::Str;

    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Return types a capability may have.
pub trait IntoInvocationResult {
    fn into_invocation_result(self) -> Result<(), InvocationError>;
}

impl IntoInvocationResult for () {
    fn into_invocation_result(self) -> Result<(), InvocationError> {
        Ok(())
    }
}

impl<E: fmt::Display> IntoInvocationResult for Result<(), E> {
    fn into_invocation_result(self) -> Result<(), InvocationError> {
        self.map_err(|e| InvocationError::new(e.to_string()))
    }
}

/// Typed callables that can be registered as capabilities of `A`.
///
/// Implemented for `Fn(&A, T1, .., Tn) -> R` with up to four `FromParam`
/// arguments; `Args` is the tuple of argument types and only exists to keep
/// the impls apart.
pub trait Handler<A, Args>: Send + Sync + 'static {
    fn kinds() -> Vec<ParamKind>;

    fn call(&self, algo: &A, args: &[ParamValue]) -> Result<(), InvocationError>;
}

fn take_arg<'a, T: FromParam>(
    args: &mut std::iter::Enumerate<std::slice::Iter<'a, ParamValue>>,
) -> Result<T, InvocationError> {
    let (idx, value) = args
        .next()
        .ok_or_else(|| InvocationError::new("missing argument"))?;
    T::from_param(value).ok_or_else(|| {
        InvocationError::new(format!("argument {idx} ({value}) does not fit a {} parameter", T::KIND))
    })
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<A, F, R, $($ty,)*> Handler<A, ($($ty,)*)> for F
        where
            F: Fn(&A, $($ty,)*) -> R + Send + Sync + 'static,
            R: IntoInvocationResult,
            $($ty: FromParam,)*
        {
            fn kinds() -> Vec<ParamKind> {
                vec![$($ty::KIND),*]
            }

            fn call(&self, algo: &A, args: &[ParamValue]) -> Result<(), InvocationError> {
                let mut args = args.iter().enumerate();
                $(let $ty = take_arg::<$ty>(&mut args)?;)*
                (self)(algo, $($ty,)*).into_invocation_result()
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);

type BoxedCall<A> = Box<dyn Fn(&A, &[ParamValue]) -> Result<(), InvocationError> + Send + Sync>;

pub struct Capability<A> {
    name: String,
    kinds: Vec<ParamKind>,
    call: BoxedCall<A>,
}

impl<A> Capability<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    pub fn arity(&self) -> usize {
        self.kinds.len()
    }

    /// `name(kind, ..)`, used in logs and listings.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, fmt_kinds(&self.kinds))
    }

    fn accepts(&self, args: &[ParamValue]) -> bool {
        self.arity() == args.len()
            && self.kinds.iter().zip(args).all(|(k, a)| *k == a.kind())
    }

    pub fn call(&self, algo: &A, args: &[ParamValue]) -> Result<(), InvocationError> {
        (self.call)(algo, args)
    }
}

impl<A> fmt::Debug for Capability<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("kinds", &self.kinds)
            .finish()
    }
}

pub struct CapabilityRegistry<A> {
    capabilities: Vec<Capability<A>>,
}

impl<A: 'static> CapabilityRegistry<A> {
    pub fn builder() -> RegistryBuilder<A> {
        RegistryBuilder {
            capabilities: Vec::new(),
        }
    }
}

impl<A> CapabilityRegistry<A> {
    /// Find the capability that accepts `args` under `name`.
    pub fn resolve(&self, name: &str, args: &[ParamValue]) -> Result<&Capability<A>, ActionError> {
        let mut named = self.capabilities.iter().filter(|c| c.name == name).peekable();
        if named.peek().is_none() {
            return Err(ActionError::CapabilityNotFound {
                method: name.to_owned(),
            });
        }
        named.find(|c| c.accepts(args)).ok_or_else(|| {
            tracing::debug!(method = name, arity = args.len(), "no overload matches arguments");
            ActionError::ArgumentMismatch {
                method: name.to_owned(),
                arity: args.len(),
                kinds: kinds_of(args),
            }
        })
    }

    /// Resolve then call.
    pub fn invoke(&self, algo: &A, name: &str, args: &[ParamValue]) -> Result<(), ActionError> {
        let capability = self.resolve(name, args)?;
        capability
            .call(algo, args)
            .map_err(|source| ActionError::InvocationFailed {
                method: name.to_owned(),
                source,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &Capability<A>> {
        self.capabilities.iter()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl<A> fmt::Debug for CapabilityRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.capabilities.iter().map(Capability::signature))
            .finish()
    }
}

pub struct RegistryBuilder<A> {
    capabilities: Vec<Capability<A>>,
}

impl<A: 'static> RegistryBuilder<A> {
    pub fn action<H, Args>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<A, Args>,
    {
        self.capabilities.push(Capability {
            name: name.into(),
            kinds: H::kinds(),
            call: Box::new(move |algo: &A, args: &[ParamValue]| handler.call(algo, args)),
        });
        self
    }

    pub fn build(self) -> Result<CapabilityRegistry<A>, RegistryError> {
        for (i, cap) in self.capabilities.iter().enumerate() {
            let dup = self.capabilities[..i]
                .iter()
                .any(|prev| prev.name == cap.name && prev.kinds == cap.kinds);
            if dup {
                return Err(RegistryError::Duplicate {
                    name: cap.name.clone(),
                    kinds: cap.kinds.clone(),
                });
            }
        }
        for required in [FALLBACK_ACTION, FINALIZER_ACTION] {
            let present = self
                .capabilities
                .iter()
                .any(|c| c.name == required && c.kinds.is_empty());
            if !present {
                return Err(RegistryError::MissingRequired(required));
            }
        }
        Ok(CapabilityRegistry {
            capabilities: self.capabilities,
        })
    }
}
