//! Payload Type Signatures
//!
//! A topic accepts exactly one payload shape. The shape is captured as a
//! [`TypeSignature`]: the ordered list of argument types of the payload tuple.
//! Comparison is by `TypeId` only; type names are carried for diagnostics.
//!
//! Borrow and ownership qualifiers are part of a Rust type's identity, so
//! `(i32,)`, `(&'static i32,)` and `(Arc<i32>,)` are three different signatures.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical descriptor of one argument type
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Ordered sequence of argument type descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeSignature {
    descriptors: Vec<TypeDescriptor>,
}

impl TypeSignature {
    pub fn from_descriptors(descriptors: Vec<TypeDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn arity(&self) -> usize {
        self.descriptors.len()
    }

    pub fn descriptors(&self) -> &[TypeDescriptor] {
        &self.descriptors
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", descriptor.name)?;
        }
        write!(f, ")")
    }
}

/// A notification payload: a tuple of owned, cloneable, sendable arguments.
///
/// Implemented for tuples of up to eight elements, including the empty tuple
/// for notifications that carry nothing.
pub trait Payload: Clone + Send + 'static {
    fn signature() -> TypeSignature;
}

/// Signature of the payload tuple `Args`
pub fn signature_of<Args: Payload>() -> TypeSignature {
    Args::signature()
}

macro_rules! impl_payload_for_tuples {
    ($($arg:ident),*) => {
        impl<$($arg: Clone + Send + 'static),*> Payload for ($($arg,)*) {
            fn signature() -> TypeSignature {
                TypeSignature::from_descriptors(vec![$(TypeDescriptor::of::<$arg>()),*])
            }
        }
    };
}

impl_payload_for_tuples!();
impl_payload_for_tuples!(A1);
impl_payload_for_tuples!(A1, A2);
impl_payload_for_tuples!(A1, A2, A3);
impl_payload_for_tuples!(A1, A2, A3, A4);
impl_payload_for_tuples!(A1, A2, A3, A4, A5);
impl_payload_for_tuples!(A1, A2, A3, A4, A5, A6);
impl_payload_for_tuples!(A1, A2, A3, A4, A5, A6, A7);
impl_payload_for_tuples!(A1, A2, A3, A4, A5, A6, A7, A8);
