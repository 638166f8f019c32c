//! Observer Callbacks
//!
//! Observers are plain closures or functions taking the payload's elements as
//! individual arguments. [`Callback`] ties a closure to its payload tuple so the
//! engine can derive the signature at registration; [`erase`] then hides the
//! concrete type behind a shared, object-safe function.

use std::any::Any;
use std::sync::Arc;

use log::error;

use crate::notifications::signature::Payload;

/// Type-erased observer callback as stored by the registry
pub(crate) type ErasedCallback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// A callable that accepts the payload tuple `Args`.
///
/// Implemented for every `Fn(A1, .., An) -> R + Send + Sync + 'static` with up to
/// eight arguments. The return value is discarded.
pub trait Callback<Args>: Send + Sync + 'static {
    fn invoke(&self, args: Args);
}

macro_rules! impl_callback_for_fns {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg),*> Callback<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            fn invoke(&self, args: ($($arg,)*)) {
                let ($($arg,)*) = args;
                let _ = (self)($($arg),*);
            }
        }
    };
}

impl_callback_for_fns!();
impl_callback_for_fns!(A1);
impl_callback_for_fns!(A1, A2);
impl_callback_for_fns!(A1, A2, A3);
impl_callback_for_fns!(A1, A2, A3, A4);
impl_callback_for_fns!(A1, A2, A3, A4, A5);
impl_callback_for_fns!(A1, A2, A3, A4, A5, A6);
impl_callback_for_fns!(A1, A2, A3, A4, A5, A6, A7);
impl_callback_for_fns!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Wrap a typed callback so it can be stored next to callbacks of other shapes.
///
/// The registry only hands a payload to a callback whose signature matched, so
/// a failed downcast means the registry invariant is broken.
pub(crate) fn erase<Args, C>(callback: C) -> ErasedCallback
where
    Args: Payload,
    C: Callback<Args>,
{
    Arc::new(move |payload: &dyn Any| match payload.downcast_ref::<Args>() {
        Some(args) => callback.invoke(args.clone()),
        None => error!(
            "Observer for {} received a payload of a different type",
            std::any::type_name::<Args>()
        ),
    })
}
