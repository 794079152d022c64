//! Adapters turning typed Rust closures into [`NativeFn`]s.
//!
//! The `Args` type parameter is a tuple of the argument types. It only
//! exists to keep the blanket impls for different arities apart.
//!
//! Arguments are converted before the receiver is borrowed, so a method may
//! take another instance of its own class (or the receiver itself) by value.

use foreignbind_core::{CallContext, FromSlot, IntoSlot, NativeFn, TypeHash};

/// A free function or static member.
pub trait IntoFunction<Args> {
    /// The native return type.
    type Output;

    /// Number of arguments.
    const ARITY: usize;

    fn into_native(self, id: TypeHash) -> NativeFn;
}

/// An instance method taking the receiver by shared reference.
pub trait IntoMethod<T, Args> {
    const ARITY: usize;

    fn into_native(self, id: TypeHash) -> NativeFn;
}

/// An instance method taking the receiver by mutable reference.
pub trait IntoMethodMut<T, Args> {
    const ARITY: usize;

    fn into_native(self, id: TypeHash) -> NativeFn;
}

macro_rules! impl_adapters {
    ($arity:literal; $($A:ident $idx:literal),*) => {
        impl<F, R, $($A,)*> IntoFunction<($($A,)*)> for F
        where
            F: Fn($($A),*) -> R + 'static,
            R: IntoSlot,
            $($A: FromSlot,)*
        {
            type Output = R;

            const ARITY: usize = $arity;

            #[allow(non_snake_case)]
            fn into_native(self, id: TypeHash) -> NativeFn {
                NativeFn::new(id, move |ctx: &mut CallContext| {
                    $(let $A: $A = ctx.arg($idx)?;)*
                    let ret = (self)($($A),*);
                    ctx.set_return(ret)
                })
            }
        }

        impl<F, T, R, $($A,)*> IntoMethod<T, ($($A,)*)> for F
        where
            F: Fn(&T, $($A),*) -> R + 'static,
            T: 'static,
            R: IntoSlot,
            $($A: FromSlot,)*
        {
            const ARITY: usize = $arity;

            #[allow(non_snake_case)]
            fn into_native(self, id: TypeHash) -> NativeFn {
                NativeFn::new(id, move |ctx: &mut CallContext| {
                    $(let $A: $A = ctx.arg($idx)?;)*
                    let ret = {
                        let this = ctx.this::<T>()?;
                        (self)(&this, $($A),*)
                    };
                    ctx.set_return(ret)
                })
            }
        }

        impl<F, T, R, $($A,)*> IntoMethodMut<T, ($($A,)*)> for F
        where
            F: Fn(&mut T, $($A),*) -> R + 'static,
            T: 'static,
            R: IntoSlot,
            $($A: FromSlot,)*
        {
            const ARITY: usize = $arity;

            #[allow(non_snake_case)]
            fn into_native(self, id: TypeHash) -> NativeFn {
                NativeFn::new(id, move |ctx: &mut CallContext| {
                    $(let $A: $A = ctx.arg($idx)?;)*
                    let ret = {
                        let mut this = ctx.this_mut::<T>()?;
                        (self)(&mut this, $($A),*)
                    };
                    ctx.set_return(ret)
                })
            }
        }
    };
}

impl_adapters!(0;);
impl_adapters!(1; A0 0);
impl_adapters!(2; A0 0, A1 1);
impl_adapters!(3; A0 0, A1 1, A2 2);
impl_adapters!(4; A0 0, A1 1, A2 2, A3 3);
impl_adapters!(5; A0 0, A1 1, A2 2, A3 3, A4 4);
impl_adapters!(6; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
