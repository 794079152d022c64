//! Argument tuples for calls into the runtime.

use foreignbind_core::{ConversionError, Dynamic, IntoSlot, ObjectHeap};

/// A tuple of values passed as call arguments.
///
/// Each element crosses the boundary with the passing mode its type selects,
/// in order, after the receiver in slot 0.
pub trait IntoArgs {
    const COUNT: usize;

    fn into_args(self, heap: &mut ObjectHeap) -> Result<Vec<Dynamic>, ConversionError>;
}

impl IntoArgs for () {
    const COUNT: usize = 0;

    fn into_args(self, _heap: &mut ObjectHeap) -> Result<Vec<Dynamic>, ConversionError> {
        Ok(Vec::new())
    }
}

macro_rules! impl_into_args {
    ($count:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: IntoSlot),+> IntoArgs for ($($name,)+) {
            const COUNT: usize = $count;

            fn into_args(self, heap: &mut ObjectHeap) -> Result<Vec<Dynamic>, ConversionError> {
                Ok(vec![$(self.$idx.into_slot(heap)?),+])
            }
        }
    };
}

impl_into_args!(1; A0 0);
impl_into_args!(2; A0 0, A1 1);
impl_into_args!(3; A0 0, A1 1, A2 2);
impl_into_args!(4; A0 0, A1 1, A2 2, A3 3);
impl_into_args!(5; A0 0, A1 1, A2 2, A3 3, A4 4);
impl_into_args!(6; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
