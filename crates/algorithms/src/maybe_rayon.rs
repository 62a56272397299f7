//! Row iteration that is parallel with the `parallel` feature and
//! sequential without it.
//!
//! Algorithms call `into_par_iter()` on a row range either way; without
//! rayon the call resolves to a plain `IntoIterator`.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub use sequential::IntoParallelIterator;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator: IntoIterator + Sized {
        fn into_par_iter(self) -> Self::IntoIter {
            self.into_iter()
        }
    }

    impl<I: IntoIterator> IntoParallelIterator for I {}
}
