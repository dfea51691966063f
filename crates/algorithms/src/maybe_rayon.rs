//! Row-parallel iteration that degrades to plain iterators.
//!
//! With the `parallel` feature the per-row kernels run on rayon's pool.
//! Without it, `into_par_iter()` is just `into_iter()` and the rest of the
//! chain resolves to `std::iter::Iterator`.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub use sequential::IntoParallelIterator;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter: Iterator<Item = Self::Item>;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}
