//! Data transformations applied before fitting.

pub mod boxcox;

pub use boxcox::{boxcox, inv_boxcox, inv_boxcox_biasadj, inv_boxcox_value};
