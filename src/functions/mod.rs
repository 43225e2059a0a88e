// Numeric and symbolic routines, one module per calculation family
pub mod calculus;
pub mod integration;
pub mod limit;
pub mod plot;
pub mod real_numbers;

pub use calculus::{Derivative, antiderivative, derivative_chain, differentiate, simplify};
pub use integration::*;
pub use limit::*;
pub use plot::*;
pub use real_numbers::*;
