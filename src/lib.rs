/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

mod conformance;
mod discrete_laplacian;
mod discrete_laplacian_1d;
mod poisson;
mod variants;
pub use crate::conformance::*;
pub use crate::discrete_laplacian::*;
pub use crate::discrete_laplacian_1d::*;
pub use crate::poisson::*;
pub use crate::variants::*;
