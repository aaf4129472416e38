pub mod contracts;
pub mod error;
pub mod preview;
pub mod runtime;

pub use contracts::*;
pub use error::RuntimeError;
pub use preview::*;
pub use runtime::*;
