//! Domain models for the petclinic system.

mod change;
mod interval;
mod pet;
mod staff;
mod visit;

pub use change::*;
pub use interval::*;
pub use pet::*;
pub use staff::*;
pub use visit::*;
