pub mod error;
pub mod geometry;
pub mod graphic;
pub mod spatial;
pub mod symbol;

pub use error::*;
pub use geometry::*;
pub use graphic::*;
pub use spatial::*;
pub use symbol::*;
