//! Market data aggregate: bars, sentiment points, request/response shapes.

pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use repositories::*;
pub use value_objects::*;
