//! Chart aggregate: axes, series, the host capability surface and the
//! primitive extension points.

pub mod gaps;
pub mod host;
pub mod price_scale;
pub mod primitive;
pub mod series;
pub mod time_scale;
pub mod tooltip;

pub use gaps::*;
pub use host::*;
pub use price_scale::*;
pub use primitive::*;
pub use series::*;
pub use time_scale::*;
pub use tooltip::*;
