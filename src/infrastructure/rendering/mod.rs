pub mod canvas_chart;
pub mod canvas_surface;
pub mod gap_shading;
pub mod surface;

pub use canvas_chart::CanvasChart;
pub use canvas_surface::Canvas2dSurface;
pub use gap_shading::{DEFAULT_GAP_COLOR, GapShadingPrimitive};
pub use surface::{DrawCall, RecordingSurface};
