//! Game-side renderers built on top of the graphics layer.

pub mod axis_lines;
pub mod isometric;

pub use axis_lines::AxisLinesRenderer;
pub use isometric::{BlockFaces, IsometricDrawer, UvRect};
