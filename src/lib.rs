//! Software rasterizer for the HTML5 2D canvas drawing model.
//!
//! This crate implements the drawing-model subset of the W3C HTML5 2D
//! Canvas specification as a self-contained library:
//! - analytic polygon rasterization with 16x supersampled scanline
//!   coverage and nonzero winding
//! - path flattening of Bezier curves and circular arcs
//! - stroke expansion with dashing, caps, joins and miter limits
//! - compositing in linear premultiplied RGBA with the Porter-Duff
//!   operators, soft clipping, and Gaussian-approximating shadow blur
//! - solid, gradient and pattern paints
//! - a minimal TrueType reader for text paths
//!
//! Rendering is deterministic and fully synchronous; pixels are
//! retrieved as 8-bit sRGB RGBA.
//!
//! # Example
//!
//! ```rust
//! use canvas2d_raster::{Canvas, RectParams, StyleTarget};
//!
//! let mut canvas = Canvas::new(256, 256).unwrap();
//! canvas.set_color(StyleTarget::Fill, 1.0, 0.0, 0.0, 1.0);
//! canvas.fill_rectangle(&RectParams { x: 16.0, y: 16.0, width: 224.0, height: 224.0 });
//!
//! let mut pixels = vec![0u8; 256 * 256 * 4];
//! canvas.get_image_data(&mut pixels, 256, 256, 256 * 4, 0, 0);
//! assert_eq!(&pixels[(128 * 256 + 128) * 4..(128 * 256 + 128) * 4 + 4], &[255, 0, 0, 255]);
//! ```

mod arc;
mod color;
mod compositor;
mod context;
mod drawing_state;
mod error;
mod font;
mod geometry;
mod gradient;
mod matrix;
mod path;
mod pattern;
mod raster;
mod shadow;
mod stroke;
mod style;

// Re-export public API
pub use context::Canvas;
pub use error::{CanvasError, CanvasResult};
pub use geometry::{
    ArcParams, ArcToParams, CubicBezierParams, Point, QuadraticBezierParams, RadialGradientParams,
    RectParams,
};
pub use matrix::Matrix;
pub use style::{
    CompositeOperation, LineCap, LineJoin, Repetition, StyleTarget, TextAlign, TextBaseline,
};
