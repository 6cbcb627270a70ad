//! Rasterization of figure marks into a framebuffer.
//!
//! # Algorithms
//!
//! - **Wu's Anti-aliased Line**: Smooth line rendering with sub-pixel accuracy
//! - **Bresenham's Line**: Fast non-antialiased line drawing
//! - **Liang-Barsky**: Segment clipping against the axes area
//! - **Even-odd scanline fill**: Markers and bar segments
//!
//! # References
//!
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.
//! - Bresenham, J. E. (1965). "Algorithm for computer control of a digital plotter."
//! - Liang, Y. D., & Barsky, B. A. (1984). "A new concept and method for line clipping."

mod primitives;

pub use primitives::{
    circle_polygon, clip_line, draw_dashed_line, draw_line, draw_line_aa, draw_rect, fill_polygon,
    flatten_quadratic, Drawable,
};
