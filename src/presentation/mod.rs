//! Presentation layer: widgets and terminal output.

/// Off-screen rendering and terminal output.
pub mod render;
/// Reusable widgets.
pub mod widgets;

pub use render::{buffer_lines, render_view, write_buffer};
pub use widgets::{MediaViewStyle, MediaViewWidget};
