mod media_view;

pub use media_view::{MAX_IMAGE_ROWS, MediaViewStyle, MediaViewWidget};
