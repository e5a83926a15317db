//! Domain entity definitions.

mod attachment;
mod cache_key;
mod media_view;

pub use attachment::{AttachmentKind, AttachmentMeta, MediaAttachment, MediaDimensions};
pub use cache_key::{CACHE_FILE_EXTENSION, CacheKey, CachePurpose, disk_file_name};
pub use media_view::{InlineImage, MediaView, Placeholder, PlaceholderKind, SizeHint};
