//! Image and video capabilities for fluentfs files.
//!
//! Any [`fluentfs_core::File`] becomes an [`Image`] or a [`Video`] through
//! the [`ImageExt`] and [`VideoExt`] traits. Images are decoded in-process;
//! video work shells out to `ffprobe` and `ffmpeg`, which must be on `PATH`.

pub mod error;
pub mod hash;
pub mod image;
pub mod video;

pub use self::error::{MediaError, MediaResult};
pub use self::hash::perceptual_hash;
pub use self::image::{
    find_image_files, is_image, Image, ImageExt, ImageInfo, ResizeOptions, IMAGE_EXTENSIONS,
};
pub use self::video::{
    find_video_files, is_video, FrameOptions, Video, VideoExt, VideoMetadata, VideoMetadataSchema,
    VIDEO_EXTENSIONS,
};
