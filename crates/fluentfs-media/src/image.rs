//! Image capability for files: metadata, resizing, transcoding and
//! perceptual hashing.

use std::path::Path;

use fluentfs_core::{Codec, File, FindOptions, Folder, FsResult, PhashString};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{MediaError, MediaResult};
use crate::hash::perceptual_hash;

/// Extensions treated as images by [`find_image_files`]: the formats this
/// crate can decode.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "tiff", "tif",
];

/// Returns `true` if the path has a recognised image extension.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Metadata extracted from an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub color_type: String,
    pub file_size: u64,
}

/// Target size for [`Image::resize`].
///
/// With only one side given the other keeps the aspect ratio. With neither,
/// the image keeps its size.
#[derive(Debug, Clone, Default)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Base name of the output file; defaults to `<base>_<w>x<h>`.
    pub new_name: Option<String>,
}

impl ResizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn new_name(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }
}

/// A file viewed as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    file: File,
}

/// Adds [`ImageExt::image`] to every file.
pub trait ImageExt {
    fn image(&self) -> Image;
}

impl<C: Codec> ImageExt for File<C> {
    fn image(&self) -> Image {
        Image { file: self.text() }
    }
}

impl Image {
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Dimensions, format, colour type and size on disk.
    ///
    /// # Errors
    ///
    /// [`MediaError::Fs`] if the file is missing, [`MediaError::Image`] if it
    /// cannot be decoded.
    pub async fn metadata(&self) -> MediaResult<ImageInfo> {
        let file_size = self.file.stat().await?.len();
        let format = ImageFormat::from_path(self.file.path())
            .map(|f| format!("{f:?}"))
            .unwrap_or_else(|_| "Unknown".to_string());
        let image = self.decode().await?;
        Ok(ImageInfo {
            width: image.width(),
            height: image.height(),
            format,
            color_type: format!("{:?}", image.color()),
            file_size,
        })
    }

    /// Writes a resized copy next to the source, in the source's format.
    pub async fn resize(&self, options: &ResizeOptions) -> MediaResult<File> {
        let image = self.decode().await?;
        let (width, height) = target_size(image.width(), image.height(), options);
        let base_name = options
            .new_name
            .clone()
            .unwrap_or_else(|| format!("{}_{width}x{height}", self.file.base_name()));
        let output = self.file.with_base_name(&base_name);
        let format = ImageFormat::from_path(self.file.path()).map_err(|source| MediaError::Image {
            path: self.file.path().to_path_buf(),
            source,
        })?;

        let path = output.path().to_path_buf();
        tokio::task::spawn_blocking(move || {
            let resized = image.resize_exact(width, height, FilterType::Lanczos3);
            encode(&resized, &path, format)
        })
        .await??;

        tracing::debug!(source = %self.file.path().display(), output = %output.path().display(), width, height, "resized image");
        Ok(output)
    }

    /// Re-encodes the image as `format`, next to the source.
    ///
    /// The output keeps the source's base name unless `new_name` is given.
    pub async fn transcode(&self, format: ImageFormat, new_name: Option<&str>) -> MediaResult<File> {
        let image = self.decode().await?;
        let extension = format.extensions_str().first().copied().unwrap_or_default();
        let base_name = new_name.unwrap_or(self.file.base_name());
        let output = self.file.with_name(&format!("{base_name}.{extension}"));

        let path = output.path().to_path_buf();
        tokio::task::spawn_blocking(move || encode(&image, &path, format)).await??;

        tracing::debug!(source = %self.file.path().display(), output = %output.path().display(), ?format, "transcoded image");
        Ok(output)
    }

    /// The image's 64-bit DCT perceptual hash.
    pub async fn phash(&self) -> MediaResult<PhashString> {
        let image = self.decode().await?;
        Ok(tokio::task::spawn_blocking(move || perceptual_hash(&image)).await?)
    }

    async fn decode(&self) -> MediaResult<DynamicImage> {
        self.file.stat().await?;
        let path = self.file.path().to_path_buf();
        tokio::task::spawn_blocking(move || {
            image::open(&path).map_err(|source| MediaError::Image { path, source })
        })
        .await?
    }
}

fn target_size(width: u32, height: u32, options: &ResizeOptions) -> (u32, u32) {
    let scaled = |side: u32, from: u32, to: u32| -> u32 {
        let value = (u64::from(side) * u64::from(to) + u64::from(from) / 2) / u64::from(from.max(1));
        u32::try_from(value.max(1)).unwrap_or(u32::MAX)
    };
    match (options.width, options.height) {
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
        (Some(w), None) => (w.max(1), scaled(height, width, w)),
        (None, Some(h)) => (scaled(width, height, h), h.max(1)),
        (None, None) => (width, height),
    }
}

fn encode(image: &DynamicImage, path: &Path, format: ImageFormat) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| MediaError::Image {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(source),
        })?;
    }
    let result = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format),
        _ => image.save_with_format(path, format),
    };
    result.map_err(|source| MediaError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Image files below `folder`, sorted by path.
///
/// Extensions are matched case-insensitively.
pub async fn find_image_files(folder: &Folder) -> FsResult<Vec<Image>> {
    let files = folder.find_files(&FindOptions::new()).await?;
    Ok(files
        .iter()
        .filter(|file| is_image(file.path()))
        .map(ImageExt::image)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentfs_core::{compare_phashes, phashes_match, PhashThreshold, Similarity};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, 128])
        })
    }

    fn save(tmp: &TempDir, name: &str, image: &RgbImage) -> File {
        let path = tmp.path().join(name);
        image.save(&path).unwrap();
        Folder::new(tmp.path()).unwrap().file(name)
    }

    #[test]
    fn recognises_image_extensions() {
        assert!(is_image(Path::new("photo.JPG")));
        assert!(is_image(Path::new("/a/b.webp")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("Makefile")));
        assert!(!is_image(Path::new("logo.svg")));
        assert!(!is_image(Path::new("photo.avif")));
    }

    #[test]
    fn every_listed_extension_is_decodable() {
        for ext in IMAGE_EXTENSIONS {
            let format = ImageFormat::from_extension(ext).unwrap();
            assert!(format.reading_enabled(), "{ext} cannot be decoded");
        }
    }

    #[test]
    fn target_size_keeps_aspect_ratio() {
        let only_width = ResizeOptions::new().width(50);
        assert_eq!(target_size(200, 100, &only_width), (50, 25));
        let only_height = ResizeOptions::new().height(10);
        assert_eq!(target_size(200, 100, &only_height), (20, 10));
        let both = ResizeOptions::new().width(7).height(9);
        assert_eq!(target_size(200, 100, &both), (7, 9));
        assert_eq!(target_size(200, 100, &ResizeOptions::new()), (200, 100));
    }

    #[tokio::test]
    async fn metadata_reports_dimensions_and_format() {
        let tmp = TempDir::new().unwrap();
        let file = save(&tmp, "wide.png", &gradient(64, 32));
        let info = file.image().metadata().await.unwrap();
        assert_eq!(info.width, 64);
        assert_eq!(info.height, 32);
        assert_eq!(info.format, "Png");
        assert_eq!(info.color_type, "Rgb8");
        assert!(info.file_size > 0);
    }

    #[tokio::test]
    async fn metadata_of_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let file = Folder::new(tmp.path()).unwrap().file("ghost.png");
        match file.image().metadata().await.unwrap_err() {
            MediaError::Fs(err) => assert!(err.is_not_found()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_file_is_an_image_error() {
        let tmp = TempDir::new().unwrap();
        let file = Folder::new(tmp.path()).unwrap().file("broken.png");
        file.write_text("not an image").await.unwrap();
        assert!(matches!(
            file.image().metadata().await.unwrap_err(),
            MediaError::Image { .. }
        ));
    }

    #[tokio::test]
    async fn resize_writes_sibling() {
        let tmp = TempDir::new().unwrap();
        let file = save(&tmp, "photo.png", &gradient(80, 40));
        let resized = file
            .image()
            .resize(&ResizeOptions::new().width(20))
            .await
            .unwrap();
        assert_eq!(resized.name(), "photo_20x10.png");
        let info = resized.image().metadata().await.unwrap();
        assert_eq!((info.width, info.height), (20, 10));
    }

    #[tokio::test]
    async fn resize_honours_new_name() {
        let tmp = TempDir::new().unwrap();
        let file = save(&tmp, "photo.png", &gradient(30, 30));
        let resized = file
            .image()
            .resize(&ResizeOptions::new().height(15).new_name("thumb"))
            .await
            .unwrap();
        assert_eq!(resized.name(), "thumb.png");
        assert!(resized.exists().await);
    }

    #[tokio::test]
    async fn transcode_changes_extension() {
        let tmp = TempDir::new().unwrap();
        let file = save(&tmp, "photo.png", &gradient(16, 16));
        let jpeg = file.image().transcode(ImageFormat::Jpeg, None).await.unwrap();
        assert_eq!(jpeg.name(), "photo.jpg");
        assert_eq!(jpeg.image().metadata().await.unwrap().format, "Jpeg");

        let bmp = file
            .image()
            .transcode(ImageFormat::Bmp, Some("copy"))
            .await
            .unwrap();
        assert_eq!(bmp.name(), "copy.bmp");
    }

    fn blocks(seed: u32, size: u32, shift: u8) -> RgbImage {
        let mut state = seed;
        let mut levels = Vec::new();
        for _ in 0..64 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            levels.push(20 + ((state >> 16) % 200) as u8);
        }
        let block = size / 8;
        RgbImage::from_fn(size, size, |x, y| {
            let level = levels[((y / block) * 8 + x / block) as usize] + shift;
            Rgb([level; 3])
        })
    }

    #[tokio::test]
    async fn phash_is_stable_and_tolerates_small_changes() {
        let tmp = TempDir::new().unwrap();
        let original = save(&tmp, "a.png", &blocks(7, 128, 0));
        let again = save(&tmp, "b.png", &blocks(7, 128, 0));
        let brighter = save(&tmp, "c.png", &blocks(7, 128, 3));

        let a = original.image().phash().await.unwrap();
        let b = again.image().phash().await.unwrap();
        let c = brighter.image().phash().await.unwrap();

        assert_eq!(compare_phashes(a, b, PhashThreshold::default()).level, Similarity::Same);
        assert!(phashes_match(a, c, PhashThreshold::default()));
    }

    #[tokio::test]
    async fn phash_separates_different_pictures() {
        let tmp = TempDir::new().unwrap();
        let first = save(&tmp, "first.png", &blocks(7, 64, 0));
        let second = save(&tmp, "second.png", &blocks(99, 64, 0));
        let a = first.image().phash().await.unwrap();
        let b = second.image().phash().await.unwrap();
        assert_eq!(
            compare_phashes(a, b, PhashThreshold::default()).level,
            Similarity::Different
        );
    }

    #[tokio::test]
    async fn finds_only_image_files() {
        let tmp = TempDir::new().unwrap();
        save(&tmp, "one.png", &gradient(4, 4));
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        save(&tmp, "nested/two.bmp", &gradient(4, 4));
        save(&tmp, "LOUD.PNG", &gradient(4, 4));
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();

        let images = find_image_files(&Folder::new(tmp.path()).unwrap()).await.unwrap();
        let names: Vec<_> = images.iter().map(|i| i.file().name()).collect();
        assert_eq!(names, ["LOUD.PNG", "two.bmp", "one.png"]);
    }
}
