use image::DynamicImage;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<DynamicImage, ImageLoadError>;
}

/// Loads images from the local filesystem, sniffing the format from content.
#[derive(Debug, Clone, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Result<DynamicImage, ImageLoadError> {
        if !path.is_file() {
            return Err(ImageLoadError::NotFound(path.to_path_buf()));
        }

        let decode_error = |source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        };

        image::ImageReader::open(path)
            .map_err(|e| decode_error(image::ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| decode_error(image::ImageError::IoError(e)))?
            .decode()
            .map_err(decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsImageLoader.load(&dir.path().join("nope.jpg")).unwrap_err();
        assert!(matches!(err, ImageLoadError::NotFound(_)));
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let err = FsImageLoader.load(&path).unwrap_err();
        assert!(matches!(err, ImageLoadError::Decode { .. }));
    }

    #[test]
    fn test_format_is_sniffed_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.bin");
        GrayImage::from_pixel(4, 3, Luma([200]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let image = FsImageLoader.load(&path).unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
    }
}
