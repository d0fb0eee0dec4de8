//! Image, audio and JSON loading behind a small trait so game code can be
//! exercised without touching the disk.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::app::Color;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset url '{url}' escapes the asset root")]
    InvalidUrl { url: String },
    #[error("failed to read asset '{url}' at {path}: {source}")]
    Read {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to parse json asset '{url}': {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("asset '{url}' is not available")]
    Missing { url: String },
}

struct ImageData {
    url: String,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Decoded RGBA8 image. Cloning is cheap and keeps the source url.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<ImageData>,
}

impl ImageHandle {
    pub fn from_rgba(url: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(ImageData {
                url: url.into(),
                width,
                height,
                rgba,
            }),
        }
    }

    pub fn solid(url: impl Into<String>, width: u32, height: u32, color: Color) -> Self {
        let rgba = color
            .to_rgba()
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba(url, width, height, rgba)
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.inner.rgba
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("url", &self.inner.url)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .finish()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.url == other.inner.url
                && self.inner.width == other.inner.width
                && self.inner.height == other.inner.height)
    }
}

/// Opaque handle to an audio clip. Playback goes through `AudioSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
    url: Arc<str>,
    byte_len: usize,
}

impl AudioHandle {
    pub fn new(url: &str, byte_len: usize) -> Self {
        Self {
            url: Arc::from(url),
            byte_len,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

pub trait AssetLoader {
    fn load_image(&mut self, url: &str) -> Result<ImageHandle, AssetError>;
    fn load_audio(&mut self, url: &str) -> Result<AudioHandle, AssetError>;
    fn load_object(&mut self, url: &str) -> Result<Value, AssetError>;

    fn load_images(&mut self, urls: &[String]) -> Result<Vec<ImageHandle>, AssetError> {
        urls.iter().map(|url| self.load_image(url)).collect()
    }
}

/// Loads assets from a directory, caching decoded images by url.
#[derive(Debug)]
pub struct FsAssetLoader {
    root: PathBuf,
    images: HashMap<String, ImageHandle>,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(url.trim_start_matches("./"));
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || url.is_empty() {
            return Err(AssetError::InvalidUrl {
                url: url.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn read(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.resolve(url)?;
        fs::read(&path).map_err(|source| AssetError::Read {
            url: url.to_string(),
            path,
            source,
        })
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_image(&mut self, url: &str) -> Result<ImageHandle, AssetError> {
        if let Some(cached) = self.images.get(url) {
            return Ok(cached.clone());
        }

        let path = self.resolve(url)?;
        let reader = ImageReader::open(&path).map_err(|source| AssetError::Read {
            url: url.to_string(),
            path: path.clone(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| AssetError::Decode {
            url: url.to_string(),
            source,
        })?;
        let image = decoded.to_rgba8();
        let handle = ImageHandle::from_rgba(url, image.width(), image.height(), image.into_raw());
        debug!(
            url,
            width = handle.width(),
            height = handle.height(),
            "image_loaded"
        );
        self.images.insert(url.to_string(), handle.clone());
        Ok(handle)
    }

    fn load_audio(&mut self, url: &str) -> Result<AudioHandle, AssetError> {
        let bytes = self.read(url)?;
        Ok(AudioHandle::new(url, bytes.len()))
    }

    fn load_object(&mut self, url: &str) -> Result<Value, AssetError> {
        let bytes = self.read(url)?;
        serde_json::from_slice(&bytes).map_err(|source| AssetError::Json {
            url: url.to_string(),
            source,
        })
    }
}

/// In-memory loader used by tests and tools. Unknown image urls fall back to a
/// placeholder unless `strict` is set.
#[derive(Debug, Default)]
pub struct MemoryAssetLoader {
    images: HashMap<String, ImageHandle>,
    objects: HashMap<String, Value>,
    strict: bool,
    requested: Vec<String>,
}

impl MemoryAssetLoader {
    pub const PLACEHOLDER_SIZE: u32 = 64;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: ImageHandle) -> Self {
        self.images.insert(image.url().to_string(), image);
        self
    }

    pub fn with_object(mut self, url: &str, value: Value) -> Self {
        self.objects.insert(url.to_string(), value);
        self
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load_image(&mut self, url: &str) -> Result<ImageHandle, AssetError> {
        self.requested.push(url.to_string());
        if let Some(image) = self.images.get(url) {
            return Ok(image.clone());
        }
        if self.strict {
            return Err(AssetError::Missing {
                url: url.to_string(),
            });
        }
        let image = ImageHandle::solid(
            url,
            Self::PLACEHOLDER_SIZE,
            Self::PLACEHOLDER_SIZE,
            Color::CORAL,
        );
        self.images.insert(url.to_string(), image.clone());
        Ok(image)
    }

    fn load_audio(&mut self, url: &str) -> Result<AudioHandle, AssetError> {
        self.requested.push(url.to_string());
        if self.strict {
            return Err(AssetError::Missing {
                url: url.to_string(),
            });
        }
        Ok(AudioHandle::new(url, 0))
    }

    fn load_object(&mut self, url: &str) -> Result<Value, AssetError> {
        self.requested.push(url.to_string());
        self.objects
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::Missing {
                url: url.to_string(),
            })
    }
}
