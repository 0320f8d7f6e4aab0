//! Image preparation before upload
//!
//! Mirrors what an admin page does in the browser before sending a photo:
//! bound the dimensions, optionally center-crop to a square, and re-encode.
//! Every operation goes through three stages, each with its own error:
//! read (sniff the bytes), decode, and draw+encode. Decoding and encoding
//! run on the blocking pool.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use serde::Serialize;

pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];
pub const DEFAULT_MAX_SIZE_MB: f64 = 5.0;
pub const DEFAULT_SQUARE_SIZE: u32 = 400;
const SQUARE_QUALITY: f32 = 0.9;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Failed to read file: {0}")]
    Read(String),

    #[error("Failed to load image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to create blob: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Invalid target dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("Image worker failed: {0}")]
    Worker(String),
}

type ImageResult<T> = std::result::Result<T, ImageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" | "image/jpeg" | "image/jpg" => Ok(OutputFormat::Jpeg),
            "png" | "image/png" => Ok(OutputFormat::Png),
            "webp" | "image/webp" => Ok(OutputFormat::Webp),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// 0.0..=1.0, only used by lossy formats
    pub quality: f32,
    pub output_format: OutputFormat,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 0.85,
            output_format: OutputFormat::Jpeg,
        }
    }
}

/// An uploaded file as the admin panel receives it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, taking its type from the extension
    pub async fn read(path: &Path) -> ImageResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ImageError::Read(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = path
            .extension()
            .and_then(|ext| OutputFormat::from_str(&ext.to_string_lossy()).ok())
            .map(OutputFormat::mime_type)
            .unwrap_or("application/octet-stream");
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Text after the last dot of the name, or one derived from the type
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_string(),
            _ => OutputFormat::from_str(&self.mime_type)
                .unwrap_or_default()
                .extension()
                .to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl OptimizedImage {
    /// Wrap as a file named after `original`, with the extension of the new format
    pub fn into_file(self, original: &str) -> ImageFile {
        let stem = original
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or("image");
        ImageFile::new(
            format!("{stem}.{}", self.format.extension()),
            self.format.mime_type(),
            self.bytes,
        )
    }
}

/// Pass/fail result of [`validate`], with a reason fit for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    fn pass() -> Self {
        Self { valid: true, error: None }
    }

    fn fail(error: String) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }
}

pub fn validate(file: Option<&ImageFile>, max_size_mb: f64) -> Validation {
    let Some(file) = file else {
        return Validation::fail("No file selected".into());
    };
    if !ALLOWED_TYPES.contains(&file.mime_type.as_str()) {
        return Validation::fail("Invalid file type. Please use JPG, PNG, or WebP".into());
    }
    let max_bytes = max_size_mb * 1024.0 * 1024.0;
    if file.size() as f64 > max_bytes {
        return Validation::fail(format!("File too large. Maximum size is {max_size_mb}MB"));
    }
    Validation::pass()
}

/// Scale `(width, height)` down to fit the bounds, keeping the aspect ratio.
///
/// Dimensions already inside the bounds are returned unchanged.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scale = |v: u32| ((v as f64 * ratio).floor() as u32).max(1);
    (scale(width), scale(height))
}

/// Largest centered square: `(x, y, side)`
pub fn center_crop(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

fn read(file: &ImageFile) -> ImageResult<Vec<u8>> {
    if file.bytes.is_empty() {
        return Err(ImageError::Read(format!("{} is empty", file.name)));
    }
    image::guess_format(&file.bytes)
        .map_err(|e| ImageError::Read(format!("{}: {e}", file.name)))?;
    Ok(file.bytes.clone())
}

async fn decode(bytes: Vec<u8>) -> ImageResult<DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
        .map_err(ImageError::Decode)
}

async fn draw<F>(
    source: DynamicImage,
    transform: F,
    format: OutputFormat,
    quality: f32,
) -> ImageResult<OptimizedImage>
where
    F: FnOnce(DynamicImage) -> DynamicImage + Send + 'static,
{
    tokio::task::spawn_blocking(move || encode(&transform(source), format, quality))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
}

fn encode(image: &DynamicImage, format: OutputFormat, quality: f32) -> ImageResult<OptimizedImage> {
    let mut bytes = Vec::new();
    let written = match format {
        OutputFormat::Jpeg => {
            let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
        }
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut bytes)),
        OutputFormat::Webp => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut bytes)),
    };
    written.map_err(ImageError::Encode)?;

    Ok(OptimizedImage {
        bytes,
        format,
        width: image.width(),
        height: image.height(),
    })
}

/// Re-encode `file`, shrinking it to fit the configured bounds
pub async fn optimize(file: &ImageFile, options: &OptimizeOptions) -> ImageResult<OptimizedImage> {
    if options.max_width == 0 || options.max_height == 0 {
        return Err(ImageError::InvalidDimensions(options.max_width, options.max_height));
    }

    let source = decode(read(file)?).await?;
    let (width, height) = fit_within(
        source.width(),
        source.height(),
        options.max_width,
        options.max_height,
    );
    tracing::debug!(
        "Optimizing {} from {}x{} to {}x{}",
        file.name,
        source.width(),
        source.height(),
        width,
        height
    );

    draw(
        source,
        move |img| {
            if img.width() == width && img.height() == height {
                img
            } else {
                img.resize_exact(width, height, FilterType::Lanczos3)
            }
        },
        options.output_format,
        options.quality,
    )
    .await
}

/// Center-crop to a square and scale it to `size` x `size` JPEG
pub async fn optimize_square(file: &ImageFile, size: u32) -> ImageResult<OptimizedImage> {
    if size == 0 {
        return Err(ImageError::InvalidDimensions(size, size));
    }

    let source = decode(read(file)?).await?;
    let (x, y, side) = center_crop(source.width(), source.height());
    draw(
        source,
        move |img| img.crop_imm(x, y, side, side).resize_exact(size, size, FilterType::Lanczos3),
        OutputFormat::Jpeg,
        SQUARE_QUALITY,
    )
    .await
}

pub fn to_data_uri(file: &ImageFile) -> String {
    format!("data:{};base64,{}", file.mime_type, STANDARD.encode(&file.bytes))
}

/// Parse a `data:<type>;base64,<payload>` URI back into a file
pub fn from_data_uri(uri: &str) -> ImageResult<ImageFile> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::Read("not a data URI".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::Read("data URI has no payload".into()))?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| ImageError::Read("data URI is not base64".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::Read(e.to_string()))?;
    let extension = OutputFormat::from_str(mime_type).unwrap_or_default().extension();
    Ok(ImageFile::new(format!("upload.{extension}"), mime_type, bytes))
}

/// Human-readable size, e.g. `1.5 KB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> ImageFile {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        ImageFile::new("photo.png", "image/png", out.into_inner())
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(800, 600, 1920, 1080), (800, 600));
        assert_eq!(fit_within(4000, 2000, 1920, 1080), (1920, 960));
        assert_eq!(fit_within(1000, 3000, 1920, 1080), (360, 1080));
        assert_eq!(fit_within(10_000, 1, 100, 100), (100, 1));
    }

    #[test]
    fn test_center_crop() {
        assert_eq!(center_crop(400, 300), (50, 0, 300));
        assert_eq!(center_crop(300, 401), (0, 50, 300));
        assert_eq!(center_crop(64, 64), (0, 0, 64));
    }

    #[tokio::test]
    async fn test_optimize_shrinks_within_bounds() {
        let options = OptimizeOptions {
            max_width: 10,
            max_height: 10,
            ..Default::default()
        };
        let out = optimize(&png(40, 20), &options).await.unwrap();
        assert_eq!((out.width, out.height), (10, 5));
        assert_eq!(out.format, OutputFormat::Jpeg);

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 5));
    }

    #[tokio::test]
    async fn test_optimize_keeps_small_images() {
        let options = OptimizeOptions {
            output_format: OutputFormat::Png,
            ..Default::default()
        };
        let out = optimize(&png(30, 12), &options).await.unwrap();
        assert_eq!((out.width, out.height), (30, 12));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_optimize_square() {
        let out = optimize_square(&png(50, 30), 8).await.unwrap();
        assert_eq!((out.width, out.height), (8, 8));
        let file = out.into_file("photo.png");
        assert_eq!(file.name, "photo.jpg");
        assert_eq!(file.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_pipeline_stage_errors() {
        let empty = ImageFile::new("x.png", "image/png", Vec::new());
        assert!(matches!(
            optimize(&empty, &OptimizeOptions::default()).await,
            Err(ImageError::Read(_))
        ));

        // A valid PNG signature with a truncated body gets past the read stage
        let mut truncated = png(4, 4);
        truncated.bytes.truncate(24);
        assert!(matches!(
            optimize_square(&truncated, 4).await,
            Err(ImageError::Decode(_))
        ));

        assert!(matches!(
            optimize_square(&png(4, 4), 0).await,
            Err(ImageError::InvalidDimensions(0, 0))
        ));
    }

    #[test]
    fn test_validate_messages() {
        assert_eq!(validate(None, 5.0).error.as_deref(), Some("No file selected"));

        let gif = ImageFile::new("a.gif", "image/gif", vec![0; 10]);
        assert_eq!(
            validate(Some(&gif), 5.0).error.as_deref(),
            Some("Invalid file type. Please use JPG, PNG, or WebP")
        );

        let big = ImageFile::new("a.jpg", "image/jpg", vec![0; 2 * 1024 * 1024 + 1]);
        assert_eq!(
            validate(Some(&big), 2.0).error.as_deref(),
            Some("File too large. Maximum size is 2MB")
        );
        assert!(validate(Some(&big), DEFAULT_MAX_SIZE_MB).valid);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(1_234_567_890), "1.15 GB");
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let file = ImageFile::new("me.webp", "image/webp", vec![9, 8, 7]);
        let uri = to_data_uri(&file);
        assert!(uri.starts_with("data:image/webp;base64,"));
        let back = from_data_uri(&uri).unwrap();
        assert_eq!(back.bytes, file.bytes);
        assert_eq!(back.name, "upload.webp");
        assert!(from_data_uri("https://x/y.png").is_err());
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(ImageFile::new("a.JPEG", "image/jpeg", vec![]).extension(), "JPEG");
        assert_eq!(ImageFile::new("blob", "image/png", vec![]).extension(), "png");
        assert_eq!(ImageFile::new("blob", "", vec![]).extension(), "jpg");
    }
}
