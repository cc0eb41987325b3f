use crate::utils::error::ClassifyError;
use crate::Result;
use base64::Engine;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use serde::Serialize;
use std::io::Cursor;

/// 已解码图像的基本信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    /// 原始颜色类型，例如 "L8"、"Rgba8"
    pub color: String,
    pub format: &'static str,
}

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str, max_size: usize) -> Result<(DynamicImage, ImageSummary)> {
        // 移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = match base64_data.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => base64_data,
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        Self::from_bytes(&image_bytes, max_size)
    }

    /// 从字节加载图像，只接受 JPEG 与 PNG
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<(DynamicImage, ImageSummary)> {
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidInput("Empty file".to_string()));
        }

        if bytes.len() > max_size {
            return Err(ClassifyError::FileTooLarge(format!(
                "{} bytes, max allowed: {} bytes",
                bytes.len(),
                max_size
            )));
        }

        let format = match Self::detect_format(bytes) {
            Some(format) if Self::is_supported_format(format) => format,
            Some(format) => {
                return Err(ClassifyError::UnsupportedFormat(format!(
                    "{:?} (expected JPEG or PNG)",
                    format
                )))
            }
            None => {
                return Err(ClassifyError::DecodeFailure(
                    "Uploaded data is not a recognizable image".to_string(),
                ))
            }
        };

        let image = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = image.dimensions();

        tracing::debug!("Decoded {:?} image: {}x{} {:?}", format, width, height, image.color());

        let summary = ImageSummary {
            width,
            height,
            color: format!("{:?}", image.color()),
            format: format.extensions_str().first().copied().unwrap_or("unknown"),
        };

        Ok((image, summary))
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    /// 生成预览缩略图的PNG数据URL
    pub fn preview_data_url(image: &DynamicImage, max_width: u32) -> Result<String> {
        let preview = if image.width() > max_width {
            image.resize(max_width, u32::MAX, FilterType::Triangle)
        } else {
            image.clone()
        };

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(preview.to_rgba8())
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| ClassifyError::Internal(format!("Failed to encode preview: {}", e)))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}
