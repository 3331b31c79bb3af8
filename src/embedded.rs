use std::sync::Arc;

use base64::Engine;
use image::GenericImageView;
use roxmltree::Node;

use crate::command::{ImageCommand, ImageFormat};
use crate::defs::href;
use crate::error::{ElementError, ImageError};
use crate::geometry::Matrix;
use crate::shapes::length_attr;
use crate::style::{Axis, LengthContext};
use crate::types::q;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub data: Arc<[u8]>,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn dimensions(&self) -> Result<(u32, u32), ImageError> {
        let format = match self.format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        };
        let decoded = image::load_from_memory_with_format(&self.data, format)
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        Ok(decoded.dimensions())
    }
}

// `data:[<mime>][;base64],<payload>`. Only base64 PNG/JPEG payloads are accepted.
pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, ImageError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or(ImageError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
    let mut params = header.split(';').map(str::trim);
    let mime = params.next().unwrap_or("").to_ascii_lowercase();
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(ImageError::UnsupportedEncoding);
    }

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

    let format = match mime.as_str() {
        "image/png" => ImageFormat::Png,
        "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
        "" => match image::guess_format(&data) {
            Ok(image::ImageFormat::Png) => ImageFormat::Png,
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(other) => {
                return Err(ImageError::UnsupportedMediaType(
                    other.to_mime_type().to_string(),
                ));
            }
            Err(_) => {
                return Err(ImageError::UnsupportedMediaType(
                    "application/octet-stream".to_string(),
                ));
            }
        },
        other => return Err(ImageError::UnsupportedMediaType(other.to_string())),
    };

    Ok(DecodedImage {
        data: Arc::from(data),
        format,
    })
}

pub(crate) fn translate_image(
    node: Node<'_, '_>,
    transform: Matrix,
    lengths: &LengthContext,
) -> Result<Option<ImageCommand>, ElementError> {
    let uri = href(node).ok_or(ElementError::MissingAttribute("href"))?;
    let decoded = decode_data_uri(uri)?;

    let x = length_attr(node, "x", Axis::Horizontal, lengths)?.unwrap_or(0.0);
    let y = length_attr(node, "y", Axis::Vertical, lengths)?.unwrap_or(0.0);
    let width = length_attr(node, "width", Axis::Horizontal, lengths)?;
    let height = length_attr(node, "height", Axis::Vertical, lengths)?;

    // Missing sides come from the intrinsic size, keeping its aspect ratio.
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (w, h) => {
            let (iw, ih) = decoded.dimensions()?;
            if iw == 0 || ih == 0 {
                return Err(ImageError::InvalidSize.into());
            }
            let (iw, ih) = (iw as f32, ih as f32);
            match (w, h) {
                (Some(w), None) => (w, w * ih / iw),
                (None, Some(h)) => (h * iw / ih, h),
                _ => (iw, ih),
            }
        }
    };
    if width < 0.0 || height < 0.0 {
        return Err(ImageError::InvalidSize.into());
    }
    if width == 0.0 || height == 0.0 {
        return Ok(None);
    }

    Ok(Some(ImageCommand {
        data: decoded.data,
        format: decoded.format,
        x: q(x),
        y: q(y),
        width: q(width),
        height: q(height),
        transform,
    }))
}
