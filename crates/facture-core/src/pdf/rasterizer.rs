//! Page images for scanned PDFs using lopdf.
//!
//! A scanned invoice page is a single full-page raster image. Rendering
//! such a page means decoding the largest image XObject it references.
//! Pages carrying only vector content have no image to render.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PageImages, PageRasterizer, Result};
use crate::error::PdfError;

/// Skip images smaller than this on either side (logos, stamps).
const MIN_DIMENSION: u32 = 50;

/// Rasterizer reading page images with lopdf.
#[derive(Debug, Clone)]
pub struct LopdfRasterizer {
    min_dimension: u32,
}

impl LopdfRasterizer {
    pub fn new() -> Self {
        Self {
            min_dimension: MIN_DIMENSION,
        }
    }

    /// Set the smallest image side considered a page scan.
    pub fn with_min_dimension(mut self, min_dimension: u32) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    fn load(data: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }

    fn render_page(&self, doc: &Document, page: u32, page_id: ObjectId) -> Result<DynamicImage> {
        let resources = page_resources(doc, page_id).ok_or_else(|| PdfError::Rasterize {
            page,
            reason: "page has no resources".to_string(),
        })?;

        let xobjects = match resources.get(b"XObject").and_then(|o| doc.dereference(o)) {
            Ok((_, Object::Dictionary(dict))) => dict.clone(),
            _ => {
                return Err(PdfError::Rasterize {
                    page,
                    reason: "page has no images".to_string(),
                });
            }
        };

        let image = xobjects
            .iter()
            .filter_map(|(_, obj)| doc.dereference(obj).ok())
            .filter_map(|(_, obj)| decode_image(doc, obj))
            .filter(|img| img.width() >= self.min_dimension && img.height() >= self.min_dimension)
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()));

        match image {
            Some(image) => {
                trace!("Page {}: {}x{} image", page, image.width(), image.height());
                Ok(image)
            }
            None => Err(PdfError::Rasterize {
                page,
                reason: "no decodable page image".to_string(),
            }),
        }
    }
}

impl Default for LopdfRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for LopdfRasterizer {
    fn rasterize<'a>(&'a self, data: &'a [u8]) -> Result<PageImages<'a>> {
        let doc = Self::load(data)?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("Rasterizing {} pages", pages.len());
        Ok(Box::new(
            pages
                .into_iter()
                .map(move |(page, page_id)| self.render_page(&doc, page, page_id)),
        ))
    }
}

/// Page resources, following inheritance up the page tree.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res))) = doc.dereference(resources) {
            return Some(res.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    // Dimensions come from the document and may be absurd.
    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgb_len = pixels.checked_mul(3)?;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => {
            RgbImage::from_raw(width, height, data[..rgb_len].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: {}x{}, colorspace={:?}, {} bytes",
                width,
                height,
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}
