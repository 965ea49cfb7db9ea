use anyhow::Context;
use printpdf::{
    image_crate::{self, DynamicImage, ImageFormat},
    Image, ImageTransform, Mm, PdfDocument,
};

use crate::print::dto::Metal;

pub const MM_TO_PT: f64 = 2.83465;

/// Physical page the invoice is printed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    pub fn for_metal(metal: Metal) -> Self {
        match metal {
            // A5 landscape
            Metal::Gold => Self { width_mm: 210.0, height_mm: 148.0 },
            // A5 portrait
            Metal::Silver => Self { width_mm: 148.0, height_mm: 210.0 },
        }
    }

    pub fn points(&self) -> (f64, f64) {
        (self.width_mm * MM_TO_PT, self.height_mm * MM_TO_PT)
    }
}

/// Wraps a rendered PNG into a single-page PDF, the image stretched over the
/// whole page.
pub fn package(png: &[u8], metal: Metal) -> anyhow::Result<Vec<u8>> {
    let page = PageSize::for_metal(metal);
    let decoded = image_crate::load_from_memory_with_format(png, ImageFormat::Png)
        .context("decode rendered invoice")?;
    // the PDF carries no alpha; templates are opaque anyway
    let buffer = decoded.to_rgb8();
    let (px_w, px_h) = (buffer.width() as f64, buffer.height() as f64);
    let rgb = DynamicImage::ImageRgb8(buffer);
    anyhow::ensure!(px_w > 0.0 && px_h > 0.0, "rendered invoice is empty");

    let (doc, page_idx, layer_idx) = PdfDocument::new(
        "Invoice",
        Mm(page.width_mm as f32),
        Mm(page.height_mm as f32),
        "invoice",
    );
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    // dpi fits the width exactly; the height is stretched to the page
    let dpi = px_w * 25.4 / page.width_mm;
    let natural_height_mm = px_h * 25.4 / dpi;
    let scale_y = page.height_mm / natural_height_mm;

    Image::from_dynamic_image(&rgb).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            scale_x: Some(1.0),
            scale_y: Some(scale_y as f32),
            dpi: Some(dpi as f32),
            ..Default::default()
        },
    );

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| anyhow::anyhow!("write pdf: {e:?}"))?;
    tracing::debug!(metal = metal.as_str(), dpi, bytes = bytes.len(), "invoice pdf packaged");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::render::testing::blank_png;

    #[test]
    fn page_sizes_follow_metal() {
        let gold = PageSize::for_metal(Metal::Gold);
        assert_eq!((gold.width_mm, gold.height_mm), (210.0, 148.0));
        let (w, h) = gold.points();
        assert!((w - 595.28).abs() < 0.01, "{w}");
        assert!((h - 419.53).abs() < 0.01, "{h}");

        let silver = PageSize::for_metal(Metal::Silver);
        assert_eq!((silver.width_mm, silver.height_mm), (148.0, 210.0));
    }

    #[test]
    fn packages_png_as_pdf() {
        let pdf = package(&blank_png(60, 42), Metal::Gold).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(package(b"\x89PNG broken", Metal::Silver).is_err());
    }
}
