use std::{path::Path, sync::Arc};

use anyhow::Context;
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg::{self, fontdb},
};

use crate::print::{dto::InvoicePayload, overlay};

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("invalid invoice time {0:?}: expected YYYY/MM/DD HH:MM")]
    InvalidTime(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Composited invoice image.
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Draws invoice overlays onto template images.
///
/// Fonts are loaded once at startup; text whose family is missing from the
/// database falls back to whatever the database resolves, or is skipped.
pub struct Renderer {
    fontdb: Arc<fontdb::Database>,
}

impl Renderer {
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = font_dir {
            db.load_fonts_dir(dir);
        }
        resolve_sans_serif(&mut db);
        tracing::info!(faces = db.len(), font_dir = ?font_dir, "font database loaded");
        Self::from_database(db)
    }

    pub fn from_database(db: fontdb::Database) -> Self {
        Self { fontdb: Arc::new(db) }
    }

    pub fn render(&self, template_png: &[u8], invoice: &InvoicePayload) -> Result<RenderedInvoice, RenderError> {
        let mut pixmap = Pixmap::decode_png(template_png)
            .map_err(|e| anyhow::anyhow!("decode template png: {e}"))?;
        let (width, height) = (pixmap.width(), pixmap.height());

        let overlay = overlay::build(invoice, width, height)?;

        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(overlay.as_str(), &opts).context("parse overlay svg")?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        let png = pixmap
            .encode_png()
            .map_err(|e| anyhow::anyhow!("encode invoice png: {e}"))?;
        tracing::debug!(width, height, bytes = png.len(), "invoice rendered");
        Ok(RenderedInvoice { png, width, height })
    }
}

/// Points the generic `sans-serif` family at a loaded face when Arial is
/// missing, so overlay text is still drawn on hosts without it.
fn resolve_sans_serif(db: &mut fontdb::Database) {
    let arial = fontdb::Query {
        families: &[fontdb::Family::Name("Arial")],
        ..Default::default()
    };
    if db.query(&arial).is_some() {
        return;
    }
    let fallback = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
    if let Some(family) = fallback {
        tracing::debug!(%family, "Arial not installed, using fallback sans-serif");
        db.set_sans_serif_family(family);
    }
}
