//! Invoice overlays: text drawn on top of a template image.
//!
//! Layouts are written against a design-time reference size and scaled to
//! the template's real pixel size, so one layout serves every resolution the
//! shop prints at.

use time::{macros::format_description, Date, Time};

use crate::print::{
    dto::{InvoicePayload, Metal},
    render::RenderError,
};

mod gold;
mod silver;
mod svg;

pub use svg::Overlay;

/// Ratio between template pixels and layout reference units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub fn new(width: u32, height: u32, reference_width: f64, reference_height: f64) -> Self {
        Self {
            x: width as f64 / reference_width,
            y: height as f64 / reference_height,
        }
    }
}

/// Builds the overlay for `invoice` on a `width` x `height` template.
pub fn build(invoice: &InvoicePayload, width: u32, height: u32) -> Result<Overlay, RenderError> {
    match invoice.metal {
        Metal::Gold => gold::layout(invoice, width, height),
        Metal::Silver => silver::layout(invoice, width, height),
    }
}

/// Greedy word wrap with an estimated glyph width of 0.6 em. No real text
/// measurement happens, so a single very long word still overflows.
pub(crate) fn wrap_text(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let mut words = text.split(' ');
    let mut lines = Vec::new();
    let mut current = words.next().unwrap_or_default().to_string();

    for word in words {
        let width = (current.chars().count() + word.chars().count() + 1) as f64 * (font_size * 0.6);
        if width < max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Splits `YYYY/MM/DD HH:MM[:SS]` into its date and optional time of day.
pub(crate) fn parse_invoice_time(raw: &str) -> Result<(Date, Option<Time>), RenderError> {
    let invalid = || RenderError::InvalidTime(raw.to_string());
    let mut parts = raw.split_whitespace();

    let date = parts
        .next()
        .and_then(|d| Date::parse(d, format_description!("[year]/[month]/[day]")).ok())
        .ok_or_else(invalid)?;

    let time = match parts.next() {
        None => None,
        Some(t) => Some(
            Time::parse(t, format_description!("[hour]:[minute]:[second]"))
                .or_else(|_| Time::parse(t, format_description!("[hour]:[minute]")))
                .map_err(|_| invalid())?,
        ),
    };
    Ok((date, time))
}

/// `05-03-2024`
pub(crate) fn dashed_date(date: Date) -> Result<String, RenderError> {
    date.format(format_description!("[day]-[month]-[year]"))
        .map_err(|e| RenderError::Other(e.into()))
}

/// `05/03/24 2:07 PM`
pub(crate) fn short_date_time(date: Date, time: Time) -> Result<String, RenderError> {
    let d = date
        .format(format_description!("[day]/[month]/[year repr:last_two]"))
        .map_err(|e| RenderError::Other(e.into()))?;
    let t = time
        .format(format_description!("[hour repr:12 padding:none]:[minute] [period]"))
        .map_err(|e| RenderError::Other(e.into()))?;
    Ok(format!("{} {}", d, t))
}
