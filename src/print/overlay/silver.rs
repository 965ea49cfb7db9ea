use super::{
    dashed_date, parse_invoice_time,
    svg::{Canvas, Overlay, Span, TextStyle},
    Scale,
};
use crate::print::{
    dto::{Amount, InvoicePayload, Metal},
    render::RenderError,
};

/// Portrait A5 reference size the silver template was designed at.
const REFERENCE: (f64, f64) = (420.0, 595.0);

struct Column {
    x: f64,
    width: f64,
}

impl Column {
    fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

pub(super) fn layout(invoice: &InvoicePayload, width: u32, height: u32) -> Result<Overlay, RenderError> {
    let s = Scale::new(width, height, REFERENCE.0, REFERENCE.1);
    let (date, _) = parse_invoice_time(&invoice.time)?;
    let mut canvas = Canvas::new(width, height);

    let bold = TextStyle::centered(8.0 * s.y, "bold");
    let cell = TextStyle::centered(8.0 * s.y, "550");

    // header: date box and the day's metal rate
    let (date_x, date_y, date_w, date_h) = (300.0 * s.x, 80.0 * s.y, 100.0 * s.x, 30.0 * s.y);
    canvas.text(
        date_x + 155.0 + date_w / 2.0,
        date_y + date_h / 2.0 - 36.0,
        bold,
        &dashed_date(date)?,
    );

    let (rate_x, rate_y, rate_w, rate_h) = (30.0 * s.x, 100.0 * s.y, 120.0 * s.x, 30.0 * s.y);
    let metal_rate = match invoice.metal {
        Metal::Gold => &invoice.gold_price,
        Metal::Silver => &invoice.silver_price,
    };
    canvas.text(
        rate_x - 190.0 + rate_w / 2.0,
        rate_y + rate_h / 2.0 - 105.0,
        bold,
        &metal_rate.to_string(),
    );

    let name_col = Column { x: 8.0 * s.x, width: 80.0 * s.x };
    let weight_col = Column { x: 95.0 * s.x, width: 82.0 * s.x };
    let wastage_col = Column { x: 180.0 * s.x, width: 76.0 * s.x };
    let making_col = Column { x: 253.0 * s.x, width: 80.0 * s.x };
    let price_col = Column { x: 336.0 * s.x, width: 80.0 * s.x };

    let row_height = 40.0 * s.y;
    let mut top = 130.0 * s.y;
    let nth = |values: &[Amount], i: usize| values.get(i).cloned().unwrap_or_default();

    for (i, name) in invoice.flat_items().iter().enumerate() {
        let gross = nth(&invoice.grossweight, i);
        if !gross.is_positive() {
            continue;
        }
        let y = top + row_height / 2.0;

        let code_line: Vec<Span> = invoice
            .codes
            .get(i)
            .filter(|c| !c.trim().is_empty())
            .map(|c| {
                Span::below(name_col.center(), 12.0 * s.y, format!("(Product Code: {})", c))
                    .sized(6.0 * s.y)
            })
            .into_iter()
            .collect();
        canvas.text_with_spans(name_col.center(), y, cell, name, &code_line);

        canvas.text(weight_col.center(), y, cell, &format!("{} grams", gross));

        let wastage = nth(&invoice.wastage, i);
        let wastage_text = if wastage.is_positive() {
            format!("{} grams", wastage)
        } else {
            "----".to_string()
        };
        canvas.text(wastage_col.center(), y, cell, &wastage_text);

        canvas.text(
            making_col.center(),
            y,
            cell,
            &format!("RS. {}", nth(&invoice.making_charges, i)),
        );
        canvas.text(
            price_col.center(),
            y,
            cell,
            &format!("RS. {}", nth(&invoice.item_price, i)),
        );

        top += 45.0 * s.y;
    }

    canvas.text(
        360.0 * s.x,
        472.5 * s.y,
        bold,
        &invoice.flat_total().to_string(),
    );

    let discounted = invoice.flat_discount.is_positive();
    if discounted {
        canvas.text(
            332.0 * s.x,
            485.0 * s.y,
            bold,
            &format!("Discount  : - {}", invoice.flat_discount),
        );
    }

    if invoice.os_nw.is_positive() {
        let y = if discounted { 497.0 } else { 489.0 };
        canvas.text(
            251.0 * s.x,
            y * s.y,
            bold,
            &format!(
                "Old Metal Net weight  : {:.2} grams | Old Metal Amount  : - {}",
                invoice.os_nw.value(),
                invoice.os_price
            ),
        );
    }

    let sale_top = if discounted { 504.0 } else { 487.0 };
    canvas.shade(311.0 * s.x, sale_top * s.y, 100.0 * s.x, 20.0 * s.y, 0.1);
    canvas.text(
        361.0 * s.x,
        514.0 * s.y,
        TextStyle::centered(9.0 * s.y, "bold"),
        &invoice.flat_sale_price.to_string(),
    );

    Ok(canvas.finish())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn invoice(extra: serde_json::Value) -> InvoicePayload {
        let mut base = json!({
            "metal": "silver",
            "time": "2024/03/05 11:20",
            "item": ["Anklet", "Toe Ring", "Bowl"],
            "grossweight": [42.5, 0, "120"],
            "wastage": [2, 0, 0],
            "making_charges": [300, 0, 450],
            "item_price": ["4500", 0, 12600],
            "Codes": ["AK-01", null, ""],
            "total": ["4500", "12600.40"],
            "silver_price": 98,
            "sale price": 17000,
        });
        if let (Some(b), Some(e)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                b.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn svg(p: &InvoicePayload) -> String {
        layout(p, 420, 595).unwrap().as_str().to_string()
    }

    #[test]
    fn renders_positive_weight_rows_only() {
        let out = svg(&invoice(json!({ "Discount": 0, "os_nw": 0 })));
        assert!(out.contains(">Anklet<tspan"));
        assert!(out.contains("(Product Code: AK-01)"));
        assert!(out.contains(">42.5 grams<"));
        assert!(out.contains(">2 grams<"));
        assert!(out.contains(">RS. 4500<"));
        assert!(out.contains(">Bowl</text>"));
        assert!(out.contains(">----<"));
        assert!(!out.contains("Toe Ring"));
    }

    #[test]
    fn header_and_totals() {
        let out = svg(&invoice(json!({})));
        assert!(out.contains(">05-03-2024<"));
        assert!(out.contains(">98<"));
        assert!(out.contains(">17000<"));
        // total: 4500 + 12600
        assert!(out.contains(">17100<"));
        assert!(out.contains(r#"fill-opacity="0.1""#));
    }

    #[test]
    fn omits_discount_and_old_metal_when_zero() {
        let out = svg(&invoice(json!({ "Discount": 0, "os_nw": 0, "os_price": 0 })));
        assert!(!out.contains("Discount"));
        assert!(!out.contains("Old Metal"));
    }

    #[test]
    fn shows_discount_and_old_metal_when_present() {
        let out = svg(&invoice(json!({ "Discount": 250, "os_nw": "12.5", "os_price": 900 })));
        assert!(out.contains("Discount  : - 250"));
        assert!(out.contains("Old Metal Net weight  : 12.50 grams | Old Metal Amount  : - 900"));
    }

    #[test]
    fn scales_to_template_size() {
        let small = svg(&invoice(json!({})));
        let large = layout(&invoice(json!({})), 840, 1190).unwrap();
        // weight column center: (95 + 41) * scale
        assert!(small.contains(r#"<text x="136.00""#));
        assert!(large.as_str().contains(r#"<text x="272.00""#));
    }

    #[test]
    fn bad_time_is_rejected() {
        let p = invoice(json!({ "time": "yesterday" }));
        assert!(matches!(layout(&p, 420, 595), Err(RenderError::InvalidTime(_))));
    }
}
