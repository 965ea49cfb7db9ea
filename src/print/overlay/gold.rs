use super::{
    parse_invoice_time, short_date_time,
    svg::{Anchor, Baseline, Canvas, Overlay, Span, TextStyle},
    wrap_text, Scale,
};
use crate::print::{
    dto::{Amount, GoldItem, InvoicePayload},
    render::RenderError,
};

/// Landscape A5 reference size the gold templates were designed at.
const REFERENCE: (f64, f64) = (595.0, 420.0);

// The gold templates are print-resolution images; cell text is sized and
// nudged in template pixels rather than reference units.
const CELL_FONT: f64 = 42.0;
const SUB_FONT: f64 = 32.0;
const ROW_ADVANCE: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Column {
    x: f64,
    width: f64,
}

impl Column {
    fn at(x: f64, width: f64, s: Scale) -> Self {
        Self {
            x: x * s.x,
            width: width * s.x,
        }
    }

    fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Column grid; the four template families shift the weight and rate
/// columns depending on whether tax and stone columns are printed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    item: Column,
    qty: Column,
    hsn: Column,
    gross: Column,
    stone: Option<Column>,
    net: Column,
    rate: Column,
    wastage: Column,
    making: Column,
    price: Column,
}

impl Columns {
    fn for_template(taxed: bool, stone: bool, s: Scale) -> Self {
        let (gross, stone_col, net, rate) = match (taxed, stone) {
            (true, true) => ((231.0, 55.0), Some((286.0, 45.0)), (332.0, 56.0), (388.0, 45.0)),
            (true, false) => ((231.0, 59.0), None, (290.0, 60.0), (350.0, 59.0)),
            (false, true) => ((196.0, 56.0), Some((252.0, 55.0)), (307.0, 55.0), (363.0, 46.0)),
            (false, false) => ((196.0, 76.0), None, (272.0, 74.0), (345.0, 65.0)),
        };
        let wastage = if taxed && stone { (433.0, 43.0) } else { (409.0, 57.0) };
        let (making, price) = if stone {
            ((476.0, 50.0), (525.0, 72.0))
        } else {
            ((467.0, 55.0), (523.0, 71.0))
        };

        let col = |(x, w): (f64, f64)| Column::at(x, w, s);
        Self {
            item: col((40.0, 100.0)),
            qty: col((150.0, 40.0)),
            hsn: col((200.0, 60.0)),
            gross: col(gross),
            stone: stone_col.map(col),
            net: col(net),
            rate: col(rate),
            wastage: col(wastage),
            making: col(making),
            price: col(price),
        }
    }
}

/// Footer x offsets (from the date block) of the gross and net totals.
fn total_offsets(taxed: bool, stone: bool) -> (f64, f64) {
    match (taxed, stone) {
        (true, true) => (-1070.0, -460.0),
        (true, false) => (-1060.0, -690.0),
        (false, true) => (-1275.0, -600.0),
        (false, false) => (-1220.0, -750.0),
    }
}

fn sum(items: &[GoldItem], field: impl Fn(&GoldItem) -> &Amount) -> Amount {
    Amount::from(items.iter().map(|i| field(i).value()).sum::<f64>())
}

pub(super) fn layout(invoice: &InvoicePayload, width: u32, height: u32) -> Result<Overlay, RenderError> {
    let s = Scale::new(width, height, REFERENCE.0, REFERENCE.1);
    let (date, time) = parse_invoice_time(&invoice.time)?;
    let time = time.ok_or_else(|| RenderError::InvalidTime(invoice.time.clone()))?;

    let taxed = invoice.is_taxed();
    let stone = invoice.has_stone_weight();
    let items = invoice.gold_items();
    let cols = Columns::for_template(taxed, stone, s);
    let mut canvas = Canvas::new(width, height);

    let customer_x = 20.0 * s.x;
    let customer_y = 70.0 * s.y;
    let date_x = width as f64 - 180.0 * s.x;
    let date_y = 70.0 * s.y;
    let line_gap = 13.0 * s.y;

    // customer block
    let header = TextStyle::roboto(46.0).baseline(Baseline::Hanging);
    let cx = customer_x + 380.0;
    let mut customer_lines = vec![Span::below(cx, line_gap, invoice.cmobile.as_str())];
    if !invoice.caddress.trim().is_empty() {
        customer_lines.push(Span::below(cx, line_gap, invoice.caddress.as_str()));
    }
    canvas.text_with_spans(cx, customer_y + 105.0, header, &invoice.cname, &customer_lines);

    // date, invoice number, payment modes
    let methods = invoice.payment_methods();
    let modes = methods.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(" / ");
    let dx = date_x + 660.0;
    canvas.text_with_spans(
        dx,
        date_y + 103.0,
        header,
        &short_date_time(date, time)?,
        &[
            Span::below(dx, line_gap, invoice.invoice.as_str()),
            Span::below(dx, line_gap, modes),
        ],
    );

    let cell = TextStyle::roboto(CELL_FONT).anchor(Anchor::Middle);
    let cell_central = cell.baseline(Baseline::Central);
    let row_height = 30.0 * s.y;
    let mut top = 155.0 * s.y;
    let mut serial = 0;

    for item in items.iter().filter(|i| i.grosswt.is_positive()) {
        serial += 1;
        let y = top + (row_height - 70.0) / 2.0;

        canvas.text(
            cols.item.x - 230.0 + (cols.qty.width - 55.0) / 2.0,
            top + (row_height - 60.0) / 2.0,
            cell,
            &serial.to_string(),
        );

        let name_width = cols.item.width + 170.0;
        let name_x = cols.item.x - 50.0 + name_width / 2.0;
        let mut name_lines = wrap_text(&item.name, name_width, CELL_FONT).into_iter();
        let first = name_lines.next().unwrap_or_default();
        let mut spans: Vec<Span> = name_lines
            .map(|line| Span::below(name_x, CELL_FONT, line))
            .collect();
        if !item.code.trim().is_empty() {
            spans.push(Span::below(name_x, CELL_FONT, format!("({})", item.code)).sized(SUB_FONT));
        }
        canvas.text_with_spans(name_x, y, cell, &first, &spans);

        canvas.text(
            cols.qty.x + 60.0 + (cols.qty.width - 30.0) / 2.0,
            y,
            cell,
            &item.qty.to_string(),
        );

        if taxed {
            let hsn = if item.hsn.trim().is_empty() { "-" } else { item.hsn.as_str() };
            canvas.text(cols.hsn.x - 20.0 + (cols.hsn.width - 150.0) / 2.0, y, cell, hsn);
        }

        canvas.text(cols.gross.center(), y, cell, &format!("{} grams", item.grosswt));

        if let Some(stone_col) = cols.stone {
            let weight = if item.stoneweight.is_positive() {
                format!("{} grams", item.stoneweight)
            } else {
                "----".to_string()
            };
            let rate: Vec<Span> = if item.stonerate.is_positive() {
                vec![Span::below(stone_col.center(), CELL_FONT, format!("(Rs.{})", item.stonerate))
                    .sized(SUB_FONT)]
            } else {
                Vec::new()
            };
            canvas.text_with_spans(stone_col.center(), y, cell_central, &weight, &rate);
        }

        canvas.text(cols.net.center(), y, cell_central, &format!("{} grams", item.netweight));
        if taxed && item.va.is_positive() {
            canvas.text(
                cols.net.center(),
                y + 40.0,
                TextStyle { size: 30.0, ..cell_central },
                &format!("( V.A {}% )", item.va),
            );
        }

        canvas.text(cols.rate.center(), y, cell_central, &format!("RS. {}", item.rate));

        let wastage = if taxed {
            format!("Rs. {}", Amount::from(item.wastage.value() * item.rate.value()))
        } else {
            item.wastage.to_string()
        };
        canvas.text(cols.wastage.center(), y, cell, &wastage);

        canvas.text(cols.making.center(), y, cell_central, &format!("RS. {}", item.mc));
        canvas.text(cols.price.center(), y, cell_central, &format!("RS. {}", item.itemprice));

        top += ROW_ADVANCE;
    }

    // totals line
    let total_style = TextStyle::roboto(52.0);
    let totals_y = date_y + 1340.0;
    let (gross_off, net_off) = total_offsets(taxed, stone);
    canvas.text(date_x - 1415.0, totals_y, total_style, &sum(items, |i| &i.qty).to_string());
    canvas.text(
        date_x + gross_off,
        totals_y,
        total_style,
        &format!("{} grams", sum(items, |i| &i.grosswt)),
    );
    canvas.text(
        date_x + net_off,
        totals_y,
        total_style,
        &format!("{} grams", sum(items, |i| &i.netweight)),
    );
    canvas.text(
        date_x + 730.0,
        totals_y,
        total_style,
        &format!("Rs.{}", sum(items, |i| &i.itemprice)),
    );

    let amount = TextStyle::roboto(46.0);
    let label = TextStyle::roboto(50.0);
    let value_x = date_x + 650.0;

    canvas.text(value_x, date_y + 1468.0, amount, &format!("Rs.{}", invoice.final_amount));

    let rounded = invoice.roundoff.is_positive();
    if rounded {
        canvas.text(date_x + 361.0, date_y + 1530.0, label, "Round off :");
        canvas.text(value_x, date_y + 1530.0, label, &format!("Rs.{}", invoice.roundoff));
    }

    if invoice.discount.is_positive() {
        let y = date_y + if rounded { 1595.0 } else { 1530.0 };
        canvas.text(date_x + 382.0, y, label, "Discount :");
        canvas.text(value_x, y, amount, &format!("Rs.{}", invoice.discount));
    }

    if taxed {
        let tax_x = date_x - 315.0;
        let total_tax = Amount::from(invoice.cgst.value() + invoice.sgst.value());
        canvas.text(tax_x, date_y + 1463.0, amount, &format!("Rs.{}", invoice.cgst));
        canvas.text(tax_x, date_y + 1526.0, amount, &format!("Rs.{}", invoice.sgst));
        canvas.text(tax_x, date_y + 1591.0, amount, &format!("Rs.{}", total_tax));
    }

    canvas.text(value_x, date_y + 1753.0, label, &format!("Rs.{}", invoice.sale_price));

    if !methods.is_empty() {
        let span_x = date_x + if taxed { -1250.0 } else { -1930.0 };
        let spans: Vec<Span> = methods
            .iter()
            .map(|(k, v)| Span::below(span_x, 1.2 * 50.0, format!("{}: Rs.{}", k, v)))
            .collect();
        let y = date_y + if taxed { 1695.0 } else { 1702.0 };
        canvas.text_with_spans(date_x - 1630.0, y, label, "", &spans);
    }

    if invoice.og_nw.is_positive() {
        canvas.text(
            date_x + 625.0,
            date_y + 1690.0,
            label.anchor(Anchor::End),
            &format!("Purchased Gold {} grams :", invoice.og_nw),
        );
        canvas.text(value_x, date_y + 1690.0, label, &format!("Rs.{}", invoice.og_price));
    }

    Ok(canvas.finish())
}
