use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Baseline {
    Middle,
    Central,
    Hanging,
}

impl Baseline {
    fn as_str(self) -> &'static str {
        match self {
            Baseline::Middle => "middle",
            Baseline::Central => "central",
            Baseline::Hanging => "hanging",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TextStyle {
    pub size: f64,
    pub weight: &'static str,
    pub anchor: Anchor,
    pub baseline: Baseline,
    pub family: Option<&'static str>,
}

impl TextStyle {
    pub fn centered(size: f64, weight: &'static str) -> Self {
        Self {
            size,
            weight,
            anchor: Anchor::Middle,
            baseline: Baseline::Middle,
            family: None,
        }
    }

    pub fn roboto(size: f64) -> Self {
        Self {
            size,
            weight: "500",
            anchor: Anchor::Start,
            baseline: Baseline::Middle,
            family: Some("Roboto"),
        }
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }
}

/// A `<tspan>` continuation line below the main text.
#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub x: f64,
    pub dy: f64,
    pub size: Option<f64>,
    pub text: String,
}

impl Span {
    pub fn below(x: f64, dy: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            dy,
            size: None,
            text: text.into(),
        }
    }

    pub fn sized(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }
}

/// SVG overlay markup sized to the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    svg: String,
}

impl Overlay {
    pub fn as_str(&self) -> &str {
        &self.svg
    }
}

pub(crate) struct Canvas {
    width: u32,
    height: u32,
    body: String,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    pub fn text(&mut self, x: f64, y: f64, style: TextStyle, text: &str) {
        self.text_with_spans(x, y, style, text, &[]);
    }

    pub fn text_with_spans(&mut self, x: f64, y: f64, style: TextStyle, text: &str, spans: &[Span]) {
        let _ = write!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-size="{:.2}" font-weight="{}" text-anchor="{}" dominant-baseline="{}""#,
            x,
            y,
            style.size,
            style.weight,
            style.anchor.as_str(),
            style.baseline.as_str(),
        );
        if let Some(family) = style.family {
            let _ = write!(self.body, r#" font-family="{}""#, family);
        }
        let _ = write!(self.body, ">{}", escape(text));
        for span in spans {
            let _ = write!(self.body, r#"<tspan x="{:.2}" dy="{:.2}""#, span.x, span.dy);
            if let Some(size) = span.size {
                let _ = write!(self.body, r#" font-size="{:.2}""#, size);
            }
            let _ = write!(self.body, ">{}</tspan>", escape(&span.text));
        }
        self.body.push_str("</text>\n");
    }

    pub fn shade(&mut self, x: f64, y: f64, width: f64, height: f64, opacity: f64) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="black" fill-opacity="{}"/>"#,
            x, y, width, height, opacity
        );
    }

    pub fn finish(self) -> Overlay {
        let svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                "\n",
                r#"<g font-family="Arial, sans-serif" fill="black" letter-spacing="0.2">"#,
                "\n{body}</g>\n</svg>\n"
            ),
            w = self.width,
            h = self.height,
            body = self.body,
        );
        Overlay { svg }
    }
}

pub(crate) fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_text() {
        assert_eq!(escape(r#"Ring <22K> & "Co""#), "Ring &lt;22K&gt; &amp; &quot;Co&quot;");
    }

    #[test]
    fn text_with_spans_renders_tspans() {
        let mut canvas = Canvas::new(100, 50);
        canvas.text_with_spans(
            10.0,
            20.0,
            TextStyle::centered(8.0, "bold"),
            "Chain",
            &[Span::below(10.0, 12.0, "(Product Code: C1)").sized(6.0)],
        );
        let svg = canvas.finish();
        let svg = svg.as_str();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50""#));
        assert!(svg.contains(r#"<text x="10.00" y="20.00" font-size="8.00" font-weight="bold" text-anchor="middle" dominant-baseline="middle">Chain"#));
        assert!(svg.contains(r#"<tspan x="10.00" dy="12.00" font-size="6.00">(Product Code: C1)</tspan>"#));
    }
}
