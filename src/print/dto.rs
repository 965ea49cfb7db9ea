use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Metal {
    Gold,
    #[default]
    Silver,
}

impl Metal {
    pub fn as_str(self) -> &'static str {
        match self {
            Metal::Gold => "gold",
            Metal::Silver => "silver",
        }
    }
}

/// A numeric field as the counter app sends it: a JSON number or a numeric
/// string. The text as sent is kept so the invoice shows exactly what was
/// entered ("1200.50" stays "1200.50").
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    raw: String,
    value: f64,
}

impl Amount {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self {
            raw: "0".into(),
            value: 0.0,
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self {
            raw: value.to_string(),
            value,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Number(n) => Self {
                raw: n.to_string(),
                value: n.as_f64().unwrap_or(0.0),
            },
            Value::String(s) => {
                let raw = s.trim().to_string();
                let value = raw.parse::<f64>().unwrap_or(0.0);
                Self { raw, value }
            }
            Value::Bool(b) => Self::from(if b { 1.0 } else { 0.0 }),
            _ => Self::default(),
        })
    }
}

fn text_of(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(text_of(Value::deserialize(de)?))
}

fn texts<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items.into_iter().map(text_of).collect(),
        _ => Vec::new(),
    })
}

fn opt_texts<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => Some(items.into_iter().map(text_of).collect()),
        Value::Null => None,
        other => Some(vec![text_of(other)]),
    })
}

fn metal<'de, D: Deserializer<'de>>(de: D) -> Result<Metal, D::Error> {
    let raw = text(de)?;
    Ok(if raw.trim().eq_ignore_ascii_case("gold") {
        Metal::Gold
    } else {
        Metal::Silver
    })
}

/// One line of a gold invoice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoldItem {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub code: String,
    pub qty: Amount,
    #[serde(deserialize_with = "text")]
    pub hsn: String,
    pub grosswt: Amount,
    pub stoneweight: Amount,
    pub stonerate: Amount,
    pub netweight: Amount,
    #[serde(rename = "VA")]
    pub va: Amount,
    pub rate: Amount,
    pub wastage: Amount,
    pub mc: Amount,
    pub itemprice: Amount,
}

/// Invoice data posted to `/print`.
///
/// Silver invoices use the flat, parallel-array shape (`item`, `grossweight`,
/// ...); gold invoices carry an `items` list plus tax and customer fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvoicePayload {
    #[serde(deserialize_with = "metal")]
    pub metal: Metal,
    #[serde(deserialize_with = "text")]
    pub time: String,

    // flat shape
    #[serde(deserialize_with = "opt_texts")]
    pub item: Option<Vec<String>>,
    pub grossweight: Vec<Amount>,
    pub wastage: Vec<Amount>,
    pub making_charges: Vec<Amount>,
    pub item_price: Vec<Amount>,
    #[serde(rename = "Codes", deserialize_with = "texts")]
    pub codes: Vec<String>,
    /// Kept raw: it is part of the duplicate fingerprint.
    pub total: Value,
    #[serde(rename = "Discount")]
    pub flat_discount: Amount,
    pub os_nw: Amount,
    pub os_price: Amount,
    #[serde(rename = "sale price")]
    pub flat_sale_price: Amount,
    pub silver_price: Amount,
    #[serde(rename = "Gold_price")]
    pub gold_price: Amount,

    // item-list shape
    pub items: Option<Vec<GoldItem>>,
    pub cgst: Amount,
    pub sgst: Amount,
    #[serde(deserialize_with = "text")]
    pub cname: String,
    #[serde(deserialize_with = "text")]
    pub cmobile: String,
    #[serde(deserialize_with = "text")]
    pub caddress: String,
    #[serde(deserialize_with = "text")]
    pub invoice: String,
    pub paymethod: Map<String, Value>,
    #[serde(rename = "final")]
    pub final_amount: Amount,
    pub roundoff: Amount,
    pub discount: Amount,
    pub sale_price: Amount,
    pub og_nw: Amount,
    pub og_price: Amount,
}

impl InvoicePayload {
    /// `time` plus at least one of the two item shapes.
    pub fn has_required_fields(&self) -> bool {
        !self.time.trim().is_empty() && (self.item.is_some() || self.items.is_some())
    }

    pub fn gold_items(&self) -> &[GoldItem] {
        self.items.as_deref().unwrap_or_default()
    }

    pub fn flat_items(&self) -> &[String] {
        self.item.as_deref().unwrap_or_default()
    }

    pub fn is_taxed(&self) -> bool {
        self.cgst.is_positive()
    }

    pub fn has_stone_weight(&self) -> bool {
        self.gold_items().iter().any(|i| i.stoneweight.is_positive())
    }

    pub fn has_customer(&self) -> bool {
        [&self.cname, &self.caddress, &self.cmobile]
            .iter()
            .any(|f| !f.trim().is_empty())
    }

    /// Integer sum of the `total` entries; each entry is truncated first.
    pub fn flat_total(&self) -> i64 {
        match &self.total {
            Value::Array(parts) => parts
                .iter()
                .fold(0i64, |acc, p| acc.saturating_add(leading_int(p))),
            other => leading_int(other),
        }
    }

    /// Payment methods in the order the client sent them.
    pub fn payment_methods(&self) -> Vec<(&str, String)> {
        self.paymethod
            .iter()
            .map(|(k, v)| (k.as_str(), text_of(v.clone())))
            .collect()
    }
}

// Integer prefix of a number or numeric string; anything else counts as 0.
fn leading_int(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            s[..end].parse::<i64>().unwrap_or(0)
        }
        _ => 0,
    }
}

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PrintersResponse {
    pub printers: Vec<String>,
}
