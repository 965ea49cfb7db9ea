use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Request body for `/attendance` and `/profile`.
#[derive(Debug, Deserialize)]
pub struct PinRequest {
    #[serde(default, deserialize_with = "pin_from_json")]
    pub pin: Option<String>,
}

// Front-ends send the PIN as a string, older ones as a bare number.
fn pin_from_json<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Which downstream dataset to fetch after logging in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Attendance,
    Profile,
}

impl DataKind {
    /// Numeric selector the data API expects in the `method` field.
    pub fn method(self) -> &'static str {
        match self {
            DataKind::Attendance => "314",
            DataKind::Profile => "32",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            DataKind::Attendance => "attendance",
            DataKind::Profile => "profile",
        }
    }
}
