use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "string_or_empty")]
    pub upi_id: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub qr_code: String,
}

// `null` or a non-string value reads as unset instead of failing the document.
fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

impl Settings {
    // A blank UPI id keeps the current one.
    pub fn merge(&mut self, upi_id: Option<&str>, qr_code: Option<String>) {
        if let Some(upi_id) = upi_id.filter(|u| !u.is_empty()) {
            self.upi_id = upi_id.to_string();
        }
        if let Some(qr_code) = qr_code {
            self.qr_code = qr_code;
        }
    }
}
