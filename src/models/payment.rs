use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Approved,
        PaymentStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Approved => "Approved",
            PaymentStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(format!("'{}' is not one of pending, approved, rejected", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    // pending -> approved | rejected only
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: &RecordStatus, to: PaymentStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (
                    RecordStatus::Known(PaymentStatus::Pending),
                    PaymentStatus::Approved | PaymentStatus::Rejected
                )
            ),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown status policy: {}", other)),
        }
    }
}

// Stored status as written. Values outside the three known ones are kept
// verbatim: listed, but matching no filter and counted nowhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordStatus {
    Known(PaymentStatus),
    Unrecognized(Value),
}

impl RecordStatus {
    pub fn known(&self) -> Option<PaymentStatus> {
        match self {
            RecordStatus::Known(status) => Some(*status),
            RecordStatus::Unrecognized(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            RecordStatus::Known(status) => status.label().to_string(),
            RecordStatus::Unrecognized(raw) => raw_text(raw),
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Known(PaymentStatus::default())
    }
}

impl From<PaymentStatus> for RecordStatus {
    fn from(status: PaymentStatus) -> Self {
        RecordStatus::Known(status)
    }
}

impl PartialEq<PaymentStatus> for RecordStatus {
    fn eq(&self, other: &PaymentStatus) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Known(status) => f.write_str(status.as_str()),
            RecordStatus::Unrecognized(raw) => f.write_str(&raw_text(raw)),
        }
    }
}

/// A record timestamp. RFC 3339 strings parse; anything else another tool
/// wrote (a bare date, epoch millis) is kept and shown as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Parsed(DateTime<Utc>),
    Raw(Value),
}

impl Timestamp {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Parsed(at) => Some(*at),
            Timestamp::Raw(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Timestamp::Parsed(at)
    }
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
    Other(Value),
}

impl Amount {
    /// Numeric value, reading the longest leading decimal prefix.
    /// Anything without one counts as zero.
    pub fn value(&self) -> f64 {
        match self {
            Amount::Number(n) => n.as_f64().unwrap_or(0.0),
            Amount::Text(s) => parse_leading_decimal(s).unwrap_or(0.0),
            Amount::Other(_) => 0.0,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) => write!(f, "{}", n),
            Amount::Text(s) => f.write_str(s),
            Amount::Other(raw) => write!(f, "{}", raw),
        }
    }
}

fn parse_leading_decimal(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    // Fields written by other tools, carried through rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PaymentRecord {
    pub fn amount_value(&self) -> f64 {
        self.amount.as_ref().map(Amount::value).unwrap_or(0.0)
    }

    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub user_name: String,
    pub package_name: String,
    pub amount: Amount,
    #[serde(default)]
    pub utr: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
}

impl NewPayment {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            id,
            user_name: Some(self.user_name),
            package_name: Some(self.package_name),
            amount: Some(self.amount),
            utr: self.utr.filter(|u| !u.trim().is_empty()),
            screenshot: self.screenshot.filter(|s| !s.trim().is_empty()),
            status: PaymentStatus::Pending.into(),
            created_at: Some(now.into()),
            updated_at: None,
            extra: serde_json::Map::new(),
        }
    }
}

// Raw string so an unknown status is a 400 from the handler, not a rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("approved".parse::<PaymentStatus>(), Ok(PaymentStatus::Approved));
        assert!("Approved".parse::<PaymentStatus>().is_err());
        assert!("done".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn strict_policy_only_leaves_pending() {
        use PaymentStatus::*;
        let strict = TransitionPolicy::Strict;
        assert!(strict.allows(&Pending.into(), Approved));
        assert!(strict.allows(&Pending.into(), Rejected));
        assert!(!strict.allows(&Approved.into(), Pending));
        assert!(!strict.allows(&Rejected.into(), Approved));
        assert!(!strict.allows(&Pending.into(), Pending));
        assert!(TransitionPolicy::Permissive.allows(&Approved.into(), Pending));

        let odd = RecordStatus::Unrecognized(json!("on-hold"));
        assert!(!strict.allows(&odd, Approved));
        assert!(TransitionPolicy::Permissive.allows(&odd, Approved));
    }

    #[test]
    fn amount_reads_leading_decimal() {
        let text = |s: &str| Amount::Text(s.to_string()).value();
        assert_eq!(text("10"), 10.0);
        assert_eq!(text("  12.5abc"), 12.5);
        assert_eq!(text(".5"), 0.5);
        assert_eq!(text("1e3"), 1000.0);
        assert_eq!(text("2e"), 2.0);
        assert_eq!(text("bad"), 0.0);
        assert_eq!(text(""), 0.0);
        assert_eq!(text("-"), 0.0);
        assert_eq!(Amount::Number(serde_json::Number::from(7)).value(), 7.0);
        assert_eq!(Amount::Other(json!({"inr": 5})).value(), 0.0);
    }

    #[test]
    fn record_keeps_amount_form_and_unknown_fields() {
        let raw = json!({
            "id": "a1b2c3d4e5f6",
            "userName": "ravi",
            "packageName": "Gold",
            "amount": "499.00",
            "status": "pending",
            "createdAt": "2024-05-01T10:00:00Z",
            "source": "telegram"
        });

        let record: PaymentRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.amount, Some(Amount::Text("499.00".into())));
        assert_eq!(record.extra.get("source"), Some(&json!("telegram")));
        assert_eq!(record.short_id(), "a1b2c3d4");
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let record: PaymentRecord = serde_json::from_value(json!({
            "id": "p1",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(record.amount_value(), 0.0);
    }

    #[test]
    fn nonconforming_fields_are_kept_as_written() {
        let raw = json!({
            "id": "p9",
            "amount": true,
            "status": "on-hold",
            "createdAt": "2024-05-01",
            "updatedAt": 1714557600000u64
        });

        let record: PaymentRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.status.known(), None);
        assert_eq!(record.status.to_string(), "on-hold");
        assert_eq!(record.created_at, Some(Timestamp::Raw(json!("2024-05-01"))));
        assert_eq!(record.amount_value(), 0.0);
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn rfc3339_timestamps_parse() {
        let record: PaymentRecord = serde_json::from_value(json!({
            "id": "p1",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        let created = record.created_at.and_then(|t| t.datetime()).unwrap();
        assert_eq!(created.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }
}
