use serde::{Deserialize, Serialize};

/// Notification priority. High priority bypasses quiet-hours suppression
/// and requests an audible push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// The channel that actually carried a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Apns,
    Sms,
    None,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Apns => "apns",
            DeliveryMethod::Sms => "sms",
            DeliveryMethod::None => "none",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "apns" => DeliveryMethod::Apns,
            "sms" => DeliveryMethod::Sms,
            _ => DeliveryMethod::None,
        }
    }
}
