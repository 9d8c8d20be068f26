//! Caller-facing campaign properties. The legacy admin boundary passes
//! booleans and numbers as strings (`"true"`, `"15"`) and knows the fields
//! by positional names `p1`–`p4`; both forms are normalized away here, at
//! the deserialization edge. Everything past this point works with real
//! types.

use serde::de::{Deserializer, Error as DeError};
use serde::Deserialize;

/// Inputs for creating or updating a campaign. On create, absent fields
/// fall back to the not-running defaults; on update, absent fields mean
/// "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CampaignProps {
    /// Desired delivery state (`state` or `p1` at the legacy boundary).
    #[serde(default, alias = "state", alias = "p1", deserialize_with = "opt_flag")]
    pub status: Option<bool>,
    /// Daily budget in major currency units ("p2").
    #[serde(default, alias = "p2", deserialize_with = "opt_number")]
    pub daily_budget: Option<f64>,
    /// Ad message ("p3").
    #[serde(default, alias = "p3")]
    pub ad_message: Option<String>,
    /// Targeted country codes (prospecting campaigns).
    #[serde(default)]
    pub country: Option<Vec<String>>,
    /// Visit-recency window in days ("p4", retargeting campaigns).
    #[serde(default, alias = "p4", deserialize_with = "opt_days")]
    pub visit_period_days: Option<u32>,
}

fn opt_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Str(String),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Bool(b)) => Ok(Some(b)),
        Some(Raw::Str(s)) => match s.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(D::Error::custom(format!(
                "expected \"true\" or \"false\", got {other:?}"
            ))),
        },
    }
}

fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

fn opt_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a day count, got {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_string_values() {
        let props: CampaignProps = serde_json::from_value(json!({
            "state": "true",
            "daily_budget": "15",
            "ad_message": "Buy now",
            "country": ["US", "CA"],
        }))
        .unwrap();
        assert_eq!(props.status, Some(true));
        assert_eq!(props.daily_budget, Some(15.0));
        assert_eq!(props.ad_message.as_deref(), Some("Buy now"));
        assert_eq!(props.country, Some(vec!["US".to_string(), "CA".to_string()]));
    }

    #[test]
    fn test_positional_aliases() {
        let props: CampaignProps = serde_json::from_value(json!({
            "p1": "false",
            "p2": 22.5,
            "p3": "New message",
            "p4": 14,
        }))
        .unwrap();
        assert_eq!(props.status, Some(false));
        assert_eq!(props.daily_budget, Some(22.5));
        assert_eq!(props.ad_message.as_deref(), Some("New message"));
        assert_eq!(props.visit_period_days, Some(14));
    }

    #[test]
    fn test_absent_fields_stay_none() {
        let props: CampaignProps = serde_json::from_value(json!({ "p4": "7" })).unwrap();
        assert_eq!(
            props,
            CampaignProps {
                visit_period_days: Some(7),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malformed_flag_rejected() {
        let result: Result<CampaignProps, _> =
            serde_json::from_value(json!({ "status": "yes" }));
        assert!(result.is_err());
    }
}
