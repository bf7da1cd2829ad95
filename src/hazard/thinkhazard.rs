use crate::prelude::*;
use crate::service::var_service::get_report_url;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HazardLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
    NoData,
    Other(String),
}

impl HazardLevel {
    pub fn from_title(title: Option<&str>) -> Self {
        let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
            return HazardLevel::NoData;
        };

        let lowered = title.to_lowercase();
        if lowered == "no data" {
            HazardLevel::NoData
        } else if lowered.contains("very high") {
            HazardLevel::VeryHigh
        } else if lowered.contains("high") {
            HazardLevel::High
        } else if lowered.contains("medium") {
            HazardLevel::Medium
        } else if lowered.contains("very low") {
            HazardLevel::VeryLow
        } else if lowered.contains("low") {
            HazardLevel::Low
        } else {
            HazardLevel::Other(title.to_string())
        }
    }
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardLevel::VeryHigh => f.write_str("Very high"),
            HazardLevel::High => f.write_str("High"),
            HazardLevel::Medium => f.write_str("Medium"),
            HazardLevel::Low => f.write_str("Low"),
            HazardLevel::VeryLow => f.write_str("Very low"),
            HazardLevel::NoData => f.write_str("No data"),
            HazardLevel::Other(title) => f.write_str(title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardAssessment {
    pub hazard: String,
    pub level: HazardLevel,
}

#[derive(Deserialize)]
struct FlatHazard {
    hazard: String,
    #[serde(default)]
    level: Option<String>,
}

#[derive(Deserialize)]
struct NestedHazard {
    hazardtype: NestedType,
    #[serde(default)]
    hazardlevel: Option<NestedLevel>,
}

#[derive(Deserialize)]
struct NestedType {
    hazardtype: String,
}

#[derive(Deserialize)]
struct NestedLevel {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReportResponse {
    Flat { hazards: Vec<FlatHazard> },
    Nested(Vec<NestedHazard>),
}

pub fn parse_report(json: Value) -> Vec<HazardAssessment> {
    match serde_json::from_value::<ReportResponse>(json) {
        Ok(ReportResponse::Flat { hazards }) => hazards
            .into_iter()
            .map(|h| HazardAssessment {
                level: HazardLevel::from_title(h.level.as_deref()),
                hazard: h.hazard,
            })
            .collect(),
        Ok(ReportResponse::Nested(hazards)) => hazards
            .into_iter()
            .map(|h| HazardAssessment {
                level: HazardLevel::from_title(h.hazardlevel.and_then(|l| l.title).as_deref()),
                hazard: h.hazardtype.hazardtype,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Hazard report had an unexpected shape: {}", e);
            Vec::new()
        }
    }
}

pub async fn fetch_hazard_report(client: &Client, report_id: i64) -> Result<Vec<HazardAssessment>> {
    let url = get_report_url().await?.join(&format!("{}.json", report_id))?;
    tracing::info!("Fetching hazard report {}", url);

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        let err = format!("Non-success response from hazard report {}: {}", report_id, response.status());
        tracing::error!(err);
        return Err(anyhow::anyhow!(err));
    }

    Ok(parse_report(response.json().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_shape() {
        let report = parse_report(json!({
            "hazards": [
                {"hazard": "River flood", "level": "High"},
                {"hazard": "Earthquake", "level": "Very low"},
                {"hazard": "Cyclone"}
            ]
        }));
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].hazard, "River flood");
        assert_eq!(report[0].level, HazardLevel::High);
        assert_eq!(report[1].level, HazardLevel::VeryLow);
        assert_eq!(report[2].level, HazardLevel::NoData);
    }

    #[test]
    fn nested_shape() {
        let report = parse_report(json!([
            {"hazardtype": {"hazardtype": "Extreme heat", "mnemonic": "EH"},
             "hazardlevel": {"title": "Medium", "mnemonic": "MED"}},
            {"hazardtype": {"hazardtype": "Wildfire"}}
        ]));
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].hazard, "Extreme heat");
        assert_eq!(report[0].level, HazardLevel::Medium);
        assert_eq!(report[1].level, HazardLevel::NoData);
    }

    #[test]
    fn other_shapes_are_empty() {
        assert!(parse_report(json!({"error": "not found"})).is_empty());
        assert!(parse_report(json!("text")).is_empty());
    }

    #[test]
    fn level_titles() {
        assert_eq!(HazardLevel::from_title(Some("Very high")), HazardLevel::VeryHigh);
        assert_eq!(HazardLevel::from_title(Some("LOW")), HazardLevel::Low);
        assert_eq!(HazardLevel::from_title(Some("No Data")), HazardLevel::NoData);
        assert_eq!(HazardLevel::from_title(None), HazardLevel::NoData);
        assert_eq!(
            HazardLevel::from_title(Some("Unclassified")),
            HazardLevel::Other("Unclassified".to_string())
        );
        assert_eq!(HazardLevel::VeryLow.to_string(), "Very low");
    }
}
