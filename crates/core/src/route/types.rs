//! Route domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of a route.
///
/// Transitions run `pending -> processing -> {completed, failed}`. A terminal
/// route can only leave its state through an explicit reset to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RouteStatus {
    /// Returns the string representation used in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Pending => "pending",
            RouteStatus::Processing => "processing",
            RouteStatus::Completed => "completed",
            RouteStatus::Failed => "failed",
        }
    }

    /// Parse the string representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RouteStatus::Pending),
            "processing" => Some(RouteStatus::Processing),
            "completed" => Some(RouteStatus::Completed),
            "failed" => Some(RouteStatus::Failed),
            _ => None,
        }
    }

    /// Completed and failed are terminal: nothing changes without a reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Completed | RouteStatus::Failed)
    }

    /// Whether a regular status update may move from `self` to `next`.
    pub fn can_transition_to(&self, next: RouteStatus) -> bool {
        matches!(
            (self, next),
            (RouteStatus::Pending, RouteStatus::Processing)
                | (RouteStatus::Processing, RouteStatus::Completed)
                | (RouteStatus::Processing, RouteStatus::Failed)
        )
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coordinate along a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl RoutePoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Risk classification of a processed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify an overall score on the 0-10 scale.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            RiskLevel::Critical
        } else if score >= 6.0 {
            RiskLevel::High
        } else if score >= 4.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

/// Result of risk processing stored on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Overall score on the 0-10 scale.
    pub overall: f64,
    pub risk_level: RiskLevel,
    /// Number of sharp turns found along the route.
    #[serde(default)]
    pub sharp_turns: u32,
}

/// Number of completed routes at one risk level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBucket {
    #[serde(alias = "_id")]
    pub risk_level: RiskLevel,
    pub count: u64,
}

/// A route subject to risk processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub route_name: String,
    /// Origin code (BU code).
    pub from_code: String,
    /// Destination code.
    pub to_code: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub route_points: Vec<RoutePoint>,
    #[serde(default)]
    pub total_distance_km: f64,
    pub status: RouteStatus,
    #[serde(default)]
    pub risk: Option<RiskSummary>,
    #[serde(default)]
    pub processing_errors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing_completed_at: Option<DateTime<Utc>>,
}

impl Route {
    /// Coarse processing progress in percent, derived from the status.
    pub fn progress(&self) -> u8 {
        match self.status {
            RouteStatus::Pending => 0,
            RouteStatus::Processing => 50,
            RouteStatus::Completed | RouteStatus::Failed => 100,
        }
    }

    /// Case-insensitive match of `needle` against the display attributes.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.route_name, &self.from_code, &self.to_code]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Request to register a new route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoute {
    /// Display name (defaults to `{from_code}_to_{to_code}`).
    #[serde(default)]
    pub route_name: Option<String>,
    pub from_code: String,
    pub to_code: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub route_points: Vec<RoutePoint>,
}

impl NewRoute {
    pub fn new(from_code: impl Into<String>, to_code: impl Into<String>) -> Self {
        Self {
            route_name: None,
            from_code: from_code.into(),
            to_code: to_code.into(),
            customer_name: String::new(),
            location: String::new(),
            route_points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<RoutePoint>) -> Self {
        self.route_points = points;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    /// Name to store for this route.
    pub fn display_name(&self) -> String {
        self.route_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{}_to_{}", self.from_code, self.to_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&RouteStatus::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: RouteStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, RouteStatus::Failed);
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            RouteStatus::Pending,
            RouteStatus::Processing,
            RouteStatus::Completed,
            RouteStatus::Failed,
        ] {
            assert_eq!(RouteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RouteStatus::parse("queued"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RouteStatus::Pending.is_terminal());
        assert!(!RouteStatus::Processing.is_terminal());
        assert!(RouteStatus::Completed.is_terminal());
        assert!(RouteStatus::Failed.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(RouteStatus::Pending.can_transition_to(RouteStatus::Processing));
        assert!(RouteStatus::Processing.can_transition_to(RouteStatus::Completed));
        assert!(RouteStatus::Processing.can_transition_to(RouteStatus::Failed));

        assert!(!RouteStatus::Pending.can_transition_to(RouteStatus::Completed));
        assert!(!RouteStatus::Completed.can_transition_to(RouteStatus::Processing));
        assert!(!RouteStatus::Failed.can_transition_to(RouteStatus::Completed));
        assert!(!RouteStatus::Processing.can_transition_to(RouteStatus::Pending));
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(1.5), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(4.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(6.2), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(8.0), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_bucket_accepts_legacy_key() {
        let bucket: RiskBucket = serde_json::from_str(r#"{"_id": "HIGH", "count": 4}"#).unwrap();
        assert_eq!(bucket.risk_level, RiskLevel::High);
        assert_eq!(bucket.count, 4);

        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["risk_level"], "HIGH");
    }

    #[test]
    fn test_new_route_default_name() {
        let route = NewRoute::new("1140", "0004521");
        assert_eq!(route.display_name(), "1140_to_0004521");

        let named = NewRoute::new("1140", "0004521").with_name("Mumbai depot run");
        assert_eq!(named.display_name(), "Mumbai depot run");
    }
}
