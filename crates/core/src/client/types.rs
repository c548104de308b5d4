//! Wire types of the route API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::route::{RiskBucket, RiskLevel, Route, RouteStatus};

/// Acknowledgement of a processing request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessAck {
    pub fn started(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Processing status of one route as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStatusReport {
    pub status: RouteStatus,
    /// Percent, 0-100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Route counters of the dashboard statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteCounts {
    pub total: u64,
    pub processed: u64,
    pub processing_rate: f64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub failed: u64,
}

impl RouteCounts {
    /// Build counters, deriving the processing rate.
    pub fn new(total: u64, processed: u64, pending: u64, failed: u64) -> Self {
        let processing_rate = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64 * 100.0
        };
        Self {
            total,
            processed,
            processing_rate,
            pending,
            failed,
        }
    }

    /// Rate with one decimal place and a percent sign, e.g. `42.0%`.
    pub fn processing_rate_label(&self) -> String {
        format!("{:.1}%", self.processing_rate)
    }
}

/// Dashboard statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub routes: RouteCounts,
    #[serde(default, deserialize_with = "deserialize_risk_distribution")]
    pub risk_distribution: Vec<RiskBucket>,
}

/// Bucket as sent by servers that group completed routes without a risk
/// level under a null key.
#[derive(Deserialize)]
struct WireRiskBucket {
    #[serde(alias = "_id")]
    risk_level: Option<RiskLevel>,
    count: u64,
}

/// Keep only buckets with a risk level; null buckets are dropped.
fn deserialize_risk_distribution<'de, D>(deserializer: D) -> Result<Vec<RiskBucket>, D::Error>
where
    D: Deserializer<'de>,
{
    let buckets = Vec::<WireRiskBucket>::deserialize(deserializer)?;
    Ok(buckets
        .into_iter()
        .filter_map(|bucket| {
            bucket.risk_level.map(|risk_level| RiskBucket {
                risk_level,
                count: bucket.count,
            })
        })
        .collect())
}

/// Query for one page of routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub page: u32,
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RouteStatus>,
}

impl Default for RouteQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            status: None,
        }
    }
}

impl RouteQuery {
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_status(mut self, status: RouteStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// One page of routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePage {
    pub routes: Vec<Route>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// A downloaded export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_rate_label() {
        let counts = RouteCounts {
            total: 100,
            processed: 42,
            processing_rate: 42.0,
            pending: 0,
            failed: 0,
        };
        assert_eq!(counts.processing_rate_label(), "42.0%");
    }

    #[test]
    fn test_processing_rate_derived() {
        assert_eq!(RouteCounts::new(3, 1, 2, 0).processing_rate_label(), "33.3%");
        assert_eq!(RouteCounts::new(0, 0, 0, 0).processing_rate, 0.0);
    }

    #[test]
    fn test_statistics_accepts_legacy_payload() {
        let json = r#"{
            "routes": {"total": 10, "processed": 4, "processing_rate": 40.0},
            "risk_distribution": [{"_id": "HIGH", "count": 3}, {"risk_level": "LOW", "count": 1}]
        }"#;
        let stats: Statistics = serde_json::from_str(json).unwrap();

        assert_eq!(stats.routes.pending, 0);
        assert_eq!(stats.risk_distribution.len(), 2);
        assert_eq!(stats.risk_distribution[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_statistics_skips_null_risk_bucket() {
        let json = r#"{
            "routes": {"total": 3, "processed": 2, "processing_rate": 66.7},
            "risk_distribution": [{"_id": "HIGH", "count": 1}, {"_id": null, "count": 1}]
        }"#;
        let stats: Statistics = serde_json::from_str(json).unwrap();

        assert_eq!(stats.routes.processing_rate_label(), "66.7%");
        assert_eq!(
            stats.risk_distribution,
            vec![RiskBucket {
                risk_level: RiskLevel::High,
                count: 1,
            }]
        );
    }

    #[test]
    fn test_status_report_defaults() {
        let report: RouteStatusReport = serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        assert_eq!(report.status, RouteStatus::Processing);
        assert_eq!(report.progress, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_ack_without_message() {
        let ack: ProcessAck = serde_json::from_str(r#"{"error": "Route not found"}"#).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.error.as_deref(), Some("Route not found"));
    }
}
