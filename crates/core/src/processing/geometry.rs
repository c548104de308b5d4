//! Geometric risk assessment.
//!
//! Scores a route by its sharp turns: every heading change above the
//! threshold counts as a sharp turn and contributes a score that grows with
//! the angle. Routes without sharp turns get a low baseline score.

use async_trait::async_trait;

use super::{ProcessError, RouteAssessment, RouteProcessor};
use crate::route::{RiskLevel, RiskSummary, Route, RoutePoint};

const EARTH_RADIUS_KM: f64 = 6371.0;
const BASELINE_SCORE: f64 = 2.0;

/// Processor that derives risk from route geometry alone.
#[derive(Debug, Clone)]
pub struct GeometryProcessor {
    sharp_turn_threshold_deg: f64,
}

impl GeometryProcessor {
    pub fn new(sharp_turn_threshold_deg: f64) -> Self {
        Self {
            sharp_turn_threshold_deg,
        }
    }

    /// Assess a list of points. Pure, so callers can use it outside the
    /// processing lifecycle.
    pub fn assess_points(&self, points: &[RoutePoint]) -> RouteAssessment {
        let total_distance_km = round2(
            points
                .windows(2)
                .map(|pair| haversine_km(pair[0], pair[1]))
                .sum(),
        );

        let turn_scores: Vec<f64> = heading_changes(points)
            .into_iter()
            .filter(|change| *change > self.sharp_turn_threshold_deg)
            .map(turn_score)
            .collect();

        let overall = if turn_scores.is_empty() {
            BASELINE_SCORE
        } else {
            round2(turn_scores.iter().sum::<f64>() / turn_scores.len() as f64)
        };

        RouteAssessment {
            risk: RiskSummary {
                overall,
                risk_level: RiskLevel::from_score(overall),
                sharp_turns: turn_scores.len() as u32,
            },
            total_distance_km,
        }
    }
}

#[async_trait]
impl RouteProcessor for GeometryProcessor {
    fn name(&self) -> &str {
        "geometry"
    }

    async fn assess(&self, route: &Route) -> Result<RouteAssessment, ProcessError> {
        if route.route_points.is_empty() {
            return Err(ProcessError::NoRoutePoints(route.id.clone()));
        }
        Ok(self.assess_points(&route.route_points))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn haversine_km(a: RoutePoint, b: RoutePoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial bearing from `a` to `b` in degrees, 0..360.
fn bearing_deg(a: RoutePoint, b: RoutePoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Absolute heading change (0..=180) at every interior point.
/// Zero-length segments have no heading and are skipped.
fn heading_changes(points: &[RoutePoint]) -> Vec<f64> {
    let bearings: Vec<f64> = points
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .map(|pair| bearing_deg(pair[0], pair[1]))
        .collect();

    bearings
        .windows(2)
        .map(|pair| {
            let diff = (pair[1] - pair[0]).abs() % 360.0;
            if diff > 180.0 {
                360.0 - diff
            } else {
                diff
            }
        })
        .collect()
}

fn turn_score(angle_deg: f64) -> f64 {
    if angle_deg > 120.0 {
        9.0
    } else if angle_deg > 90.0 {
        8.0
    } else if angle_deg > 75.0 {
        7.0
    } else {
        6.0
    }
}
