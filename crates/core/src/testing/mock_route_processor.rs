//! Mock route processor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::processing::{ProcessError, RouteAssessment, RouteProcessor};
use crate::route::{RiskLevel, RiskSummary, Route};

/// Mock implementation of the RouteProcessor trait.
///
/// Records every assessed route, can fail chosen routes, and tracks how many
/// assessments ran at the same time.
#[derive(Debug)]
pub struct MockRouteProcessor {
    assessed: Arc<RwLock<Vec<String>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    assessment: Arc<RwLock<RouteAssessment>>,
    delay: Arc<RwLock<Option<Duration>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Default for MockRouteProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRouteProcessor {
    /// Create a processor that scores every route as medium risk.
    pub fn new() -> Self {
        Self {
            assessed: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            assessment: Arc::new(RwLock::new(RouteAssessment {
                risk: RiskSummary {
                    overall: 5.0,
                    risk_level: RiskLevel::Medium,
                    sharp_turns: 1,
                },
                total_distance_km: 10.0,
            })),
            delay: Arc::new(RwLock::new(None)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail assessments of `route_id` with `message`.
    pub async fn fail_route(&self, route_id: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(route_id.to_string(), message.to_string());
    }

    pub async fn set_assessment(&self, assessment: RouteAssessment) {
        *self.assessment.write().await = assessment;
    }

    /// Make each assessment take `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// IDs of assessed routes, in call order.
    pub async fn assessed(&self) -> Vec<String> {
        self.assessed.read().await.clone()
    }

    /// Highest number of assessments running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteProcessor for MockRouteProcessor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn assess(&self, route: &Route) -> Result<RouteAssessment, ProcessError> {
        self.assessed.write().await.push(route.id.clone());

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = self.failures.read().await.get(&route.id) {
            return Err(ProcessError::Processor(message.clone()));
        }
        Ok(self.assessment.read().await.clone())
    }
}
