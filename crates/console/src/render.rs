//! Prints console events to the terminal.

use tokio::sync::mpsc;

use hpcl_core::{ConsoleEvent, ConsoleEventEnvelope, NotificationLevel, RoutePage};

/// Drain the event channel until every handle is gone.
pub async fn run(mut events: mpsc::Receiver<ConsoleEventEnvelope>) {
    while let Some(envelope) = events.recv().await {
        if let Some(line) = render_event(&envelope.event) {
            println!("{}", line);
        }
    }
}

fn render_event(event: &ConsoleEvent) -> Option<String> {
    match event {
        ConsoleEvent::Notification { level, message } => {
            Some(format!("[{}] {}", level_tag(*level), message))
        }
        ConsoleEvent::StatusObserved { route_id, status } => {
            Some(format!("  {} ... {}", route_id, status))
        }
        ConsoleEvent::ProgressShown { total, label } => {
            Some(format!("Processing {} routes ({})", total, label))
        }
        ConsoleEvent::ProgressUpdated { percent, label, .. } => {
            Some(format!("  [{:>3}%] {}", percent, label))
        }
        ConsoleEvent::StatsUpdated {
            total,
            processed,
            processing_rate_label,
        } => Some(format!(
            "Routes: {} total, {} processed, processing rate {}",
            total, processed, processing_rate_label
        )),
        ConsoleEvent::RiskChartUpdated { distribution } => {
            if distribution.is_empty() {
                return Some("Risk distribution: no processed routes".to_string());
            }
            let buckets: Vec<String> = distribution
                .iter()
                .map(|bucket| format!("{} {}", bucket.risk_level.as_str(), bucket.count))
                .collect();
            Some(format!("Risk distribution: {}", buckets.join(", ")))
        }
        // Control state and view refreshes have no terminal counterpart.
        ConsoleEvent::ControlDisabled { .. }
        | ConsoleEvent::ControlEnabled { .. }
        | ConsoleEvent::ProgressHidden
        | ConsoleEvent::RefreshRequested => None,
    }
}

fn level_tag(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Danger => "error",
    }
}

pub fn print_routes(page: &RoutePage) {
    println!(
        "{:<38} {:<28} {:<10} {:<10} {:<8}",
        "ID", "NAME", "FROM", "TO", "STATUS"
    );
    for route in &page.routes {
        println!(
            "{:<38} {:<28} {:<10} {:<10} {:<8}",
            route.id, route.route_name, route.from_code, route.to_code, route.status
        );
    }
    println!(
        "Page {} ({} per page), {} routes in total",
        page.page, page.per_page, page.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpcl_core::{RiskBucket, RiskLevel};

    #[test]
    fn test_render_notification() {
        let line = render_event(&ConsoleEvent::Notification {
            level: NotificationLevel::Danger,
            message: "Route processing failed: timeout".to_string(),
        });
        assert_eq!(
            line.as_deref(),
            Some("[error] Route processing failed: timeout")
        );
    }

    #[test]
    fn test_render_stats_keeps_rate_label() {
        let line = render_event(&ConsoleEvent::StatsUpdated {
            total: 10,
            processed: 4,
            processing_rate_label: "40.0%".to_string(),
        })
        .unwrap();
        assert!(line.ends_with("processing rate 40.0%"));
    }

    #[test]
    fn test_render_risk_chart() {
        let line = render_event(&ConsoleEvent::RiskChartUpdated {
            distribution: vec![
                RiskBucket {
                    risk_level: RiskLevel::High,
                    count: 3,
                },
                RiskBucket {
                    risk_level: RiskLevel::Low,
                    count: 1,
                },
            ],
        });
        assert_eq!(line.as_deref(), Some("Risk distribution: HIGH 3, LOW 1"));
    }

    #[test]
    fn test_silent_events() {
        assert_eq!(render_event(&ConsoleEvent::ProgressHidden), None);
        assert_eq!(render_event(&ConsoleEvent::RefreshRequested), None);
    }
}
