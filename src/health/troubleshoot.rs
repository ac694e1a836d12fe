//! Guided troubleshooting.
//!
//! Combines the connectivity snapshot with a round of health checks and
//! turns what it sees into plain-language suggestions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::connectivity::ConnectivitySnapshot;
use crate::health::check::{HealthReport, HealthTarget};
use crate::http::ResilientClient;
use crate::resilience::ErrorClass;

const SLOW_RTT_MS: u64 = 1000;
const SLOW_CONNECTION_TYPES: [&str; 2] = ["slow-2g", "2g"];

#[derive(Debug, Clone, Serialize)]
pub struct TroubleshootReport {
    pub connectivity: Arc<ConnectivitySnapshot>,
    pub targets: BTreeMap<String, HealthReport>,
    pub suggestions: Vec<String>,
}

impl TroubleshootReport {
    /// No problems found.
    pub fn is_clear(&self) -> bool {
        self.suggestions.is_empty()
    }
}

impl ResilientClient {
    /// Check connectivity and every target, then suggest next steps.
    pub async fn diagnose(&self, targets: &[HealthTarget]) -> TroubleshootReport {
        let connectivity = self.connectivity().snapshot();
        let reports = self.health_check(targets).await;
        let suggestions = suggest(&connectivity, &reports);

        tracing::info!(
            online = connectivity.is_online,
            targets = reports.len(),
            suggestions = suggestions.len(),
            "Troubleshooting finished"
        );

        TroubleshootReport {
            connectivity,
            targets: reports,
            suggestions,
        }
    }
}

fn suggest(snapshot: &ConnectivitySnapshot, reports: &BTreeMap<String, HealthReport>) -> Vec<String> {
    let mut suggestions = Vec::new();

    if !snapshot.is_online {
        suggestions.push(
            "You appear to be offline. Check your network connection or Wi-Fi.".to_string(),
        );
        return suggestions;
    }

    let slow_type = snapshot
        .hints
        .effective_type
        .as_deref()
        .is_some_and(|t| SLOW_CONNECTION_TYPES.contains(&t));
    let slow_rtt = snapshot.hints.rtt_ms.is_some_and(|rtt| rtt > SLOW_RTT_MS);
    if slow_type || slow_rtt {
        suggestions.push(
            "Your connection is slow. Requests may time out; try a faster network.".to_string(),
        );
    }

    let unhealthy: Vec<(&String, &HealthReport)> =
        reports.iter().filter(|(_, r)| !r.is_healthy()).collect();

    if !reports.is_empty() && unhealthy.len() == reports.len() {
        suggestions.push(
            "Every service is unavailable. A firewall, proxy or VPN may be blocking requests."
                .to_string(),
        );
        return suggestions;
    }

    for (name, report) in unhealthy {
        let hint = match report.class {
            Some(ErrorClass::Cors) => format!(
                "{name}: the request was blocked by cross-origin policy. Check the service's allowed origins."
            ),
            Some(ErrorClass::ClientRejected) if matches!(report.http_status, Some(401 | 403)) => {
                format!("{name}: you are not authorized. Check your credentials or sign in again.")
            }
            Some(ErrorClass::ClientRejected) => {
                format!("{name}: the service rejected the request.")
            }
            Some(ErrorClass::Timeout) => {
                format!("{name}: the service did not answer in time. Try again shortly.")
            }
            Some(ErrorClass::ServerError) => format!(
                "{name}: the service is having problems. Try again later."
            ),
            _ => format!("{name}: the service could not be reached."),
        };
        suggestions.push(hint);
    }

    suggestions
}
