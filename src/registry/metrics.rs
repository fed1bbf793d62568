use super::{Metric, Severity, Trend};

fn metric(title: &str, value: u64, unit: &str, change: &str, severity: Severity, confidence: u8) -> Metric {
    Metric {
        title: title.to_string(),
        value,
        unit: unit.to_string(),
        change: change.to_string(),
        trend: Trend::Increase,
        severity,
        confidence,
    }
}

/// Headline metrics snapshot
pub fn standard_metrics() -> Vec<Metric> {
    vec![
        metric("Active Disasters", 47, "events", "+3", Severity::Critical, 94),
        metric("Affected Population", 8_200_000, "people", "+12%", Severity::High, 87),
        metric("Infrastructure at Risk", 1247, "assets", "+8%", Severity::High, 91),
        metric("Displacement Estimates", 2_100_000, "displaced", "+15%", Severity::Critical, 82),
    ]
}
