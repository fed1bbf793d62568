use crate::registry::{Metric, Severity, Trend};
use crate::selection::{Selected, SelectionListener};

/// Sentinel for a field the selection does not carry
pub const NOT_AVAILABLE: &str = "N/A";
/// Sentinel for a missing confidence figure
pub const NO_CONFIDENCE: &str = "—";

/// One headline metric card, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCardModel {
    pub title: String,
    pub value: String,
    pub unit: String,
    pub change: String,
    pub trend_arrow: char,
    pub severity: Severity,
    pub confidence: String,
}

/// Detail fields of the selected thing
#[derive(Debug, Clone, PartialEq)]
pub struct DetailModel {
    pub title: String,
    pub kind: String,
    pub severity: Severity,
    pub active_events: String,
    pub affected_population: String,
    pub confidence: String,
    pub coordinates: Option<String>,
}

/// Everything the summary panel draws
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayModel {
    pub cards: Vec<MetricCardModel>,
    /// `None` hides the detail section
    pub detail: Option<DetailModel>,
}

/// Project the selection and metrics into a display model
pub fn render(selection: Option<&Selected>, metrics: &[Metric]) -> DisplayModel {
    DisplayModel {
        cards: metrics.iter().map(metric_card).collect(),
        detail: selection.map(detail),
    }
}

pub fn metric_card(metric: &Metric) -> MetricCardModel {
    MetricCardModel {
        title: metric.title.clone(),
        value: format_metric_value(metric.value),
        unit: metric.unit.clone(),
        change: metric.change.clone(),
        trend_arrow: match metric.trend {
            Trend::Increase => '↑',
            Trend::Decrease => '↓',
        },
        severity: metric.severity,
        confidence: format!("{}%", metric.confidence),
    }
}

pub fn detail(selection: &Selected) -> DetailModel {
    DetailModel {
        title: selection.name().to_string(),
        kind: selection.kind_label().to_string(),
        severity: selection.severity(),
        active_events: format_active_events(selection.active_incidents(), selection.magnitude()),
        affected_population: format_population(selection.affected_population()),
        confidence: selection
            .confidence_percent()
            .map(|c| format!("{c}%"))
            .unwrap_or_else(|| NO_CONFIDENCE.to_string()),
        coordinates: selection.coordinates().map(|c| format_coords(c.lon, c.lat)),
    }
}

/// Incident count first, then magnitude; zero counts as absent
pub fn format_active_events(active_incidents: Option<u32>, magnitude: Option<f64>) -> String {
    if let Some(count) = active_incidents.filter(|&c| c > 0) {
        return count.to_string();
    }
    if let Some(mag) = magnitude.filter(|&m| m > 0.0) {
        return format!("{mag}");
    }
    NOT_AVAILABLE.to_string()
}

/// Millions with one decimal: 2_400_000 → "2.4M"; absent or zero → "N/A"
pub fn format_population(population: Option<u64>) -> String {
    match population.filter(|&p| p > 0) {
        Some(p) => format!("{:.1}M", p as f64 / 1_000_000.0),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Metric card value: millions compacted, smaller numbers digit-grouped
pub fn format_metric_value(value: u64) -> String {
    if value >= 1_000_000 {
        return format!("{:.1}M", value as f64 / 1_000_000.0);
    }
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_coords(lon: f64, lat: f64) -> String {
    format!(
        "{:.2}°{}, {:.2}°{}",
        lat.abs(),
        if lat >= 0.0 { "N" } else { "S" },
        lon.abs(),
        if lon >= 0.0 { "E" } else { "W" }
    )
}

/// Summary panel state: recomputes its display model on every selection write
pub struct SummaryPanel {
    metrics: Vec<Metric>,
    model: DisplayModel,
    revision: u64,
}

impl SummaryPanel {
    pub fn new(metrics: Vec<Metric>) -> Self {
        let model = render(None, &metrics);
        Self {
            metrics,
            model,
            revision: 0,
        }
    }

    pub fn model(&self) -> &DisplayModel {
        &self.model
    }

    /// Selection revision the model was computed for
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_detail(&self) -> bool {
        self.model.detail.is_some()
    }
}

impl SelectionListener for SummaryPanel {
    fn selection_changed(&mut self, selection: Option<&Selected>, revision: u64) {
        self.model = render(selection, &self.metrics);
        self.revision = revision;
    }
}
