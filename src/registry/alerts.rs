use super::{AlertKind, AlertRecord, HazardPoint, RegistryError, Severity};
use chrono::{DateTime, Duration, Utc};

#[allow(clippy::too_many_arguments)]
fn alert(
    id: &str,
    kind: AlertKind,
    severity: Severity,
    title: &str,
    location: &str,
    occurred_at: DateTime<Utc>,
    description: &str,
    affected_population: u64,
    confidence: u8,
) -> AlertRecord {
    AlertRecord {
        id: id.to_string(),
        kind,
        severity,
        title: title.to_string(),
        location: location.to_string(),
        occurred_at,
        description: description.to_string(),
        affected_population,
        confidence,
        magnitude: None,
    }
}

/// Alert feed snapshot, timestamped relative to `now`
pub fn standard_alerts(now: DateTime<Utc>) -> Vec<AlertRecord> {
    let mut quake = alert(
        "alert-001",
        AlertKind::Earthquake,
        Severity::Critical,
        "Magnitude 7.2 Earthquake",
        "Manila, Philippines",
        now - Duration::minutes(5),
        "Major seismic activity detected with potential for significant infrastructure damage and population displacement.",
        2_400_000,
        94,
    );
    quake.magnitude = Some(7.2);

    vec![
        quake,
        alert(
            "alert-002",
            AlertKind::Flood,
            Severity::High,
            "Flash Flood Warning",
            "Dubai, UAE",
            now - Duration::minutes(15),
            "Rapid water level rise in urban areas following unprecedented rainfall. Evacuation routes activated.",
            850_000,
            87,
        ),
        alert(
            "alert-003",
            AlertKind::Cyclone,
            Severity::Critical,
            "Category 4 Cyclone Approaching",
            "Cebu, Philippines",
            now - Duration::minutes(30),
            "Tropical cyclone with sustained winds of 240 km/h expected to make landfall within 6 hours.",
            1_200_000,
            91,
        ),
        alert(
            "alert-004",
            AlertKind::Wildfire,
            Severity::High,
            "Wildfire Spreading Rapidly",
            "Riyadh, Saudi Arabia",
            now - Duration::minutes(45),
            "Desert fire expanding due to high winds. Critical infrastructure at risk including power stations.",
            450_000,
            82,
        ),
        alert(
            "alert-005",
            AlertKind::Drought,
            Severity::Medium,
            "Severe Drought Conditions",
            "Jakarta, Indonesia",
            now - Duration::minutes(60),
            "Water reserves critically low. Agricultural systems failing across metropolitan region.",
            3_200_000,
            78,
        ),
    ]
}

/// Map-facing hazard points; also the source of the name → coordinate index
pub fn standard_points() -> Result<Vec<HazardPoint>, RegistryError> {
    Ok(vec![
        HazardPoint::new("UAE", "United Arab Emirates", 54.37, 24.45, "High".parse()?, 1250, 0.85)?,
        HazardPoint::new("Dubai", "Dubai", 55.27, 25.20, "Critical".parse()?, 520, 0.9)?,
        HazardPoint::new("Riyadh", "Riyadh", 46.72, 24.71, "Medium".parse()?, 220, 0.75)?,
        HazardPoint::new("Jeddah", "Jeddah", 39.19, 21.49, "Low".parse()?, 80, 0.6)?,
    ])
}
