use super::{LocationKind, LocationNode, Severity};

use LocationKind::{City, Country, Global, Region};
use Severity::{Critical, High, Medium};

fn city(id: &str, name: &str, active: u32, severity: Severity) -> LocationNode {
    LocationNode::new(id, name, City, severity, active)
}

/// Built-in location hierarchy
pub fn standard_locations() -> Vec<LocationNode> {
    let middle_east = LocationNode::new("middle-east", "Middle East & North Africa", Region, High, 12)
        .with_children(vec![
            LocationNode::new("uae", "United Arab Emirates", Country, Medium, 3).with_children(vec![
                city("dubai", "Dubai", 1, Medium),
                city("abu-dhabi", "Abu Dhabi", 2, High),
            ]),
            LocationNode::new("saudi", "Saudi Arabia", Country, High, 4).with_children(vec![
                city("riyadh", "Riyadh", 2, High),
                city("jeddah", "Jeddah", 2, Medium),
            ]),
        ]);

    let asia_pacific = LocationNode::new("asia-pacific", "Asia Pacific", Region, Critical, 18)
        .with_children(vec![
            LocationNode::new("philippines", "Philippines", Country, Critical, 8).with_children(vec![
                city("manila", "Manila", 3, Critical),
                city("cebu", "Cebu", 2, High),
            ]),
            LocationNode::new("indonesia", "Indonesia", Country, High, 6).with_children(vec![
                city("jakarta", "Jakarta", 3, High),
                city("surabaya", "Surabaya", 1, Medium),
            ]),
        ]);

    let americas = LocationNode::new("americas", "Americas", Region, High, 11).with_children(vec![
        LocationNode::new("usa", "United States", Country, High, 7).with_children(vec![
            city("miami", "Miami", 2, High),
            city("houston", "Houston", 1, Medium),
        ]),
    ]);

    vec![LocationNode::new("global", "Global Overview", Global, Critical, 47)
        .with_children(vec![middle_east, asia_pacific, americas])]
}
