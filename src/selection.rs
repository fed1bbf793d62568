use crate::registry::{AlertRecord, GeoCoord, HazardPoint, LocationNode, Severity};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// The single shared "currently focused" thing.
/// Absence of a selection is `Option::None` at every use site.
#[derive(Debug, Clone, PartialEq)]
pub enum Selected {
    /// A node picked in the location tree
    Location(LocationNode),
    /// A row picked in the alert feed
    Alert(AlertRecord),
    /// A feature picked on the map
    Point(HazardPoint),
}

impl Selected {
    /// Display name: `name` for locations and points, `title` for alerts
    pub fn name(&self) -> &str {
        match self {
            Selected::Location(node) => &node.name,
            Selected::Alert(alert) => &alert.title,
            Selected::Point(point) => &point.name,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Selected::Location(node) => node.kind.label(),
            Selected::Alert(alert) => alert.kind.label(),
            Selected::Point(_) => "map point",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Selected::Location(node) => node.severity,
            Selected::Alert(alert) => alert.severity,
            Selected::Point(point) => point.severity,
        }
    }

    /// Id of the selected tree node, if the selection came from the tree
    pub fn location_id(&self) -> Option<&str> {
        match self {
            Selected::Location(node) => Some(&node.id),
            _ => None,
        }
    }

    pub fn alert_id(&self) -> Option<&str> {
        match self {
            Selected::Alert(alert) => Some(&alert.id),
            _ => None,
        }
    }

    /// Explicit coordinates carried by the value itself
    pub fn coordinates(&self) -> Option<GeoCoord> {
        match self {
            Selected::Location(node) => node.coordinates,
            Selected::Alert(_) => None,
            Selected::Point(point) => Some(point.coord()),
        }
    }

    pub fn active_incidents(&self) -> Option<u32> {
        match self {
            Selected::Location(node) => Some(node.active_incidents),
            _ => None,
        }
    }

    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Selected::Alert(alert) => alert.magnitude,
            _ => None,
        }
    }

    pub fn affected_population(&self) -> Option<u64> {
        match self {
            Selected::Alert(alert) => Some(alert.affected_population),
            _ => None,
        }
    }

    pub fn displaced(&self) -> Option<u64> {
        match self {
            Selected::Point(point) => Some(point.displaced),
            _ => None,
        }
    }

    /// Confidence as a whole percentage
    pub fn confidence_percent(&self) -> Option<u8> {
        match self {
            Selected::Location(_) => None,
            Selected::Alert(alert) => Some(alert.confidence.min(100)),
            Selected::Point(point) => Some((point.confidence * 100.0).round().clamp(0.0, 100.0) as u8),
        }
    }

    /// Name matched against the map's coordinate index
    pub fn lookup_name(&self) -> &str {
        match self {
            Selected::Location(node) => &node.name,
            Selected::Alert(alert) => &alert.title,
            Selected::Point(point) => &point.name,
        }
    }
}

/// A consumer notified synchronously on every selection write
pub trait SelectionListener {
    fn selection_changed(&mut self, selection: Option<&Selected>, revision: u64);
}

/// Shared handle to a registered listener (single-threaded UI)
pub type ListenerHandle = Rc<RefCell<dyn SelectionListener>>;

/// Single-writer value cell holding the current selection
pub struct SelectionCoordinator {
    current: Option<Selected>,
    /// Bumped on every write, including re-selection of the same value
    revision: u64,
    listeners: Vec<ListenerHandle>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self {
            current: None,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a consumer. It is immediately told the current value.
    pub fn register(&mut self, listener: ListenerHandle) {
        listener
            .borrow_mut()
            .selection_changed(self.current.as_ref(), self.revision);
        self.listeners.push(listener);
    }

    /// Replace the held value and notify every listener before returning.
    /// Writing the value already held is not suppressed.
    pub fn set_selection(&mut self, value: Option<Selected>) {
        self.current = value;
        self.revision += 1;

        match &self.current {
            Some(selected) => debug!(revision = self.revision, name = selected.name(), "selection set"),
            None => debug!(revision = self.revision, "selection cleared"),
        }

        for listener in &self.listeners {
            listener
                .borrow_mut()
                .selection_changed(self.current.as_ref(), self.revision);
        }
    }

    pub fn select(&mut self, value: Selected) {
        self.set_selection(Some(value));
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
    }

    pub fn current(&self) -> Option<&Selected> {
        self.current.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
