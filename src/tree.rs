use crate::registry::{LocationNode, LocationRegistry};
use crate::selection::{Selected, SelectionCoordinator};
use std::collections::HashSet;
use tracing::debug;

/// Columns of indentation per tree level
pub const INDENT_COLS: u16 = 2;
/// Width of the expand/collapse affordance (glyph + space)
pub const AFFORDANCE_COLS: u16 = 2;

/// Nodes expanded when the dashboard opens
const INITIAL_EXPANDED: [&str; 3] = ["global", "middle-east", "asia-pacific"];

/// One line of the flattened tree
#[derive(Debug, Clone, Copy)]
pub struct TreeRow<'a> {
    pub node: &'a LocationNode,
    pub depth: usize,
    /// Has children, so shows an expand affordance
    pub expandable: bool,
    pub expanded: bool,
}

impl TreeRow<'_> {
    /// Column range `[start, end)` of the expand affordance, if any
    pub fn affordance_cols(&self) -> Option<(u16, u16)> {
        if !self.expandable {
            return None;
        }
        let start = self.depth as u16 * INDENT_COLS;
        Some((start, start + AFFORDANCE_COLS))
    }
}

/// What a click on the tree pane landed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeHit {
    /// The expand affordance of a node with children
    Expander(String),
    /// Anywhere else on the row
    Row(String),
}

/// Expandable location tree with a keyboard cursor
pub struct TreeNavigator {
    registry: LocationRegistry,
    expanded: HashSet<String>,
    /// Index into the flattened rows
    cursor: usize,
}

impl TreeNavigator {
    pub fn new(registry: LocationRegistry) -> Self {
        let expanded = INITIAL_EXPANDED
            .iter()
            .filter(|id| registry.find(id).is_some())
            .map(|id| id.to_string())
            .collect();
        Self::with_expanded(registry, expanded)
    }

    pub fn with_expanded(registry: LocationRegistry, expanded: HashSet<String>) -> Self {
        Self {
            registry,
            expanded,
            cursor: 0,
        }
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pre-order depth-first render order; children of collapsed nodes are skipped.
    /// A leaf never shows an affordance, even if its id sits in the expansion set.
    pub fn rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::new();
        for root in self.registry.roots() {
            self.push_rows(root, 0, &mut rows);
        }
        rows
    }

    fn push_rows<'a>(&'a self, node: &'a LocationNode, depth: usize, rows: &mut Vec<TreeRow<'a>>) {
        let expandable = node.has_children();
        let expanded = expandable && self.expanded.contains(&node.id);
        rows.push(TreeRow {
            node,
            depth,
            expandable,
            expanded,
        });
        if expanded {
            for child in &node.children {
                self.push_rows(child, depth + 1, rows);
            }
        }
    }

    /// Flip a node's expansion. Unknown ids and leaves are left alone.
    /// Returns whether anything changed. Never touches the selection.
    pub fn toggle_expand(&mut self, id: &str) -> bool {
        let Some(node) = self.registry.find(id) else {
            return false;
        };
        if !node.has_children() {
            return false;
        }

        let cursor_id = self.cursor_node().map(|n| n.id.clone());

        let now_expanded = if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        };
        debug!(id, expanded = now_expanded, "tree toggle");

        // Keep the cursor on the same node, or on the collapsed ancestor if it vanished
        let rows = self.rows();
        self.cursor = cursor_id
            .and_then(|cid| rows.iter().position(|r| r.node.id == cid))
            .or_else(|| rows.iter().position(|r| r.node.id == id))
            .unwrap_or(0);
        true
    }

    /// Publish a node as the selection. Re-selecting the selected node still publishes.
    pub fn select_node(&self, node: &LocationNode, coordinator: &mut SelectionCoordinator) {
        debug!(id = %node.id, "tree select");
        coordinator.select(Selected::Location(node.clone()));
    }

    /// Select by id; returns false if the id is unknown
    pub fn select_id(&self, id: &str, coordinator: &mut SelectionCoordinator) -> bool {
        match self.registry.find(id) {
            Some(node) => {
                self.select_node(node, coordinator);
                true
            }
            None => false,
        }
    }

    pub fn cursor_node(&self) -> Option<&LocationNode> {
        self.rows().get(self.cursor).map(|r| r.node)
    }

    /// Move the cursor by `delta` rows, clamped to the visible rows
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn toggle_at_cursor(&mut self) -> bool {
        match self.cursor_node().map(|n| n.id.clone()) {
            Some(id) => self.toggle_expand(&id),
            None => false,
        }
    }

    pub fn select_at_cursor(&self, coordinator: &mut SelectionCoordinator) {
        if let Some(node) = self.cursor_node() {
            self.select_node(node, coordinator);
        }
    }

    /// First visible row for a pane `height` rows tall, keeping the cursor in view
    pub fn scroll_offset(&self, height: usize) -> usize {
        if height == 0 {
            return 0;
        }
        (self.cursor + 1).saturating_sub(height)
    }

    /// Resolve a click at pane-relative (`row`, `col`)
    pub fn hit(&self, row: usize, col: u16, height: usize) -> Option<TreeHit> {
        let rows = self.rows();
        let tree_row = rows.get(self.scroll_offset(height) + row)?;
        let id = tree_row.node.id.clone();
        match tree_row.affordance_cols() {
            Some((start, end)) if (start..end).contains(&col) => Some(TreeHit::Expander(id)),
            _ => Some(TreeHit::Row(id)),
        }
    }

    /// Apply a click. The expander toggles without selecting; the row selects
    /// without toggling.
    pub fn click(
        &mut self,
        row: usize,
        col: u16,
        height: usize,
        coordinator: &mut SelectionCoordinator,
    ) -> Option<TreeHit> {
        let hit = self.hit(row, col, height)?;
        match &hit {
            TreeHit::Expander(id) => {
                self.toggle_expand(id);
            }
            TreeHit::Row(id) => {
                if let Some(pos) = self.rows().iter().position(|r| r.node.id == *id) {
                    self.cursor = pos;
                }
                self.select_id(id, coordinator);
            }
        }
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionListener;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn navigator() -> TreeNavigator {
        TreeNavigator::new(LocationRegistry::standard().unwrap())
    }

    fn ids(nav: &TreeNavigator) -> Vec<String> {
        nav.rows().iter().map(|r| r.node.id.clone()).collect()
    }

    #[derive(Default)]
    struct Counter(usize);

    impl SelectionListener for Counter {
        fn selection_changed(&mut self, _selection: Option<&Selected>, _revision: u64) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_initial_render_order() {
        let nav = navigator();
        assert_eq!(
            ids(&nav),
            vec![
                "global",
                "middle-east",
                "uae",
                "saudi",
                "asia-pacific",
                "philippines",
                "indonesia",
                "americas",
            ]
        );
        let depths: Vec<usize> = nav.rows().iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 2, 2, 1]);
    }

    #[test]
    fn test_expand_shows_children_in_order() {
        let mut nav = navigator();
        assert!(nav.toggle_expand("saudi"));
        let rows = ids(&nav);
        let saudi = rows.iter().position(|id| id == "saudi").unwrap();
        assert_eq!(rows[saudi + 1], "riyadh");
        assert_eq!(rows[saudi + 2], "jeddah");
        assert_eq!(rows[saudi + 3], "asia-pacific");
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut nav = navigator();
        for id in ["global", "uae", "americas", "middle-east"] {
            let before = nav.expanded().clone();
            nav.toggle_expand(id);
            nav.toggle_expand(id);
            assert_eq!(nav.expanded(), &before, "toggling {id} twice");
        }
    }

    #[test]
    fn test_collapsed_ancestor_hides_expanded_descendants() {
        let mut nav = navigator();
        nav.toggle_expand("uae");
        nav.toggle_expand("middle-east");
        let rows = ids(&nav);
        assert!(!rows.contains(&"dubai".to_string()));
        assert!(!rows.contains(&"uae".to_string()));
        // Expansion of uae is remembered
        assert!(nav.is_expanded("uae"));
        nav.toggle_expand("middle-east");
        assert!(ids(&nav).contains(&"dubai".to_string()));
    }

    #[test]
    fn test_leaf_has_no_affordance_and_toggle_is_noop() {
        let registry = LocationRegistry::standard().unwrap();
        let mut expanded: HashSet<String> = ["global", "middle-east", "saudi", "riyadh"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        expanded.insert("jeddah".to_string());
        let mut nav = TreeNavigator::with_expanded(registry, expanded);

        for row in nav.rows() {
            if !row.node.has_children() {
                assert!(!row.expandable);
                assert!(!row.expanded);
                assert!(row.affordance_cols().is_none());
            }
        }

        let before = nav.expanded().clone();
        assert!(!nav.toggle_expand("riyadh"));
        assert!(!nav.toggle_expand("houston"));
        assert!(!nav.toggle_expand("no-such-node"));
        assert_eq!(nav.expanded(), &before);
    }

    #[test]
    fn test_toggle_does_not_touch_selection() {
        let mut nav = navigator();
        let mut coordinator = SelectionCoordinator::new();
        nav.select_id("riyadh", &mut coordinator);
        let revision = coordinator.revision();
        nav.toggle_expand("middle-east");
        assert_eq!(coordinator.revision(), revision);
        assert_eq!(coordinator.current().and_then(|s| s.location_id()), Some("riyadh"));
    }

    #[test]
    fn test_select_same_node_twice_notifies_twice() {
        let nav = navigator();
        let mut coordinator = SelectionCoordinator::new();
        let counter = Rc::new(RefCell::new(Counter::default()));
        coordinator.register(counter.clone());

        nav.select_id("riyadh", &mut coordinator);
        let first = coordinator.current().cloned();
        nav.select_id("riyadh", &mut coordinator);

        assert_eq!(coordinator.current().cloned(), first);
        assert_eq!(counter.borrow().0, 3);
    }

    #[test]
    fn test_click_expander_toggles_only() {
        let mut nav = navigator();
        let mut coordinator = SelectionCoordinator::new();
        // Row 2 is "uae" at depth 2: affordance at cols 4..6
        let hit = nav.click(2, 4, 20, &mut coordinator);
        assert_eq!(hit, Some(TreeHit::Expander("uae".to_string())));
        assert!(nav.is_expanded("uae"));
        assert!(coordinator.current().is_none());
        assert_eq!(coordinator.revision(), 0);
    }

    #[test]
    fn test_every_expander_column_toggles() {
        let nav = navigator();
        let rows = nav.rows();
        let (row, tree_row) = rows.iter().enumerate().find(|(_, r)| r.depth > 0 && r.expandable).unwrap();
        let id = tree_row.node.id.clone();
        let (start, end) = tree_row.affordance_cols().unwrap();

        assert_eq!(nav.hit(row, start + 1, 50), Some(TreeHit::Expander(id.clone())));
        assert_eq!(nav.hit(row, end, 50), Some(TreeHit::Row(id.clone())));
        if start > 0 {
            assert_eq!(nav.hit(row, start - 1, 50), Some(TreeHit::Row(id)));
        }
    }

    #[test]
    fn test_click_row_selects_only() {
        let mut nav = navigator();
        let mut coordinator = SelectionCoordinator::new();
        let before = nav.expanded().clone();
        let hit = nav.click(2, 9, 20, &mut coordinator);
        assert_eq!(hit, Some(TreeHit::Row("uae".to_string())));
        assert_eq!(nav.expanded(), &before);
        assert_eq!(coordinator.current().and_then(|s| s.location_id()), Some("uae"));
        assert_eq!(nav.cursor(), 2);
    }

    #[test]
    fn test_click_leaf_indent_selects() {
        let mut nav = navigator();
        nav.toggle_expand("uae");
        let mut coordinator = SelectionCoordinator::new();
        // Row 3 is "dubai" at depth 3; col 6 is where an affordance would be
        let hit = nav.click(3, 6, 20, &mut coordinator);
        assert_eq!(hit, Some(TreeHit::Row("dubai".to_string())));
        assert_eq!(coordinator.current().map(|s| s.name()), Some("Dubai"));
    }

    #[test]
    fn test_click_below_rows_is_ignored() {
        let mut nav = navigator();
        let mut coordinator = SelectionCoordinator::new();
        assert_eq!(nav.click(40, 0, 50, &mut coordinator), None);
        assert!(coordinator.current().is_none());
    }

    #[test]
    fn test_cursor_moves_to_collapsed_ancestor() {
        let mut nav = navigator();
        nav.move_cursor(2); // uae
        assert_eq!(nav.cursor_node().map(|n| n.id.as_str()), Some("uae"));
        nav.toggle_expand("middle-east");
        assert_eq!(nav.cursor_node().map(|n| n.id.as_str()), Some("middle-east"));
    }

    #[test]
    fn test_cursor_clamped() {
        let mut nav = navigator();
        nav.move_cursor(-5);
        assert_eq!(nav.cursor(), 0);
        nav.move_cursor(100);
        assert_eq!(nav.cursor(), nav.rows().len() - 1);
    }

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        let mut nav = navigator();
        nav.move_cursor(7);
        assert_eq!(nav.scroll_offset(3), 5);
        assert_eq!(nav.scroll_offset(20), 0);
        // Hit testing follows the same offset
        assert_eq!(nav.hit(0, 10, 3), Some(TreeHit::Row("philippines".to_string())));
    }
}
