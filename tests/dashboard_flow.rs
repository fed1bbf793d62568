use std::cell::RefCell;
use std::rc::Rc;

use disaster_overview::map::{MapRenderer, MapView};
use disaster_overview::registry::{standard_metrics, standard_points, LocationRegistry, Severity};
use disaster_overview::selection::{ListenerHandle, Selected, SelectionCoordinator};
use disaster_overview::summary::SummaryPanel;
use disaster_overview::tree::{TreeHit, TreeNavigator};

struct Dashboard {
    tree: TreeNavigator,
    selection: SelectionCoordinator,
    summary: Rc<RefCell<SummaryPanel>>,
    map: Rc<RefCell<MapView>>,
}

fn dashboard() -> Dashboard {
    let mut selection = SelectionCoordinator::new();
    let summary = Rc::new(RefCell::new(SummaryPanel::new(standard_metrics())));
    let map = Rc::new(RefCell::new(MapView::new(
        MapRenderer::new(),
        standard_points().unwrap(),
        80,
        30,
    )));
    let summary_handle: ListenerHandle = summary.clone();
    let map_handle: ListenerHandle = map.clone();
    selection.register(summary_handle);
    selection.register(map_handle);

    Dashboard {
        tree: TreeNavigator::new(LocationRegistry::standard().unwrap()),
        selection,
        summary,
        map,
    }
}

fn row_of(tree: &TreeNavigator, id: &str) -> usize {
    tree.rows().iter().position(|r| r.node.id == id).unwrap()
}

#[test]
fn riyadh_select_and_close() {
    let mut d = dashboard();

    // Saudi starts collapsed: open it through its expander
    let saudi = row_of(&d.tree, "saudi");
    let hit = d.tree.click(saudi, 4, 100, &mut d.selection);
    assert_eq!(hit, Some(TreeHit::Expander("saudi".into())));
    assert!(d.selection.current().is_none());

    let riyadh = row_of(&d.tree, "riyadh");
    let hit = d.tree.click(riyadh, 10, 100, &mut d.selection);
    assert_eq!(hit, Some(TreeHit::Row("riyadh".into())));

    {
        let summary = d.summary.borrow();
        let detail = summary.model().detail.as_ref().unwrap();
        assert_eq!(detail.severity, Severity::High);
        assert_eq!(detail.active_events, "2");
        assert_eq!(summary.revision(), d.selection.revision());
    }
    let focus = d.map.borrow().focus().unwrap();
    assert_eq!((focus.lon, focus.lat), (46.72, 24.71));

    d.selection.clear_selection();
    assert!(d.selection.current().is_none());
    assert!(!d.summary.borrow().has_detail());
    assert!(d.map.borrow().focus().is_none());
}

#[test]
fn reselect_renotifies_with_new_revision() {
    let mut d = dashboard();
    d.tree.select_id("dubai", &mut d.selection);
    let first = d.summary.borrow().revision();
    let model = d.summary.borrow().model().clone();

    d.tree.select_id("dubai", &mut d.selection);
    assert_eq!(d.summary.borrow().revision(), first + 1);
    assert_eq!(*d.summary.borrow().model(), model);
}

#[test]
fn map_pick_feeds_back_into_selection() {
    let mut d = dashboard();
    d.tree.select_id("dubai", &mut d.selection);

    let picked = {
        let map = d.map.borrow();
        let (px, py) = map.projector().project_point(55.27, 25.20).unwrap();
        map.pick(px + 1, py).unwrap()
    };
    d.selection.select(Selected::Point(picked));

    let summary = d.summary.borrow();
    let detail = summary.model().detail.as_ref().unwrap();
    assert_eq!(detail.title, "Dubai");
    assert_eq!(detail.severity, Severity::Critical);
    assert_eq!(detail.confidence, "90%");
}

#[test]
fn unmatched_selection_keeps_summary_without_focus() {
    let mut d = dashboard();
    d.tree.select_id("dubai", &mut d.selection);
    assert!(d.map.borrow().focus().is_some());

    d.tree.select_id("jakarta", &mut d.selection);
    assert!(d.summary.borrow().has_detail());
    assert!(d.map.borrow().focus().is_none());
}
