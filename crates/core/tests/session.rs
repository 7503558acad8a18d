use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use treemap_core::config::RenderConfig;
use treemap_core::dataset::{Dataset, Request};
use treemap_core::fetch::{FileFetcher, Fetcher};
use treemap_core::session::Session;
use treemap_core::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("treemap_core=debug")
        .try_init();
}

/// Serves documents from memory, sleeping first for the listed locations.
struct StubFetcher {
    docs: HashMap<String, RawNode>,
    delays: HashMap<String, Duration>,
}

impl Fetcher for StubFetcher {
    fn fetch(&self, location: &str) -> treemap_core::Result<RawNode> {
        if let Some(delay) = self.delays.get(location) {
            std::thread::sleep(*delay);
        }
        self.docs.get(location).cloned().ok_or(TreemapError::Fetch {
            source_name: location.to_string(),
            reason: "not found".to_string(),
        })
    }
}

fn doc(root: &str, cats: &[(&str, f64)]) -> RawNode {
    RawNode::group(
        root,
        cats.iter()
            .map(|(c, v)| RawNode::group(*c, vec![RawNode::leaf(format!("{c} item"), *c, *v)]))
            .collect(),
    )
}

fn stub() -> Arc<StubFetcher> {
    let mut docs = HashMap::new();
    docs.insert("slow".to_string(), doc("Slow", &[("A", 1.0), ("B", 2.0)]));
    docs.insert("fast".to_string(), doc("Fast", &[("C", 3.0), ("D", 1.0), ("E", 1.0)]));
    docs.insert("empty".to_string(), RawNode::group("Empty", vec![]));
    let mut delays = HashMap::new();
    delays.insert("slow".to_string(), Duration::from_millis(200));
    Arc::new(StubFetcher { docs, delays })
}

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn last_switch_wins() {
    init_tracing();
    let mut session = Session::new(RenderConfig::default(), stub());
    let first = session.switch_to(Request::for_location("slow"));
    let second = session.switch_to(Request::for_location("fast"));
    assert!(second > first);
    assert!(session.is_loading());

    session.wait(WAIT).unwrap();
    assert!(!session.is_loading());
    assert_eq!(session.view().unwrap().tree.root_node().name, "Fast");

    // The slow load finishes later and must not replace the view.
    std::thread::sleep(Duration::from_millis(400));
    assert!(!session.poll().unwrap());
    assert_eq!(session.view().unwrap().tree.root_node().name, "Fast");
}

#[test]
fn failed_load_keeps_previous_view() {
    let mut session = Session::new(RenderConfig::default(), stub());
    session.switch_to(Request::for_location("fast"));
    session.wait(WAIT).unwrap();

    session.switch_to(Request::for_location("missing"));
    assert!(matches!(session.wait(WAIT), Err(TreemapError::Fetch { .. })));
    assert_eq!(session.view().unwrap().tree.root_node().name, "Fast");

    session.switch_to(Request::for_location("empty"));
    assert!(matches!(session.wait(WAIT), Err(TreemapError::InvalidData { .. })));
    assert_eq!(session.view().unwrap().tree.root_node().name, "Fast");
}

#[test]
fn view_carries_palette_and_legend_in_sorted_order() {
    let mut session = Session::new(RenderConfig::default(), stub());
    let view = session.load_now(Request::for_location("fast")).unwrap();
    let labels: Vec<&str> = view.legend.iter().map(|e| e.label.as_str()).collect();
    // Equal sums keep document order.
    assert_eq!(labels, ["C", "D", "E"]);
    assert_eq!(view.palette.len(), 3);

    let area = RenderConfig::default().treemap_area();
    for leaf in view.tree.leaves() {
        assert!(area.contains(&leaf.rect, 0.0));
        assert_eq!(leaf.rect.x0.fract(), 0.0);
    }
}

#[test]
fn wait_without_pending_load_returns_immediately() {
    let mut session = Session::new(RenderConfig::default(), stub());
    session.wait(Duration::from_millis(1)).unwrap();
    assert!(session.view().is_none());
    assert!(!session.poll().unwrap());
}

#[test]
fn loads_a_dataset_file_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    std::fs::write(
        dir.join(Dataset::VideoGames.file_name()),
        r#"{"name":"Video Game Sales Data Top 100","children":[
            {"name":"Wii","children":[
                {"name":"Wii Sports","category":"Wii","value":"82.53"},
                {"name":"Mario Kart Wii","category":"Wii","value":"35.52"}]},
            {"name":"NES","children":[
                {"name":"Super Mario Bros.","category":"NES","value":"40.24"}]}]}"#,
    )
    .unwrap();

    let mut session = Session::new(RenderConfig::default(), Arc::new(FileFetcher::new()));
    session.switch_to(Dataset::VideoGames.request(Some(dir)));
    session.wait(WAIT).unwrap();
    let view = session.view().unwrap();
    assert_eq!(view.request.title, "Video Game Sales");
    assert_eq!(view.tree.leaves().count(), 3);
    assert_eq!(view.legend[0].label, "Wii");
}
