//! Short-form feed classifier.
//!
//! Decides from a [`UiSnapshot`] whether the foreground app is currently
//! showing its short-form feed. The decision is a structural heuristic:
//! a depth-first walk that looks for app-specific keywords in each node's
//! identifier, type name, description and text.
//!
//! ## Traversal limits
//!
//! The snapshot provider bounds tree size, but the classifier does not rely
//! on it:
//!
//! - a node's children are visited only when it has fewer than
//!   `max_fan_out` of them; wider nodes are matched on their own fields only
//! - nodes deeper than `max_depth` are not visited
//! - at most `max_nodes` nodes are examined per classification
//!
//! A dangling child index (unreadable node) is skipped and the walk goes on.
//! The classifier never fails: anything it cannot read counts as no match.

mod profiles;

pub use profiles::{
    default_profiles, AppProfile, FeedHeuristic, MonitoredApps, INSTAGRAM, TIKTOK, YOUTUBE,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::{NodeId, UiNode, UiSnapshot};

/// Bounds applied to every traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalLimits {
    /// Children are visited only when `0 < child_count < max_fan_out`.
    pub max_fan_out: usize,
    /// Deepest level visited; the root is depth 0.
    pub max_depth: usize,
    /// Nodes examined per classification.
    pub max_nodes: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_fan_out: 50,
            max_depth: 64,
            max_nodes: 4096,
        }
    }
}

/// Node attribute a keyword was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeField {
    Identifier,
    TypeName,
    Description,
    Text,
}

/// Where and why a snapshot matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub field: NodeField,
    pub node: NodeId,
}

/// Detailed classification result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Whether the user is inside a monitored short-form feed.
    pub in_feed: bool,
    /// Nodes whose fields were examined.
    pub nodes_visited: usize,
    /// First keyword hit, for keyword heuristics.
    pub matched: Option<KeywordMatch>,
    /// A traversal limit stopped the walk before the tree was exhausted.
    pub truncated: bool,
    /// Dangling child references skipped.
    pub unreadable_nodes: usize,
}

/// Maps (app identifier, UI snapshot) to "inside a short-form feed".
///
/// Stateless; one instance can classify for any number of events.
#[derive(Debug, Clone, Default)]
pub struct UiSnapshotClassifier {
    apps: MonitoredApps,
    limits: TraversalLimits,
}

impl UiSnapshotClassifier {
    pub fn new(apps: MonitoredApps, limits: TraversalLimits) -> Self {
        Self { apps, limits }
    }

    pub fn apps(&self) -> &MonitoredApps {
        &self.apps
    }

    pub fn limits(&self) -> TraversalLimits {
        self.limits
    }

    pub fn is_monitored(&self, app_id: &str) -> bool {
        self.apps.contains(app_id)
    }

    /// Whether classifying `app_id` looks at the UI tree at all.
    pub fn requires_snapshot(&self, app_id: &str) -> bool {
        matches!(
            self.apps.get(app_id).map(|p| &p.heuristic),
            Some(FeedHeuristic::Keywords { .. })
        )
    }

    /// `true` when `app_id` is monitored and `snapshot` looks like its feed.
    pub fn classify(&self, app_id: &str, snapshot: &UiSnapshot) -> bool {
        self.inspect(app_id, snapshot).in_feed
    }

    /// Like [`classify`](Self::classify), with traversal details.
    ///
    /// Unmonitored apps and always-in-feed apps report `nodes_visited == 0`.
    pub fn inspect(&self, app_id: &str, snapshot: &UiSnapshot) -> Classification {
        let Some(profile) = self.apps.get(app_id) else {
            return Classification::default();
        };

        match &profile.heuristic {
            FeedHeuristic::AlwaysInFeed => Classification {
                in_feed: true,
                ..Classification::default()
            },
            FeedHeuristic::Keywords { keywords } => {
                let result = scan(snapshot, keywords, self.limits);
                if result.unreadable_nodes > 0 {
                    debug!(
                        app = app_id,
                        skipped = result.unreadable_nodes,
                        "snapshot had unreadable nodes"
                    );
                }
                if result.truncated {
                    debug!(
                        app = app_id,
                        visited = result.nodes_visited,
                        "snapshot traversal truncated by limits"
                    );
                }
                result
            }
        }
    }
}

/// Depth-first keyword scan with an explicit stack.
fn scan(snapshot: &UiSnapshot, keywords: &[String], limits: TraversalLimits) -> Classification {
    let mut result = Classification::default();
    if keywords.is_empty() {
        return result;
    }
    let Some(root) = snapshot.root() else {
        return result;
    };

    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        if result.nodes_visited >= limits.max_nodes {
            result.truncated = true;
            break;
        }

        let Some(node) = snapshot.node(id) else {
            result.unreadable_nodes += 1;
            continue;
        };
        result.nodes_visited += 1;

        if let Some((keyword, field)) = match_node(node, keywords) {
            result.in_feed = true;
            result.matched = Some(KeywordMatch {
                keyword: keyword.to_string(),
                field,
                node: id,
            });
            return result;
        }

        let fan_out = node.children.len();
        if fan_out == 0 {
            continue;
        }
        if fan_out >= limits.max_fan_out || depth >= limits.max_depth {
            result.truncated = true;
            continue;
        }
        // Reverse push keeps left-to-right visiting order.
        stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
    }

    result
}

fn match_node<'k>(node: &UiNode, keywords: &'k [String]) -> Option<(&'k str, NodeField)> {
    let fields = [
        (node.identifier.as_str(), NodeField::Identifier),
        (node.type_name.as_str(), NodeField::TypeName),
        (node.description.as_str(), NodeField::Description),
        (node.text.as_str(), NodeField::Text),
    ];

    for (value, field) in fields {
        if value.is_empty() {
            continue;
        }
        let value = value.to_lowercase();
        if let Some(keyword) = keywords.iter().find(|k| value.contains(k.as_str())) {
            return Some((keyword.as_str(), field));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotNode;

    fn classifier() -> UiSnapshotClassifier {
        UiSnapshotClassifier::default()
    }

    fn youtube_home() -> SnapshotNode {
        SnapshotNode::new("com.google.android.youtube:id/main", "FrameLayout").with_children(vec![
            SnapshotNode::new("com.google.android.youtube:id/results", "RecyclerView"),
            SnapshotNode::new("", "TextView").with_text("Subscriptions"),
        ])
    }

    #[test]
    fn unmonitored_app_is_not_traversed() {
        let snapshot = UiSnapshot::from_tree(youtube_home());
        let result = classifier().inspect("com.example.other", &snapshot);
        assert!(!result.in_feed);
        assert_eq!(result.nodes_visited, 0);
    }

    #[test]
    fn identifier_match_in_any_case() {
        let tree = youtube_home().with_children(vec![SnapshotNode::new(
            "com.google.android.youtube:id/REEL_Recycler",
            "RecyclerView",
        )]);
        let snapshot = UiSnapshot::from_tree(tree);
        let result = classifier().inspect(YOUTUBE, &snapshot);
        assert!(result.in_feed);
        let hit = result.matched.unwrap();
        assert_eq!(hit.field, NodeField::Identifier);
        assert_eq!(hit.keyword, "reel_");
    }

    #[test]
    fn description_and_text_are_scanned() {
        let by_description = UiSnapshot::from_tree(
            SnapshotNode::new("", "View").with_children(vec![
                SnapshotNode::new("", "ImageView").with_description("Reels Tab"),
            ]),
        );
        // "reels_tab" needs the underscore; "Reels Tab" does not match it,
        // but nothing else in the Instagram list matches either.
        assert!(!classifier().classify(INSTAGRAM, &by_description));

        let by_text = UiSnapshot::from_tree(
            SnapshotNode::new("", "View")
                .with_children(vec![SnapshotNode::new("", "TextView").with_text("Shorts")]),
        );
        let result = classifier().inspect(YOUTUBE, &by_text);
        assert!(result.in_feed);
        assert_eq!(result.matched.unwrap().field, NodeField::Text);
    }

    #[test]
    fn no_match_returns_false() {
        let snapshot = UiSnapshot::from_tree(youtube_home());
        let result = classifier().inspect(YOUTUBE, &snapshot);
        assert!(!result.in_feed);
        assert_eq!(result.nodes_visited, 3);
        assert!(!result.truncated);
    }

    #[test]
    fn always_in_feed_skips_traversal() {
        let result = classifier().inspect(TIKTOK, &UiSnapshot::new());
        assert!(result.in_feed);
        assert_eq!(result.nodes_visited, 0);
    }

    #[test]
    fn wide_node_is_a_leaf() {
        let mut children: Vec<SnapshotNode> = (0..49)
            .map(|i| SnapshotNode::new(format!("item_{i}"), "View"))
            .collect();
        children.push(SnapshotNode::new("reel_viewer", "View"));
        let wide = SnapshotNode::new("list", "RecyclerView").with_children(children);

        let snapshot = UiSnapshot::from_tree(wide.clone());
        let result = classifier().inspect(INSTAGRAM, &snapshot);
        assert!(!result.in_feed);
        assert_eq!(result.nodes_visited, 1);
        assert!(result.truncated);

        // The wide node's own fields still count.
        let own = UiSnapshot::from_tree(SnapshotNode {
            identifier: "clips_tab_container".into(),
            ..wide
        });
        assert!(classifier().classify(INSTAGRAM, &own));
    }

    #[test]
    fn forty_nine_children_are_visited() {
        let mut children: Vec<SnapshotNode> = (0..48)
            .map(|i| SnapshotNode::new(format!("item_{i}"), "View"))
            .collect();
        children.push(SnapshotNode::new("reel_viewer", "View"));
        let snapshot = UiSnapshot::from_tree(
            SnapshotNode::new("list", "RecyclerView").with_children(children),
        );
        assert!(classifier().classify(INSTAGRAM, &snapshot));
    }

    #[test]
    fn depth_limit_stops_descent() {
        let mut tree = SnapshotNode::new("shorts_player", "View");
        for i in 0..10 {
            tree = SnapshotNode::new(format!("level_{i}"), "View").with_children(vec![tree]);
        }
        let snapshot = UiSnapshot::from_tree(tree);

        let shallow = UiSnapshotClassifier::new(
            MonitoredApps::default(),
            TraversalLimits {
                max_depth: 5,
                ..TraversalLimits::default()
            },
        );
        let result = shallow.inspect(YOUTUBE, &snapshot);
        assert!(!result.in_feed);
        assert!(result.truncated);
        assert!(classifier().classify(YOUTUBE, &snapshot));
    }

    #[test]
    fn node_budget_is_enforced() {
        let children: Vec<SnapshotNode> = (0..40)
            .map(|i| SnapshotNode::new(format!("item_{i}"), "View"))
            .collect();
        let snapshot =
            UiSnapshot::from_tree(SnapshotNode::new("root", "View").with_children(children));
        let tight = UiSnapshotClassifier::new(
            MonitoredApps::default(),
            TraversalLimits {
                max_nodes: 10,
                ..TraversalLimits::default()
            },
        );
        let result = tight.inspect(YOUTUBE, &snapshot);
        assert_eq!(result.nodes_visited, 10);
        assert!(result.truncated);
    }

    #[test]
    fn dangling_child_is_skipped() {
        let json = r#"{
            "nodes": [
                {"identifier": "root", "children": [7, 1]},
                {"identifier": "com.google.android.youtube:id/shorts_player"}
            ],
            "root": 0
        }"#;
        let snapshot: UiSnapshot = serde_json::from_str(json).unwrap();
        let result = classifier().inspect(YOUTUBE, &snapshot);
        assert!(result.in_feed);
        assert_eq!(result.unreadable_nodes, 1);
    }

    #[test]
    fn cyclic_arena_terminates() {
        let json = r#"{
            "nodes": [
                {"identifier": "a", "children": [1]},
                {"identifier": "b", "children": [0]}
            ],
            "root": 0
        }"#;
        let snapshot: UiSnapshot = serde_json::from_str(json).unwrap();
        let result = classifier().inspect(YOUTUBE, &snapshot);
        assert!(!result.in_feed);
        assert!(result.truncated);
    }

    #[test]
    fn empty_snapshot_is_not_a_feed() {
        assert!(!classifier().classify(YOUTUBE, &UiSnapshot::new()));
    }

    #[test]
    fn only_keyword_apps_need_a_snapshot() {
        let c = classifier();
        assert!(c.requires_snapshot(YOUTUBE));
        assert!(c.requires_snapshot(INSTAGRAM));
        assert!(!c.requires_snapshot(TIKTOK));
        assert!(!c.requires_snapshot("com.example.other"));
    }
}
