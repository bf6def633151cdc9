use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use super::distance::{compute_distances, effective_distance, max_finite_distance};
use super::model::{Edge, GraphSnapshot, Node, NodeKind, Status};

/// User-selected predicates; `None` matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterPredicates {
    /// Area name.
    pub area: Option<String>,
    pub status: Option<Status>,
    pub level: Option<String>,
}

impl FilterPredicates {
    pub fn is_empty(&self) -> bool {
        self.area.is_none() && self.status.is_none() && self.level.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilteredNode {
    pub node: Node,
    /// Unreachable nodes carry the graph's `max_distance`.
    pub distance_from_root: u32,
    pub reachable: bool,
    /// Degree within the filtered edge set.
    pub connection_count: usize,
}

/// The visible subgraph plus the per-node fields derived from it.
#[derive(Clone, Debug, Default)]
pub struct FilteredGraph {
    pub nodes: Vec<FilteredNode>,
    pub edges: Vec<Edge>,
    pub max_distance: u32,
    index_by_id: HashMap<String, usize>,
}

impl FilteredGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&FilteredNode> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    /// Edge endpoints as node indices, in edge order.
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .filter_map(|edge| Some((self.index_of(&edge.source)?, self.index_of(&edge.target)?)))
            .collect()
    }

    /// First-degree neighbours of `index`, excluding `index` itself.
    pub fn neighbors(&self, index: usize) -> HashSet<usize> {
        let Some(id) = self.nodes.get(index).map(|node| node.node.id.as_str()) else {
            return HashSet::new();
        };

        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.source == id {
                    self.index_of(&edge.target)
                } else if edge.target == id {
                    self.index_of(&edge.source)
                } else {
                    None
                }
            })
            .filter(|&neighbor| neighbor != index)
            .collect()
    }

    /// Hash of the node ids and edge endpoints; equal identities mean the
    /// layout can keep its positions.
    pub fn identity(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.nodes.len().hash(&mut hasher);
        for node in &self.nodes {
            node.node.id.hash(&mut hasher);
        }
        self.edges.len().hash(&mut hasher);
        for edge in &self.edges {
            edge.source.hash(&mut hasher);
            edge.target.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Shortest undirected path from the root node to `index`, both ends included.
    pub fn path_from_root(&self, index: usize) -> Option<Vec<usize>> {
        let root = self.nodes.iter().position(|node| node.node.is_root())?;
        if index >= self.nodes.len() {
            return None;
        }

        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for (source, target) in self.edge_indices() {
            adjacency[source].push(target);
            adjacency[target].push(source);
        }

        let mut parent = vec![None::<usize>; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([root]);
        visited[root] = true;

        while let Some(current) = queue.pop_front() {
            if current == index {
                break;
            }
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    parent[next] = Some(current);
                    queue.push_back(next);
                }
            }
        }

        if !visited[index] {
            return None;
        }

        let mut path = vec![index];
        let mut cursor = index;
        while let Some(previous) = parent[cursor] {
            path.push(previous);
            cursor = previous;
        }
        path.reverse();
        Some(path)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn node_passes(node: &Node, predicates: &FilterPredicates) -> bool {
    match &node.kind {
        NodeKind::Root => true,
        NodeKind::Area(area) => predicates.area.as_deref().is_none_or(|wanted| {
            area.name
                .to_lowercase()
                .contains(wanted.trim().to_lowercase().as_str())
        }),
        NodeKind::Content(_) | NodeKind::Journal(_) => {
            let area_ok = predicates.area.as_deref().is_none_or(|wanted| {
                node.area()
                    .is_some_and(|area| eq_ignore_case(&area.name, wanted))
            });
            let status_ok = predicates
                .status
                .is_none_or(|wanted| node.status() == Some(wanted));
            let level_ok = predicates.level.as_deref().is_none_or(|wanted| {
                node.level().is_some_and(|level| eq_ignore_case(level, wanted))
            });
            area_ok && status_ok && level_ok
        }
    }
}

/// Applies `predicates` to the snapshot and derives distance and degree.
///
/// Edges survive only when both endpoints do. Connection counts and distances
/// are computed on the surviving subgraph, so narrowing a filter shrinks the
/// reported degree of the remaining nodes.
pub fn filter(snapshot: &GraphSnapshot, predicates: &FilterPredicates) -> FilteredGraph {
    let nodes = snapshot
        .nodes
        .iter()
        .filter(|node| node_passes(node, predicates))
        .cloned()
        .collect::<Vec<_>>();

    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    let edges = snapshot
        .edges
        .iter()
        .filter(|edge| {
            index_by_id.contains_key(&edge.source) && index_by_id.contains_key(&edge.target)
        })
        .cloned()
        .collect::<Vec<_>>();

    let mut connection_counts = vec![0usize; nodes.len()];
    for edge in &edges {
        if let Some(&source) = index_by_id.get(&edge.source) {
            connection_counts[source] += 1;
        }
        if let Some(&target) = index_by_id.get(&edge.target) {
            connection_counts[target] += 1;
        }
    }

    let distances = compute_distances(&nodes, &edges);
    let max_distance = max_finite_distance(&distances);

    let nodes = nodes
        .into_iter()
        .zip(connection_counts)
        .map(|(node, connection_count)| {
            let distance = distances.get(&node.id).copied();
            FilteredNode {
                distance_from_root: effective_distance(distance, max_distance),
                reachable: distance.is_some(),
                connection_count,
                node,
            }
        })
        .collect();

    FilteredGraph {
        nodes,
        edges,
        max_distance,
        index_by_id,
    }
}

/// Values offered by the filter widgets for a given snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub areas: Vec<String>,
    pub levels: Vec<String>,
}

impl FilterOptions {
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let mut areas = Vec::new();
        let mut levels = BTreeSet::new();

        for node in &snapshot.nodes {
            match &node.kind {
                NodeKind::Area(area) => areas.push(area.name.clone()),
                NodeKind::Content(content) => {
                    if let Some(level) = content.level.as_deref().map(str::trim)
                        && !level.is_empty()
                    {
                        levels.insert(level.to_owned());
                    }
                }
                NodeKind::Root | NodeKind::Journal(_) => {}
            }
        }

        Self {
            areas,
            levels: levels.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::super::build::build_snapshot;
    use super::super::model::{Area, ContentItem, JournalEntry, SnapshotInput};
    use super::*;

    fn area(id: &str, name: &str) -> Area {
        Area {
            id: id.to_owned(),
            name: name.to_owned(),
            color: "#ff0000".to_owned(),
            icon: String::new(),
            keywords: Vec::new(),
        }
    }

    fn item(id: &str, area_id: &str, status: Status, level: Option<&str>) -> ContentItem {
        ContentItem {
            id: id.to_owned(),
            title: format!("Item {id}"),
            content: String::new(),
            status,
            parent_id: None,
            area_id: Some(area_id.to_owned()),
            level: level.map(str::to_owned),
        }
    }

    fn no_match(_: &str, _: &str) -> Option<String> {
        None
    }

    fn math_history_snapshot() -> GraphSnapshot {
        let input = SnapshotInput {
            areas: vec![area("math", "Math"), area("history", "History")],
            content_items: vec![
                item("1", "math", Status::Pending, None),
                item("2", "math", Status::Pending, None),
                item("3", "history", Status::Pending, None),
            ],
            ..SnapshotInput::default()
        };
        build_snapshot(&input, &no_match, "Me")
    }

    fn sorted_ids(graph: &FilteredGraph) -> Vec<String> {
        let mut ids = graph
            .nodes
            .iter()
            .map(|node| node.node.id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[test]
    fn area_filter_keeps_area_subtree_and_root() {
        let snapshot = math_history_snapshot();
        let predicates = FilterPredicates {
            area: Some("Math".to_owned()),
            ..FilterPredicates::default()
        };
        let graph = filter(&snapshot, &predicates);

        assert_eq!(
            sorted_ids(&graph),
            vec!["area-math", "content-1", "content-2", "self"]
        );
        let mut edges = graph
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect::<Vec<_>>();
        edges.sort();
        assert_eq!(
            edges,
            vec![
                ("area-math", "content-1"),
                ("area-math", "content-2"),
                ("self", "area-math"),
            ]
        );
        assert!(graph.node("area-history").is_none());
        assert!(graph.node("content-3").is_none());
    }

    #[test]
    fn connection_counts_follow_filtered_edges() {
        let snapshot = math_history_snapshot();
        let all = filter(&snapshot, &FilterPredicates::default());
        assert_eq!(all.node("self").map(|n| n.connection_count), Some(2));
        assert_eq!(all.node("area-math").map(|n| n.connection_count), Some(3));

        let math_only = filter(
            &snapshot,
            &FilterPredicates {
                area: Some("math".to_owned()),
                ..FilterPredicates::default()
            },
        );
        assert_eq!(math_only.node("self").map(|n| n.connection_count), Some(1));
    }

    #[test]
    fn status_and_level_predicates_match_content() {
        let input = SnapshotInput {
            areas: vec![area("math", "Math")],
            content_items: vec![
                item("1", "math", Status::Understood, Some("Beginner")),
                item("2", "math", Status::Pending, Some("Advanced")),
            ],
            ..SnapshotInput::default()
        };
        let snapshot = build_snapshot(&input, &no_match, "Me");

        let understood = filter(
            &snapshot,
            &FilterPredicates {
                status: Some(Status::Understood),
                ..FilterPredicates::default()
            },
        );
        assert_eq!(sorted_ids(&understood), vec!["area-math", "content-1", "self"]);

        let advanced = filter(
            &snapshot,
            &FilterPredicates {
                level: Some("advanced".to_owned()),
                ..FilterPredicates::default()
            },
        );
        assert_eq!(sorted_ids(&advanced), vec!["area-math", "content-2", "self"]);
    }

    #[test]
    fn journal_status_follows_completion() {
        let input = SnapshotInput {
            journal_entries: vec![
                JournalEntry {
                    id: "done".to_owned(),
                    date: "2025-01-02".to_owned(),
                    is_complete: true,
                },
                JournalEntry {
                    id: "open".to_owned(),
                    date: "2025-01-03".to_owned(),
                    is_complete: false,
                },
            ],
            ..SnapshotInput::default()
        };
        let snapshot = build_snapshot(&input, &no_match, "Me");
        let graph = filter(
            &snapshot,
            &FilterPredicates {
                status: Some(Status::Pending),
                ..FilterPredicates::default()
            },
        );
        assert!(graph.node("journal-open").is_some());
        assert!(graph.node("journal-done").is_none());
    }

    #[test]
    fn unreachable_nodes_get_max_distance() {
        let mut child = item("2", "missing", Status::Pending, None);
        child.parent_id = Some("1".to_owned());
        let input = SnapshotInput {
            content_items: vec![item("1", "missing", Status::Understood, None), child],
            ..SnapshotInput::default()
        };
        let snapshot = build_snapshot(&input, &no_match, "Me");
        let graph = filter(&snapshot, &FilterPredicates::default());

        assert_eq!(graph.max_distance, 1);
        for id in ["content-1", "content-2"] {
            let orphan = graph.node(id).expect("orphan survives");
            assert!(!orphan.reachable);
            assert_eq!(orphan.distance_from_root, graph.max_distance);
        }
        assert_eq!(graph.node("content-1").map(|n| n.connection_count), Some(1));
    }

    #[test]
    fn neighbors_come_from_filtered_edges() {
        let snapshot = math_history_snapshot();
        let graph = filter(&snapshot, &FilterPredicates::default());
        let math = graph.index_of("area-math").expect("math");
        let neighbors = graph.neighbors(math);

        let expected = ["self", "content-1", "content-2"]
            .iter()
            .filter_map(|id| graph.index_of(id))
            .collect::<HashSet<_>>();
        assert_eq!(neighbors, expected);
    }

    #[test]
    fn identity_tracks_node_set() {
        let snapshot = math_history_snapshot();
        let all = filter(&snapshot, &FilterPredicates::default());
        let again = filter(&snapshot, &FilterPredicates::default());
        let math = filter(
            &snapshot,
            &FilterPredicates {
                area: Some("Math".to_owned()),
                ..FilterPredicates::default()
            },
        );
        assert_eq!(all.identity(), again.identity());
        assert_ne!(all.identity(), math.identity());
    }

    #[test]
    fn path_from_root_walks_through_the_area() {
        let graph = filter(&math_history_snapshot(), &FilterPredicates::default());
        let target = graph.index_of("content-2").expect("content");
        let path = graph
            .path_from_root(target)
            .expect("reachable")
            .into_iter()
            .map(|index| graph.nodes[index].node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(path, vec!["self", "area-math", "content-2"]);

        let root = graph.index_of("self").expect("root");
        assert_eq!(graph.path_from_root(root), Some(vec![root]));
        assert_eq!(graph.path_from_root(99), None);
    }

    #[test]
    fn filter_options_list_areas_and_levels() {
        let input = SnapshotInput {
            areas: vec![area("math", "Math")],
            content_items: vec![
                item("1", "math", Status::Pending, Some("B")),
                item("2", "math", Status::Pending, Some("A")),
                item("3", "math", Status::Pending, Some("A")),
            ],
            ..SnapshotInput::default()
        };
        let options = FilterOptions::from_snapshot(&build_snapshot(&input, &no_match, "Me"));
        assert_eq!(options.areas, vec!["Math"]);
        assert_eq!(options.levels, vec!["A", "B"]);
    }

    fn snapshot_strategy() -> impl Strategy<Value = GraphSnapshot> {
        let statuses = prop::sample::select(Status::ALL.to_vec());
        let items = prop::collection::vec((0usize..3, statuses, 0usize..3), 1..12);
        let pairs = prop::collection::vec((0usize..12, 0usize..12), 0..16);
        (items, pairs).prop_map(|(items, pairs)| {
            let areas = vec![area("a", "Alpha"), area("b", "Beta"), area("c", "Gamma")];
            let content_items = items
                .iter()
                .enumerate()
                .map(|(index, (area_index, status, level))| {
                    item(
                        &index.to_string(),
                        &areas[*area_index].id,
                        *status,
                        Some(["L1", "L2", "L3"][*level]),
                    )
                })
                .collect::<Vec<_>>();
            let explicit_edges = pairs
                .into_iter()
                .map(|(a, b)| super::super::model::StoredEdge {
                    source: a.to_string(),
                    target: b.to_string(),
                    kind: super::super::model::EdgeKind::Related,
                })
                .collect();
            let input = SnapshotInput {
                content_items,
                areas,
                journal_entries: Vec::new(),
                explicit_edges,
            };
            build_snapshot(&input, &no_match, "Me")
        })
    }

    fn predicates_strategy() -> impl Strategy<Value = FilterPredicates> {
        (
            prop::option::of(prop::sample::select(vec!["Alpha", "Beta", "Gamma"])),
            prop::option::of(prop::sample::select(Status::ALL.to_vec())),
            prop::option::of(prop::sample::select(vec!["L1", "L2", "L3"])),
        )
            .prop_map(|(area, status, level)| FilterPredicates {
                area: area.map(str::to_owned),
                status,
                level: level.map(str::to_owned),
            })
    }

    proptest! {
        #[test]
        fn retained_edges_have_both_endpoints(
            snapshot in snapshot_strategy(),
            predicates in predicates_strategy(),
        ) {
            let graph = filter(&snapshot, &predicates);
            for edge in &graph.edges {
                prop_assert!(graph.node(&edge.source).is_some());
                prop_assert!(graph.node(&edge.target).is_some());
            }
        }

        #[test]
        fn connection_count_equals_incident_filtered_edges(
            snapshot in snapshot_strategy(),
            predicates in predicates_strategy(),
        ) {
            let graph = filter(&snapshot, &predicates);
            for node in &graph.nodes {
                let incident = graph
                    .edges
                    .iter()
                    .map(|edge| usize::from(edge.source == node.node.id) + usize::from(edge.target == node.node.id))
                    .sum::<usize>();
                prop_assert_eq!(node.connection_count, incident);
            }
        }

        #[test]
        fn removing_a_node_lowers_neighbor_degree(
            snapshot in snapshot_strategy(),
            status in prop::sample::select(Status::ALL.to_vec()),
        ) {
            let full = filter(&snapshot, &FilterPredicates::default());
            let narrowed = filter(&snapshot, &FilterPredicates {
                status: Some(status),
                ..FilterPredicates::default()
            });

            for survivor in &narrowed.nodes {
                let before = full.node(&survivor.node.id).map(|n| n.connection_count).unwrap_or(0);
                let lost_neighbor = full.edges.iter().any(|edge| {
                    let other = if edge.source == survivor.node.id {
                        Some(&edge.target)
                    } else if edge.target == survivor.node.id {
                        Some(&edge.source)
                    } else {
                        None
                    };
                    other.is_some_and(|other| narrowed.node(other).is_none())
                });
                if lost_neighbor {
                    prop_assert!(survivor.connection_count < before);
                } else {
                    prop_assert_eq!(survivor.connection_count, before);
                }
            }
        }

        #[test]
        fn filtering_is_idempotent(
            snapshot in snapshot_strategy(),
            predicates in predicates_strategy(),
        ) {
            let first = filter(&snapshot, &predicates);
            let second = filter(&snapshot, &predicates);

            let mut first_nodes = first.nodes.clone();
            let mut second_nodes = second.nodes.clone();
            first_nodes.sort_by(|a, b| a.node.id.cmp(&b.node.id));
            second_nodes.sort_by(|a, b| a.node.id.cmp(&b.node.id));
            prop_assert_eq!(first_nodes, second_nodes);

            let mut first_edges = first.edges.clone();
            let mut second_edges = second.edges.clone();
            first_edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
            second_edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
            prop_assert_eq!(first_edges, second_edges);
            prop_assert_eq!(first.max_distance, second.max_distance);
        }
    }
}
