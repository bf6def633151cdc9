use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::util::slugify;

use super::classify::Classifier;
use super::model::{
    Area, AreaData, AreaRef, ContentData, ContentItem, Edge, EdgeKind, GraphSnapshot,
    JournalData, JournalEntry, Node, NodeKind, SnapshotInput,
};

pub const ROOT_ID: &str = "self";
pub const JOURNAL_AREA_ID: &str = "journal";
const JOURNAL_AREA_NAME: &str = "Journal";
const JOURNAL_AREA_COLOR: &str = "#64748b";
const JOURNAL_AREA_ICON: &str = "📓";
const JOURNAL_DATE_FORMAT: &str = "%Y-%m-%d";
const JOURNAL_LABEL_FORMAT: &str = "%b %-d, %Y";
const MIN_MENTION_TITLE_CHARS: usize = 3;

pub fn area_node_id(area_id: &str) -> String {
    format!("area-{area_id}")
}

pub fn content_node_id(item_id: &str) -> String {
    format!("content-{item_id}")
}

pub fn journal_node_id(entry_id: &str) -> String {
    format!("journal-{entry_id}")
}

pub fn journal_label(raw_date: &str) -> (Option<NaiveDate>, String) {
    match NaiveDate::parse_from_str(raw_date.trim(), JOURNAL_DATE_FORMAT) {
        Ok(date) => (Some(date), date.format(JOURNAL_LABEL_FORMAT).to_string()),
        Err(error) => {
            warn!(raw_date, %error, "journal entry date is not YYYY-MM-DD");
            (None, raw_date.to_owned())
        }
    }
}

struct Assembly {
    nodes: Vec<Node>,
    known: HashSet<String>,
    edges: Vec<Edge>,
}

impl Assembly {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            known: HashSet::new(),
            edges: Vec::new(),
        }
    }

    fn push_node(&mut self, node: Node) {
        if !self.known.insert(node.id.clone()) {
            warn!(id = %node.id, "duplicate node id dropped");
            return;
        }
        self.nodes.push(node);
    }

    fn push_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        if source == target {
            debug!(source, "self edge dropped");
            return false;
        }
        if !self.known.contains(source) || !self.known.contains(target) {
            warn!(source, target, kind = kind.label(), "edge endpoint missing, dropped");
            return false;
        }

        self.edges.push(Edge::new(source, target, kind));
        true
    }
}

fn area_ref(area: &Area) -> AreaRef {
    AreaRef {
        node_id: area_node_id(&area.id),
        name: area.name.clone(),
        color: area.color.clone(),
    }
}

fn resolve_area<'a>(
    item: &ContentItem,
    areas: &'a [Area],
    classifier: &dyn Classifier,
) -> Option<&'a Area> {
    let by_id = |id: &str| areas.iter().find(|area| area.id == id);

    if let Some(assigned) = item.area_id.as_deref() {
        if let Some(area) = by_id(assigned) {
            return Some(area);
        }
        warn!(item = %item.id, area = assigned, "assigned area does not exist");
    }

    classifier
        .classify(&item.title, &item.content)
        .and_then(|area_id| by_id(&area_id))
        .or_else(|| areas.first())
}

/// Turns the upstream collections into one node/edge snapshot.
///
/// Edges are emitted in a fixed order: root to areas, areas to members,
/// parent to child, stored relationships, then inferred mentions. Edges whose
/// endpoints do not resolve are dropped.
pub fn build_snapshot(
    input: &SnapshotInput,
    classifier: &dyn Classifier,
    self_label: &str,
) -> GraphSnapshot {
    let mut assembly = Assembly::new();

    assembly.push_node(Node {
        id: ROOT_ID.to_owned(),
        label: self_label.to_owned(),
        kind: NodeKind::Root,
    });

    let mut areas = input.areas.clone();
    if !input.journal_entries.is_empty() {
        areas.push(Area {
            id: JOURNAL_AREA_ID.to_owned(),
            name: JOURNAL_AREA_NAME.to_owned(),
            color: JOURNAL_AREA_COLOR.to_owned(),
            icon: JOURNAL_AREA_ICON.to_owned(),
            keywords: Vec::new(),
        });
    }

    for area in &areas {
        assembly.push_node(Node {
            id: area_node_id(&area.id),
            label: area.name.clone(),
            kind: NodeKind::Area(AreaData {
                name: area.name.clone(),
                color: area.color.clone(),
                icon: area.icon.clone(),
            }),
        });
    }

    // The synthetic journal area never receives classified content.
    let configured_areas = &input.areas;
    let mut item_areas = Vec::with_capacity(input.content_items.len());
    for item in &input.content_items {
        let area = resolve_area(item, configured_areas, classifier).map(area_ref);
        item_areas.push(area.clone());
        assembly.push_node(Node {
            id: content_node_id(&item.id),
            label: item.title.clone(),
            kind: NodeKind::Content(ContentData {
                item_id: item.id.clone(),
                status: item.status,
                area,
                level: item.level.clone(),
                parent_id: item.parent_id.clone(),
            }),
        });
    }

    let journal_area = areas
        .iter()
        .find(|area| area.id == JOURNAL_AREA_ID && !input.journal_entries.is_empty())
        .map(area_ref);
    for entry in &input.journal_entries {
        assembly.push_node(journal_node(entry, journal_area.clone()));
    }

    for area in &areas {
        assembly.push_edge(ROOT_ID, &area_node_id(&area.id), EdgeKind::Related);
    }

    for (item, area) in input.content_items.iter().zip(&item_areas) {
        if let Some(area) = area {
            assembly.push_edge(&area.node_id, &content_node_id(&item.id), EdgeKind::Related);
        }
    }
    if let Some(journal_area) = &journal_area {
        for entry in &input.journal_entries {
            assembly.push_edge(
                &journal_area.node_id,
                &journal_node_id(&entry.id),
                EdgeKind::Related,
            );
        }
    }

    for item in &input.content_items {
        if let Some(parent_id) = item.parent_id.as_deref() {
            assembly.push_edge(
                &content_node_id(parent_id),
                &content_node_id(&item.id),
                EdgeKind::Prerequisite,
            );
        }
    }

    for stored in &input.explicit_edges {
        let source = resolve_endpoint(&assembly.known, &stored.source);
        let target = resolve_endpoint(&assembly.known, &stored.target);
        assembly.push_edge(&source, &target, stored.kind);
    }

    let inferred = infer_mentions(&input.content_items, &mut assembly.edges);
    debug!(
        nodes = assembly.nodes.len(),
        edges = assembly.edges.len(),
        inferred,
        "snapshot assembled"
    );

    GraphSnapshot {
        nodes: assembly.nodes,
        edges: assembly.edges,
    }
}

fn journal_node(entry: &JournalEntry, area: Option<AreaRef>) -> Node {
    let (date, label) = journal_label(&entry.date);
    Node {
        id: journal_node_id(&entry.id),
        label,
        kind: NodeKind::Journal(JournalData {
            entry_id: entry.id.clone(),
            date,
            raw_date: entry.date.clone(),
            is_complete: entry.is_complete,
            area,
        }),
    }
}

/// Stored relationships reference content by raw id; full node ids pass through.
fn resolve_endpoint(known: &HashSet<String>, raw: &str) -> String {
    if known.contains(raw) {
        return raw.to_owned();
    }
    content_node_id(raw)
}

struct MentionTerms {
    node_id: String,
    haystack: String,
    title: String,
    slug: String,
}

/// Adds a `mention` edge from every item whose text names another item's title.
///
/// At most one mention edge exists per unordered pair, so running this again
/// over its own output adds nothing. Returns how many edges were added.
pub fn infer_mentions(items: &[ContentItem], edges: &mut Vec<Edge>) -> usize {
    let terms = items
        .iter()
        .map(|item| MentionTerms {
            node_id: content_node_id(&item.id),
            haystack: item.content.to_lowercase(),
            title: item.title.trim().to_lowercase(),
            slug: slugify(&item.title),
        })
        .collect::<Vec<_>>();

    let mut seen = edges
        .iter()
        .filter(|edge| edge.kind == EdgeKind::Mention)
        .map(|edge| {
            let (a, b) = edge.unordered_pair();
            (a.to_owned(), b.to_owned())
        })
        .collect::<HashSet<_>>();

    let mut added = 0usize;
    for mentioning in &terms {
        for mentioned in &terms {
            if mentioning.node_id == mentioned.node_id
                || mentioned.title.chars().count() < MIN_MENTION_TITLE_CHARS
            {
                continue;
            }

            let names_title = mentioning.haystack.contains(mentioned.title.as_str());
            let names_slug = mentioned.slug.chars().count() >= MIN_MENTION_TITLE_CHARS
                && mentioning.haystack.contains(mentioned.slug.as_str());
            if !names_title && !names_slug {
                continue;
            }

            let edge = Edge::new(
                mentioning.node_id.as_str(),
                mentioned.node_id.as_str(),
                EdgeKind::Mention,
            );
            let (a, b) = edge.unordered_pair();
            if seen.insert((a.to_owned(), b.to_owned())) {
                edges.push(edge);
                added += 1;
            }
        }
    }

    added
}
