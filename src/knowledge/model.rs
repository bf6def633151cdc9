use chrono::NaiveDate;
use serde::Deserialize;

/// Learning progress of a content item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Understood,
    InProgress,
    #[default]
    Pending,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Understood, Status::InProgress, Status::Pending];

    pub fn label(self) -> &'static str {
        match self {
            Self::Understood => "Understood",
            Self::InProgress => "In progress",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Prerequisite,
    #[default]
    Related,
    Mention,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::Related => "related",
            Self::Mention => "mention",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    /// Extra terms the keyword classifier associates with this area.
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    /// Calendar day in `YYYY-MM-DD` form.
    pub date: String,
    #[serde(default)]
    pub is_complete: bool,
}

/// A stored relationship. Endpoints may be raw content ids or full node ids.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: EdgeKind,
}

/// Everything the upstream collections hand to the graph engine on reload.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInput {
    #[serde(default)]
    pub content_items: Vec<ContentItem>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,
    #[serde(default)]
    pub explicit_edges: Vec<StoredEdge>,
}

/// Area membership carried by content and journal nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaRef {
    pub node_id: String,
    pub name: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaData {
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentData {
    pub item_id: String,
    pub status: Status,
    pub area: Option<AreaRef>,
    pub level: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalData {
    pub entry_id: String,
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub is_complete: bool,
    pub area: Option<AreaRef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Area(AreaData),
    Content(ContentData),
    Journal(JournalData),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    /// Root-class nodes anchor the distance computation.
    pub fn is_root_class(&self) -> bool {
        matches!(self.kind, NodeKind::Root | NodeKind::Area(_))
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn area(&self) -> Option<&AreaRef> {
        match &self.kind {
            NodeKind::Content(content) => content.area.as_ref(),
            NodeKind::Journal(journal) => journal.area.as_ref(),
            NodeKind::Root | NodeKind::Area(_) => None,
        }
    }

    /// Journal entries report their completion flag as a status bucket.
    pub fn status(&self) -> Option<Status> {
        match &self.kind {
            NodeKind::Content(content) => Some(content.status),
            NodeKind::Journal(journal) => Some(if journal.is_complete {
                Status::Understood
            } else {
                Status::Pending
            }),
            NodeKind::Root | NodeKind::Area(_) => None,
        }
    }

    pub fn level(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Content(content) => content.level.as_deref(),
            NodeKind::Root | NodeKind::Area(_) | NodeKind::Journal(_) => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            NodeKind::Root => "self",
            NodeKind::Area(_) => "area",
            NodeKind::Content(_) => "content",
            NodeKind::Journal(_) => "journal",
        }
    }
}

/// Stored with a direction for display; undirected for layout and distance.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Endpoints ordered so that `a -> b` and `b -> a` compare equal.
    pub fn unordered_pair(&self) -> (&str, &str) {
        if self.source <= self.target {
            (self.source.as_str(), self.target.as_str())
        } else {
            (self.target.as_str(), self.source.as_str())
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
