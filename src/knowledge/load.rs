use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use super::build::build_snapshot;
use super::classify::KeywordClassifier;
use super::model::{GraphSnapshot, SnapshotInput};

const DEMO_SNAPSHOT: &str = include_str!("../../assets/demo_snapshot.json");

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {origin} is not a valid snapshot document")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the upstream collections come from.
#[derive(Clone, Debug)]
pub enum SnapshotSource {
    File(PathBuf),
    Demo,
}

impl SnapshotSource {
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Demo => "built-in demo".to_owned(),
        }
    }
}

pub fn parse_snapshot(raw: &str, origin: &str) -> Result<SnapshotInput, SnapshotError> {
    serde_json::from_str(raw).map_err(|source| SnapshotError::Parse {
        origin: origin.to_owned(),
        source,
    })
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotInput, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(&raw, &path.display().to_string())
}

/// Reads the upstream collections and assembles the graph snapshot.
pub fn collect_snapshot(source: &SnapshotSource, self_label: &str) -> Result<GraphSnapshot> {
    let input = match source {
        SnapshotSource::File(path) => read_snapshot(path)
            .with_context(|| format!("failed to load snapshot from {}", path.display()))?,
        SnapshotSource::Demo => {
            parse_snapshot(DEMO_SNAPSHOT, "demo").context("built-in demo snapshot is invalid")?
        }
    };

    let classifier = KeywordClassifier::new(&input.areas);
    let snapshot = build_snapshot(&input, &classifier, self_label);
    info!(
        source = %source.describe(),
        nodes = snapshot.node_count(),
        edges = snapshot.edge_count(),
        "knowledge graph snapshot loaded"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::super::model::{EdgeKind, NodeKind, Status};
    use super::*;

    #[test]
    fn parses_camel_case_document_with_defaults() {
        let raw = r##"{
            "areas": [{"id": "math", "name": "Math", "color": "#2563eb", "icon": "∑"}],
            "contentItems": [
                {"id": "1", "title": "Limits", "status": "in-progress", "parentId": null},
                {"id": "2", "title": "Derivatives", "areaId": "math", "level": "Intro"}
            ],
            "journalEntries": [{"id": "j", "date": "2024-12-31", "isComplete": true}],
            "explicitEdges": [{"source": "1", "target": "2", "kind": "prerequisite"}]
        }"##;

        let input = parse_snapshot(raw, "test").expect("valid document");
        assert_eq!(input.content_items[0].status, Status::InProgress);
        assert_eq!(input.content_items[1].status, Status::Pending);
        assert_eq!(input.content_items[1].area_id.as_deref(), Some("math"));
        assert!(input.journal_entries[0].is_complete);
        assert_eq!(input.explicit_edges[0].kind, EdgeKind::Prerequisite);
        assert!(input.areas[0].keywords.is_empty());
    }

    #[test]
    fn empty_document_is_an_empty_snapshot_input() {
        let input = parse_snapshot("{}", "test").expect("valid document");
        assert!(input.content_items.is_empty());
        assert!(input.areas.is_empty());
    }

    #[test]
    fn invalid_json_reports_origin() {
        let error = parse_snapshot("{not json", "broken.json").expect_err("invalid");
        assert!(error.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let error = read_snapshot(Path::new("/definitely/not/here.json")).expect_err("missing");
        assert!(matches!(error, SnapshotError::Read { .. }));
    }

    #[test]
    fn demo_snapshot_builds() {
        let snapshot = collect_snapshot(&SnapshotSource::Demo, "Me").expect("demo loads");
        assert!(snapshot.nodes.iter().any(|node| node.is_root()));
        assert!(
            snapshot
                .nodes
                .iter()
                .any(|node| matches!(node.kind, NodeKind::Journal(_)))
        );
        assert!(
            snapshot
                .edges
                .iter()
                .any(|edge| edge.kind == EdgeKind::Mention)
        );
    }
}
