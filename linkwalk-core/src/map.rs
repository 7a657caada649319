// Exporting the walked link graph

use crate::page::PageState;
use crate::registry::Registry;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dot,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Some(ExportFormat::Dot),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageExport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub state: PageState,
    pub partial: bool,
    pub linked_to: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub pages: usize,
    pub populated: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub summary: GraphSummary,
    pub pages: Vec<PageExport>,
}

pub fn summarize(registry: &Registry) -> GraphSummary {
    GraphSummary {
        pages: registry.len(),
        populated: registry.iter().filter(|(_, p)| p.is_populated()).count(),
        edges: registry.edge_count(),
    }
}

/// The registry as a petgraph graph. Node weights are URLs, edge weights
/// are the link's index in its source page.
pub fn to_graph(registry: &Registry) -> DiGraph<String, usize> {
    let mut graph = DiGraph::with_capacity(registry.len(), registry.edge_count());

    let nodes: Vec<NodeIndex> = registry
        .iter()
        .map(|(_, page)| graph.add_node(page.url().to_string()))
        .collect();

    for (id, page) in registry.iter() {
        for (ordinal, target) in page.linked_to().iter().enumerate() {
            graph.add_edge(nodes[id.index()], nodes[target.index()], ordinal);
        }
    }

    graph
}

pub fn to_dot(registry: &Registry) -> String {
    let graph = to_graph(registry);
    format!("{}", Dot::new(&graph))
}

pub fn to_export(registry: &Registry) -> GraphExport {
    let pages = registry
        .iter()
        .map(|(_, page)| PageExport {
            url: page.url().to_string(),
            title: page.title().map(str::to_string),
            state: page.state(),
            partial: page.is_partial(),
            linked_to: registry.urls(page.linked_to()),
        })
        .collect();

    GraphExport {
        summary: summarize(registry),
        pages,
    }
}

pub fn to_json(registry: &Registry) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_export(registry))
}

pub fn render(registry: &Registry, format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Dot => Ok(to_dot(registry)),
        ExportFormat::Json => to_json(registry),
    }
}

pub fn save_export(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
