//! Local co-author network around one researcher.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::VecDeque;

use crate::models::ResearcherProfile;

pub const DEFAULT_DEPTH: usize = 3;
pub const DEFAULT_MAX_NODES: usize = 25;

/// Researcher node weighted by total citations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub citations: u64,
}

/// Undirected edge with the lower id first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

impl GraphEdge {
    fn new(a: &str, b: &str, weight: u64) -> Self {
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        Self {
            source: source.to_string(),
            target: target.to_string(),
            weight,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoauthorGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Breadth-first expansion over `top_coauthors` starting at `root`
///
/// Nodes are listed in discovery order. Expansion stops below `max_depth` and
/// as soon as more than `max_nodes` nodes beyond the root are known. Returns
/// an empty graph when `root` is not a known researcher.
pub fn coauthor_graph(
    profiles: &IndexMap<String, ResearcherProfile>,
    root: &str,
    max_depth: usize,
    max_nodes: usize,
) -> CoauthorGraph {
    let Some(root_profile) = profiles.get(root) else {
        return CoauthorGraph::default();
    };

    let mut nodes = vec![GraphNode {
        id: root.to_string(),
        citations: root_profile.author.citation_count.total,
    }];
    let mut visited: IndexSet<&str> = IndexSet::from([root]);
    let mut edges: IndexSet<GraphEdge> = IndexSet::new();
    let mut queue = VecDeque::from([(root, 0usize)]);
    let mut discovered = 0;

    'expand: while let Some((id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(profile) = profiles.get(id) else {
            continue;
        };

        for (coauthor, count) in &profile.top_coauthors {
            let Some(coauthor_profile) = profiles.get(coauthor) else {
                continue;
            };
            edges.insert(GraphEdge::new(id, coauthor, *count));

            if visited.insert(coauthor.as_str()) {
                nodes.push(GraphNode {
                    id: coauthor.clone(),
                    citations: coauthor_profile.author.citation_count.total,
                });
                queue.push_back((coauthor.as_str(), depth + 1));
                discovered += 1;

                if discovered > max_nodes {
                    break 'expand;
                }
            }
        }
    }

    CoauthorGraph {
        nodes,
        edges: edges.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;

    fn profile(id: &str, citations: u64, coauthors: &[(&str, u64)]) -> (String, ResearcherProfile) {
        let mut author = Author::new(id, None, None);
        author.citation_count.total = citations;
        let mut profile = ResearcherProfile::new(author);
        profile.top_coauthors = coauthors.iter().map(|(c, n)| (c.to_string(), *n)).collect();
        (id.to_string(), profile)
    }

    fn chain() -> IndexMap<String, ResearcherProfile> {
        IndexMap::from([
            profile("A", 100, &[("B", 3), ("C", 1)]),
            profile("B", 50, &[("A", 3), ("D", 2)]),
            profile("C", 10, &[("A", 1)]),
            profile("D", 5, &[("B", 2), ("E", 1)]),
            profile("E", 1, &[("D", 1)]),
        ])
    }

    #[test]
    fn test_breadth_first_discovery() {
        let graph = coauthor_graph(&chain(), "A", 3, 25);

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(graph.nodes[0].citations, 100);
    }

    #[test]
    fn test_edges_deduplicated_and_ordered() {
        let graph = coauthor_graph(&chain(), "A", 3, 25);

        assert!(graph.edges.iter().all(|e| e.source < e.target));
        let ab: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.source == "A" && e.target == "B")
            .collect();
        assert_eq!(ab.len(), 1);
        assert_eq!(ab[0].weight, 3);
    }

    #[test]
    fn test_depth_limit() {
        let graph = coauthor_graph(&chain(), "A", 1, 25);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_node_limit() {
        let graph = coauthor_graph(&chain(), "A", 3, 1);
        // Expansion stops once the discovered count exceeds the limit.
        assert_eq!(graph.nodes.len(), 3);
    }

    #[test]
    fn test_unknown_coauthors_skipped() {
        let profiles = IndexMap::from([profile("A", 1, &[("Z", 4)])]);
        let graph = coauthor_graph(&profiles, "A", 3, 25);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_unknown_root() {
        assert_eq!(coauthor_graph(&chain(), "Q", 3, 25), CoauthorGraph::default());
    }
}
