use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

/// A named vertex with its incoming dependency edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: String,
    pub depends_on: Vec<String>,
}

/// Result of layering a dependency graph.
#[derive(Debug, Default)]
pub struct Layers {
    /// Layer of each node: roots are 0, a node sits one layer below its
    /// deepest dependency
    pub ranks: BTreeMap<String, usize>,
    /// Members of a cycle and everything downstream of one, sorted
    pub unresolved: Vec<String>,
}

impl Layers {
    pub fn depth(&self) -> usize {
        self.ranks.values().max().map_or(0, |max| max + 1)
    }
}

/// Ranks `nodes` by dependency depth.
///
/// Builds a `DiGraph` with an edge from each dependency to its dependent.
/// Strongly connected components with more than one node, or with a
/// self-loop, are cycles; they and every node reachable from them stay
/// unranked. Dependencies on names absent from `nodes` are ignored, they
/// resolve outside the graph.
pub fn compute_layers(nodes: &[GraphNode]) -> Layers {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
    for node in nodes {
        let name = node.name.as_str();
        indices.entry(name).or_insert_with(|| graph.add_node(name));
    }

    for node in nodes {
        let to = indices[node.name.as_str()];
        for dep in &node.depends_on {
            if let Some(&from) = indices.get(dep.as_str()) {
                graph.update_edge(from, to, ());
            }
        }
    }

    // Components come out in reverse topological order
    let components = tarjan_scc(&graph);

    let mut blocked: HashSet<NodeIndex> = HashSet::new();
    for component in &components {
        let cyclic = match component.as_slice() {
            [single] => graph.find_edge(*single, *single).is_some(),
            _ => true,
        };
        if !cyclic {
            continue;
        }
        for &start in component {
            let mut dfs = Dfs::new(&graph, start);
            while let Some(reached) = dfs.next(&graph) {
                blocked.insert(reached);
            }
        }
    }

    let mut layers = Layers::default();
    let mut ranks: HashMap<NodeIndex, usize> = HashMap::new();
    for &idx in components.iter().rev().flatten() {
        if blocked.contains(&idx) {
            continue;
        }
        let rank = graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter_map(|dep| ranks.get(&dep))
            .map(|dep_rank| dep_rank + 1)
            .max()
            .unwrap_or(0);
        ranks.insert(idx, rank);
        layers.ranks.insert(graph[idx].to_string(), rank);
    }

    let unresolved: BTreeSet<&str> = blocked.iter().map(|&idx| graph[idx]).collect();
    layers.unresolved = unresolved.into_iter().map(str::to_string).collect();
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, depends_on: &[&str]) -> GraphNode {
        GraphNode {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn test_linear_chain_layers() {
        let layers = compute_layers(&[node("c", &["b"]), node("a", &[]), node("b", &["a"])]);

        assert_eq!(layers.ranks["a"], 0);
        assert_eq!(layers.ranks["b"], 1);
        assert_eq!(layers.ranks["c"], 2);
        assert_eq!(layers.depth(), 3);
        assert!(layers.unresolved.is_empty());
    }

    #[test]
    fn test_node_sits_below_deepest_dependency() {
        let layers = compute_layers(&[
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["a", "b"]),
        ]);

        assert_eq!(layers.ranks["c"], 2);
    }

    #[test]
    fn test_external_dependencies_are_ignored() {
        let layers = compute_layers(&[node("a", &["outside"])]);

        assert_eq!(layers.ranks["a"], 0);
    }

    #[test]
    fn test_cycles_are_unresolved() {
        let layers = compute_layers(&[
            node("root", &[]),
            node("x", &["y", "root"]),
            node("y", &["x"]),
        ]);

        assert_eq!(layers.ranks.len(), 1);
        assert_eq!(layers.unresolved, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_nodes_downstream_of_a_cycle_are_unresolved() {
        let layers = compute_layers(&[
            node("a", &[]),
            node("x", &["y"]),
            node("y", &["x", "a"]),
            node("after", &["y"]),
            node("beside", &["a"]),
        ]);

        assert_eq!(layers.ranks["beside"], 1);
        assert_eq!(
            layers.unresolved,
            vec!["after".to_string(), "x".to_string(), "y".to_string()]
        );
    }

    #[test]
    fn test_duplicate_names_share_one_vertex() {
        let layers = compute_layers(&[node("a", &[]), node("b", &["a"]), node("a", &[])]);

        assert_eq!(layers.ranks.len(), 2);
        assert_eq!(layers.ranks["b"], 1);
    }

    #[test]
    fn test_self_dependency_is_unresolved() {
        let layers = compute_layers(&[node("loop", &["loop"])]);

        assert!(layers.ranks.is_empty());
        assert_eq!(layers.unresolved, vec!["loop".to_string()]);
    }

    #[test]
    fn test_empty_graph() {
        let layers = compute_layers(&[]);
        assert_eq!(layers.depth(), 0);
    }
}
