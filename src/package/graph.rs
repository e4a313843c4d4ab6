//! Publish ordering for monorepo members.

use crate::error::{PackageError, Result};
use crate::package::MonorepoMember;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Order `members` so every package comes after the siblings it depends on
pub fn publish_order(members: &[MonorepoMember]) -> Result<Vec<MonorepoMember>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for (i, member) in members.iter().enumerate() {
        index.insert(member.name.as_str(), graph.add_node(i));
    }

    for member in members {
        let to = index[member.name.as_str()];
        for dep in &member.dependencies {
            // Dependencies outside the given set are already published
            if let Some(&from) = index.get(dep.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let sorted = toposort(&graph, None).map_err(|cycle| PackageError::Cycle {
        package: members[graph[cycle.node_id()]].name.clone(),
    })?;

    Ok(sorted.into_iter().map(|n| members[graph[n]].clone()).collect())
}
