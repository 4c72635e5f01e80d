//! Cycle detection over the forward index.

use crate::TaskPlanner;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

impl TaskPlanner {
    /// Find dependency cycles.
    ///
    /// Runs a depth-first search along prerequisite edges from every task not
    /// yet visited, in registration order. Reaching a task that is already on
    /// the current path reports the path from that task onward. Dangling
    /// prerequisites are skipped. An empty result means the graph is acyclic.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let ids: Vec<&str> = self.ids().collect();
        let mut marks = vec![Mark::Unvisited; ids.len()];
        let mut cycles: Vec<Vec<String>> = Vec::new();

        for root in 0..ids.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // (task position, next prerequisite to visit)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::OnPath;

            while let Some(&(node, cursor)) = stack.last() {
                let Some(dep) = self.index.prerequisites(ids[node]).get(cursor) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let Some(next) = self.position(dep) else {
                    continue;
                };
                match marks[next] {
                    Mark::Unvisited => {
                        marks[next] = Mark::OnPath;
                        stack.push((next, 0));
                    }
                    Mark::OnPath => {
                        let start = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                        let cycle: Vec<String> = stack[start..]
                            .iter()
                            .map(|&(n, _)| ids[n].to_string())
                            .collect();
                        debug!(cycle = ?cycle, "found dependency cycle");
                        cycles.push(cycle);
                    }
                    Mark::Done => {}
                }
            }
        }

        if !cycles.is_empty() {
            warn!(count = cycles.len(), "task graph contains cycles");
        }
        cycles
    }

    /// Whether the graph contains at least one cycle.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.to_petgraph().graph)
    }
}
