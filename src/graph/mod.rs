use crate::error::{Diagnostic, ScheduleError};
use crate::task::{validate_task, Dependency, Task};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::warn;

/// One snapshot's task network: an id-indexed arena of tasks plus the
/// dependency DAG. Node weights are task ids, edge weights index into the
/// dependency list, so `clone()` is a full deep copy with no aliasing.
#[derive(Debug, Clone)]
pub struct TaskNetwork {
    snapshot: String,
    tasks: FxHashMap<i32, Task>,
    dependencies: Vec<Dependency>,
    graph: DiGraph<i32, usize>,
    id_to_index: FxHashMap<i32, NodeIndex>,
    diagnostics: Vec<Diagnostic>,
}

impl TaskNetwork {
    pub fn new(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: snapshot.into(),
            tasks: FxHashMap::default(),
            dependencies: Vec::new(),
            graph: DiGraph::new(),
            id_to_index: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), ScheduleError> {
        validate_task(&task)?;
        if self.tasks.contains_key(&task.id) {
            return Err(ScheduleError::DuplicateTask { task_id: task.id });
        }
        let node = self.graph.add_node(task.id);
        self.id_to_index.insert(task.id, node);
        self.tasks.insert(task.id, task);
        Ok(())
    }

    /// A dependency referencing a task id absent from the network is not an
    /// error: it is dropped and recorded as a diagnostic (§ data quality).
    pub fn add_dependency(&mut self, dependency: Dependency) {
        let (pred, succ) = (dependency.predecessor, dependency.successor);
        match (self.id_to_index.get(&pred), self.id_to_index.get(&succ)) {
            (Some(&u), Some(&v)) => {
                let idx = self.dependencies.len();
                self.dependencies.push(dependency);
                self.graph.add_edge(u, v, idx);
            }
            _ => {
                warn!(predecessor = pred, successor = succ, "dropping dangling dependency");
                self.diagnostics.push(Diagnostic::DanglingDependency {
                    predecessor: pred,
                    successor: succ,
                });
            }
        }
    }

    pub fn task(&self, id: i32) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: i32) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn successors(&self, id: i32) -> Vec<i32> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    pub fn predecessors(&self, id: i32) -> Vec<i32> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    fn neighbor_ids(&self, id: i32, direction: Direction) -> Vec<i32> {
        let Some(&node) = self.id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut ids: Vec<i32> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Dependencies entering `id`, paired with the predecessor's task id.
    pub fn incoming(&self, id: i32) -> Vec<(&Dependency, i32)> {
        self.edge_pairs(id, Direction::Incoming)
    }

    /// Dependencies leaving `id`, paired with the successor's task id.
    pub fn outgoing(&self, id: i32) -> Vec<(&Dependency, i32)> {
        self.edge_pairs(id, Direction::Outgoing)
    }

    fn edge_pairs(&self, id: i32, direction: Direction) -> Vec<(&Dependency, i32)> {
        use petgraph::visit::EdgeRef;
        let Some(&node) = self.id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut pairs: Vec<(&Dependency, i32)> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (&self.dependencies[*edge.weight()], self.graph[other])
            })
            .collect();
        pairs.sort_by_key(|(dep, _)| (dep.predecessor, dep.successor));
        pairs
    }

    /// Kahn's algorithm over the dependency DAG. Ties between ready tasks
    /// are broken by node insertion order so repeated runs produce the same
    /// ordering.
    pub fn topological_order(&self) -> Result<Vec<i32>, ScheduleError> {
        let mut in_degree: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut ready: BinaryHeap<Reverse<NodeIndex>> = BinaryHeap::new();

        for node in self.graph.node_indices() {
            let degree = self.graph.edges_directed(node, Direction::Incoming).count();
            in_degree.insert(node, degree);
            if degree == 0 {
                ready.push(Reverse(node));
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(self.graph[node]);
            for succ in self.graph.neighbors_directed(node, Direction::Outgoing) {
                let degree = in_degree
                    .get_mut(&succ)
                    .expect("successor missing from in-degree map");
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(succ));
                }
            }
        }

        if order.len() != self.graph.node_count() {
            let ordered: std::collections::HashSet<i32> = order.iter().copied().collect();
            let mut remaining: Vec<i32> = self
                .graph
                .node_indices()
                .map(|n| self.graph[n])
                .filter(|id| !ordered.contains(id))
                .collect();
            remaining.sort_unstable();
            return Err(ScheduleError::CycleDetected { remaining });
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::DependencyKind;

    fn task(id: i32) -> Task {
        Task::new(id, format!("T-{id}"), format!("Task {id}"), 8.0, 1)
    }

    #[test]
    fn topological_order_is_stable_across_runs() {
        let mut network = TaskNetwork::new("baseline");
        for id in [3, 1, 2, 4] {
            network.add_task(task(id)).unwrap();
        }
        network.add_dependency(Dependency::finish_to_start(3, 4));

        let first = network.topological_order().unwrap();
        let second = network.topological_order().unwrap();
        assert_eq!(first, second);
        // insertion order breaks the tie between the three roots
        assert_eq!(first, vec![3, 1, 2, 4]);
    }

    #[test]
    fn dangling_dependency_recorded_not_fatal() {
        let mut network = TaskNetwork::new("baseline");
        network.add_task(task(1)).unwrap();
        network.add_dependency(Dependency::new(
            1,
            99,
            DependencyKind::FinishToStart,
            0.0,
        ));
        assert!(network.dependencies().is_empty());
        assert_eq!(
            network.diagnostics(),
            &[Diagnostic::DanglingDependency {
                predecessor: 1,
                successor: 99
            }]
        );
    }

    #[test]
    fn parallel_edges_between_same_pair_are_kept() {
        let mut network = TaskNetwork::new("baseline");
        network.add_task(task(1)).unwrap();
        network.add_task(task(2)).unwrap();
        network.add_dependency(Dependency::new(1, 2, DependencyKind::StartToStart, 4.0));
        network.add_dependency(Dependency::new(1, 2, DependencyKind::FinishToFinish, 4.0));
        assert_eq!(network.incoming(2).len(), 2);
        assert_eq!(network.successors(1), vec![2]);
    }
}
