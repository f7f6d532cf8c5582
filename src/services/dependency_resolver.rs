use crate::domain::models::Task;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Read-only checks over the `depends_on` graph.
///
/// Nothing here blocks a mutation; cycles leave the tasks involved blocked
/// forever and are only reported.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

// Standalone helper for cycle detection (no self needed)
fn detect_cycle_util(
    node: Uuid,
    graph: &HashMap<Uuid, &[Uuid]>,
    visited: &mut HashSet<Uuid>,
    rec_stack: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(&node) {
        for &neighbor in *neighbors {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Dependencies of `task` that are not among `known_tasks`.
    pub fn missing_dependencies(&self, task: &Task, known_tasks: &[Task]) -> Vec<Uuid> {
        let known: HashSet<Uuid> = known_tasks.iter().map(|t| t.id).collect();
        task.depends_on
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect()
    }

    /// First dependency cycle found, as the path of task ids around it.
    ///
    /// Roots are visited in slice order so the reported path is stable.
    pub fn detect_cycle(&self, tasks: &[Task]) -> Option<Vec<Uuid>> {
        let graph: HashMap<Uuid, &[Uuid]> = tasks
            .iter()
            .map(|t| (t.id, t.depends_on.as_slice()))
            .collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task in tasks {
            if !visited.contains(&task.id)
                && detect_cycle_util(task.id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Lane;

    fn create_test_task(id: Uuid, depends_on: Vec<Uuid>) -> Task {
        let mut task = Task::new("Test", Lane::Queued);
        task.id = id;
        task.depends_on = depends_on;
        task
    }

    #[test]
    fn test_missing_dependencies() {
        let resolver = DependencyResolver::new();
        let id1 = Uuid::new_v4();
        let ghost = Uuid::new_v4();

        let task1 = create_test_task(id1, vec![]);
        let task2 = create_test_task(Uuid::new_v4(), vec![id1, ghost]);

        assert_eq!(resolver.missing_dependencies(&task2, &[task1]), vec![ghost]);
    }

    #[test]
    fn test_detect_cycle_none() {
        let resolver = DependencyResolver::new();
        let id1 = Uuid::new_v4();
        let id2 = Uuid::new_v4();
        let id3 = Uuid::new_v4();

        let tasks = vec![
            create_test_task(id1, vec![]),
            create_test_task(id2, vec![id1]),
            create_test_task(id3, vec![id1, id2]),
        ];

        assert!(resolver.detect_cycle(&tasks).is_none());
    }

    #[test]
    fn test_detect_cycle_simple() {
        let resolver = DependencyResolver::new();
        let id1 = Uuid::new_v4();
        let id2 = Uuid::new_v4();

        let tasks = vec![
            create_test_task(id1, vec![id2]),
            create_test_task(id2, vec![id1]),
        ];

        let cycle = resolver.detect_cycle(&tasks).unwrap();
        assert_eq!(cycle, vec![id1, id2]);
    }

    #[test]
    fn test_detect_cycle_ignores_unknown_ids() {
        let resolver = DependencyResolver::new();
        let id1 = Uuid::new_v4();
        let tasks = vec![create_test_task(id1, vec![Uuid::new_v4()])];

        assert!(resolver.detect_cycle(&tasks).is_none());
    }

    #[test]
    fn test_detect_cycle_three_nodes() {
        let resolver = DependencyResolver::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let tasks = vec![
            create_test_task(a, vec![b]),
            create_test_task(b, vec![c]),
            create_test_task(c, vec![a]),
            create_test_task(Uuid::new_v4(), vec![a]),
        ];

        let cycle = resolver.detect_cycle(&tasks).unwrap();
        assert_eq!(cycle.len(), 3);
        assert!(cycle.contains(&a) && cycle.contains(&b) && cycle.contains(&c));
    }
}
