use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Position in the contract's task array.
    pub id: u64,
    pub description: String,
    pub completed: bool,
}

/// Complete snapshot of the contract's tasks in on-chain index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from `(description, completed)` pairs read at
    /// indices `0..n`.
    pub fn from_reads(reads: Vec<(String, bool)>) -> Self {
        let tasks = reads
            .into_iter()
            .enumerate()
            .map(|(idx, (description, completed))| Task {
                id: idx as u64,
                description,
                completed,
            })
            .collect();
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        usize::try_from(id).ok().and_then(|idx| self.tasks.get(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn open_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_read_order() {
        let list = TaskList::from_reads(vec![
            ("water plants".to_string(), true),
            ("buy milk".to_string(), false),
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).map(|t| t.description.as_str()), Some("buy milk"));
        assert_eq!(list.get(0).map(|t| t.completed), Some(true));
        assert_eq!(list.get(2), None);
        assert_eq!(list.open_count(), 1);
        assert_eq!(
            list.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }
}
