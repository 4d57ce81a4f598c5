//! Grouping of tasks into labelled buckets with children placed after their parents.

use serde::Serialize;

use crate::task::Task;

/// Tasks of one group in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGroup {
    /// Group label.
    pub label: String,
    /// Ordered tasks.
    pub tasks: Vec<Task>,
}

/// Ordered mapping from group label to tasks; groups keep first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TaskGroups {
    groups: Vec<TaskGroup>,
}

impl TaskGroups {
    /// Groups in display order.
    #[must_use]
    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    /// Tasks of the group named `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&[Task]> {
        self.groups
            .iter()
            .find(|group| group.label == label)
            .map(|group| group.tasks.as_slice())
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All tasks, group by group.
    #[must_use]
    pub fn flatten(self) -> Vec<Task> {
        self.groups.into_iter().flat_map(|group| group.tasks).collect()
    }

    fn bucket_mut(&mut self, label: &str) -> &mut Vec<Task> {
        let index = match self.groups.iter().position(|group| group.label == label) {
            Some(index) => index,
            None => {
                self.groups.push(TaskGroup {
                    label: label.to_owned(),
                    tasks: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[index].tasks
    }

    /// Insert `child` right after its parent and any siblings already placed there.
    fn splice_child(&mut self, child: Task) -> Result<(), Task> {
        let Some(parent_id) = child.parent_id.as_ref() else {
            return Err(child);
        };
        for group in &mut self.groups {
            let Some(parent_pos) = group.tasks.iter().position(|task| task.is_root() && &task.id == parent_id) else {
                continue;
            };
            let insert_at = group.tasks[parent_pos + 1..]
                .iter()
                .position(|task| task.parent_id.as_ref() != Some(parent_id))
                .map_or(group.tasks.len(), |offset| parent_pos + 1 + offset);
            group.tasks.insert(insert_at, child);
            return Ok(());
        }
        Err(child)
    }
}

/// Partition tasks by group label and nest children under their parents.
///
/// Roots keep arrival order. A child whose parent is not present is appended to
/// the end of its own group instead of being dropped.
#[must_use]
pub fn group_tasks(tasks: Vec<Task>) -> TaskGroups {
    let mut groups = TaskGroups::default();
    let mut children = Vec::new();

    for task in tasks {
        if task.is_root() {
            let label = task.group.clone();
            groups.bucket_mut(&label).push(task);
        } else {
            children.push(task);
        }
    }

    for child in children {
        if let Err(orphan) = groups.splice_child(child) {
            tracing::debug!(task = %orphan.id, "parent not present; appending child to its group");
            let label = orphan.group.clone();
            groups.bucket_mut(&label).push(orphan);
        }
    }

    groups
}
