use crate::error::{Error, Result};
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TODO: &str = "1";
pub const IN_PROGRESS: &str = "2";
pub const DONE: &str = "3";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub tasks: Vec<Task>,
}

impl Column {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            tasks: Vec::new(),
        }
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

/// Ordered columns of tasks. Serialized as a bare JSON array of columns.
///
/// Every transition takes `&self` and hands back a fresh snapshot; a
/// rejected transition returns an unchanged copy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            columns: vec![
                Column::new(TODO, "To Do"),
                Column::new(IN_PROGRESS, "In Progress"),
                Column::new(DONE, "Done"),
            ],
        }
    }
}

impl Board {
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn contains_task(&self, task_id: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.tasks.iter().any(|t| t.id == task_id))
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn add_task(&self, column_id: &str, id: &str, title: &str, description: &str) -> Board {
        if title.trim().is_empty() || self.column(column_id).is_none() || self.contains_task(id) {
            return self.clone();
        }

        let task = Task::new(id, title, description);
        self.map_columns(|col| {
            if col.id == column_id {
                col.tasks.push(task.clone());
            }
        })
    }

    pub fn delete_task(&self, column_id: &str, task_id: &str) -> Board {
        self.map_columns(|col| {
            if col.id == column_id {
                col.tasks.retain(|t| t.id != task_id);
            }
        })
    }

    pub fn move_task(&self, from_column: &str, to_column: &str, task_id: &str) -> Board {
        if from_column == to_column || self.column(to_column).is_none() {
            return self.clone();
        }
        let Some(task) = self
            .column(from_column)
            .and_then(|c| c.find_task(task_id))
            .cloned()
        else {
            return self.clone();
        };

        self.map_columns(|col| {
            if col.id == from_column {
                col.tasks.retain(|t| t.id != task_id);
            } else if col.id == to_column {
                col.tasks.push(task.clone());
            }
        })
    }

    /// Rejects boards whose columns differ from the fixed three, or whose
    /// tasks have duplicate ids or blank titles.
    pub fn validate(&self) -> Result<()> {
        let ids: Vec<&str> = self.columns.iter().map(|c| c.id.as_str()).collect();
        if ids != [TODO, IN_PROGRESS, DONE] {
            return Err(Error::InvalidBoard(format!("unexpected columns {:?}", ids)));
        }

        let mut task_ids = HashSet::new();
        for task in self.columns.iter().flat_map(|c| &c.tasks) {
            if !task_ids.insert(task.id.as_str()) {
                return Err(Error::InvalidBoard(format!("duplicate task id {}", task.id)));
            }
            if task.title.trim().is_empty() {
                return Err(Error::InvalidBoard(format!("task {} has no title", task.id)));
            }
        }
        Ok(())
    }

    fn map_columns(&self, mut f: impl FnMut(&mut Column)) -> Board {
        let mut next = self.clone();
        next.columns.iter_mut().for_each(|col| f(col));
        next
    }
}
