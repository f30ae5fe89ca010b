use chrono::NaiveDate;

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::models::{new_id, Issue, IssueStatus, Priority, Task, TaskStatus, Win};

fn required_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub desc: String,
    /// `YYYY-MM-DD`; blank means today.
    pub due: String,
    pub priority: Priority,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        TaskForm {
            title: task.title.clone(),
            desc: task.desc.clone(),
            due: task.due.format("%Y-%m-%d").to_string(),
            priority: task.priority,
        }
    }

    /// Builds a new task, or the edited version of `existing` keeping its
    /// id, status and creation time.
    pub fn build(&self, existing: Option<&Task>, clock: &dyn Clock) -> Result<Task, ValidationError> {
        let title = required_title(&self.title)?;
        let due = match self.due.trim() {
            "" => clock.today(),
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidDate(raw.to_string()))?,
        };
        Ok(Task {
            id: existing.map(|t| t.id.clone()).unwrap_or_else(new_id),
            title,
            desc: self.desc.trim().to_string(),
            due,
            priority: self.priority,
            status: existing.map(|t| t.status).unwrap_or(TaskStatus::Todo),
            created: existing.map(|t| t.created).unwrap_or_else(|| clock.timestamp()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueForm {
    pub title: String,
    pub desc: String,
    pub status: IssueStatus,
}

impl IssueForm {
    pub fn from_issue(issue: &Issue) -> Self {
        IssueForm { title: issue.title.clone(), desc: issue.desc.clone(), status: issue.status }
    }

    pub fn build(&self, existing: Option<&Issue>, clock: &dyn Clock) -> Result<Issue, ValidationError> {
        Ok(Issue {
            id: existing.map(|i| i.id.clone()).unwrap_or_else(new_id),
            title: required_title(&self.title)?,
            desc: self.desc.trim().to_string(),
            status: self.status,
            date: existing.map(|i| i.date).unwrap_or_else(|| clock.timestamp()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WinForm {
    pub title: String,
    pub desc: String,
}

impl WinForm {
    pub fn from_win(win: &Win) -> Self {
        WinForm { title: win.title.clone(), desc: win.desc.clone() }
    }

    pub fn build(&self, existing: Option<&Win>, clock: &dyn Clock) -> Result<Win, ValidationError> {
        Ok(Win {
            id: existing.map(|w| w.id.clone()).unwrap_or_else(new_id),
            title: required_title(&self.title)?,
            desc: self.desc.trim().to_string(),
            date: existing.map(|w| w.date).unwrap_or_else(|| clock.timestamp()),
        })
    }
}
