use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Tasks,
    Issues,
    Wins,
    Notifications,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Tasks, Slot::Issues, Slot::Wins, Slot::Notifications];

    /// Key of this slot inside the durable snapshot object.
    pub fn key(self) -> &'static str {
        match self {
            Slot::Tasks => "tasks",
            Slot::Issues => "issues",
            Slot::Wins => "wins",
            Slot::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A record type stored in one of the four snapshot slots.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + 'static {
    const SLOT: Slot;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

// Generates the lowercase wire name, Display and FromStr for a closed value set.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ParseEnumError { kind: $kind, value: s.to_string() })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

wire_enum!(Priority, "priority", { Low => "low", Medium => "medium", High => "high" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

wire_enum!(TaskStatus, "task status", { Todo => "todo", InProgress => "inprogress", Done => "done" });

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Neighbouring kanban column, if any.
    pub fn shifted(self, forward: bool) -> Option<TaskStatus> {
        match (self, forward) {
            (TaskStatus::Todo, true) => Some(TaskStatus::InProgress),
            (TaskStatus::InProgress, true) => Some(TaskStatus::Done),
            (TaskStatus::InProgress, false) => Some(TaskStatus::Todo),
            (TaskStatus::Done, false) => Some(TaskStatus::InProgress),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    #[default]
    Open,
    Monitoring,
    Resolved,
}

wire_enum!(IssueStatus, "issue status", { Open => "open", Monitoring => "monitoring", Resolved => "resolved" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Warning,
    Danger,
    Success,
}

wire_enum!(NotificationKind, "notification kind", {
    Info => "info",
    Warning => "warning",
    Danger => "danger",
    Success => "success",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub due: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub status: IssueStatus,
    pub date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Win {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub msg: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub date: Timestamp,
}

impl Record for Task {
    const SLOT: Slot = Slot::Tasks;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Issue {
    const SLOT: Slot = Slot::Issues;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Win {
    const SLOT: Slot = Slot::Wins;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Notification {
    const SLOT: Slot = Slot::Notifications;

    fn id(&self) -> &str {
        &self.id
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The four collections as one value; also the exact export file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub issues: Vec<Issue>,
    pub wins: Vec<Win>,
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
impl Snapshot {
    pub fn len(&self, slot: Slot) -> usize {
        match slot {
            Slot::Tasks => self.tasks.len(),
            Slot::Issues => self.issues.len(),
            Slot::Wins => self.wins.len(),
            Slot::Notifications => self.notifications.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Slot::ALL.iter().all(|slot| self.len(*slot) == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(p) => task.priority == p,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            PriorityFilter::All => PriorityFilter::Only(Priority::Low),
            PriorityFilter::Only(Priority::Low) => PriorityFilter::Only(Priority::Medium),
            PriorityFilter::Only(Priority::Medium) => PriorityFilter::Only(Priority::High),
            PriorityFilter::Only(Priority::High) => PriorityFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityFilter::All => "all",
            PriorityFilter::Only(p) => p.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueFilter {
    #[default]
    All,
    Only(IssueStatus),
}

impl IssueFilter {
    pub fn matches(self, issue: &Issue) -> bool {
        match self {
            IssueFilter::All => true,
            IssueFilter::Only(s) => issue.status == s,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            IssueFilter::All => IssueFilter::Only(IssueStatus::Open),
            IssueFilter::Only(IssueStatus::Open) => IssueFilter::Only(IssueStatus::Monitoring),
            IssueFilter::Only(IssueStatus::Monitoring) => IssueFilter::Only(IssueStatus::Resolved),
            IssueFilter::Only(IssueStatus::Resolved) => IssueFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IssueFilter::All => "all",
            IssueFilter::Only(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PopupMode {
    #[default]
    None,
    Form,
    ConfirmDelete(DeleteTarget),
    ConfirmReset,
    ImportPath,
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Task(String),
    Issue(String),
    Win(String),
}

impl DeleteTarget {
    pub fn prompt(&self) -> &'static str {
        match self {
            DeleteTarget::Task(_) => "Delete this task?",
            DeleteTarget::Issue(_) => "Delete this issue?",
            DeleteTarget::Win(_) => "Delete this win?",
        }
    }
}
