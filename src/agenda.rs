use chrono::NaiveDate;

use crate::models::{Issue, IssueFilter, IssueStatus, Notification, PriorityFilter, Task, TaskStatus};
use crate::store::RootStore;

pub const RECENT_NOTIFICATIONS: usize = 5;

/// Whole calendar days from `today` to `due`; negative once overdue.
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

pub fn is_today(due: NaiveDate, today: NaiveDate) -> bool {
    due == today
}

pub fn is_overdue(due: NaiveDate, today: NaiveDate) -> bool {
    due < today
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBadge {
    Overdue,
    Today,
    Soon,
}

pub fn due_badge(due: NaiveDate, today: NaiveDate) -> DueBadge {
    if is_overdue(due, today) {
        DueBadge::Overdue
    } else if is_today(due, today) {
        DueBadge::Today
    } else {
        DueBadge::Soon
    }
}

pub fn todays_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| is_today(t.due, today) && t.status != TaskStatus::Done)
        .collect()
}

pub fn overdue_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| is_overdue(t.due, today) && t.status != TaskStatus::Done)
        .collect()
}

/// The latest `limit` notifications, newest first.
pub fn recent_notifications(notifications: &[Notification], limit: usize) -> Vec<&Notification> {
    notifications.iter().rev().take(limit).collect()
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

/// Tasks in one kanban column, in insertion order.
pub fn kanban_column(tasks: &[Task], status: TaskStatus, filter: PriorityFilter) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.status == status && filter.matches(t))
        .collect()
}

pub fn filtered_issues(issues: &[Issue], filter: IssueFilter) -> Vec<&Issue> {
    issues.iter().filter(|i| filter.matches(i)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub today: usize,
    pub overdue: usize,
    pub open_tasks: usize,
    pub open_issues: usize,
    pub wins: usize,
    pub unread: usize,
}

pub fn summarize(store: &RootStore, today: NaiveDate) -> Summary {
    Summary {
        today: todays_tasks(store.tasks(), today).len(),
        overdue: overdue_tasks(store.tasks(), today).len(),
        open_tasks: store.tasks().iter().filter(|t| t.status != TaskStatus::Done).count(),
        open_issues: store
            .issues()
            .iter()
            .filter(|i| i.status != IssueStatus::Resolved)
            .count(),
        wins: store.wins().len(),
        unread: unread_count(store.notifications()),
    }
}
