use crate::clock::Clock;
use crate::forms::{IssueForm, TaskForm, WinForm};
use crate::models::{Issue, IssueStatus, Priority, Task, Win};

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    content: Vec<char>,
    pub cursor_col: usize,
}

impl LineEditor {
    pub fn new(content: &str) -> Self {
        let content: Vec<char> = content.chars().collect();
        LineEditor { cursor_col: content.len(), content }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.cursor_col > self.content.len() {
            self.cursor_col = self.content.len();
        }
        self.content.insert(self.cursor_col, c);
        self.cursor_col += 1;
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if self.cursor_col > 0 && self.cursor_col <= self.content.len() {
            self.content.remove(self.cursor_col - 1);
            self.cursor_col -= 1;
            }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor_col < self.content.len() {
            self.content.remove(self.cursor_col);
            }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.content.len() {
            self.cursor_col += 1;
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor_col = self.content.len();
    }

    /// Text before the cursor, the character under it, and the rest.
    pub fn split_at_cursor(&self) -> (String, Option<char>, String) {
        let col = self.cursor_col.min(self.content.len());
        let before: String = self.content[..col].iter().collect();
        let under = self.content.get(col).copied();
        let after: String = self.content.get(col + 1..).map(|s| s.iter().collect()).unwrap_or_default();
        (before, under, after)
    }

    pub fn get_content(&self) -> String {
        self.content.iter().collect()
    }
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Text(LineEditor),
    Choice { options: Vec<&'static str>, selected: usize },
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FormField {
    fn text(label: &'static str, value: &str) -> Self {
        FormField { label, kind: FieldKind::Text(LineEditor::new(value)) }
    }

    fn choice(label: &'static str, options: Vec<&'static str>, current: &str) -> Self {
        let selected = options.iter().position(|o| *o == current).unwrap_or(0);
        FormField { label, kind: FieldKind::Choice { options, selected } }
    }

    pub fn value(&self) -> String {
        match &self.kind {
            FieldKind::Text(editor) => editor.get_content(),
            FieldKind::Choice { options, selected } => options[*selected].to_string(),
        }
    }
}

/// Which record a form creates or edits. Edits carry the record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    NewTask,
    EditTask(String),
    NewIssue,
    EditIssue(String),
    NewWin,
    EditWin(String),
}

#[derive(Debug, Clone)]
pub struct FormEditor {
    pub target: FormTarget,
    pub fields: Vec<FormField>,
    pub focused: usize,
    pub error: Option<String>,
}

fn names<T: Copy>(all: &[T], name: fn(T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(|v| name(*v)).collect()
}

impl FormEditor {
    fn new(target: FormTarget, fields: Vec<FormField>) -> Self {
        FormEditor { target, fields, focused: 0, error: None }
    }

    pub fn new_task(clock: &dyn Clock) -> Self {
        let today = clock.today().format("%Y-%m-%d").to_string();
        Self::task(FormTarget::NewTask, &TaskForm { due: today, ..TaskForm::default() })
    }

    pub fn edit_task(task: &Task) -> Self {
        Self::task(FormTarget::EditTask(task.id.clone()), &TaskForm::from_task(task))
    }

    fn task(target: FormTarget, form: &TaskForm) -> Self {
        Self::new(
            target,
            vec![
                FormField::text("Title", &form.title),
                FormField::text("Description", &form.desc),
                FormField::text("Due Date", &form.due),
                FormField::choice("Priority", names(Priority::ALL, Priority::as_str), form.priority.as_str()),
            ],
        )
    }

    pub fn new_issue() -> Self {
        Self::issue(FormTarget::NewIssue, &IssueForm::default())
    }

    pub fn edit_issue(issue: &Issue) -> Self {
        Self::issue(FormTarget::EditIssue(issue.id.clone()), &IssueForm::from_issue(issue))
    }

    fn issue(target: FormTarget, form: &IssueForm) -> Self {
        Self::new(
            target,
            vec![
                FormField::text("Title", &form.title),
                FormField::text("Description", &form.desc),
                FormField::choice("Status", names(IssueStatus::ALL, IssueStatus::as_str), form.status.as_str()),
            ],
        )
    }

    pub fn new_win() -> Self {
        Self::win(FormTarget::NewWin, &WinForm::default())
    }

    pub fn edit_win(win: &Win) -> Self {
        Self::win(FormTarget::EditWin(win.id.clone()), &WinForm::from_win(win))
    }

    fn win(target: FormTarget, form: &WinForm) -> Self {
        Self::new(
            target,
            vec![FormField::text("Title", &form.title), FormField::text("Description", &form.desc)],
        )
    }

    pub fn title(&self) -> &'static str {
        match self.target {
            FormTarget::NewTask => "Add Task",
            FormTarget::EditTask(_) => "Edit Task",
            FormTarget::NewIssue => "Add Issue",
            FormTarget::EditIssue(_) => "Edit Issue",
            FormTarget::NewWin => "Add Major Win",
            FormTarget::EditWin(_) => "Edit Win",
        }
    }

    pub fn is_edit(&self) -> bool {
        !matches!(self.target, FormTarget::NewTask | FormTarget::NewIssue | FormTarget::NewWin)
    }

    fn value(&self, label: &str) -> String {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(FormField::value)
            .unwrap_or_default()
    }

    pub fn task_form(&self) -> TaskForm {
        TaskForm {
            title: self.value("Title"),
            desc: self.value("Description"),
            due: self.value("Due Date"),
            priority: self.value("Priority").parse().unwrap_or_default(),
        }
    }

    pub fn issue_form(&self) -> IssueForm {
        IssueForm {
            title: self.value("Title"),
            desc: self.value("Description"),
            status: self.value("Status").parse().unwrap_or_default(),
        }
    }

    pub fn win_form(&self) -> WinForm {
        WinForm { title: self.value("Title"), desc: self.value("Description") }
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn focus_previous(&mut self) {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }

    fn focused_kind(&mut self) -> &mut FieldKind {
        &mut self.fields[self.focused].kind
    }

    fn focused_is_choice(&self) -> bool {
        matches!(self.fields[self.focused].kind, FieldKind::Choice { .. })
    }

    pub fn insert_char(&mut self, c: char) {
        if self.focused_is_choice() {
            if c == ' ' {
                self.cycle_choice(true);
            }
        } else if let FieldKind::Text(editor) = self.focused_kind() {
            editor.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if let FieldKind::Text(editor) = self.focused_kind() {
            editor.delete_char();
        }
    }

    pub fn delete(&mut self) {
        if let FieldKind::Text(editor) = self.focused_kind() {
            editor.delete_forward();
        }
    }

    pub fn left(&mut self) {
        if self.focused_is_choice() {
            self.cycle_choice(false);
        } else if let FieldKind::Text(editor) = self.focused_kind() {
            editor.move_cursor_left();
        }
    }

    pub fn right(&mut self) {
        if self.focused_is_choice() {
            self.cycle_choice(true);
        } else if let FieldKind::Text(editor) = self.focused_kind() {
            editor.move_cursor_right();
        }
    }

    pub fn home(&mut self) {
        if let FieldKind::Text(editor) = self.focused_kind() {
            editor.move_to_start_of_line();
        }
    }

    pub fn end(&mut self) {
        if let FieldKind::Text(editor) = self.focused_kind() {
            editor.move_to_end_of_line();
        }
    }

    fn cycle_choice(&mut self, forward: bool) {
        if let FieldKind::Choice { options, selected } = self.focused_kind() {
            let len = options.len();
            *selected = if forward { (*selected + 1) % len } else { (*selected + len - 1) % len };
        }
    }
}
