use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::{Path, PathBuf};

use crate::actions;
use crate::agenda::{self, DueBadge};
use crate::clock::Clock;
use crate::editor::{FieldKind, FormEditor, FormTarget, LineEditor};
use crate::error::ActionError;
use crate::models::{
    DeleteTarget, Issue, IssueFilter, IssueStatus, Notification, NotificationKind, PopupMode, Priority,
    PriorityFilter, Slot, Task, TaskStatus, Win,
};
use crate::router::{Router, View, ViewRenderer};
use crate::store::RootStore;

const KANBAN: &[TaskStatus] = TaskStatus::ALL;

/// Selection, filter and popup state that lives across frames.
#[derive(Debug, Default)]
pub struct UiState {
    pub task_column: usize,
    pub task_list_state: ListState,
    pub issue_list_state: ListState,
    pub win_list_state: ListState,
    pub notification_list_state: ListState,
    pub priority_filter: PriorityFilter,
    pub issue_filter: IssueFilter,
    pub popup_mode: PopupMode,
    pub form: Option<FormEditor>,
    pub import_input: LineEditor,
    pub status: Option<String>,
}

impl UiState {
    fn list_state(&mut self, view: View) -> Option<&mut ListState> {
        match view {
            View::Tasks => Some(&mut self.task_list_state),
            View::Issues => Some(&mut self.issue_list_state),
            View::Wins => Some(&mut self.win_list_state),
            View::Notifications => Some(&mut self.notification_list_state),
            View::Dashboard | View::Backup => None,
        }
    }
}

pub struct App<'a> {
    store: &'a mut RootStore,
    clock: &'a dyn Clock,
    router: Router,
    backup_dir: PathBuf,
    pub ui: UiState,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(store: &'a mut RootStore, clock: &'a dyn Clock, router: Router, backup_dir: PathBuf) -> Self {
        App { store, clock, router, backup_dir, ui: UiState::default(), should_quit: false }
    }

    pub fn view(&self) -> View {
        self.router.current_view()
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let mut painter = FramePainter {
            frame: f,
            ui: &mut self.ui,
            today: self.clock.today(),
            backup_dir: &self.backup_dir,
        };
        self.router.render_current(&*self.store, &mut painter);
    }

    fn close_popup(&mut self) {
        self.ui.popup_mode = PopupMode::None;
        self.ui.form = None;
        self.ui.import_input = LineEditor::default();
    }

    fn open_form(&mut self, form: FormEditor) {
        self.ui.form = Some(form);
        self.ui.popup_mode = PopupMode::Form;
    }

    fn column_tasks(&self) -> Vec<&Task> {
        agenda::kanban_column(self.store.tasks(), KANBAN[self.ui.task_column], self.ui.priority_filter)
    }

    fn selected_task(&self) -> Option<&Task> {
        let column = self.column_tasks();
        self.ui.task_list_state.selected().and_then(|i| column.get(i).copied())
    }

    fn selected_issue(&self) -> Option<&Issue> {
        let issues = agenda::filtered_issues(self.store.issues(), self.ui.issue_filter);
        self.ui.issue_list_state.selected().and_then(|i| issues.get(i).copied())
    }

    fn selected_win(&self) -> Option<&Win> {
        self.ui.win_list_state.selected().and_then(|i| self.store.wins().get(i))
    }

    // the notification list is painted newest first
    fn selected_notification(&self) -> Option<&Notification> {
        let notifications = self.store.notifications();
        self.ui
            .notification_list_state
            .selected()
            .and_then(|i| notifications.len().checked_sub(i + 1))
            .and_then(|i| notifications.get(i))
    }

    fn visible_len(&self, view: View) -> usize {
        match view {
            View::Tasks => self.column_tasks().len(),
            View::Issues => agenda::filtered_issues(self.store.issues(), self.ui.issue_filter).len(),
            View::Wins => self.store.wins().len(),
            View::Notifications => self.store.notifications().len(),
            View::Dashboard | View::Backup => 0,
        }
    }

    pub fn next_item(&mut self) {
        self.step_selection(true);
    }

    pub fn previous_item(&mut self) {
        self.step_selection(false);
    }

    fn step_selection(&mut self, forward: bool) {
        let view = self.view();
        let len = self.visible_len(view);
        let Some(state) = self.ui.list_state(view) else { return };
        if len == 0 {
            state.select(None);
            return;
        }
        let i = match state.selected() {
            Some(i) if forward => {
                if i + 1 >= len {
                    0
                } else {
                    i + 1
                }
            }
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    fn select_column(&mut self, column: usize) {
        self.ui.task_column = column;
        self.ui.task_list_state.select(None);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match self.ui.popup_mode.clone() {
            PopupMode::None => self.handle_view_key(key.code),
            PopupMode::Form => self.handle_form_key(key),
            PopupMode::ConfirmDelete(target) => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        self.close_popup();
                        self.delete(&target)?;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => self.close_popup(),
                    _ => {}
                }
                Ok(())
            }
            PopupMode::ConfirmReset => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        self.close_popup();
                        actions::reset_all(self.store);
                        self.ui.status = Some("All data cleared".to_string());
                    }
                    KeyCode::Char('n') | KeyCode::Esc => self.close_popup(),
                    _ => {}
                }
                Ok(())
            }
            PopupMode::ImportPath => self.handle_import_key(key.code),
            PopupMode::Message(_) => {
                self.close_popup();
                Ok(())
            }
        }
    }

    fn handle_view_key(&mut self, code: KeyCode) -> Result<()> {
        let view = self.view();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.router.navigate_to(view.next()),
            KeyCode::BackTab => self.router.navigate_to(view.previous()),
            KeyCode::Char(c) if ('1'..='6').contains(&c) => {
                let index = c as usize - '1' as usize;
                self.router.navigate_to(View::ALL[index]);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next_item(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_item(),
            _ => return self.handle_view_action(view, code),
        }
        Ok(())
    }

    fn handle_view_action(&mut self, view: View, code: KeyCode) -> Result<()> {
        match (view, code) {
            (_, KeyCode::Char('t')) if view.shows_quick_add() => self.open_form(FormEditor::new_task(self.clock)),
            (_, KeyCode::Char('i')) if view.shows_quick_add() => self.open_form(FormEditor::new_issue()),
            (_, KeyCode::Char('w')) if view.shows_quick_add() => self.open_form(FormEditor::new_win()),
            (View::Tasks, KeyCode::Char('a')) => self.open_form(FormEditor::new_task(self.clock)),
            (View::Issues, KeyCode::Char('a')) => self.open_form(FormEditor::new_issue()),
            (View::Wins, KeyCode::Char('a')) => self.open_form(FormEditor::new_win()),

            (View::Tasks, KeyCode::Left) => self.select_column(self.ui.task_column.saturating_sub(1)),
            (View::Tasks, KeyCode::Right) => self.select_column((self.ui.task_column + 1).min(KANBAN.len() - 1)),
            (View::Tasks, KeyCode::Char('<') | KeyCode::Char('H')) => self.shift_selected_task(false)?,
            (View::Tasks, KeyCode::Char('>') | KeyCode::Char('L')) => self.shift_selected_task(true)?,
            (View::Tasks, KeyCode::Char('f')) => {
                self.ui.priority_filter = self.ui.priority_filter.cycle();
                self.ui.task_list_state.select(None);
            }
            (View::Tasks, KeyCode::Enter) => {
                if let Some(form) = self.selected_task().map(FormEditor::edit_task) {
                    self.open_form(form);
                }
            }
            (View::Tasks, KeyCode::Char('d')) => {
                if let Some(id) = self.selected_task().map(|task| task.id.clone()) {
                    self.ui.popup_mode = PopupMode::ConfirmDelete(DeleteTarget::Task(id));
                }
            }

            (View::Issues, KeyCode::Char('f')) => {
                self.ui.issue_filter = self.ui.issue_filter.cycle();
                self.ui.issue_list_state.select(None);
            }
            (View::Issues, KeyCode::Enter) => {
                if let Some(form) = self.selected_issue().map(FormEditor::edit_issue) {
                    self.open_form(form);
                }
            }
            (View::Issues, KeyCode::Char('d')) => {
                if let Some(id) = self.selected_issue().map(|issue| issue.id.clone()) {
                    self.ui.popup_mode = PopupMode::ConfirmDelete(DeleteTarget::Issue(id));
                }
            }

            (View::Wins, KeyCode::Enter) => {
                if let Some(form) = self.selected_win().map(FormEditor::edit_win) {
                    self.open_form(form);
                }
            }
            (View::Wins, KeyCode::Char('d')) => {
                if let Some(id) = self.selected_win().map(|win| win.id.clone()) {
                    self.ui.popup_mode = PopupMode::ConfirmDelete(DeleteTarget::Win(id));
                }
            }

            (View::Notifications, KeyCode::Enter | KeyCode::Char('x')) => {
                if let Some(id) = self.selected_notification().map(|n| n.id.clone()) {
                    actions::dismiss_notification(self.store, &id)?;
                }
            }
            (View::Notifications, KeyCode::Char('z')) => {
                if let Some(id) = self.selected_notification().map(|n| n.id.clone()) {
                    actions::snooze_notification(self.store, self.clock, &id)?;
                    self.ui.status = Some(format!("Snoozed for {} hours", actions::SNOOZE_HOURS));
                }
            }

            (View::Backup, KeyCode::Char('e')) => self.export(),
            (View::Backup, KeyCode::Char('i')) => self.ui.popup_mode = PopupMode::ImportPath,
            (View::Backup, KeyCode::Char('R')) => self.ui.popup_mode = PopupMode::ConfirmReset,
            _ => {}
        }
        Ok(())
    }

    fn shift_selected_task(&mut self, forward: bool) -> Result<()> {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else { return Ok(()) };
        if let Some(status) = actions::shift_task(self.store, &id, forward)? {
            // follow the card into its new column
            if let Some(column) = KANBAN.iter().position(|s| *s == status) {
                self.ui.task_column = column;
                let row = self.column_tasks().iter().position(|t| t.id == id);
                self.ui.task_list_state.select(row);
            }
            self.ui.status = Some(format!("Moved to {}", status.label()));
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.ui.form.as_mut() else {
            self.close_popup();
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => self.close_popup(),
            KeyCode::Enter => return self.submit_form(),
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Left => form.left(),
            KeyCode::Right => form.right(),
            KeyCode::Home => form.home(),
            KeyCode::End => form.end(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Delete => form.delete(),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(target) = delete_target(&form.target) {
                    self.ui.form = None;
                    self.ui.popup_mode = PopupMode::ConfirmDelete(target);
                }
            }
            KeyCode::Char(c) => form.insert_char(c),
            _ => {}
        }
        Ok(())
    }

    fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.ui.form.as_ref() else { return Ok(()) };
        let result = match &form.target {
            FormTarget::NewTask => actions::create_task(self.store, self.clock, &form.task_form()).map(|t| t.title),
            FormTarget::EditTask(id) => {
                actions::edit_task(self.store, self.clock, id, &form.task_form()).map(|t| t.title)
            }
            FormTarget::NewIssue => actions::create_issue(self.store, self.clock, &form.issue_form()).map(|i| i.title),
            FormTarget::EditIssue(id) => {
                actions::edit_issue(self.store, self.clock, id, &form.issue_form()).map(|i| i.title)
            }
            FormTarget::NewWin => actions::create_win(self.store, self.clock, &form.win_form()).map(|w| w.title),
            FormTarget::EditWin(id) => actions::edit_win(self.store, self.clock, id, &form.win_form()).map(|w| w.title),
        };

        match result {
            Ok(title) => {
                self.close_popup();
                self.ui.status = Some(format!("Saved \"{title}\""));
            }
            Err(ActionError::Validation(err)) => {
                if let Some(form) = self.ui.form.as_mut() {
                    form.error = Some(err.to_string());
                }
            }
            Err(err) => {
                self.close_popup();
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn delete(&mut self, target: &DeleteTarget) -> Result<()> {
        let title = match target {
            DeleteTarget::Task(id) => actions::delete_task(self.store, id)?.title,
            DeleteTarget::Issue(id) => actions::delete_issue(self.store, id)?.title,
            DeleteTarget::Win(id) => actions::delete_win(self.store, id)?.title,
        };
        self.ui.status = Some(format!("Deleted \"{title}\""));
        Ok(())
    }

    fn export(&mut self) {
        match actions::export_backup(self.store, self.clock, &self.backup_dir) {
            Ok(path) => self.ui.status = Some(format!("Data exported successfully ✅ {}", path.display())),
            Err(err) => {
                log::error!("Export failed: {err}");
                self.ui.popup_mode = PopupMode::Message(err.to_string());
            }
        }
    }

    fn handle_import_key(&mut self, code: KeyCode) -> Result<()> {
        let input = &mut self.ui.import_input;
        match code {
            KeyCode::Esc => self.close_popup(),
            KeyCode::Enter => {
                let path = PathBuf::from(input.get_content().trim());
                self.close_popup();
                match actions::import_backup_file(self.store, self.clock, &path) {
                    Ok(()) => self.ui.status = Some("Data import complete 🎉".to_string()),
                    Err(err) if err.is_rejected_import() => {
                        self.ui.popup_mode = PopupMode::Message(actions::IMPORT_REJECTED.to_string());
                    }
                    Err(err) => self.ui.popup_mode = PopupMode::Message(err.to_string()),
                }
            }
            KeyCode::Left => input.move_cursor_left(),
            KeyCode::Right => input.move_cursor_right(),
            KeyCode::Home => input.move_to_start_of_line(),
            KeyCode::End => input.move_to_end_of_line(),
            KeyCode::Backspace => input.delete_char(),
            KeyCode::Delete => input.delete_forward(),
            KeyCode::Char(c) => input.insert_char(c),
            _ => {}
        }
        Ok(())
    }
}

fn delete_target(target: &FormTarget) -> Option<DeleteTarget> {
    match target {
        FormTarget::EditTask(id) => Some(DeleteTarget::Task(id.clone())),
        FormTarget::EditIssue(id) => Some(DeleteTarget::Issue(id.clone())),
        FormTarget::EditWin(id) => Some(DeleteTarget::Win(id.clone())),
        FormTarget::NewTask | FormTarget::NewIssue | FormTarget::NewWin => None,
    }
}

pub fn run_tui(store: &mut RootStore, clock: &dyn Clock, router: Router, backup_dir: PathBuf) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, clock, router, backup_dir);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if !app.store.persist_now() {
        log::error!("Final save failed, changes since the last successful write are lost");
    }

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        if app.router.take_change() {
            log::debug!("Showing {}", app.router.current_view());
            app.ui.status = None;
        }

        terminal.draw(|f| app.draw(f))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                if let Err(err) = app.handle_key(key) {
                    log::error!("{err:#}");
                    app.ui.status = Some(err.to_string());
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Paints one routed view plus the navigation, footer and any open popup.
struct FramePainter<'p, 'f> {
    frame: &'p mut Frame<'f>,
    ui: &'p mut UiState,
    today: NaiveDate,
    backup_dir: &'p Path,
}

impl ViewRenderer for FramePainter<'_, '_> {
    fn render(&mut self, view: View, store: &RootStore) {
        let f = &mut *self.frame;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(4)].as_ref())
            .split(f.area());

        render_nav(f, view, store, chunks[0]);
        match view {
            View::Dashboard => render_dashboard(f, store, self.today, chunks[1]),
            View::Tasks => render_tasks(f, store, self.ui, self.today, chunks[1]),
            View::Issues => render_issues(f, store, self.ui, chunks[1]),
            View::Wins => render_wins(f, store, self.ui, chunks[1]),
            View::Notifications => render_notifications(f, store, self.ui, chunks[1]),
            View::Backup => render_backup(f, store, self.backup_dir, chunks[1]),
        }
        render_footer(f, view, store, self.ui, chunks[2]);
        render_popup(f, self.ui);
    }
}

fn render_nav(f: &mut Frame, view: View, store: &RootStore, area: Rect) {
    let unread = agenda::unread_count(store.notifications());
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            View::Notifications if unread > 0 => Line::from(format!("{} {} ({unread})", i + 1, v.title())),
            _ => Line::from(format!("{} {}", i + 1, v.title())),
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("OT CSM Buddy"))
        .select(view.index())
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Black));

    f.render_widget(tabs, area);
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Keeps a selection inside the list after rows were removed or filtered.
fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        Some(_) => {}
    }
}

fn highlighted_list<'a>(items: Vec<ListItem<'a>>, title: String) -> List<'a> {
    List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::LightGreen).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ")
}

fn placeholder(text: &str) -> Vec<ListItem<'static>> {
    vec![ListItem::new(Span::styled(text.to_string(), Style::default().fg(Color::DarkGray)))]
}

fn due_span(due: NaiveDate, today: NaiveDate) -> Span<'static> {
    let color = match agenda::due_badge(due, today) {
        DueBadge::Overdue => Color::Red,
        DueBadge::Today => Color::Yellow,
        DueBadge::Soon => Color::Green,
    };
    Span::styled(format!("[{due}]"), Style::default().fg(color))
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Blue,
    }
}

fn issue_status_color(status: IssueStatus) -> Color {
    match status {
        IssueStatus::Open => Color::Red,
        IssueStatus::Monitoring => Color::Yellow,
        IssueStatus::Resolved => Color::Green,
    }
}

fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Info => Color::Cyan,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Danger => Color::Red,
        NotificationKind::Success => Color::Green,
    }
}

fn task_item(task: &Task, today: NaiveDate) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled(format!("{} ", task.title), Style::default().fg(Color::White)),
        Span::styled(format!("[{}] ", task.priority), Style::default().fg(priority_color(task.priority))),
        due_span(task.due, today),
    ]))
}

fn due_list(tasks: &[&Task], today: NaiveDate) -> Vec<ListItem<'static>> {
    if tasks.is_empty() {
        return placeholder("All clear!");
    }
    tasks
        .iter()
        .map(|t| ListItem::new(Line::from(vec![Span::raw(format!("{} ", t.title)), due_span(t.due, today)])))
        .collect()
}

fn render_dashboard(f: &mut Frame, store: &RootStore, today: NaiveDate, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let summary = agenda::summarize(store, today);
    let header = Paragraph::new(format!(
        "Open tasks: {}   Open issues: {}   Wins: {}   Unread: {}      Quick add: t Task | i Issue | w Win",
        summary.open_tasks, summary.open_issues, summary.wins, summary.unread
    ))
    .block(Block::default().borders(Borders::ALL).title(today.format("%A, %B %-d").to_string()))
    .style(Style::default().fg(Color::White));
    f.render_widget(header, rows[0]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(33), Constraint::Percentage(33), Constraint::Percentage(34)].as_ref())
        .split(rows[1]);

    let todays = agenda::todays_tasks(store.tasks(), today);
    f.render_widget(
        List::new(due_list(&todays, today)).block(Block::default().borders(Borders::ALL).title("Today's To-Dos")),
        cards[0],
    );

    let overdue = agenda::overdue_tasks(store.tasks(), today);
    f.render_widget(
        List::new(due_list(&overdue, today)).block(Block::default().borders(Borders::ALL).title("Overdue Tasks")),
        cards[1],
    );

    let recent = agenda::recent_notifications(store.notifications(), agenda::RECENT_NOTIFICATIONS);
    let items = if recent.is_empty() {
        placeholder("No notifications.")
    } else {
        recent
            .iter()
            .map(|n| ListItem::new(Span::styled(n.msg.clone(), Style::default().fg(kind_color(n.kind)))))
            .collect()
    };
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Recent Notifications")),
        cards[2],
    );
}

fn render_tasks(f: &mut Frame, store: &RootStore, ui: &mut UiState, today: NaiveDate, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)].as_ref())
        .split(area);

    f.render_widget(
        Paragraph::new(format!(" Priority: {}  (f to change)", ui.priority_filter.label()))
            .style(Style::default().fg(Color::Cyan)),
        rows[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(33), Constraint::Percentage(33), Constraint::Percentage(34)].as_ref())
        .split(rows[1]);

    for (i, status) in KANBAN.iter().enumerate() {
        let tasks = agenda::kanban_column(store.tasks(), *status, ui.priority_filter);
        let items: Vec<ListItem> = tasks.iter().map(|t| task_item(t, today)).collect();
        let title = format!("{} ({})", status.label(), tasks.len());

        if i == ui.task_column {
            let list = highlighted_list(items, String::new()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(title),
            );
            clamp_selection(&mut ui.task_list_state, tasks.len());
            f.render_stateful_widget(list, columns[i], &mut ui.task_list_state);
        } else {
            f.render_widget(highlighted_list(items, title), columns[i]);
        }
    }
}

fn render_issues(f: &mut Frame, store: &RootStore, ui: &mut UiState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let issues = agenda::filtered_issues(store.issues(), ui.issue_filter);
    let items = if issues.is_empty() {
        placeholder("No issues found.")
    } else {
        issues
            .iter()
            .map(|issue| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", issue.title), Style::default().fg(Color::White)),
                    Span::styled(format!("[{}]", issue.status), Style::default().fg(issue_status_color(issue.status))),
                ]))
            })
            .collect()
    };

    clamp_selection(&mut ui.issue_list_state, issues.len());
    let title = format!("Major Issues (status: {})", ui.issue_filter.label());
    f.render_stateful_widget(highlighted_list(items, title), chunks[0], &mut ui.issue_list_state);

    let selected = ui.issue_list_state.selected().and_then(|i| issues.get(i));
    let info_text = match selected {
        Some(issue) => format!(
            "Issue: {}\nStatus: {}\nLogged: {}\n\n{}\n\nControls:\n• a: Add issue\n• Enter: Edit\n• d: Delete\n• f: Filter by status",
            issue.title, issue.status, issue.date, issue.desc
        ),
        None => "No issue selected\n\nControls:\n• a: Add issue\n• f: Filter by status".to_string(),
    };
    let info = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Issue Info"))
        .wrap(Wrap { trim: false });
    f.render_widget(info, chunks[1]);
}

fn render_wins(f: &mut Frame, store: &RootStore, ui: &mut UiState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let wins = store.wins();
    let items = if wins.is_empty() {
        placeholder("No wins yet.")
    } else {
        wins.iter()
            .map(|win| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", win.title), Style::default().fg(Color::White)),
                    Span::styled(format!("{}", win.date.local_date()), Style::default().fg(Color::Cyan)),
                ]))
            })
            .collect()
    };

    clamp_selection(&mut ui.win_list_state, wins.len());
    f.render_stateful_widget(highlighted_list(items, "Major Wins".to_string()), chunks[0], &mut ui.win_list_state);

    let selected = ui.win_list_state.selected().and_then(|i| wins.get(i));
    let info_text = match selected {
        Some(win) => format!(
            "Win: {}\nDate: {}\n\n{}\n\nControls:\n• a: Add win\n• Enter: Edit\n• d: Delete",
            win.title, win.date, win.desc
        ),
        None => "No win selected\n\nControls:\n• a: Add win".to_string(),
    };
    let info = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Win Info"))
        .wrap(Wrap { trim: false });
    f.render_widget(info, chunks[1]);
}

fn render_notifications(f: &mut Frame, store: &RootStore, ui: &mut UiState, area: Rect) {
    let notifications = store.notifications();
    let items = if notifications.is_empty() {
        placeholder("No notifications.")
    } else {
        notifications
            .iter()
            .rev()
            .map(|n| {
                let style = Style::default().fg(kind_color(n.kind));
                let (marker, style) = if n.read {
                    ("  ", style)
                } else {
                    ("● ", style.add_modifier(Modifier::BOLD))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{marker}{}", n.msg), style),
                    Span::styled(format!("  {}", n.date), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect()
    };

    clamp_selection(&mut ui.notification_list_state, notifications.len());
    f.render_stateful_widget(
        highlighted_list(items, "Notifications".to_string()),
        area,
        &mut ui.notification_list_state,
    );
}

fn render_backup(f: &mut Frame, store: &RootStore, backup_dir: &Path, area: Rect) {
    let counts = Slot::ALL
        .iter()
        .map(|slot| format!("{slot}: {}", store.len(*slot)))
        .collect::<Vec<_>>()
        .join("   ");
    let text = format!(
        "Saved in: {}\n{counts}\n\n• e: Export a backup to {}\n• i: Import a backup file (replaces everything)\n• R: Clear all data",
        store.storage_description(),
        backup_dir.display()
    );
    let panel = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("BackUp"))
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn help_text(view: View) -> &'static str {
    match view {
        View::Dashboard => "t/i/w: Quick add | Tab/1-6: Switch view | q: Quit",
        View::Tasks => "←/→: Column | ↑/↓: Select | a: Add | Enter: Edit | d: Delete | </>: Move | f: Filter | q: Quit",
        View::Issues => "↑/↓: Select | a: Add | Enter: Edit | d: Delete | f: Filter | q: Quit",
        View::Wins => "↑/↓: Select | a: Add | Enter: Edit | d: Delete | q: Quit",
        View::Notifications => "↑/↓: Select | x: Dismiss | z: Snooze | q: Quit",
        View::Backup => "e: Export | i: Import | R: Reset | q: Quit",
    }
}

fn render_footer(f: &mut Frame, view: View, store: &RootStore, ui: &UiState, area: Rect) {
    let status = match store.last_persist_error() {
        Some(err) => Line::from(Span::styled(format!("Could not save data: {err}"), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(ui.status.clone().unwrap_or_default(), Style::default().fg(Color::Green))),
    };
    let footer = Paragraph::new(vec![status, Line::from(help_text(view))])
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::White));
    f.render_widget(footer, area);
}

fn input_line(editor: &LineEditor, focused: bool) -> Line<'static> {
    if !focused {
        return Line::from(editor.get_content());
    }
    let (before, under, after) = editor.split_at_cursor();
    Line::from(vec![
        Span::raw(before),
        Span::styled(under.unwrap_or(' ').to_string(), Style::default().bg(Color::Cyan).fg(Color::Black)),
        Span::raw(after),
    ])
}

fn render_popup(f: &mut Frame, ui: &UiState) {
    match &ui.popup_mode {
        PopupMode::None => {}
        PopupMode::Form => {
            if let Some(form) = &ui.form {
                render_form(f, form);
            }
        }
        PopupMode::ConfirmDelete(target) => render_dialog(f, "Confirm", target.prompt(), "y: Yes | n: No"),
        PopupMode::ConfirmReset => render_dialog(
            f,
            "Confirm",
            "Clear all data (tasks, issues, wins, notifications)?",
            "y: Yes | n: No",
        ),
        PopupMode::ImportPath => {
            let popup_area = centered_rect(60, 25, f.area());
            let lines = vec![
                Line::from("Path to backup file:"),
                Line::from(""),
                input_line(&ui.import_input, true),
                Line::from(""),
                Line::from(Span::styled("Enter: Import | Esc: Cancel", Style::default().fg(Color::Gray))),
            ];
            let popup = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Import Backup"))
                .style(Style::default().bg(Color::DarkGray));
            f.render_widget(Clear, popup_area);
            f.render_widget(popup, popup_area);
        }
        PopupMode::Message(msg) => render_dialog(f, "Notice", msg, "Press any key"),
    }
}

fn render_dialog(f: &mut Frame, title: &str, text: &str, hint: &str) {
    let popup_area = centered_rect(50, 20, f.area());
    let lines = vec![
        Line::from(text.to_string()),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(Color::Gray))),
    ];
    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().bg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn render_form(f: &mut Frame, form: &FormEditor) {
    let popup_area = centered_rect(60, 60, f.area());
    let mut lines = Vec::new();

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focused;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));
        lines.push(match &field.kind {
            FieldKind::Text(editor) => input_line(editor, focused),
            FieldKind::Choice { options, selected } if focused => Line::from(Span::styled(
                format!("< {} >", options[*selected]),
                Style::default().bg(Color::Cyan).fg(Color::Black),
            )),
            FieldKind::Choice { options, selected } => Line::from(options[*selected]),
        });
        lines.push(Line::from(""));
    }

    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    let hint = if form.is_edit() {
        "Enter: Save | Tab: Next field | Esc: Cancel | Ctrl+D: Delete"
    } else {
        "Enter: Save | Tab: Next field | Esc: Cancel"
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));

    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(form.title()))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}
