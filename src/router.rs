use std::fmt;

use crate::store::RootStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    Tasks,
    Issues,
    Wins,
    Notifications,
    Backup,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Tasks,
        View::Issues,
        View::Wins,
        View::Notifications,
        View::Backup,
    ];

    pub const HOME: View = View::Dashboard;

    pub fn name(self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Tasks => "tasks",
            View::Issues => "issues",
            View::Wins => "wins",
            View::Notifications => "notifications",
            View::Backup => "backup",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Tasks => "Tasks",
            View::Issues => "Major Issues",
            View::Wins => "Major Wins",
            View::Notifications => "Notifications",
            View::Backup => "BackUp",
        }
    }

    /// Exact match on a view name; `None` for anything unknown.
    pub fn parse(name: &str) -> Option<View> {
        View::ALL.into_iter().find(|view| view.name() == name)
    }

    /// Total mapping from a navigation token to a view.
    pub fn from_token(token: &str) -> View {
        let name = token.strip_prefix('#').unwrap_or(token);
        View::parse(name).unwrap_or(View::HOME)
    }

    pub fn token(self) -> String {
        format!("#{}", self.name())
    }

    pub fn index(self) -> usize {
        View::ALL.iter().position(|view| *view == self).unwrap_or(0)
    }

    pub fn next(self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn previous(self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }

    /// Quick-add shortcuts are only offered on the dashboard.
    pub fn shows_quick_add(self) -> bool {
        self == View::Dashboard
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Paints one view from the store. Implementations must only read the store.
pub trait ViewRenderer {
    fn render(&mut self, view: View, store: &RootStore);
}

#[derive(Debug)]
pub struct Router {
    token: String,
    highlighted: Option<View>,
    changed: bool,
}

impl Router {
    /// Boots on `initial_token`, or on the home view when there is none.
    pub fn new(initial_token: Option<&str>) -> Self {
        let mut router = Router { token: String::new(), highlighted: None, changed: false };
        match initial_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => router.set_token(token),
            None => router.navigate(View::HOME.name()),
        }
        router
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Host-side write of the raw token. Any string is accepted here; it is
    /// resolved when read.
    pub fn set_token(&mut self, token: &str) {
        if self.token != token {
            self.token = token.to_string();
            self.changed = true;
        }
    }

    pub fn current_view(&self) -> View {
        View::from_token(&self.token)
    }

    /// Points the token at `name`, or at the home view if `name` is unknown.
    pub fn navigate(&mut self, name: &str) {
        let view = View::parse(name).unwrap_or_else(|| {
            log::debug!("Unknown view '{name}', going to {}", View::HOME);
            View::HOME
        });
        self.navigate_to(view);
    }

    pub fn navigate_to(&mut self, view: View) {
        self.set_token(&view.token());
    }

    /// True once after each token change, like a `hashchange` event.
    pub fn take_change(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn highlighted(&self) -> Option<View> {
        self.highlighted
    }

    /// The single re-render entry point.
    pub fn render_current<R: ViewRenderer + ?Sized>(&mut self, store: &RootStore, renderer: &mut R) -> View {
        let view = self.current_view();
        if self.token != view.token() {
            // normalize quietly; the view being painted already matches
            self.token = view.token();
        }
        self.highlighted = Some(view);
        renderer.render(view, store);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[derive(Default)]
    struct Recorder {
        painted: Vec<(View, usize)>,
    }

    impl ViewRenderer for Recorder {
        fn render(&mut self, view: View, store: &RootStore) {
            self.painted.push((view, store.tasks().len()));
        }
    }

    #[test]
    fn boots_on_home_without_a_token() {
        let mut router = Router::new(None);
        assert_eq!(router.current_view(), View::Dashboard);
        assert_eq!(router.token(), "#dashboard");
        assert!(router.take_change());
        assert!(!router.take_change());
    }

    #[test]
    fn unknown_tokens_resolve_to_home() {
        assert_eq!(View::from_token(""), View::Dashboard);
        assert_eq!(View::from_token("#"), View::Dashboard);
        assert_eq!(View::from_token("#settings"), View::Dashboard);
        assert_eq!(View::from_token("wins"), View::Wins);
        assert_eq!(View::from_token("#backup"), View::Backup);

        let router = Router::new(Some("#bogus"));
        assert_eq!(router.current_view(), View::Dashboard);
    }

    #[test]
    fn navigate_substitutes_home_for_unknown_names() {
        let mut router = Router::new(Some("#tasks"));
        router.take_change();
        router.navigate("nonexistent-view");
        assert_eq!(router.current_view(), View::Dashboard);
        assert_eq!(router.token(), "#dashboard");
        assert!(router.take_change());
    }

    #[test]
    fn navigating_to_the_current_view_raises_no_change() {
        let mut router = Router::new(Some("#issues"));
        router.take_change();
        router.navigate("issues");
        assert!(!router.take_change());
    }

    #[test]
    fn render_current_highlights_and_dispatches() {
        let store = RootStore::hydrate(Box::new(MemoryStorage::new()));
        let mut router = Router::new(Some("#nope"));
        let mut recorder = Recorder::default();

        assert_eq!(router.render_current(&store, &mut recorder), View::Dashboard);
        assert_eq!(router.token(), "#dashboard");
        assert_eq!(router.highlighted(), Some(View::Dashboard));

        router.navigate_to(View::Wins);
        assert_eq!(router.highlighted(), Some(View::Dashboard));
        router.render_current(&store, &mut recorder);
        assert_eq!(router.highlighted(), Some(View::Wins));
        assert_eq!(recorder.painted, vec![(View::Dashboard, 0), (View::Wins, 0)]);
    }

    #[test]
    fn tab_order_wraps() {
        assert_eq!(View::Backup.next(), View::Dashboard);
        assert_eq!(View::Dashboard.previous(), View::Backup);
        assert!(View::Dashboard.shows_quick_add());
        assert!(!View::Tasks.shows_quick_add());
    }
}
