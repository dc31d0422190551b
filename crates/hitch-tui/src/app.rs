//! TUI application state.
//!
//! `App` only mirrors what the core publishes and turns terminal input into
//! [`UserIntent`]s. It never talks to the orchestrator itself.

use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEventKind};
use hitch_core::{CandidateSet, CoreUpdate, Mode, ProcessId, UserIntent};
use ratatui::widgets::ListState;

/// Launch status as last reported by the core
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchView {
    pub pid: ProcessId,
    pub progress: f32,
    /// `None` until the spawn attempt happened
    pub spawned: Option<bool>,
    pub completed: bool,
}

pub struct App {
    pub candidates: CandidateSet,
    pub selected: usize,
    pub list_state: ListState,
    pub mode: Mode,
    pub launch: Option<LaunchView>,
    pub status_message: Option<String>,
    pub should_quit: bool,
    close_on_complete: bool,
    dragging: bool,
}

impl App {
    pub fn new(close_on_complete: bool) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            candidates: CandidateSet::new(),
            selected: 0,
            list_state,
            mode: Mode::Idle,
            launch: None,
            status_message: None,
            should_quit: false,
            close_on_complete,
            dragging: false,
        }
    }

    pub fn is_launching(&self) -> bool {
        self.mode == Mode::Launching
    }

    pub fn selected_pid(&self) -> Option<ProcessId> {
        self.candidates
            .get_index(self.selected)
            .map(|c| c.process_id)
    }

    pub fn select_next(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = (self.selected + 1) % self.candidates.len();
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn select_previous(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = if self.selected == 0 {
                self.candidates.len() - 1
            } else {
                self.selected - 1
            };
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn handle_update(&mut self, update: CoreUpdate) {
        match update {
            CoreUpdate::CandidatesChanged { candidates } => self.replace_candidates(candidates),
            CoreUpdate::ModeChanged { mode, target } => {
                let was_launching = self.is_launching();
                self.mode = mode;
                if mode == Mode::Launching
                    && let Some(pid) = target
                {
                    self.launch = Some(LaunchView {
                        pid,
                        ..LaunchView::default()
                    });
                    self.status_message = None;
                } else if was_launching && !self.launch.as_ref().is_some_and(|l| l.completed) {
                    self.status_message = Some("Launch interrupted".to_string());
                }
            }
            CoreUpdate::LaunchProgress { pid, progress } => {
                if let Some(launch) = self.launch.as_mut().filter(|l| l.pid == pid) {
                    launch.progress = progress;
                }
            }
            CoreUpdate::LaunchSpawned { pid, ok, .. } => {
                if let Some(launch) = self.launch.as_mut().filter(|l| l.pid == pid) {
                    launch.spawned = Some(ok);
                }
                if !ok {
                    self.status_message = Some(format!("Launcher failed to start for PID {pid}"));
                }
            }
            CoreUpdate::LaunchCompleted { pid } => {
                if let Some(launch) = self.launch.as_mut().filter(|l| l.pid == pid) {
                    launch.completed = true;
                    launch.progress = 1.0;
                }
                if self.close_on_complete {
                    tracing::info!(pid, "Launch complete, closing");
                    self.should_quit = true;
                }
            }
        }
    }

    /// Swap in a new list, keeping the selection on the same PID when it
    /// survived.
    fn replace_candidates(&mut self, candidates: CandidateSet) {
        let previous = self.selected_pid();
        self.candidates = candidates;

        self.selected = previous
            .and_then(|pid| self.candidates.iter().position(|c| c.process_id == pid))
            .unwrap_or_else(|| self.selected.min(self.candidates.len().saturating_sub(1)));
        self.list_state.select(Some(self.selected));
    }

    /// Map a key press. Returns the intent to forward, if any.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<UserIntent> {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.quit(),
            KeyCode::Char('c') if ctrl => self.quit(),
            _ if self.is_launching() => None,
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                None
            }
            KeyCode::Enter => self.selected_pid().map(|pid| UserIntent::Select { pid }),
            _ => None,
        }
    }

    /// Map a mouse event. A left-button drag brackets a drag intent pair.
    pub fn handle_mouse(&mut self, kind: MouseEventKind) -> Option<UserIntent> {
        match kind {
            MouseEventKind::Drag(MouseButton::Left) if !self.dragging => {
                self.dragging = true;
                Some(UserIntent::DragStarted)
            }
            MouseEventKind::Up(MouseButton::Left) => self.end_drag(),
            MouseEventKind::ScrollDown if !self.is_launching() => {
                self.select_next();
                None
            }
            MouseEventKind::ScrollUp if !self.is_launching() => {
                self.select_previous();
                None
            }
            _ => None,
        }
    }

    /// Losing focus mid-drag means the button-up will never arrive.
    pub fn handle_focus_lost(&mut self) -> Option<UserIntent> {
        self.end_drag()
    }

    fn end_drag(&mut self) -> Option<UserIntent> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        Some(UserIntent::DragEnded)
    }

    fn quit(&mut self) -> Option<UserIntent> {
        self.should_quit = true;
        Some(UserIntent::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitch_core::{CacheOrigin, Candidate};

    fn set(pids: &[ProcessId]) -> CandidateSet {
        pids.iter()
            .map(|pid| Candidate::new(*pid, "Minecraft", CacheOrigin::Fresh))
            .collect()
    }

    fn app_with(pids: &[ProcessId]) -> App {
        let mut app = App::new(true);
        app.handle_update(CoreUpdate::CandidatesChanged {
            candidates: set(pids),
        });
        app
    }

    fn key(app: &mut App, code: KeyCode) -> Option<UserIntent> {
        app.handle_key(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_selects_highlighted_pid() {
        let mut app = app_with(&[101, 202]);
        assert_eq!(key(&mut app, KeyCode::Down), None);
        assert_eq!(
            key(&mut app, KeyCode::Enter),
            Some(UserIntent::Select { pid: 202 })
        );
    }

    #[test]
    fn test_enter_on_empty_list_does_nothing() {
        let mut app = App::new(true);
        assert_eq!(key(&mut app, KeyCode::Enter), None);
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = app_with(&[1, 2, 3]);
        key(&mut app, KeyCode::Up);
        assert_eq!(app.selected_pid(), Some(3));
        key(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_pid(), Some(1));
    }

    #[test]
    fn test_selection_follows_pid_across_updates() {
        let mut app = app_with(&[101, 202]);
        key(&mut app, KeyCode::Down);
        app.handle_update(CoreUpdate::CandidatesChanged {
            candidates: set(&[50, 101, 202]),
        });
        assert_eq!(app.selected_pid(), Some(202));

        app.handle_update(CoreUpdate::CandidatesChanged {
            candidates: set(&[50]),
        });
        assert_eq!(app.selected_pid(), Some(50));
    }

    #[test]
    fn test_quit_keys_send_close() {
        let mut app = App::new(true);
        assert_eq!(key(&mut app, KeyCode::Char('q')), Some(UserIntent::Close));
        assert!(app.should_quit);

        let mut app = App::new(true);
        assert_eq!(
            app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(UserIntent::Close)
        );
    }

    #[test]
    fn test_navigation_ignored_while_launching() {
        let mut app = app_with(&[101, 202]);
        app.handle_update(CoreUpdate::ModeChanged {
            mode: Mode::Launching,
            target: Some(101),
        });
        assert_eq!(key(&mut app, KeyCode::Down), None);
        assert_eq!(key(&mut app, KeyCode::Enter), None);
        assert_eq!(app.selected_pid(), Some(101));
    }

    #[test]
    fn test_launch_updates_and_close_on_complete() {
        let mut app = app_with(&[101]);
        app.handle_update(CoreUpdate::ModeChanged {
            mode: Mode::Launching,
            target: Some(101),
        });
        app.handle_update(CoreUpdate::LaunchProgress {
            pid: 101,
            progress: 0.4,
        });
        app.handle_update(CoreUpdate::LaunchSpawned {
            pid: 101,
            script: None,
            ok: true,
        });
        let launch = app.launch.clone().unwrap();
        assert!((launch.progress - 0.4).abs() < f32::EPSILON);
        assert_eq!(launch.spawned, Some(true));
        assert!(!app.should_quit);

        app.handle_update(CoreUpdate::LaunchCompleted { pid: 101 });
        assert!(app.should_quit);
    }

    #[test]
    fn test_stays_open_without_close_on_complete() {
        let mut app = App::new(false);
        app.handle_update(CoreUpdate::ModeChanged {
            mode: Mode::Launching,
            target: Some(7),
        });
        app.handle_update(CoreUpdate::LaunchCompleted { pid: 7 });
        app.handle_update(CoreUpdate::ModeChanged {
            mode: Mode::Idle,
            target: None,
        });
        assert!(!app.should_quit);
        assert!(app.status_message.is_none());
        assert!(app.launch.unwrap().completed);
    }

    #[test]
    fn test_release_without_completion_is_reported() {
        let mut app = App::new(false);
        app.handle_update(CoreUpdate::ModeChanged {
            mode: Mode::Launching,
            target: Some(7),
        });
        app.handle_update(CoreUpdate::ModeChanged {
            mode: Mode::Idle,
            target: None,
        });
        assert_eq!(app.status_message.as_deref(), Some("Launch interrupted"));
    }

    #[test]
    fn test_failed_spawn_sets_status() {
        let mut app = App::new(false);
        app.handle_update(CoreUpdate::LaunchSpawned {
            pid: 9,
            script: None,
            ok: false,
        });
        assert!(app.status_message.unwrap().contains("PID 9"));
    }

    #[test]
    fn test_drag_intents_are_paired() {
        let mut app = App::new(true);
        assert_eq!(
            app.handle_mouse(MouseEventKind::Drag(MouseButton::Left)),
            Some(UserIntent::DragStarted)
        );
        assert_eq!(app.handle_mouse(MouseEventKind::Drag(MouseButton::Left)), None);
        assert_eq!(
            app.handle_mouse(MouseEventKind::Up(MouseButton::Left)),
            Some(UserIntent::DragEnded)
        );
        assert_eq!(app.handle_mouse(MouseEventKind::Up(MouseButton::Left)), None);
    }

    #[test]
    fn test_focus_loss_ends_drag() {
        let mut app = App::new(true);
        assert_eq!(app.handle_focus_lost(), None);
        app.handle_mouse(MouseEventKind::Drag(MouseButton::Left));
        assert_eq!(app.handle_focus_lost(), Some(UserIntent::DragEnded));
    }
}
