//! Multiplexer - sessions, the input mode machine and the compositor.
//!
//! - **mod.rs**: `Multiplexer` state, session/window operations and the close
//!   cascade
//! - **input.rs**: per-mode key dispatch and the key-binding table
//! - **command.rs**: the command-prompt vocabulary
//! - **render.rs**: composites pane frames, borders, overlays and the status
//!   bar into one `Frame`
//!
//! The multiplexer is a pure `(state, key) -> state'` transform: nothing here
//! blocks, spawns or performs I/O. Hosts feed keys, render frames, and tear
//! the multiplexer down once `is_detached()` reports true.

pub mod command;
pub mod input;
pub mod render;

use chrono::{Duration, Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::{ColorScheme, Config};
use crate::copymode::CopyMode;
use crate::core::content::{Lifecycle, PaneFactory};
use crate::core::key::Key;
use crate::error::{MuxError, Result};
use crate::wm::{PaneId, PaneSpawner, Session, SessionId, SplitDirection, Window};

pub use command::Command;
pub use input::KEY_BINDINGS;

/// Source of the wall-clock time shown in the status bar and used for
/// overlay deadlines
pub type Clock = Box<dyn Fn() -> NaiveDateTime>;

/// Destructive action waiting for a y/n answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    KillPane,
    KillWindow,
}

/// What a rename prompt renames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameTarget {
    Window,
    Session,
}

/// Interaction mode. Each variant carries only its own transient state.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    Prefix,
    Command { buffer: String },
    Confirm { prompt: String, action: ConfirmAction },
    Rename { buffer: String, target: RenameTarget },
    Copy(Box<CopyMode>),
    WindowList { cursor: usize },
    PaneNumbers { deadline: NaiveDateTime },
    Clock,
    Help { scroll: usize },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Prefix => "prefix",
            Mode::Command { .. } => "command",
            Mode::Confirm { .. } => "confirm",
            Mode::Rename { .. } => "rename",
            Mode::Copy(_) => "copy",
            Mode::WindowList { .. } => "window-list",
            Mode::PaneNumbers { .. } => "pane-numbers",
            Mode::Clock => "clock",
            Mode::Help { .. } => "help",
        }
    }
}

pub struct Multiplexer {
    sessions: Vec<Session>,
    active_session: usize,
    mode: Mode,
    /// Transient status message, cleared by the next key
    message: Option<String>,
    detached: bool,
    spawner: PaneSpawner,
    config: Config,
    scheme: ColorScheme,
    clock: Clock,
    paste_buffer: Option<String>,
    next_session_id: SessionId,
    /// Terminal size; the last row is the status bar
    cols: u16,
    rows: u16,
}

impl Multiplexer {
    /// Create a multiplexer with one session holding one window
    pub fn new(cols: u16, rows: u16, factory: PaneFactory, config: Config) -> Self {
        let mut spawner = PaneSpawner::new(factory);
        let content_rows = rows.saturating_sub(1);
        let session = Session::new(
            0,
            config.default_session_name.clone(),
            &config.default_window_name,
            &mut spawner,
            cols,
            content_rows,
        );
        info!(session = %session.name, cols, rows, "multiplexer started");

        Self {
            sessions: vec![session],
            active_session: 0,
            mode: Mode::Normal,
            message: None,
            detached: false,
            spawner,
            scheme: config.color_scheme(),
            config,
            clock: Box::new(|| Local::now().naive_local()),
            paste_buffer: None,
            next_session_id: 1,
            cols,
            rows,
        }
    }

    /// Replace the wall clock, e.g. with a fixed time in tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Rows available to panes (everything above the status bar)
    pub fn content_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Show a rejected operation as the transient message
    pub(crate) fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "rejected input");
            self.set_message(e.to_string());
        }
    }

    /// True once the last pane is gone or the client detached; the host
    /// should tear the multiplexer down
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn detach(&mut self) {
        if !self.detached {
            info!(session = %self.active_session().name, "detached");
        }
        self.detached = true;
    }

    pub fn paste_buffer(&self) -> Option<&str> {
        self.paste_buffer.as_deref()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active_session_index(&self) -> usize {
        self.active_session
    }

    pub fn active_session(&self) -> &Session {
        &self.sessions[self.active_session]
    }

    pub fn active_session_mut(&mut self) -> &mut Session {
        &mut self.sessions[self.active_session]
    }

    pub fn active_window(&self) -> &Window {
        self.active_session().active_window()
    }

    pub fn active_window_mut(&mut self) -> &mut Window {
        self.active_session_mut().active_window_mut()
    }

    /// Resize the terminal; every window of every session reflows
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let content_rows = self.content_rows();
        for session in &mut self.sessions {
            session.resize(cols, content_rows);
        }
        // The copy snapshot is sized to the old pane
        if matches!(self.mode, Mode::Copy(_)) {
            self.set_mode(Mode::Normal);
        }
        debug!(cols, rows, "resized");
    }

    /// Expire the pane-number overlay once its deadline has passed. Hosts
    /// call this periodically; returns true if the mode changed.
    pub fn expire_timers(&mut self) -> bool {
        if let Mode::PaneNumbers { deadline } = self.mode {
            if self.now() >= deadline {
                debug!("pane numbers expired");
                self.set_mode(Mode::Normal);
                return true;
            }
        }
        false
    }

    // ---- panes ----

    pub fn split(&mut self, direction: SplitDirection) -> Result<PaneId> {
        let session = &mut self.sessions[self.active_session];
        session
            .active_window_mut()
            .split_pane(direction, &mut self.spawner)
    }

    /// Forward a key to the active pane, closing it if its program exits
    pub(crate) fn forward_key(&mut self, key: &Key) -> Lifecycle {
        let Some(pane) = self.active_window_mut().active_pane_mut() else {
            return Lifecycle::Continue;
        };
        let id = pane.id;
        let lifecycle = pane.feed_key(key);
        if lifecycle == Lifecycle::Exited {
            info!(pane = id, "pane exited");
            self.close_pane(id);
        }
        lifecycle
    }

    /// Close a pane of the active window. The last pane takes its window
    /// with it, and the last window its session. Ids not in the active
    /// window are ignored.
    pub fn close_pane(&mut self, pane: PaneId) {
        if self.active_window().pane(pane).is_none() {
            debug!(pane, "close of unknown pane ignored");
            return;
        }
        if self.active_window_mut().close_pane(pane) {
            return;
        }
        let index = self.active_session().active_index();
        self.close_window(index);
    }

    pub fn kill_pane(&mut self) {
        let pane = self.active_window().active_pane_id();
        self.close_pane(pane);
    }

    /// Close a window of the active session, cascading to the session
    pub fn close_window(&mut self, index: usize) {
        if self.active_session_mut().close_window(index) {
            return;
        }
        self.destroy_active_session();
    }

    pub fn kill_window(&mut self) {
        let index = self.active_session().active_index();
        self.close_window(index);
    }

    /// The active session lost its last window
    fn destroy_active_session(&mut self) {
        if self.config.detach_on_destroy || self.sessions.len() == 1 {
            self.detach();
            return;
        }
        let removed = self.sessions.remove(self.active_session);
        self.active_session = self.active_session.min(self.sessions.len() - 1);
        info!(session = %removed.name, "session destroyed");
    }

    pub fn break_pane(&mut self) -> bool {
        let Some(pane) = self.active_window_mut().break_pane() else {
            return false;
        };
        let name = self.config.default_window_name.clone();
        let (cols, rows) = (self.cols, self.content_rows());
        self.active_session_mut().add_window(&name, pane, cols, rows);
        true
    }

    /// Snapshot the active pane into copy mode
    pub fn enter_copy_mode(&mut self) {
        let Some(pane) = self.active_window().active_pane() else {
            return;
        };
        let frame = pane.render_frame();
        let screen = (0..frame.rows).map(|r| frame.row_text(r).to_string()).collect();
        let copy = CopyMode::enter(
            pane.id,
            pane.history(),
            screen,
            (frame.cursor.row, frame.cursor.col),
            pane.rect.width,
            pane.rect.height,
        );
        self.set_mode(Mode::Copy(Box::new(copy)));
    }

    /// Type the paste buffer into the active pane
    pub fn paste(&mut self) -> Result<()> {
        let text = self.paste_buffer.clone().ok_or(MuxError::EmptyBuffer)?;
        for c in text.chars() {
            let key = if c == '\n' { Key::Enter } else { Key::Char(c) };
            if self.forward_key(&key) == Lifecycle::Exited {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn store_paste_buffer(&mut self, text: String) {
        self.set_message(format!("copied {} characters", text.chars().count()));
        self.paste_buffer = Some(text);
    }

    pub fn display_panes(&mut self) {
        let deadline = self.now() + Duration::milliseconds(self.config.display_panes_ms as i64);
        self.set_mode(Mode::PaneNumbers { deadline });
    }

    // ---- windows ----

    pub fn new_window(&mut self, name: Option<&str>) -> usize {
        self.open_window(name, true)
    }

    /// Create a window without switching to it (`new-window -d`)
    pub fn new_window_detached(&mut self, name: Option<&str>) -> usize {
        self.open_window(name, false)
    }

    fn open_window(&mut self, name: Option<&str>, select: bool) -> usize {
        let name = name
            .unwrap_or(self.config.default_window_name.as_str())
            .to_string();
        let (cols, rows) = (self.cols, self.content_rows());
        let session = &mut self.sessions[self.active_session];
        if select {
            session.create_window(&name, &mut self.spawner, cols, rows)
        } else {
            session.create_window_detached(&name, &mut self.spawner, cols, rows)
        }
    }

    pub fn select_window(&mut self, index: usize) -> Result<()> {
        self.active_session_mut().switch_window(index)
    }

    pub fn rename_window(&mut self, name: &str) {
        debug!(name, "rename window");
        self.active_window_mut().name = name.to_string();
    }

    /// Rename the window at `index` of the active session
    pub fn rename_window_at(&mut self, index: usize, name: &str) -> Result<()> {
        self.active_session_mut().rename_window(index, name)
    }

    // ---- sessions ----

    /// Create and switch to a new session
    pub fn new_session(&mut self, name: Option<&str>) -> Result<usize> {
        self.new_session_with(name, None, true)
    }

    /// Create a session whose first window is `window_name` (or the default
    /// window name). With `attach` false the current session stays active.
    pub fn new_session_with(
        &mut self,
        name: Option<&str>,
        window_name: Option<&str>,
        attach: bool,
    ) -> Result<usize> {
        let id = self.next_session_id;
        let name = name.map(str::to_string).unwrap_or_else(|| id.to_string());
        if self.sessions.iter().any(|s| s.name == name) {
            return Err(MuxError::DuplicateSession(name));
        }
        self.next_session_id += 1;

        let (cols, rows) = (self.cols, self.content_rows());
        let window_name = window_name
            .unwrap_or(self.config.default_window_name.as_str())
            .to_string();
        let session = Session::new(id, name, &window_name, &mut self.spawner, cols, rows);
        info!(session = %session.name, attach, "new session");
        self.sessions.push(session);
        let index = self.sessions.len() - 1;
        if attach {
            self.active_session = index;
        }
        Ok(index)
    }

    /// Find a session by name, falling back to its index
    pub fn find_session(&self, target: &str) -> Result<usize> {
        self.sessions
            .iter()
            .position(|s| s.name == target)
            .or_else(|| target.parse::<usize>().ok().filter(|&i| i < self.sessions.len()))
            .ok_or_else(|| MuxError::SessionNotFound(target.to_string()))
    }

    pub fn switch_session(&mut self, index: usize) -> Result<()> {
        if index >= self.sessions.len() {
            return Err(MuxError::SessionNotFound(index.to_string()));
        }
        self.active_session = index;
        debug!(session = %self.sessions[index].name, "switched session");
        Ok(())
    }

    pub fn next_session(&mut self) -> bool {
        self.step_session(true)
    }

    pub fn prev_session(&mut self) -> bool {
        self.step_session(false)
    }

    fn step_session(&mut self, forward: bool) -> bool {
        let len = self.sessions.len();
        if len <= 1 {
            return false;
        }
        self.active_session = if forward {
            (self.active_session + 1) % len
        } else {
            (self.active_session + len - 1) % len
        };
        true
    }

    pub fn rename_session(&mut self, name: &str) -> Result<()> {
        self.rename_session_at(self.active_session, name)
    }

    /// Rename the session at `index`; names stay unique
    pub fn rename_session_at(&mut self, index: usize, name: &str) -> Result<()> {
        if index >= self.sessions.len() {
            return Err(MuxError::SessionNotFound(index.to_string()));
        }
        let taken = self
            .sessions
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.name == name);
        if taken {
            return Err(MuxError::DuplicateSession(name.to_string()));
        }
        self.sessions[index].rename(name);
        Ok(())
    }

    /// One line per session, tmux `list-sessions` style
    pub fn list_sessions(&self) -> Vec<String> {
        self.sessions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let attached = if i == self.active_session { " (attached)" } else { "" };
                format!("{}: {} windows{}", s.name, s.window_count(), attached)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::echo::EchoSession;
    use chrono::NaiveDate;

    pub(crate) fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 7, 0))
            .unwrap()
    }

    pub(crate) fn mux_with(config: Config) -> Multiplexer {
        Multiplexer::new(
            80,
            24,
            Box::new(|cols, rows| Box::new(EchoSession::new(cols, rows))),
            config,
        )
        .with_clock(Box::new(fixed_time))
    }

    pub(crate) fn mux() -> Multiplexer {
        mux_with(Config::default())
    }

    #[test]
    fn test_initial_state() {
        let m = mux();
        assert_eq!(m.sessions().len(), 1);
        assert_eq!(m.active_session().name, "0");
        assert_eq!(m.active_window().name, "zsh");
        assert_eq!(m.active_window().size(), (80, 23));
        assert_eq!(*m.mode(), Mode::Normal);
        assert!(!m.is_detached());
    }

    #[test]
    fn test_close_cascade_detaches() {
        let mut m = mux();
        m.split(SplitDirection::Vertical).unwrap();
        m.new_window(None);
        assert_eq!(m.active_session().window_count(), 2);

        m.kill_window();
        assert_eq!(m.active_session().window_count(), 1);
        m.kill_pane();
        assert_eq!(m.active_window().pane_count(), 1);
        assert!(!m.is_detached());
        m.kill_pane();
        assert!(m.is_detached());
        assert_eq!(m.active_session().window_count(), 1);
    }

    #[test]
    fn test_destroy_without_detach_switches_session() {
        let config = Config {
            detach_on_destroy: false,
            ..Config::default()
        };
        let mut m = mux_with(config);
        m.new_session(Some("work")).unwrap();
        assert_eq!(m.active_session().name, "work");

        m.kill_pane();
        assert!(!m.is_detached());
        assert_eq!(m.sessions().len(), 1);
        assert_eq!(m.active_session().name, "0");
        m.kill_pane();
        assert!(m.is_detached());
    }

    #[test]
    fn test_sessions_by_name_and_index() {
        let mut m = mux();
        assert_eq!(m.new_session(None), Ok(1));
        assert_eq!(m.active_session().name, "1");
        assert_eq!(
            m.new_session(Some("0")),
            Err(MuxError::DuplicateSession("0".to_string()))
        );
        assert_eq!(m.find_session("0"), Ok(0));
        assert_eq!(m.find_session("1"), Ok(1));
        assert!(m.find_session("nope").is_err());
        assert!(m.next_session());
        assert_eq!(m.active_session_index(), 0);
        assert_eq!(m.list_sessions(), vec!["0: 1 windows (attached)", "1: 1 windows"]);
    }

    #[test]
    fn test_close_unknown_pane_keeps_window() {
        let mut m = mux();
        m.new_window(None);
        let before = m.active_window().id;
        m.close_pane(999);
        assert_eq!(m.active_session().window_count(), 2);
        assert_eq!(m.active_window().id, before);
        assert!(!m.is_detached());
    }

    #[test]
    fn test_detached_window_and_session() {
        let mut m = mux();
        assert_eq!(m.new_window_detached(Some("bg")), 1);
        assert_eq!(m.active_session().active_index(), 0);
        assert_eq!(m.active_session().window_names(), vec!["zsh", "bg"]);

        assert_eq!(m.new_session_with(Some("x"), Some("editor"), false), Ok(1));
        assert_eq!(m.active_session_index(), 0);
        assert_eq!(m.sessions()[1].window_names(), vec!["editor"]);
    }

    #[test]
    fn test_rename_by_index() {
        let mut m = mux();
        m.new_window(None);
        m.rename_window_at(0, "editor").unwrap();
        assert_eq!(m.active_session().window_names(), vec!["editor", "zsh"]);
        assert_eq!(m.rename_window_at(4, "x"), Err(MuxError::WindowOutOfRange(4)));

        m.new_session(Some("work")).unwrap();
        m.rename_session_at(0, "main").unwrap();
        assert_eq!(m.sessions()[0].name, "main");
        assert_eq!(m.active_session().name, "work");
        assert_eq!(
            m.rename_session_at(0, "work"),
            Err(MuxError::DuplicateSession("work".to_string()))
        );
    }

    #[test]
    fn test_break_pane_opens_window() {
        let mut m = mux();
        assert!(!m.break_pane());
        let pane = m.split(SplitDirection::Horizontal).unwrap();
        assert!(m.break_pane());
        assert_eq!(m.active_session().window_count(), 2);
        assert_eq!(m.active_window().active_pane_id(), pane);
        assert_eq!(m.active_window().active_pane().unwrap().content_size(), (80, 23));
    }

    #[test]
    fn test_pane_numbers_expire() {
        let mut m = mux();
        m.display_panes();
        assert!(!m.expire_timers());
        m = m.with_clock(Box::new(|| fixed_time() + Duration::seconds(2)));
        assert!(m.expire_timers());
        assert_eq!(*m.mode(), Mode::Normal);
    }

    #[test]
    fn test_resize_reflows_every_window() {
        let mut m = mux();
        m.split(SplitDirection::Vertical).unwrap();
        m.new_window(None);
        m.resize(100, 30);
        for window in m.active_session().windows() {
            assert_eq!(window.size(), (100, 29));
        }
    }
}
