//! Command prompt vocabulary.
//!
//! A small fixed set of tmux commands (and their short aliases) with
//! `-flag [value]` arguments. Not a general command language: there is no
//! chaining, no formats and no targets beyond plain indices and names.

use std::str::FromStr;

use tracing::debug;

use super::{Mode, Multiplexer, RenameTarget};
use crate::core::key::{Direction, PREFIX_KEY};
use crate::error::{MuxError, Result};
use crate::wm::{LayoutPreset, SplitDirection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneTarget {
    Direction(Direction),
    Index(usize),
    /// `-t +`
    Next,
    /// `-t -`
    Previous,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    Next,
    Previous,
    /// Session name or index
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SplitWindow { direction: SplitDirection },
    NewWindow { name: Option<String>, detached: bool },
    /// Rename window `target` (default: the active one)
    RenameWindow { target: Option<usize>, name: String },
    /// Open the rename prompt; bare `rename-window` / `rename-session`
    RenamePrompt { target: RenameTarget },
    SelectWindow { index: usize },
    NextWindow,
    PreviousWindow,
    LastWindow,
    SelectPane { target: PaneTarget },
    LastPane,
    ResizePane { direction: Direction, amount: u16 },
    ZoomPane,
    KillPane,
    KillWindow,
    SwapPane { forward: bool },
    BreakPane,
    NewSession {
        name: Option<String>,
        window_name: Option<String>,
        detached: bool,
    },
    SwitchClient { target: SessionTarget },
    /// Rename session `target`, a name or index (default: the active one)
    RenameSession { target: Option<String>, name: String },
    ListSessions,
    DetachClient,
    NextLayout,
    SelectLayout { preset: LayoutPreset },
    DisplayPanes,
    ClockMode,
    ListKeys,
    CopyMode,
    PasteBuffer,
    ChooseWindow,
    CommandPrompt,
    SendPrefix,
}

/// Split a command line into words; double or single quotes group words
fn tokenize(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Parsed `-x` switches, `-x value` options and positional words
#[derive(Default)]
struct Args {
    switches: Vec<char>,
    options: Vec<(char, String)>,
    positional: Vec<String>,
}

impl Args {
    /// `valued` lists the flags that take a value, `switches` those that don't
    fn parse(command: &str, words: &[String], switches: &str, valued: &str) -> Result<Self> {
        let mut args = Args::default();
        let mut words = words.iter();
        while let Some(word) = words.next() {
            let flag = word
                .strip_prefix('-')
                .filter(|rest| rest.chars().count() == 1)
                .and_then(|rest| rest.chars().next());
            match flag {
                Some(f) if valued.contains(f) => {
                    let value = words.next().ok_or_else(|| MuxError::MissingArgument {
                        command: command.to_string(),
                        flag: format!("-{}", f),
                    })?;
                    args.options.push((f, value.clone()));
                }
                Some(f) if switches.contains(f) => args.switches.push(f),
                Some(_) => {
                    return Err(MuxError::InvalidArgument {
                        command: command.to_string(),
                        value: word.clone(),
                    })
                }
                None => args.positional.push(word.clone()),
            }
        }
        Ok(args)
    }

    fn has(&self, flag: char) -> bool {
        self.switches.contains(&flag)
    }

    fn value(&self, flag: char) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(f, _)| *f == flag)
            .map(|(_, v)| v.as_str())
    }

    /// Positional words joined back together; None when blank
    fn rest(&self) -> Option<String> {
        let joined = self.positional.join(" ");
        (!joined.trim().is_empty()).then_some(joined)
    }

    /// First of the direction switches -L/-R/-U/-D
    fn direction(&self) -> Option<Direction> {
        self.switches.iter().find_map(|f| match f {
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            _ => None,
        })
    }
}

fn parse_number<T: FromStr>(command: &str, value: &str) -> Result<T> {
    // tmux targets may be written ":1" or "=1"
    let trimmed = value.trim_start_matches([':', '=']);
    trimmed.parse().map_err(|_| MuxError::InvalidArgument {
        command: command.to_string(),
        value: value.to_string(),
    })
}

fn missing(command: &str, flag: &str) -> MuxError {
    MuxError::MissingArgument {
        command: command.to_string(),
        flag: flag.to_string(),
    }
}

impl FromStr for Command {
    type Err = MuxError;

    fn from_str(line: &str) -> Result<Self> {
        let words = tokenize(line);
        let Some((name, rest)) = words.split_first() else {
            return Err(MuxError::UnknownCommand(String::new()));
        };
        let name = name.as_str();

        let command = match name {
            "split-window" | "splitw" => {
                let args = Args::parse(name, rest, "hv", "")?;
                let direction = if args.has('h') {
                    SplitDirection::Vertical
                } else {
                    SplitDirection::Horizontal
                };
                Command::SplitWindow { direction }
            }
            "new-window" | "neww" => {
                let args = Args::parse(name, rest, "d", "n")?;
                Command::NewWindow {
                    name: args.value('n').map(str::to_string),
                    detached: args.has('d'),
                }
            }
            "rename-window" | "renamew" => {
                let args = Args::parse(name, rest, "", "t")?;
                if args.positional.is_empty() && args.options.is_empty() {
                    Command::RenamePrompt {
                        target: RenameTarget::Window,
                    }
                } else {
                    let target = match args.value('t') {
                        Some(t) => Some(parse_number(name, t)?),
                        None => None,
                    };
                    let name = args.rest().ok_or_else(|| missing(name, "name"))?;
                    Command::RenameWindow { target, name }
                }
            }
            "select-window" | "selectw" => {
                let args = Args::parse(name, rest, "nlp", "t")?;
                if args.has('n') {
                    Command::NextWindow
                } else if args.has('p') {
                    Command::PreviousWindow
                } else if args.has('l') {
                    Command::LastWindow
                } else {
                    let target = args.value('t').ok_or_else(|| missing(name, "-t"))?;
                    Command::SelectWindow {
                        index: parse_number(name, target)?,
                    }
                }
            }
            "next-window" | "next" => Command::NextWindow,
            "previous-window" | "prev" => Command::PreviousWindow,
            "last-window" | "last" => Command::LastWindow,
            "select-pane" | "selectp" => {
                let args = Args::parse(name, rest, "LRUDl", "t")?;
                let target = if let Some(dir) = args.direction() {
                    PaneTarget::Direction(dir)
                } else if args.has('l') {
                    PaneTarget::Last
                } else {
                    match args.value('t').ok_or_else(|| missing(name, "-t"))? {
                        "+" => PaneTarget::Next,
                        "-" => PaneTarget::Previous,
                        target => PaneTarget::Index(parse_number(name, target)?),
                    }
                };
                Command::SelectPane { target }
            }
            "last-pane" | "lastp" => Command::LastPane,
            "resize-pane" | "resizep" => {
                let args = Args::parse(name, rest, "LRUDZ", "")?;
                if args.has('Z') {
                    Command::ZoomPane
                } else {
                    let direction = args.direction().ok_or_else(|| missing(name, "-L|-R|-U|-D"))?;
                    let amount = match args.positional.first() {
                        Some(n) => parse_number(name, n)?,
                        None => 1,
                    };
                    Command::ResizePane { direction, amount }
                }
            }
            "kill-pane" | "killp" => Command::KillPane,
            "kill-window" | "killw" => Command::KillWindow,
            "swap-pane" | "swapp" => {
                let args = Args::parse(name, rest, "UD", "")?;
                Command::SwapPane {
                    forward: !args.has('U'),
                }
            }
            "break-pane" | "breakp" => Command::BreakPane,
            "new-session" | "new" => {
                let args = Args::parse(name, rest, "d", "sn")?;
                Command::NewSession {
                    name: args.value('s').map(str::to_string),
                    window_name: args.value('n').map(str::to_string),
                    detached: args.has('d'),
                }
            }
            "switch-client" | "switchc" => {
                let args = Args::parse(name, rest, "np", "t")?;
                let target = if args.has('n') {
                    SessionTarget::Next
                } else if args.has('p') {
                    SessionTarget::Previous
                } else {
                    let target = args.value('t').ok_or_else(|| missing(name, "-t"))?;
                    SessionTarget::Named(target.to_string())
                };
                Command::SwitchClient { target }
            }
            "rename-session" | "rename" => {
                let args = Args::parse(name, rest, "", "t")?;
                if args.positional.is_empty() && args.options.is_empty() {
                    Command::RenamePrompt {
                        target: RenameTarget::Session,
                    }
                } else {
                    let target = args.value('t').map(str::to_string);
                    let name = args.rest().ok_or_else(|| missing(name, "name"))?;
                    Command::RenameSession { target, name }
                }
            }
            "list-sessions" | "ls" => Command::ListSessions,
            "detach-client" | "detach" => Command::DetachClient,
            "next-layout" | "nextl" => Command::NextLayout,
            "select-layout" | "selectl" => {
                let args = Args::parse(name, rest, "", "")?;
                let layout = args.rest().ok_or_else(|| missing(name, "layout"))?;
                let preset = LayoutPreset::from_name(&layout).ok_or(MuxError::InvalidArgument {
                    command: name.to_string(),
                    value: layout,
                })?;
                Command::SelectLayout { preset }
            }
            "display-panes" | "displayp" => Command::DisplayPanes,
            "clock-mode" => Command::ClockMode,
            "list-keys" | "lsk" => Command::ListKeys,
            "copy-mode" => Command::CopyMode,
            "paste-buffer" | "pasteb" => Command::PasteBuffer,
            "choose-window" => Command::ChooseWindow,
            "command-prompt" => Command::CommandPrompt,
            "send-prefix" => Command::SendPrefix,
            other => return Err(MuxError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

impl Multiplexer {
    /// Parse and run one command-prompt line
    pub fn run_command(&mut self, line: &str) -> Result<()> {
        let command: Command = line.parse()?;
        debug!(?command, "running command");
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::SplitWindow { direction } => {
                self.split(direction)?;
            }
            Command::NewWindow { name, detached } => {
                if detached {
                    self.new_window_detached(name.as_deref());
                } else {
                    self.new_window(name.as_deref());
                }
            }
            Command::RenameWindow { target, name } => match target {
                Some(index) => self.rename_window_at(index, &name)?,
                None => self.rename_window(&name),
            },
            Command::RenamePrompt { target } => {
                let buffer = match target {
                    RenameTarget::Window => self.active_window().name.clone(),
                    RenameTarget::Session => self.active_session().name.clone(),
                };
                self.set_mode(Mode::Rename { buffer, target });
            }
            Command::SelectWindow { index } => self.select_window(index)?,
            Command::NextWindow => {
                self.active_session_mut().next_window();
            }
            Command::PreviousWindow => {
                self.active_session_mut().prev_window();
            }
            Command::LastWindow => {
                self.active_session_mut().last_window();
            }
            Command::SelectPane { target } => {
                let window = self.active_window_mut();
                match target {
                    PaneTarget::Direction(dir) => {
                        window.navigate_pane(dir);
                    }
                    PaneTarget::Index(index) => window.select_pane(index)?,
                    PaneTarget::Next => {
                        window.next_pane();
                    }
                    PaneTarget::Previous => {
                        window.prev_pane();
                    }
                    PaneTarget::Last => {
                        window.last_pane();
                    }
                }
            }
            Command::LastPane => {
                self.active_window_mut().last_pane();
            }
            Command::ResizePane { direction, amount } => {
                self.active_window_mut().resize_pane(direction, amount);
            }
            Command::ZoomPane => {
                self.active_window_mut().toggle_zoom();
            }
            Command::KillPane => self.kill_pane(),
            Command::KillWindow => self.kill_window(),
            Command::SwapPane { forward } => {
                let window = self.active_window_mut();
                if forward {
                    window.swap_pane_next();
                } else {
                    window.swap_pane_prev();
                }
            }
            Command::BreakPane => {
                self.break_pane();
            }
            Command::NewSession {
                name,
                window_name,
                detached,
            } => {
                self.new_session_with(name.as_deref(), window_name.as_deref(), !detached)?;
            }
            Command::SwitchClient { target } => match target {
                SessionTarget::Next => {
                    self.next_session();
                }
                SessionTarget::Previous => {
                    self.prev_session();
                }
                SessionTarget::Named(target) => {
                    let index = self.find_session(&target)?;
                    self.switch_session(index)?;
                }
            },
            Command::RenameSession { target, name } => match target {
                Some(target) => {
                    let index = self.find_session(&target)?;
                    self.rename_session_at(index, &name)?;
                }
                None => self.rename_session(&name)?,
            },
            Command::ListSessions => {
                let listing = self.list_sessions().join("; ");
                self.set_message(listing);
            }
            Command::DetachClient => self.detach(),
            Command::NextLayout => {
                self.active_window_mut().cycle_layout();
            }
            Command::SelectLayout { preset } => {
                self.active_window_mut().set_layout(preset);
            }
            Command::DisplayPanes => self.display_panes(),
            Command::ClockMode => self.set_mode(Mode::Clock),
            Command::ListKeys => self.set_mode(Mode::Help { scroll: 0 }),
            Command::CopyMode => self.enter_copy_mode(),
            Command::PasteBuffer => self.paste()?,
            Command::ChooseWindow => {
                let cursor = self.active_session().active_index();
                self.set_mode(Mode::WindowList { cursor });
            }
            Command::CommandPrompt => self.set_mode(Mode::Command {
                buffer: String::new(),
            }),
            Command::SendPrefix => {
                self.forward_key(&PREFIX_KEY);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::tests::mux;
    use crate::mux::KEY_BINDINGS;

    fn parse(line: &str) -> Result<Command> {
        line.parse()
    }

    #[test]
    fn test_split_directions() {
        assert_eq!(
            parse("split-window -h"),
            Ok(Command::SplitWindow { direction: SplitDirection::Vertical })
        );
        assert_eq!(
            parse("splitw"),
            Ok(Command::SplitWindow { direction: SplitDirection::Horizontal })
        );
        assert_eq!(
            parse("splitw -v"),
            Ok(Command::SplitWindow { direction: SplitDirection::Horizontal })
        );
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            parse("neww -n logs"),
            Ok(Command::NewWindow { name: Some("logs".to_string()), detached: false })
        );
        assert_eq!(
            parse("rename-window \"my editor\""),
            Ok(Command::RenameWindow { target: None, name: "my editor".to_string() })
        );
        assert_eq!(
            parse("renamew -t 0 foo"),
            Ok(Command::RenameWindow { target: Some(0), name: "foo".to_string() })
        );
        assert_eq!(
            parse("new -d -s x -n editor"),
            Ok(Command::NewSession {
                name: Some("x".to_string()),
                window_name: Some("editor".to_string()),
                detached: true,
            })
        );
        assert_eq!(parse("selectp -t +"), Ok(Command::SelectPane { target: PaneTarget::Next }));
        assert_eq!(parse("selectp -t -"), Ok(Command::SelectPane { target: PaneTarget::Previous }));
        assert_eq!(parse("selectw -t :2"), Ok(Command::SelectWindow { index: 2 }));
        assert_eq!(
            parse("resizep -L 5"),
            Ok(Command::ResizePane { direction: Direction::Left, amount: 5 })
        );
        assert_eq!(parse("resize-pane -Z"), Ok(Command::ZoomPane));
        assert_eq!(parse("swapp -U"), Ok(Command::SwapPane { forward: false }));
        assert_eq!(
            parse("switchc -t work"),
            Ok(Command::SwitchClient { target: SessionTarget::Named("work".to_string()) })
        );
        assert_eq!(
            parse("select-layout main-vertical"),
            Ok(Command::SelectLayout { preset: LayoutPreset::MainVertical })
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            parse("frobnicate"),
            Err(MuxError::UnknownCommand("frobnicate".to_string()))
        );
        assert!(matches!(parse("selectw"), Err(MuxError::MissingArgument { .. })));
        assert!(matches!(parse("selectw -t x"), Err(MuxError::InvalidArgument { .. })));
        assert!(matches!(parse("neww -n"), Err(MuxError::MissingArgument { .. })));
        assert!(matches!(parse("swapp -q"), Err(MuxError::InvalidArgument { .. })));
        assert!(matches!(parse("select-layout tiled"), Err(MuxError::InvalidArgument { .. })));
        assert!(matches!(parse("renamew -t x foo"), Err(MuxError::InvalidArgument { .. })));
    }

    #[test]
    fn test_blank_names_rejected() {
        let mut m = mux();
        for line in ["rename-window \"\"", "renamew '  '", "renamew -t 0", "rename-session \"\""] {
            assert!(
                matches!(m.run_command(line), Err(MuxError::MissingArgument { .. })),
                "{}",
                line
            );
        }
        assert_eq!(m.active_window().name, "zsh");
        assert_eq!(m.active_session().name, "0");
    }

    #[test]
    fn test_targeted_renames() {
        let mut m = mux();
        m.run_command("new-window").unwrap();
        assert_eq!(m.active_session().active_index(), 1);
        m.run_command("rename-window -t 0 foo").unwrap();
        assert_eq!(m.active_session().window_names(), vec!["foo", "zsh"]);
        assert_eq!(m.run_command("renamew -t 3 bar"), Err(MuxError::WindowOutOfRange(3)));

        m.run_command("new -s work").unwrap();
        m.run_command("rename-session -t 0 main").unwrap();
        assert_eq!(m.sessions()[0].name, "main");
        assert_eq!(m.active_session().name, "work");
        assert_eq!(
            m.run_command("rename -t nope x"),
            Err(MuxError::SessionNotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_detached_creation() {
        let mut m = mux();
        m.run_command("new-window -d -n bg").unwrap();
        assert_eq!(m.active_session().active_index(), 0);
        assert_eq!(m.active_session().window_names(), vec!["zsh", "bg"]);

        m.run_command("new -d -s x -n editor").unwrap();
        assert_eq!(m.active_session().name, "0");
        let x = m.find_session("x").unwrap();
        assert_eq!(m.sessions()[x].window_names(), vec!["editor"]);

        m.run_command("new -s y -n logs").unwrap();
        assert_eq!(m.active_session().name, "y");
        assert_eq!(m.active_window().name, "logs");
    }

    #[test]
    fn test_bound_commands_run() {
        let mut m = mux();
        for (_, command) in KEY_BINDINGS {
            if command.ends_with(" N") {
                continue;
            }
            assert!(command.parse::<Command>().is_ok(), "{}", command);
        }

        m.run_command("split-window -h").unwrap();
        m.run_command("select-pane -t +").unwrap();
        assert_eq!(m.active_window().pane_index(m.active_window().active_pane_id()), Some(0));
        m.run_command("select-pane -t -").unwrap();
        assert_eq!(m.active_window().pane_index(m.active_window().active_pane_id()), Some(1));

        m.run_command("choose-window").unwrap();
        assert_eq!(*m.mode(), Mode::WindowList { cursor: 0 });
        m.run_command("command-prompt").unwrap();
        assert_eq!(*m.mode(), Mode::Command { buffer: String::new() });
        m.run_command("rename-window").unwrap();
        assert!(matches!(m.mode(), Mode::Rename { buffer, target: RenameTarget::Window } if buffer == "zsh"));
        m.run_command("rename-session").unwrap();
        assert!(matches!(m.mode(), Mode::Rename { buffer, target: RenameTarget::Session } if buffer == "0"));
        m.run_command("send-prefix").unwrap();
    }

    #[test]
    fn test_run_commands() {
        let mut m = mux();
        m.run_command("split-window -h").unwrap();
        assert_eq!(m.active_window().pane_count(), 2);
        m.run_command("selectp -t 0").unwrap();
        assert_eq!(m.active_window().pane_index(m.active_window().active_pane_id()), Some(0));
        m.run_command("new-window -n logs").unwrap();
        assert_eq!(m.active_window().name, "logs");
        assert_eq!(m.run_command("selectw -t 7"), Err(MuxError::WindowOutOfRange(7)));
        m.run_command("new -s work").unwrap();
        assert_eq!(m.active_session().name, "work");
        m.run_command("switchc -t 0").unwrap();
        assert_eq!(m.active_session().name, "0");
        m.run_command("ls").unwrap();
        assert_eq!(m.message(), Some("0: 2 windows (attached); work: 1 windows"));
        assert_eq!(m.run_command("paste-buffer"), Err(MuxError::EmptyBuffer));
        m.run_command("detach").unwrap();
        assert!(m.is_detached());
    }
}
