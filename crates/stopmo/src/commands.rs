//! Line-oriented console commands
//!
//! Transport and settings commands act on the project directly. Key and
//! keymap commands are queued on the router channel so they are handled in
//! order with MIDI input.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use flume::Sender;
use stopmo_core::project::{load_record, save_record};
use stopmo_core::{ClipSide, ControlSurface, Project};
use stopmo_midi::{ControlEvent, Key, Modifiers, RouterCommand};

pub const HELP: &str = "\
play in|out      start or stop playback of a clip
stop             stop playback and recording
rec              toggle punch-in recording
rew in|out       cursor to the first frame
fwd in|out       cursor to the last frame
learn on|off     bind the next key to the focused frame
select <i>       select and focus frame i
key <c>          press key c (^c for ctrl-c)
keyup <c>        release key c
partition        spread the clip across MIDI keys 36-96
map11            map frame i to MIDI key 36+i
clear midi|kbd   drop every binding of one surface
delete           delete the selected frames
status           show the current state
save <path>      write the project record
load <path>      read a project record
quit             shut down";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(ClipSide),
    Stop,
    Record,
    Rewind(ClipSide),
    Forward(ClipSide),
    Learn(bool),
    Select(usize),
    Key { key: char, ctrl: bool },
    KeyUp(char),
    Partition,
    Map11,
    Clear(ControlSurface),
    Delete,
    Status,
    Save(PathBuf),
    Load(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let arg = words.next();
        if words.next().is_some() {
            bail!("too many arguments to '{}'", name);
        }

        let side = || -> Result<ClipSide> {
            let arg = arg.with_context(|| format!("'{}' needs in|out", name))?;
            arg.parse::<ClipSide>().map_err(anyhow::Error::msg)
        };
        let path = || -> Result<PathBuf> {
            arg.map(PathBuf::from)
                .with_context(|| format!("'{}' needs a path", name))
        };
        let bare = |command: Self| -> Result<Self> {
            match arg {
                Some(extra) => bail!("'{}' takes no argument, got '{}'", name, extra),
                None => Ok(command),
            }
        };

        let command = match name {
            "play" => Self::Play(side()?),
            "stop" => bare(Self::Stop)?,
            "rec" | "record" => bare(Self::Record)?,
            "rew" => Self::Rewind(side()?),
            "fwd" => Self::Forward(side()?),
            "learn" => match arg {
                Some("on") => Self::Learn(true),
                Some("off") => Self::Learn(false),
                _ => bail!("'learn' needs on|off"),
            },
            "select" => {
                let arg = arg.context("'select' needs a frame index")?;
                Self::Select(arg.parse().with_context(|| format!("invalid frame index '{}'", arg))?)
            }
            "key" => {
                let (key, ctrl) = match arg.context("'key' needs a key")? {
                    s if s.len() > 1 && s.starts_with('^') => (single_char(&s[1..])?, true),
                    s => (single_char(s)?, false),
                };
                Self::Key { key, ctrl }
            }
            "keyup" => Self::KeyUp(single_char(arg.context("'keyup' needs a key")?)?),
            "partition" => bare(Self::Partition)?,
            "map11" => bare(Self::Map11)?,
            "clear" => match arg {
                Some("midi") => Self::Clear(ControlSurface::Midi),
                Some("kbd") => Self::Clear(ControlSurface::Kbd),
                _ => bail!("'clear' needs midi|kbd"),
            },
            "delete" => bare(Self::Delete)?,
            "status" => bare(Self::Status)?,
            "save" => Self::Save(path()?),
            "load" => Self::Load(path()?),
            "help" | "?" => bare(Self::Help)?,
            "quit" | "exit" => bare(Self::Quit)?,
            other => bail!("unknown command '{}' (try 'help')", other),
        };
        Ok(command)
    }
}

fn single_char(s: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => bail!("expected a single key, got '{}'", s),
    }
}

/// Whether the console keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Executes commands against one project
pub struct Console {
    project: Arc<Project>,
    events: Sender<ControlEvent>,
    target: ClipSide,
}

impl Console {
    pub fn new(project: Arc<Project>, events: Sender<ControlEvent>, target: ClipSide) -> Self {
        Self {
            project,
            events,
            target,
        }
    }

    /// Run one command, returning any text meant for the operator
    pub fn execute(&self, command: Command) -> Result<(Flow, Option<String>)> {
        let mut output = None;
        match command {
            Command::Play(side) => self.project.play(side),
            Command::Stop => self.project.stop(),
            Command::Record => self.project.toggle_record(),
            Command::Rewind(side) => self.project.rewind(side),
            Command::Forward(side) => self.project.forward(side),
            Command::Learn(on) => self.project.set_learning(on),
            Command::Select(index) => {
                self.project
                    .lock()
                    .clip_mut(self.target)
                    .store
                    .select_only(index)?;
            }
            Command::Key { key, ctrl } => self.send(ControlEvent::KeyDown {
                key: Key::Char(key),
                modifiers: if ctrl { Modifiers::CTRL } else { Modifiers::NONE },
            })?,
            Command::KeyUp(key) => self.send(ControlEvent::KeyUp { key: Key::Char(key) })?,
            Command::Partition => self.send(ControlEvent::Command(RouterCommand::PartitionMidiKeymap))?,
            Command::Map11 => self.send(ControlEvent::Command(RouterCommand::InitMidiKeymap1to1))?,
            Command::Clear(surface) => self.send(ControlEvent::Command(RouterCommand::ClearKeymap(surface)))?,
            Command::Delete => self.send(ControlEvent::KeyDown {
                key: Key::Delete,
                modifiers: Modifiers::NONE,
            })?,
            Command::Status => output = Some(self.describe()),
            Command::Save(path) => {
                let settings = self.project.lock().settings;
                save_record(&settings, &path)?;
                output = Some(format!("Saved {}", path.display()));
            }
            Command::Load(path) => {
                let settings = load_record(&path)?;
                self.project.set_settings(settings)?;
                output = Some(format!("Loaded {}", path.display()));
            }
            Command::Help => output = Some(HELP.to_string()),
            Command::Quit => return Ok((Flow::Quit, None)),
        }
        Ok((Flow::Continue, output))
    }

    fn send(&self, event: ControlEvent) -> Result<()> {
        self.events
            .send(event)
            .context("control-surface router is not running")
    }

    fn describe(&self) -> String {
        let state = self.project.lock();
        let clip_line = |side: ClipSide| {
            let clip = state.clip(side);
            format!(
                "{:<6} {} frames, cursor {}, {} selected, audio {}",
                side.name(),
                clip.store.len(),
                clip.store.cursor(),
                clip.store.selected_count(),
                match clip.track.info() {
                    Some(info) => format!("{}-Ch {}Hz", info.channels, info.sample_rate),
                    None => "none".to_string(),
                }
            )
        };
        let mode = match (state.playing, state.recording) {
            (Some(side), _) => format!("playing {}", side.name()),
            (None, true) => "recording".to_string(),
            (None, false) => "stopped".to_string(),
        };
        let (value, min, max) = self.project.progress().get();
        format!(
            "{}\n{}\n{}, {:?}, {} fps, learn {}, progress {}/{}..{}\nstatus: {}",
            clip_line(ClipSide::Input),
            clip_line(ClipSide::Output),
            mode,
            state.proc_op,
            state.settings.frame_rate,
            if state.learning { "on" } else { "off" },
            value,
            min,
            max,
            self.project.status().current()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stopmo_core::clip::Bitmap;
    use stopmo_core::project::ProjectSettings;

    fn console(frames: u64) -> (Console, flume::Receiver<ControlEvent>) {
        let project = Arc::new(Project::headless(ProjectSettings::default()));
        {
            let mut state = project.lock();
            for i in 0..frames {
                state.input.store.push_frame(i + 1, Bitmap::default()).unwrap();
            }
        }
        let (tx, rx) = flume::unbounded();
        (Console::new(project, tx, ClipSide::Input), rx)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("play in".parse::<Command>().unwrap(), Command::Play(ClipSide::Input));
        assert_eq!("fwd out".parse::<Command>().unwrap(), Command::Forward(ClipSide::Output));
        assert_eq!("learn on".parse::<Command>().unwrap(), Command::Learn(true));
        assert_eq!("select 12".parse::<Command>().unwrap(), Command::Select(12));
        assert_eq!(
            "key ^a".parse::<Command>().unwrap(),
            Command::Key { key: 'a', ctrl: true }
        );
        assert_eq!(
            "key ^".parse::<Command>().unwrap(),
            Command::Key { key: '^', ctrl: false }
        );
        assert_eq!("keyup q".parse::<Command>().unwrap(), Command::KeyUp('q'));
        assert_eq!(
            "clear kbd".parse::<Command>().unwrap(),
            Command::Clear(ControlSurface::Kbd)
        );
        assert_eq!(
            "save /tmp/p.rec".parse::<Command>().unwrap(),
            Command::Save(PathBuf::from("/tmp/p.rec"))
        );
        assert_eq!("  quit ".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "play", "play sideways", "learn maybe", "select x", "key ab", "clear all", "stop now", "dance"] {
            assert!(bad.parse::<Command>().is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn test_transport_and_selection() {
        let (console, _rx) = console(5);
        let project = console.project.clone();

        console.execute(Command::Forward(ClipSide::Input)).unwrap();
        assert_eq!(project.lock().input.store.cursor(), 4);
        console.execute(Command::Play(ClipSide::Input)).unwrap();
        assert_eq!(project.lock().playing, Some(ClipSide::Input));
        console.execute(Command::Stop).unwrap();
        assert_eq!(project.lock().playing, None);

        console.execute(Command::Select(3)).unwrap();
        assert_eq!(project.lock().input.store.focus(), Some(3));
        assert!(console.execute(Command::Select(9)).is_err());
    }

    #[test]
    fn test_key_commands_go_to_router() {
        let (console, rx) = console(2);
        console.execute(Command::Key { key: 'a', ctrl: true }).unwrap();
        console.execute(Command::Delete).unwrap();
        console.execute(Command::Partition).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            ControlEvent::KeyDown {
                key: Key::Char('a'),
                modifiers: Modifiers::CTRL
            }
        );
        assert!(matches!(rx.try_recv().unwrap(), ControlEvent::KeyDown { key: Key::Delete, .. }));
        assert_eq!(
            rx.try_recv().unwrap(),
            ControlEvent::Command(RouterCommand::PartitionMidiKeymap)
        );

        drop(rx);
        assert!(console.execute(Command::Map11).is_err());
    }

    #[test]
    fn test_save_load_and_status() {
        let (console, _rx) = console(3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.rec");

        console
            .project
            .set_settings(ProjectSettings {
                frame_rate: 15,
                ..Default::default()
            })
            .unwrap();
        console.execute(Command::Save(path.clone())).unwrap();
        console.project.set_settings(ProjectSettings::default()).unwrap();

        let (flow, text) = console.execute(Command::Load(path)).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(text.unwrap().starts_with("Loaded "));
        assert_eq!(console.project.lock().settings.frame_rate, 15);

        let (_, status) = console.execute(Command::Status).unwrap();
        let status = status.unwrap();
        assert!(status.starts_with("input  3 frames, cursor 0"));
        assert!(status.contains("15 fps"));

        assert_eq!(console.execute(Command::Quit).unwrap().0, Flow::Quit);
    }
}
