use crate::model::{GameKind, Panel, Species};
use anyhow::{anyhow, bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UiAction {
    Type(char),
    Backspace,
    Submit,
    /// Esc: closes the help or open panels first, quits otherwise.
    Back,
    Quit,
    HelpToggle,
    TogglePanel(Panel),
    Photo,
    MuteToggle,
    /// Digit pressed while a picker panel is open, zero based.
    Pick(usize),
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 64 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

/// `picking` is set while the games or accessories panel waits for a number.
pub(crate) fn map_event_to_action(ev: InputEvent, picking: bool) -> Option<UiAction> {
    if ev.mods.contains(KeyModifiers::CONTROL) {
        return match ev.key {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(UiAction::Quit),
            _ => None,
        };
    }

    match ev.key {
        KeyCode::Enter => Some(UiAction::Submit),
        KeyCode::Backspace => Some(UiAction::Backspace),
        KeyCode::Esc => Some(UiAction::Back),
        KeyCode::F(1) => Some(UiAction::HelpToggle),
        KeyCode::F(2) => Some(UiAction::TogglePanel(Panel::Games)),
        KeyCode::F(3) => Some(UiAction::TogglePanel(Panel::Accessories)),
        KeyCode::F(4) => Some(UiAction::TogglePanel(Panel::Achievements)),
        KeyCode::F(5) => Some(UiAction::TogglePanel(Panel::Memory)),
        KeyCode::F(6) => Some(UiAction::Photo),
        KeyCode::F(7) => Some(UiAction::MuteToggle),
        KeyCode::Char(ch) if picking && ch.is_ascii_digit() && ch != '0' => {
            Some(UiAction::Pick(ch as usize - '1' as usize))
        }
        KeyCode::Char(ch) if !ch.is_control() => Some(UiAction::Type(ch)),
        _ => None,
    }
}

/// Slash commands typed into the chat line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Name(String),
    Species(Species),
    Color(String),
    Play(GameKind),
    Wear(String),
    Photo,
    Mute,
    Help,
    Quit,
}

/// `None` when the line is ordinary chat.
pub(crate) fn parse_command(line: &str) -> Option<Result<Command>> {
    let rest = line.trim().strip_prefix('/')?;
    let (word, arg) = match rest.split_once(char::is_whitespace) {
        Some((w, a)) => (w, a.trim()),
        None => (rest, ""),
    };
    Some(command(&word.to_lowercase(), arg))
}

fn command(word: &str, arg: &str) -> Result<Command> {
    let need = |what: &str| -> Result<String> {
        if arg.is_empty() {
            Err(anyhow!("/{word} needs a {what}"))
        } else {
            Ok(arg.to_string())
        }
    };
    Ok(match word {
        "name" => Command::Name(need("name")?),
        "species" | "type" => Command::Species(need("species")?.parse()?),
        "color" | "colour" => Command::Color(need("colour")?),
        "play" => {
            let want = need("game")?.to_lowercase();
            let kind = GameKind::ALL
                .into_iter()
                .find(|k| k.label().eq_ignore_ascii_case(&want))
                .ok_or_else(|| anyhow!("unknown game `{want}`, try memory, fetch or puzzle"))?;
            Command::Play(kind)
        }
        "wear" => Command::Wear(need("accessory")?),
        "photo" => Command::Photo,
        "mute" => Command::Mute,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command /{other}"),
    })
}
