use crate::config::{save_settings_atomic, Paths, Settings};
use crate::dialogue::TurnContext;
use crate::input::{
    collect_input_nonblocking, map_event_to_action, parse_command, Command, UiAction,
};
use crate::model::{GameKind, Panel, PetState, Sender, Species, Stats};
use crate::render::{
    avatar_lines, bounce_offset, draw_avatar, draw_center_box, draw_conversation, draw_input,
    draw_stats, draw_text, AvatarView, Terminal,
};
use crate::session::{PetAction, Session};
use crate::speech::{speak_best_effort, speaker_for, Speaker};
use crate::storage::{load_session, save_session, JsonFileStore, KeyValueStore};
use anyhow::{Context, Result};
use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::{max, min};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MAX_INPUT_CHARS: usize = 240;

/// Something the pet can try on. Higher levels unlock fancier items.
pub(crate) struct Outfit {
    pub(crate) name: &'static str,
    pub(crate) min_level: u32,
    pub(crate) species: &'static [Species],
}

const ANY: &[Species] = &Species::ALL;

pub(crate) const WARDROBE: &[Outfit] = &[
    Outfit { name: "party hat", min_level: 1, species: ANY },
    Outfit { name: "beanie", min_level: 1, species: ANY },
    Outfit { name: "bow tie", min_level: 1, species: ANY },
    Outfit { name: "sunglasses", min_level: 2, species: ANY },
    Outfit { name: "cowboy hat", min_level: 2, species: &[Species::Dog, Species::Cat] },
    Outfit { name: "wizard hat", min_level: 3, species: ANY },
    Outfit { name: "crown", min_level: 5, species: ANY },
];

pub(crate) fn wardrobe_for(pet: &PetState) -> Vec<&'static Outfit> {
    WARDROBE
        .iter()
        .filter(|o| o.min_level <= pet.level && o.species.contains(&pet.species))
        .collect()
}

/// Stand-in for the mini-games: a roll nudged by the stat the game leans on.
pub(crate) fn roll_score<R: Rng + ?Sized>(kind: GameKind, stats: &Stats, rng: &mut R) -> u32 {
    let skill = match kind {
        GameKind::Fetch => stats.energy,
        GameKind::Memory | GameKind::Puzzle => stats.intelligence,
    } as u32;
    (rng.gen_range(10..=60) + skill / 2).min(100)
}

/// Title and body text for an open panel.
pub(crate) fn panel_text(panel: Panel, session: &Session) -> (String, String) {
    let pet = &session.pet;
    match panel {
        Panel::Games => (
            "Mini games".to_string(),
            "Press a number to play:\n\n\
             1  Memory  (sharpens intelligence)\n\
             2  Fetch   (fun, but tiring)\n\
             3  Puzzle  (big intelligence boost)\n\n\
             Scores over 80 earn Game Master.\n\nEsc to close."
                .to_string(),
        ),
        Panel::Accessories => {
            let mut body = String::from("Press a number to wear it:\n\n");
            for (i, o) in wardrobe_for(pet).iter().enumerate() {
                let mark = if pet.equipped_accessory.as_deref() == Some(o.name) {
                    " (wearing)"
                } else if pet.accessories.iter().any(|a| a == o.name) {
                    " (owned)"
                } else {
                    ""
                };
                body.push_str(&format!("{}  {}{}\n", i + 1, o.name, mark));
            }
            let locked = WARDROBE
                .iter()
                .filter(|o| o.species.contains(&pet.species) && o.min_level > pet.level)
                .count();
            if locked > 0 {
                body.push_str(&format!("\n{locked} more unlock at higher levels."));
            }
            ("Wardrobe".to_string(), body)
        }
        Panel::Achievements => {
            let body = if pet.achievements.len() == 0 {
                "No achievements yet. Keep chatting!".to_string()
            } else {
                pet.achievements
                    .iter()
                    .map(|a| format!("* {a}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            (format!("Achievements ({})", pet.achievements.len()), body)
        }
        Panel::Memory => {
            let said: Vec<&str> = session
                .history
                .iter()
                .filter(|e| e.sender == Sender::User)
                .map(|e| e.text.as_str())
                .collect();
            let body = if said.is_empty() {
                "We haven't talked yet.".to_string()
            } else {
                said.iter()
                    .rev()
                    .take(10)
                    .map(|t| format!("- {t}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            (format!("{}'s Memory Bank", pet.name), body)
        }
        Panel::Share => (
            "Photo".to_string(),
            format!(
                "{}\n\nSaved to your photos folder. Share it with your friends!",
                snapshot_text(session)
            ),
        ),
    }
}

pub(crate) fn snapshot_text(session: &Session) -> String {
    let pet = &session.pet;
    let mut out = avatar_lines(&AvatarView::of(pet, session.emotion)).join("\n");
    out.push_str(&format!(
        "\n\n{} the {} {}, level {}, feeling {}",
        pet.name, pet.color, pet.species, pet.level, session.emotion
    ));
    out
}

/// Pet name reduced to something safe inside a file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.chars().all(|c| c == '_') {
        "pet".to_string()
    } else {
        stem
    }
}

/// Writes the current avatar as a text "photo" and returns its path.
pub(crate) fn save_photo(dir: &Path, session: &Session) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("{}-{stamp}.txt", file_stem(&session.pet.name)));
    fs::write(&path, snapshot_text(session))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

struct PendingReply {
    text: String,
    due: Instant,
}

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    store: JsonFileStore,
    session: Session,
    rng: StdRng,
    speaker: Box<dyn Speaker>,
    term: Terminal,
    input: String,
    pending: Option<PendingReply>,
    help: bool,
    notice: Option<String>,
    frame: u64,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings, paths: Paths, rng: StdRng) -> Result<Self> {
        let store = JsonFileStore::open(&paths.store_path);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut session = load_session(&store, now_ms);
        session.welcome_back(now_ms);

        let speaker = speaker_for(settings.muted, settings.speech_command.as_deref());
        let term = Terminal::begin()?;

        let mut app = Self {
            settings,
            paths,
            store,
            session,
            rng,
            speaker,
            term,
            input: String::new(),
            pending: None,
            help: false,
            notice: None,
            frame: 0,
            should_quit: false,
        };
        app.save_now()?;
        Ok(app)
    }

    fn run(&mut self) -> Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 120);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.should_quit {
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev, self.picking()) {
                    self.handle(action)?;
                }
                if self.should_quit {
                    break;
                }
            }

            if self.pending.as_ref().is_some_and(|p| Instant::now() >= p.due) {
                if let Some(p) = self.pending.take() {
                    self.act(PetAction::Say(p.text))?;
                }
            }

            self.render_frame()?;
            self.frame = self.frame.wrapping_add(1);
            spin_sleep(frame_dt, Instant::now());
        }

        if let Some(p) = self.pending.take() {
            self.act(PetAction::Say(p.text))?;
        }
        self.save_now()?;
        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn picking(&self) -> bool {
        self.input.is_empty()
            && (self.session.panels.games || self.session.panels.accessories)
    }

    fn handle(&mut self, action: UiAction) -> Result<()> {
        match action {
            UiAction::Type(ch) => {
                if self.input.chars().count() < MAX_INPUT_CHARS {
                    self.input.push(ch);
                }
            }
            UiAction::Backspace => {
                self.input.pop();
            }
            UiAction::Submit => self.submit()?,
            UiAction::Back => {
                if self.help {
                    self.help = false;
                } else if self.session.panels.any() {
                    self.act(PetAction::ClosePanels)?;
                } else {
                    self.should_quit = true;
                }
            }
            UiAction::Quit => self.should_quit = true,
            UiAction::HelpToggle => self.help = !self.help,
            UiAction::TogglePanel(panel) => self.act(PetAction::TogglePanel(panel))?,
            UiAction::Photo => self.take_photo()?,
            UiAction::MuteToggle => self.toggle_mute(),
            UiAction::Pick(i) => self.pick(i)?,
        }
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        if self.input.trim().is_empty() {
            self.input.clear();
            return Ok(());
        }
        if let Some(cmd) = parse_command(&self.input) {
            self.input.clear();
            return match cmd {
                Ok(cmd) => self.run_command(cmd),
                Err(e) => {
                    self.notice = Some(e.to_string());
                    Ok(())
                }
            };
        }
        // one thought at a time
        if self.pending.is_some() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.input);
        self.notice = None;
        self.pending = Some(PendingReply {
            text,
            due: Instant::now() + Duration::from_millis(self.settings.reply_delay_ms),
        });
        Ok(())
    }

    fn run_command(&mut self, cmd: Command) -> Result<()> {
        let pet = &self.session.pet;
        let (name, species, color) = (pet.name.clone(), pet.species, pet.color.clone());
        match cmd {
            Command::Name(name) => self.act(PetAction::Customize { name, species, color }),
            Command::Species(species) => self.act(PetAction::Customize { name, species, color }),
            Command::Color(color) => self.act(PetAction::Customize { name, species, color }),
            Command::Play(kind) => self.play(kind),
            Command::Wear(item) => self.act(PetAction::EquipAccessory(item)),
            Command::Photo => self.take_photo(),
            Command::Mute => {
                self.toggle_mute();
                Ok(())
            }
            Command::Help => {
                self.help = true;
                Ok(())
            }
            Command::Quit => {
                self.should_quit = true;
                Ok(())
            }
        }
    }

    fn pick(&mut self, i: usize) -> Result<()> {
        if self.session.panels.games {
            if let Some(kind) = GameKind::ALL.get(i).copied() {
                self.session.panels.games = false;
                self.play(kind)?;
            }
        } else if self.session.panels.accessories {
            if let Some(outfit) = wardrobe_for(&self.session.pet).get(i) {
                self.session.panels.accessories = false;
                self.act(PetAction::EquipAccessory(outfit.name.to_string()))?;
            }
        }
        Ok(())
    }

    fn play(&mut self, kind: GameKind) -> Result<()> {
        let score = roll_score(kind, &self.session.pet.stats, &mut self.rng);
        tracing::info!(game = kind.label(), score, "mini game finished");
        self.act(PetAction::CompleteGame { score, kind })
    }

    fn take_photo(&mut self) -> Result<()> {
        self.act(PetAction::CapturePhoto)?;
        match save_photo(&self.paths.dir.join("photos"), &self.session) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "photo saved");
                self.notice = Some(format!("Photo saved to {}", path.display()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not save photo");
                self.notice = Some("Could not save the photo".to_string());
            }
        }
        Ok(())
    }

    fn toggle_mute(&mut self) {
        self.settings.muted = !self.settings.muted;
        self.speaker = speaker_for(self.settings.muted, self.settings.speech_command.as_deref());
        self.notice = Some(if self.settings.muted { "Muted" } else { "Unmuted" }.to_string());
    }

    /// Applies an action, then persists and speaks what the pet said.
    fn act(&mut self, action: PetAction) -> Result<()> {
        let ctx = TurnContext::now();
        let feedback = self.session.apply(action, &ctx, &mut self.rng);
        self.save_now()?;
        for line in &feedback.lines {
            speak_best_effort(self.speaker.as_mut(), line);
        }
        let Some(turn) = feedback.turn else {
            return Ok(());
        };
        tracing::debug!(
            intent = ?turn.intent,
            delta = ?turn.stat_delta,
            xp = turn.experience_gained,
            "turn applied"
        );
        if let Some(level) = turn.levels_reached.last() {
            self.notice = Some(format!("{} reached level {level}!", self.session.pet.name));
        } else if !turn.achievements_unlocked.is_empty() {
            self.notice = Some(format!(
                "Achievement unlocked: {}",
                turn.achievements_unlocked.join(", ")
            ));
        }
        if turn.capture_photo {
            self.take_photo()?;
        }
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        let buf = &mut self.term.cur;
        buf.clear(Color::Black);

        let cols = self.term.cols as i32;
        let rows = self.term.rows as i32;
        let pet = &self.session.pet;

        let mut title = format!(
            "PetPal  |  {} the {} {}  |  Level {}",
            pet.name, pet.color, pet.species, pet.level
        );
        if self.settings.muted {
            title.push_str("  |  muted");
        }
        draw_text(buf, 1, 0, &title, Color::White, Color::Black);

        let panel_w = min(max(30, cols / 3), max(cols - 20, 0));
        let view = AvatarView::of(pet, self.session.emotion);
        let top = 3 + bounce_offset(self.frame, self.session.emotion);
        draw_avatar(buf, &view, panel_w / 2, top, self.settings.enable_color);
        draw_stats(buf, pet, 1, 13);

        let chat_x = (panel_w + 1) as u16;
        let chat_w = max(cols - panel_w - 2, 0) as u16;
        let chat_h = max(rows - 6, 0) as u16;
        draw_conversation(buf, &self.session.history, &pet.name, chat_x, 2, chat_w, chat_h);

        if let Some(n) = &self.notice {
            draw_text(buf, 1, max(rows - 3, 0) as u16, n, Color::Yellow, Color::Black);
        }
        let thinking = self.pending.as_ref().map(|_| pet.name.as_str());
        draw_input(buf, &self.input, thinking, max(rows - 2, 0) as u16);
        draw_text(
            buf,
            1,
            max(rows - 1, 0) as u16,
            "Enter send | F1 help | F2 games | F3 wardrobe | F4 trophies | F5 memory | F6 photo | F7 mute | Esc back",
            Color::DarkGrey,
            Color::Black,
        );

        let open = [
            Panel::Games,
            Panel::Accessories,
            Panel::Achievements,
            Panel::Memory,
            Panel::Share,
        ]
        .into_iter()
        .find(|p| self.session.panels.is_open(*p));
        if let Some(panel) = open {
            let (t, b) = panel_text(panel, &self.session);
            draw_center_box(buf, &t, &b);
        }

        if self.help {
            draw_center_box(
                buf,
                "How to talk to your pet",
                "Type anything and press Enter; your pet answers after a moment.\n\
                 Try greetings, asking how it feels, food, games, jokes, or telling it your name.\n\n\
                 /name NAME   /type dog|cat|bird   /color COLOUR\n\
                 /play memory|fetch|puzzle   /wear ITEM   /photo   /mute\n\n\
                 F2-F5 open panels, F6 takes a photo, F7 mutes speech.\n\
                 Esc closes panels, or quits when none are open.",
            );
        }

        self.term.present(true)?;
        Ok(())
    }

    fn save_now(&mut self) -> Result<()> {
        save_session(&mut self.store, &self.session)
    }
}

pub(crate) fn run(settings: Settings, paths: Paths, rng: StdRng) -> Result<()> {
    let mut app = App::init(settings, paths, rng)?;
    let result = app.run();
    if result.is_err() {
        // leave the terminal usable even when the loop bailed
        let _ = app.term.end();
    }
    result
}

/// Loads the pet, answers one message and saves. Returns the pet's lines.
pub(crate) fn one_shot<R: Rng + ?Sized>(
    store: &mut impl KeyValueStore,
    text: &str,
    ctx: &TurnContext,
    rng: &mut R,
) -> Result<Vec<String>> {
    let mut session = load_session(store, ctx.now_ms);
    let mut lines: Vec<String> = session.welcome_back(ctx.now_ms).into_iter().collect();
    let feedback = session.apply(PetAction::Say(text.to_string()), ctx, rng);
    if feedback.turn.is_none() {
        anyhow::bail!("nothing to say: the message is blank");
    }
    lines.extend(feedback.lines);
    save_session(store, &session)?;
    Ok(lines)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
