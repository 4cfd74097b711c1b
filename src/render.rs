use crate::model::{ConversationEntry, Emotion, PetState, Sender, Species};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
    #[cfg(test)]
    fn row(&self, y: u16) -> String {
        (0..self.w).map(|x| self.cells[self.idx(x, y)].ch).collect()
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Avatar
------------------------------ */

/// Everything the avatar drawing needs to know about the pet.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AvatarView<'a> {
    pub(crate) species: Species,
    pub(crate) color: &'a str,
    pub(crate) emotion: Emotion,
    pub(crate) accessory: Option<&'a str>,
    pub(crate) name: &'a str,
}

impl<'a> AvatarView<'a> {
    pub(crate) fn of(pet: &'a PetState, emotion: Emotion) -> Self {
        Self {
            species: pet.species,
            color: &pet.color,
            emotion,
            accessory: pet.equipped_accessory.as_deref(),
            name: &pet.name,
        }
    }
}

/// Eye and mouth glyphs for an emotion.
fn face(emotion: Emotion) -> (char, char) {
    use Emotion::*;
    match emotion {
        Happy => ('^', 'w'),
        Excited => ('*', 'D'),
        Playful => ('o', 'P'),
        Proud => ('-', 'v'),
        Curious => ('o', '?'),
        Hungry => ('o', 'Q'),
        Sleepy => ('-', 'z'),
        Sad => ('T', 'n'),
        Loving => ('@', '3'),
        Dancing => ('^', 'o'),
        Shocked => ('O', 'O'),
        Laughing => ('>', 'D'),
        Scared => ('0', '~'),
        Thinking => ('.', '-'),
    }
}

fn hat_for(accessory: &str) -> Option<&'static str> {
    let a = accessory.to_lowercase();
    if a.contains("crown") {
        Some(r"   \/\/\/  ")
    } else if a.contains("wizard") || a.contains("party") {
        Some("    /^\\    ")
    } else if a.contains("hat") || a.contains("beanie") {
        Some("   _|=|_   ")
    } else {
        None
    }
}

/// ASCII art for the pet, accessory included, each line the same width.
pub(crate) fn avatar_lines(view: &AvatarView) -> Vec<String> {
    let (mut e, m) = face(view.emotion);
    let accessory = view.accessory.map(str::to_lowercase);
    if accessory.as_deref().is_some_and(|a| a.contains("glasses")) {
        e = '#';
    }

    let mut lines = Vec::with_capacity(8);
    if let Some(hat) = view.accessory.and_then(hat_for) {
        lines.push(hat.to_string());
    }
    match view.species {
        Species::Dog => {
            lines.push(r" __     __ ".to_string());
            lines.push(r"/  \___/  \".to_string());
            lines.push(format!(r"\_/ {e} {e} \_/"));
            lines.push(format!(r"  |  {m}  |  "));
            lines.push(r"   \___/   ".to_string());
        }
        Species::Cat => {
            lines.push(r" /\_____/\ ".to_string());
            lines.push(format!(r"/  {e}   {e}  \"));
            lines.push(format!(r"(    {m}    )"));
            lines.push(r" \_______/ ".to_string());
        }
        Species::Bird => {
            lines.push(r"    ___    ".to_string());
            lines.push(format!(r"   / {e} \   "));
            lines.push(format!(r"  |   {m}>   "));
            lines.push(r"   \___/   ".to_string());
            lines.push(r"    | |    ".to_string());
        }
    }
    if accessory
        .as_deref()
        .is_some_and(|a| a.replace(['_', ' '], "").contains("bowtie"))
    {
        lines.push("    >o<    ".to_string());
    }
    lines
}

/// Maps a colour name to a terminal colour; unknown names stay white.
pub(crate) fn color_for(tag: &str) -> Color {
    match tag.trim().to_lowercase().as_str() {
        "golden" | "gold" | "yellow" => Color::Rgb {
            r: 230,
            g: 180,
            b: 60,
        },
        "brown" => Color::Rgb {
            r: 150,
            g: 100,
            b: 60,
        },
        "orange" | "ginger" => Color::Rgb {
            r: 240,
            g: 140,
            b: 50,
        },
        "black" | "gray" | "grey" => Color::Grey,
        "red" => Color::Red,
        "blue" => Color::Blue,
        "green" => Color::Green,
        "pink" | "purple" => Color::Magenta,
        "cyan" | "teal" => Color::Cyan,
        _ => Color::White,
    }
}

/// Vertical hop in cells; livelier emotions bounce higher.
pub(crate) fn bounce_offset(frame: u64, emotion: Emotion) -> i32 {
    let amp = match emotion {
        Emotion::Excited | Emotion::Dancing | Emotion::Playful | Emotion::Laughing => 1.6,
        Emotion::Sleepy | Emotion::Sad | Emotion::Thinking => 0.0,
        _ => 0.8,
    };
    let t = frame as f32 * 0.15;
    (t.sin() * amp).round() as i32
}

pub(crate) fn draw_avatar(
    buf: &mut CellBuffer,
    view: &AvatarView,
    cx: i32,
    top: i32,
    enable_color: bool,
) {
    let fg = if enable_color {
        color_for(view.color)
    } else {
        Color::White
    };
    let lines = avatar_lines(view);
    for (dy, line) in lines.iter().enumerate() {
        let y = top + dy as i32;
        let x0 = cx - line.chars().count() as i32 / 2;
        if y < 0 || y >= buf.h as i32 {
            continue;
        }
        for (dx, ch) in line.chars().enumerate() {
            let x = x0 + dx as i32;
            if x >= 0 && x < buf.w as i32 && ch != ' ' {
                buf.set(x as u16, y as u16, Cell { ch, fg, bg: Color::Black });
            }
        }
    }
    let caption = format!("{} is {}", view.name, view.emotion);
    let y = top + lines.len() as i32 + 1;
    if y >= 0 {
        let x = (cx - caption.chars().count() as i32 / 2).max(0);
        draw_text(buf, x as u16, y as u16, &caption, Color::White, Color::Black);
    }
}

/* -----------------------------
   Text + panels
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

fn bar(value: u8, width: usize) -> String {
    let fill = (value as usize * width + 50) / 100;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

/// Greedy word wrap; words longer than `width` are split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            out.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !line.is_empty() {
            out.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() || out.is_empty() {
        out.push(line);
    }
    out
}

pub(crate) fn draw_stats(buf: &mut CellBuffer, pet: &PetState, x: u16, y: u16) {
    let fg = Color::White;
    let bg = Color::Black;
    let s = pet.stats;
    let rows = [
        ("Happy ", s.happiness),
        ("Energy", s.energy),
        ("Hunger", s.hunger),
        ("Smarts", s.intelligence),
    ];
    for (i, (name, v)) in rows.iter().enumerate() {
        let line = format!("{name} {} {:>3}", bar(*v, 12), v);
        let warn = *v < 30;
        draw_text(buf, x, y + i as u16, &line, if warn { Color::Red } else { fg }, bg);
    }

    let xp = format!(
        "Level {}  XP {}/{}",
        pet.level,
        pet.experience,
        pet.xp_to_next_level()
    );
    draw_text(buf, x, y + 5, &xp, Color::Yellow, bg);

    let p = pet.personality;
    let traits = format!(
        "Play {} Love {} Curio {} Indep {}",
        p.playfulness, p.affection, p.curiosity, p.independence
    );
    draw_text(buf, x, y + 6, &traits, Color::DarkGrey, bg);
}

/// Draws the tail of the conversation that fits in the given box.
pub(crate) fn draw_conversation(
    buf: &mut CellBuffer,
    history: &[ConversationEntry],
    pet_name: &str,
    x: u16,
    y: u16,
    w: u16,
    h: u16,
) {
    if w < 8 || h == 0 {
        return;
    }
    let mut lines: Vec<(String, Color)> = Vec::new();
    for entry in history {
        let (who, color) = match entry.sender {
            Sender::User => ("You", Color::Cyan),
            Sender::Pet => (pet_name, Color::White),
        };
        let text = format!("{who}: {}", entry.text);
        for l in wrap(&text, w as usize) {
            lines.push((l, color));
        }
    }
    let skip = lines.len().saturating_sub(h as usize);
    for (i, (l, color)) in lines.iter().skip(skip).enumerate() {
        draw_text(buf, x, y + i as u16, l, *color, Color::Black);
    }
}

pub(crate) fn draw_input(buf: &mut CellBuffer, input: &str, thinking: Option<&str>, y: u16) {
    let line = match thinking {
        Some(name) => format!("  {name} is thinking..."),
        None => format!("> {input}_"),
    };
    let w = buf.w as usize;
    // keep the cursor end visible on long input
    let shown: String = {
        let n = line.chars().count();
        line.chars().skip(n.saturating_sub(w.saturating_sub(1))).collect()
    };
    draw_text(buf, 0, y, &shown, Color::Yellow, Color::Black);
}

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let w = buf.w;
    let h = buf.h;
    if w < 8 || h < 6 {
        return;
    }

    let bw = 60.min(w.saturating_sub(4));
    let bh = 18.min(h.saturating_sub(4));
    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;
    let fg = Color::White;
    let bg = Color::Black;

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let ch = match (x == x0, x == x0 + bw - 1, y == y0, y == y0 + bh - 1) {
                (true, _, true, _) => '┌',
                (_, true, true, _) => '┐',
                (true, _, _, true) => '└',
                (_, true, _, true) => '┘',
                (_, _, true, _) | (_, _, _, true) => '─',
                (true, _, _, _) | (_, true, _, _) => '│',
                _ => ' ',
            };
            buf.set(x, y, Cell { ch, fg, bg });
        }
    }

    draw_text(buf, x0 + 2, y0 + 1, title, Color::Yellow, bg);

    let mut yy = y0 + 3;
    for line in body.lines() {
        for l in wrap(line, (bw - 4) as usize) {
            if yy >= y0 + bh - 1 {
                return;
            }
            draw_text(buf, x0 + 2, yy, &l, fg, bg);
            yy += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(species: Species, emotion: Emotion, accessory: Option<&str>) -> AvatarView<'_> {
        AvatarView {
            species,
            color: "golden",
            emotion,
            accessory,
            name: "Buddy",
        }
    }

    #[test]
    fn avatar_lines_have_equal_width() {
        for species in Species::ALL {
            for emotion in Emotion::ALL {
                for acc in [None, Some("crown"), Some("bow tie"), Some("sunglasses")] {
                    let lines = avatar_lines(&view(species, emotion, acc));
                    let w = lines[0].chars().count();
                    assert!(lines.iter().all(|l| l.chars().count() == w), "{species} {emotion}");
                }
            }
        }
    }

    #[test]
    fn accessories_change_the_avatar() {
        let plain = avatar_lines(&view(Species::Cat, Emotion::Happy, None));
        let crowned = avatar_lines(&view(Species::Cat, Emotion::Happy, Some("Royal Crown")));
        assert_eq!(crowned.len(), plain.len() + 1);
        let shades = avatar_lines(&view(Species::Cat, Emotion::Happy, Some("sunglasses")));
        assert!(shades.iter().any(|l| l.contains('#')));
    }

    #[test]
    fn emotion_shows_on_the_face() {
        let sad = avatar_lines(&view(Species::Dog, Emotion::Sad, None)).join("\n");
        let happy = avatar_lines(&view(Species::Dog, Emotion::Happy, None)).join("\n");
        assert!(sad.contains('T'));
        assert_ne!(sad, happy);
    }

    #[test]
    fn sleepy_pets_stay_still() {
        assert!((0..200).all(|f| bounce_offset(f, Emotion::Sleepy) == 0));
        assert!((0..200).any(|f| bounce_offset(f, Emotion::Excited) != 0));
    }

    #[test]
    fn known_colors_map() {
        assert_eq!(color_for("Blue"), Color::Blue);
        assert_eq!(color_for("chartreuse"), Color::White);
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 5), vec![""]);
    }

    #[test]
    fn conversation_shows_latest_lines() {
        let mut buf = CellBuffer::new(30, 2);
        let history = vec![
            ConversationEntry::user("one", 0),
            ConversationEntry::pet("two", 0),
            ConversationEntry::user("three", 0),
        ];
        draw_conversation(&mut buf, &history, "Buddy", 0, 0, 30, 2);
        assert!(buf.row(0).starts_with("Buddy: two"));
        assert!(buf.row(1).starts_with("You: three"));
    }

    #[test]
    fn center_box_survives_tiny_terminals() {
        let mut buf = CellBuffer::new(5, 3);
        draw_center_box(&mut buf, "Title", "body");
        let mut buf = CellBuffer::new(40, 12);
        draw_center_box(&mut buf, "Title", "a long body line that wraps around");
        assert!(buf.cells.iter().any(|c| c.ch == '┌'));
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(0, 4), "[    ]");
        assert_eq!(bar(100, 4), "[████]");
        assert_eq!(bar(50, 4), "[██  ]");
    }
}
