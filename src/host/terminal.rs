//! Terminal host - draws the host tree to the terminal with crossterm.
//!
//! Recognized tags:
//! - `box` - block container; opens its own line group
//! - `text` - inline styled run
//! - `button` - focusable inline control, drawn as `[ label ]`
//!
//! Layout is deliberately minimal: boxes stack vertically, inline
//! content flows left to right. Style fields understood: `color`,
//! `background`, `bold`, `dim`, `italic`, `underline`.
//!
//! Focus moves over buttons in tree order (Tab / Shift+Tab) and is
//! tracked by position, not node id - the engine rebuilds the subtree
//! on every render, so ids never survive a pass. Mouse clicks resolve
//! through hit regions recorded at draw time.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::cursor::{self, Hide, MoveTo, MoveToColumn, MoveToPreviousLine, Show};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use tracing::{debug, trace};
use unicode_width::UnicodeWidthStr;

use super::memory::MemoryHost;
use super::{Host, NodeId};
use crate::types::{Event, EventHandler, HostError, Value};

/// Tags this host knows how to draw.
const KNOWN_TAGS: &[&str] = &["box", "text", "button"];

bitflags::bitflags! {
    /// Text attribute set for one styled span.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextAttrs: u8 {
        const BOLD      = 1 << 0;
        const DIM       = 1 << 1;
        const ITALIC    = 1 << 2;
        const UNDERLINE = 1 << 3;
        const REVERSE   = 1 << 4;
    }
}

/// How frames are written to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Draw below the shell prompt, repainting in place.
    #[default]
    Inline,
    /// Alternate screen, full terminal.
    Fullscreen,
}

#[derive(Debug, Clone)]
pub struct TerminalOptions {
    pub mode: RenderMode,
    pub mouse: bool,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Inline,
            mouse: true,
        }
    }
}

/// What `handle_input` did with a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Ignored,
    Handled,
    Quit,
}

// =============================================================================
// Frame Model
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct SpanStyle {
    fg: Option<Color>,
    bg: Option<Color>,
    attrs: TextAttrs,
}

#[derive(Debug, Clone, PartialEq)]
struct Span {
    text: String,
    style: SpanStyle,
    /// Hit target for clickable spans.
    node: Option<NodeId>,
}

type Line = Vec<Span>;

/// Clickable screen region, frame-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HitRegion {
    row: u16,
    col_start: u16,
    col_end: u16,
    node: NodeId,
}

struct TermState {
    options: TerminalOptions,
    root: NodeId,
    entered: bool,
    /// Height of the previously drawn frame (inline repaint).
    prev_height: u16,
    /// Terminal row the current frame starts at.
    frame_row: u16,
    /// Focus position within the button order.
    focus: Option<usize>,
    hits: Vec<HitRegion>,
}

// =============================================================================
// TerminalHost
// =============================================================================

/// Host that renders the tree to a terminal.
///
/// Cheap to clone; all clones share the same tree and terminal state.
#[derive(Clone)]
pub struct TerminalHost {
    tree: MemoryHost,
    state: Rc<RefCell<TermState>>,
}

impl TerminalHost {
    pub fn new(options: TerminalOptions) -> Self {
        let tree = MemoryHost::new();
        let root = tree.create_root();
        Self {
            tree,
            state: Rc::new(RefCell::new(TermState {
                options,
                root,
                entered: false,
                prev_height: 0,
                frame_row: 0,
                focus: None,
                hits: Vec::new(),
            })),
        }
    }

    /// The container node renders attach to.
    pub fn root(&self) -> NodeId {
        self.state.borrow().root
    }

    /// The backing tree, for inspection.
    pub fn tree(&self) -> &MemoryHost {
        &self.tree
    }

    // -------------------------------------------------------------------------
    // Terminal lifecycle
    // -------------------------------------------------------------------------

    /// Take over the terminal: raw mode, cursor hidden, optional
    /// alternate screen and mouse capture.
    pub fn enter(&self) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if state.entered {
            return Ok(());
        }
        enable_raw_mode()?;
        let mut out = io::stdout();
        if state.options.mode == RenderMode::Fullscreen {
            execute!(out, EnterAlternateScreen)?;
        }
        execute!(out, Hide)?;
        if state.options.mouse {
            execute!(out, EnableMouseCapture)?;
        }
        state.entered = true;
        debug!(mode = ?state.options.mode, "terminal entered");
        Ok(())
    }

    /// Restore the terminal. Idempotent.
    pub fn leave(&self) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.entered {
            return Ok(());
        }
        let mut out = io::stdout();
        if state.options.mouse {
            execute!(out, DisableMouseCapture)?;
        }
        execute!(out, Show)?;
        if state.options.mode == RenderMode::Fullscreen {
            execute!(out, LeaveAlternateScreen)?;
        }
        disable_raw_mode()?;
        state.entered = false;
        debug!("terminal restored");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    fn focusables(&self) -> Vec<NodeId> {
        let root = self.state.borrow().root;
        self.tree.find_all(root, "button")
    }

    /// Currently focused button, if any.
    pub fn focused(&self) -> Option<NodeId> {
        let focusables = self.focusables();
        let focus = self.state.borrow().focus?;
        focusables.get(focus.min(focusables.len().checked_sub(1)?)).copied()
    }

    pub fn focus_next(&self) {
        let count = self.focusables().len();
        if count == 0 {
            self.state.borrow_mut().focus = None;
            return;
        }
        let mut state = self.state.borrow_mut();
        state.focus = Some(match state.focus {
            Some(i) => (i + 1) % count,
            None => 0,
        });
    }

    pub fn focus_previous(&self) {
        let count = self.focusables().len();
        if count == 0 {
            self.state.borrow_mut().focus = None;
            return;
        }
        let mut state = self.state.borrow_mut();
        state.focus = Some(match state.focus {
            Some(i) => (i + count - 1) % count,
            None => count - 1,
        });
    }

    /// Click the focused button. Returns listeners invoked.
    pub fn activate_focused(&self) -> usize {
        match self.focused() {
            Some(node) => self.tree.dispatch(node, &Event::new("click")),
            None => 0,
        }
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Translate one crossterm event into host actions.
    pub fn handle_input(&self, event: &TermEvent) -> InputOutcome {
        match event {
            TermEvent::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            TermEvent::Mouse(mouse) => self.handle_mouse(mouse),
            TermEvent::Resize(_, _) => InputOutcome::Handled,
            _ => InputOutcome::Ignored,
        }
    }

    fn handle_key(&self, key: &KeyEvent) -> InputOutcome {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputOutcome::Quit
            }
            KeyCode::Char('q') | KeyCode::Esc => InputOutcome::Quit,
            KeyCode::Tab => {
                self.focus_next();
                InputOutcome::Handled
            }
            KeyCode::BackTab => {
                self.focus_previous();
                InputOutcome::Handled
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.activate_focused() > 0 {
                    InputOutcome::Handled
                } else {
                    InputOutcome::Ignored
                }
            }
            _ => InputOutcome::Ignored,
        }
    }

    fn handle_mouse(&self, mouse: &MouseEvent) -> InputOutcome {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return InputOutcome::Ignored;
        }
        let target = {
            let state = self.state.borrow();
            let row = mouse.row.saturating_sub(state.frame_row);
            state
                .hits
                .iter()
                .find(|hit| {
                    hit.row == row && mouse.column >= hit.col_start && mouse.column < hit.col_end
                })
                .map(|hit| hit.node)
        };
        let Some(node) = target else {
            return InputOutcome::Ignored;
        };
        // Clicking also moves focus to the button.
        if let Some(index) = self.focusables().iter().position(|id| *id == node) {
            self.state.borrow_mut().focus = Some(index);
        }
        self.tree.dispatch(node, &Event::new("click"));
        InputOutcome::Handled
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Lay the tree out into styled lines plus hit regions. Pure with
    /// respect to the terminal.
    fn render_frame(&self) -> (Vec<Line>, Vec<HitRegion>) {
        let root = self.state.borrow().root;
        let focused = self.focused();

        let mut layout = Layout::default();
        for child in self.tree.children(root) {
            self.walk(child, SpanStyle::default(), focused, &mut layout);
        }
        layout.flush();

        let mut hits = Vec::new();
        for (row, line) in layout.lines.iter().enumerate() {
            let mut col: u16 = 0;
            for span in line {
                let width = UnicodeWidthStr::width(span.text.as_str()) as u16;
                if let Some(node) = span.node {
                    hits.push(HitRegion {
                        row: row as u16,
                        col_start: col,
                        col_end: col + width,
                        node,
                    });
                }
                col += width;
            }
        }
        (layout.lines, hits)
    }

    fn walk(&self, id: NodeId, inherited: SpanStyle, focused: Option<NodeId>, out: &mut Layout) {
        if let Some(content) = self.tree.text(id) {
            for (i, part) in content.split('\n').enumerate() {
                if i > 0 {
                    out.flush();
                }
                if !part.is_empty() {
                    out.push(Span {
                        text: part.to_string(),
                        style: inherited,
                        node: None,
                    });
                }
            }
            return;
        }

        let Some(tag) = self.tree.tag(id) else { return };
        let style = apply_styles(inherited, &self.tree.styles(id));

        match tag.as_str() {
            "button" => {
                let mut style = style;
                if focused == Some(id) {
                    style.attrs |= TextAttrs::REVERSE;
                }
                out.push(Span {
                    text: format!("[ {} ]", self.tree.text_content(id)),
                    style,
                    node: Some(id),
                });
            }
            "box" => {
                out.flush();
                for child in self.tree.children(id) {
                    self.walk(child, style, focused, out);
                }
                out.flush();
            }
            // "text" and the root container flow inline.
            _ => {
                for child in self.tree.children(id) {
                    self.walk(child, style, focused, out);
                }
            }
        }
    }

    /// Write the current tree to the terminal and refresh hit regions.
    pub fn draw(&self) -> Result<(), HostError> {
        let (lines, hits) = self.render_frame();
        let mut out = io::stdout();
        let mut state = self.state.borrow_mut();

        match state.options.mode {
            RenderMode::Fullscreen => {
                queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
                state.frame_row = 0;
            }
            RenderMode::Inline => {
                if state.prev_height > 0 {
                    queue!(out, MoveToPreviousLine(state.prev_height))?;
                }
                queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
                out.flush()?;
                state.frame_row = cursor::position().map(|(_, row)| row).unwrap_or(0);
            }
        }

        for line in &lines {
            for span in line {
                if let Some(fg) = span.style.fg {
                    queue!(out, SetForegroundColor(fg))?;
                }
                if let Some(bg) = span.style.bg {
                    queue!(out, SetBackgroundColor(bg))?;
                }
                for attr in attributes(span.style.attrs) {
                    queue!(out, SetAttribute(attr))?;
                }
                queue!(out, Print(&span.text))?;
                queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
            }
            queue!(out, Print("\r\n"))?;
        }
        out.flush()?;

        state.prev_height = lines.len() as u16;
        state.hits = hits;
        trace!(height = lines.len(), "frame drawn");
        Ok(())
    }
}

// =============================================================================
// Host Implementation
// =============================================================================

impl Host for TerminalHost {
    fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
        if !KNOWN_TAGS.contains(&tag) {
            return Err(HostError::UnknownTag(tag.to_string()));
        }
        self.tree.create_element(tag)
    }

    fn create_text(&self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    fn append(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.tree.append(parent, child)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &Value) {
        self.tree.set_attribute(node, name, value);
    }

    fn set_style(&self, node: NodeId, field: &str, value: &str) {
        self.tree.set_style(node, field, value);
    }

    fn set_class(&self, node: NodeId, class: &str) {
        self.tree.set_class(node, class);
    }

    fn add_listener(&self, node: NodeId, event: &str, handler: EventHandler) {
        self.tree.add_listener(node, event, handler);
    }

    fn clear_children(&self, node: NodeId) {
        self.tree.clear_children(node);
    }
}

// =============================================================================
// Styling
// =============================================================================

fn apply_styles(mut style: SpanStyle, fields: &[(String, String)]) -> SpanStyle {
    for (field, value) in fields {
        match field.as_str() {
            "color" => {
                if let Some(color) = parse_color(value) {
                    style.fg = Some(color);
                }
            }
            "background" => {
                if let Some(color) = parse_color(value) {
                    style.bg = Some(color);
                }
            }
            "bold" => style.attrs.set(TextAttrs::BOLD, truthy(value)),
            "dim" => style.attrs.set(TextAttrs::DIM, truthy(value)),
            "italic" => style.attrs.set(TextAttrs::ITALIC, truthy(value)),
            "underline" => style.attrs.set(TextAttrs::UNDERLINE, truthy(value)),
            _ => {}
        }
    }
    style
}

fn truthy(value: &str) -> bool {
    !matches!(value, "" | "false" | "0" | "none" | "off")
}

/// Parse a named or `#rrggbb` color.
fn parse_color(value: &str) -> Option<Color> {
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Color::Rgb { r, g, b });
        }
        return None;
    }
    match value {
        "black" => Some(Color::Black),
        "red" => Some(Color::DarkRed),
        "green" => Some(Color::DarkGreen),
        "yellow" => Some(Color::DarkYellow),
        "blue" => Some(Color::DarkBlue),
        "magenta" => Some(Color::DarkMagenta),
        "cyan" => Some(Color::DarkCyan),
        "white" => Some(Color::White),
        "grey" | "gray" => Some(Color::Grey),
        "bright-red" => Some(Color::Red),
        "bright-green" => Some(Color::Green),
        "bright-yellow" => Some(Color::Yellow),
        "bright-blue" => Some(Color::Blue),
        "bright-magenta" => Some(Color::Magenta),
        "bright-cyan" => Some(Color::Cyan),
        _ => None,
    }
}

fn attributes(attrs: TextAttrs) -> impl Iterator<Item = Attribute> {
    [
        (TextAttrs::BOLD, Attribute::Bold),
        (TextAttrs::DIM, Attribute::Dim),
        (TextAttrs::ITALIC, Attribute::Italic),
        (TextAttrs::UNDERLINE, Attribute::Underlined),
        (TextAttrs::REVERSE, Attribute::Reverse),
    ]
    .into_iter()
    .filter(move |(flag, _)| attrs.contains(*flag))
    .map(|(_, attr)| attr)
}

// =============================================================================
// Layout Accumulator
// =============================================================================

#[derive(Default)]
struct Layout {
    lines: Vec<Line>,
    current: Line,
}

impl Layout {
    fn push(&mut self, span: Span) {
        self.current.push(span);
    }

    /// Close the current line if it holds anything.
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }
}
