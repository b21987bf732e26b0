//! A single draggable memo that floats over the note list.
//!
//! The widget owns no storage. Its owner hands it text and a position and
//! receives [`FloatingEvent`]s back when a drag is committed or an edit is
//! saved.

use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tui_textarea::{CursorMove, TextArea};

use crate::config::ThemeConfig;
use crate::glass::{EffectHost, GlassOptions, LiquidGlass};

pub const WIDGET_SIZE: (u16, u16) = (28, 7);
pub const EDIT_SIZE: (u16, u16) = (44, 12);
pub const LONG_PRESS: Duration = Duration::from_millis(500);
pub const PLACEHOLDER: &str = "Tap to edit...";

const DRAG_SCALE: f32 = 1.1;
const SPRING_RATE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatingEvent {
    PositionCommitted(Position),
    Saved(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Pressed { at: Position, since: Instant },
    Dragging { grab: Position, origin: Position },
}

pub struct FloatingNote {
    text: String,
    position: Position,
    gesture: Gesture,
    editor: Option<TextArea<'static>>,
    scale: f32,
    target_scale: f32,
    glass: LiquidGlass,
}

impl FloatingNote {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        Self {
            text: text.into(),
            position,
            gesture: Gesture::Idle,
            editor: None,
            scale: 1.0,
            target_scale: 1.0,
            glass: LiquidGlass::new(GlassOptions {
                blur_intensity: 0.9,
                corner_radius: 16,
                ..GlassOptions::default()
            }),
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn position(&self) -> Position {
        self.position
    }

    #[cfg(test)]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.gesture, Gesture::Pressed { .. })
    }

    /// Whether the widget needs animation ticks.
    pub fn is_animating(&self) -> bool {
        self.glass.is_animating()
            || self.is_pressed()
            || (self.scale - self.target_scale).abs() > 0.001
    }

    fn size(&self) -> (u16, u16) {
        if self.is_editing() {
            EDIT_SIZE
        } else {
            WIDGET_SIZE
        }
    }

    /// Screen rectangle of the widget inside `viewport`.
    pub fn rect(&self, viewport: Rect) -> Rect {
        let (w, h) = self.size();
        let w = w.min(viewport.width);
        let h = h.min(viewport.height);
        let x = clamp_axis(i32::from(self.position.x), viewport.x, viewport.width, w);
        let y = clamp_axis(i32::from(self.position.y), viewport.y, viewport.height, h);
        Rect::new(x, y, w, h)
    }

    pub fn contains(&self, at: Position, viewport: Rect) -> bool {
        let r = self.rect(viewport);
        at.x >= r.x && at.x < r.right() && at.y >= r.y && at.y < r.bottom()
    }

    pub fn press(&mut self, at: Position, now: Instant) {
        if self.is_editing() {
            return;
        }
        self.gesture = Gesture::Pressed { at, since: now };
    }

    /// Moves the widget with the pointer. Position is not clamped until
    /// release.
    pub fn drag_to(&mut self, at: Position) {
        let (grab, origin) = match self.gesture {
            Gesture::Pressed { at: grab, .. } => {
                self.target_scale = DRAG_SCALE;
                log::debug!("floating note drag started");
                (grab, self.position)
            }
            Gesture::Dragging { grab, origin } => (grab, origin),
            Gesture::Idle => return,
        };
        self.gesture = Gesture::Dragging { grab, origin };

        let dx = i32::from(at.x) - i32::from(grab.x);
        let dy = i32::from(at.y) - i32::from(grab.y);
        self.position = Position::new(
            (i32::from(origin.x) + dx).clamp(0, i32::from(u16::MAX)) as u16,
            (i32::from(origin.y) + dy).clamp(0, i32::from(u16::MAX)) as u16,
        );
    }

    /// Ends a gesture. A drag commits a final position that centres the
    /// widget under the pointer and keeps it inside `viewport`.
    pub fn release(&mut self, at: Position, viewport: Rect) -> Option<FloatingEvent> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if !matches!(gesture, Gesture::Dragging { .. }) {
            return None;
        }

        self.target_scale = 1.0;
        let (w, h) = WIDGET_SIZE;
        let x = clamp_axis(i32::from(at.x) - i32::from(w / 2), viewport.x, viewport.width, w);
        let y = clamp_axis(i32::from(at.y) - i32::from(h / 2), viewport.y, viewport.height, h);
        self.position = Position::new(x, y);
        Some(FloatingEvent::PositionCommitted(self.position))
    }

    /// Turns a press held for `LONG_PRESS` without moving into an edit.
    pub fn poll_long_press(&mut self, now: Instant) -> bool {
        match self.gesture {
            Gesture::Pressed { since, .. } if now.duration_since(since) >= LONG_PRESS => {
                self.begin_edit();
                true
            }
            _ => false,
        }
    }

    pub fn begin_edit(&mut self) {
        self.gesture = Gesture::Idle;
        let mut editor = TextArea::from(self.text.lines().map(str::to_string));
        editor.set_placeholder_text(PLACEHOLDER);
        editor.move_cursor(CursorMove::Bottom);
        editor.move_cursor(CursorMove::End);
        editor.set_block(Block::default().borders(Borders::TOP).title(" Edit Note "));
        self.editor = Some(editor);

        let options = GlassOptions {
            blur_intensity: 1.0,
            corner_radius: 20,
            ..*self.glass.options()
        };
        self.glass.configure(options);
    }

    pub fn input(&mut self, key: KeyEvent) {
        if let Some(editor) = self.editor.as_mut() {
            editor.input(key);
        }
    }

    #[cfg(test)]
    fn insert_str(&mut self, text: &str) {
        if let Some(editor) = self.editor.as_mut() {
            editor.insert_str(text);
        }
    }

    pub fn save(&mut self) -> Option<FloatingEvent> {
        let editor = self.editor.take()?;
        self.text = editor.lines().join("\n");
        self.restore_glass();
        Some(FloatingEvent::Saved(self.text.clone()))
    }

    pub fn cancel(&mut self) {
        if self.editor.take().is_some() {
            self.restore_glass();
        }
    }

    fn restore_glass(&mut self) {
        let options = GlassOptions {
            blur_intensity: 0.9,
            corner_radius: 16,
            ..*self.glass.options()
        };
        self.glass.configure(options);
    }

    pub fn advance(&mut self, dt: Duration) {
        let step = (dt.as_secs_f32() * SPRING_RATE).min(1.0);
        self.scale += (self.target_scale - self.scale) * step;
        if (self.scale - self.target_scale).abs() <= 0.001 {
            self.scale = self.target_scale;
        }
        self.glass.advance(dt);
    }

    /// Stops the sheen loop; called when the owning screen goes away.
    pub fn teardown(&mut self) {
        self.glass.stop();
        self.gesture = Gesture::Idle;
    }

    pub fn resume(&mut self) {
        if self.glass.options().liquid_animation {
            self.glass.start();
        }
    }

    pub fn render(&self, f: &mut Frame, viewport: Rect, theme: &ThemeConfig) {
        let mut area = self.rect(viewport);
        if self.scale > 1.05 {
            let grown = Rect::new(
                area.x.saturating_sub(1),
                area.y.saturating_sub(1),
                area.width + 2,
                area.height + 2,
            );
            area = grown.intersection(viewport);
        }

        let border = if self.is_dragging() {
            theme.accent
        } else {
            theme.border
        };
        let title = if self.is_editing() {
            " Esc: Cancel • Ctrl+S: Save "
        } else {
            " Floating Memo "
        };
        let panel = self.glass.panel(theme.background, border).title(title);
        let inner = panel.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(panel, area);

        if let Some(editor) = &self.editor {
            f.render_widget(editor, inner);
            return;
        }

        let body = if self.text.trim().is_empty() {
            Line::styled(PLACEHOLDER, Style::default().fg(theme.muted))
        } else {
            Line::styled(
                self.text.clone(),
                Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
            )
        };
        f.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }), inner);
    }
}

fn clamp_axis(value: i32, start: u16, len: u16, size: u16) -> u16 {
    let lo = i32::from(start);
    let hi = lo + i32::from(len.saturating_sub(size));
    value.clamp(lo, hi) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0, 0, 80, 24)
    }

    #[test]
    fn test_drag_updates_position_continuously() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        let t0 = Instant::now();
        note.press(Position::new(12, 6), t0);
        note.drag_to(Position::new(15, 8));
        assert!(note.is_dragging());
        assert_eq!(note.position(), Position::new(13, 7));

        note.drag_to(Position::new(20, 10));
        assert_eq!(note.position(), Position::new(18, 9));
    }

    #[test]
    fn test_release_commits_clamped_position() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        note.press(Position::new(11, 6), Instant::now());
        note.drag_to(Position::new(79, 23));

        let event = note.release(Position::new(79, 23), viewport());
        let committed = Position::new(80 - WIDGET_SIZE.0, 24 - WIDGET_SIZE.1);
        assert_eq!(event, Some(FloatingEvent::PositionCommitted(committed)));
        assert_eq!(note.position(), committed);
        assert!(!note.is_dragging());
    }

    #[test]
    fn test_release_near_origin_clamps_to_zero() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        note.press(Position::new(11, 6), Instant::now());
        note.drag_to(Position::new(1, 1));
        let event = note.release(Position::new(1, 1), viewport());
        assert_eq!(event, Some(FloatingEvent::PositionCommitted(Position::new(0, 0))));
    }

    #[test]
    fn test_release_respects_viewport_offset() {
        let vp = Rect::new(5, 3, 60, 20);
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        note.press(Position::new(11, 6), Instant::now());
        note.drag_to(Position::new(6, 4));
        assert_eq!(
            note.release(Position::new(6, 4), vp),
            Some(FloatingEvent::PositionCommitted(Position::new(5, 3)))
        );
    }

    #[test]
    fn test_tap_without_drag_commits_nothing() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        note.press(Position::new(11, 6), Instant::now());
        assert_eq!(note.release(Position::new(11, 6), viewport()), None);
        assert_eq!(note.position(), Position::new(10, 5));
    }

    #[test]
    fn test_long_press_enters_editing() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        let t0 = Instant::now();
        note.press(Position::new(11, 6), t0);
        assert!(!note.poll_long_press(t0 + Duration::from_millis(200)));
        assert!(!note.is_editing());
        assert!(note.poll_long_press(t0 + LONG_PRESS));
        assert!(note.is_editing());
        assert_eq!(note.rect(viewport()).width, EDIT_SIZE.0);
    }

    #[test]
    fn test_dragging_cancels_long_press() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        let t0 = Instant::now();
        note.press(Position::new(11, 6), t0);
        note.drag_to(Position::new(12, 6));
        assert!(!note.poll_long_press(t0 + Duration::from_secs(2)));
        assert!(!note.is_editing());
    }

    #[test]
    fn test_save_emits_edited_text() {
        let mut note = FloatingNote::new("hello", Position::default());
        note.begin_edit();
        note.insert_str(" world");
        let event = note.save();
        assert_eq!(event, Some(FloatingEvent::Saved("hello world".to_string())));
        assert_eq!(note.text(), "hello world");
        assert!(!note.is_editing());
        assert_eq!(note.save(), None);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut note = FloatingNote::new("hello", Position::default());
        note.begin_edit();
        note.insert_str("!!!");
        note.cancel();
        assert_eq!(note.text(), "hello");
        assert!(!note.is_editing());
    }

    #[test]
    fn test_press_ignored_while_editing() {
        let mut note = FloatingNote::new("hello", Position::default());
        note.begin_edit();
        note.press(Position::new(1, 1), Instant::now());
        note.drag_to(Position::new(30, 10));
        assert!(!note.is_dragging());
        assert_eq!(note.position(), Position::default());
    }

    #[test]
    fn test_scale_springs_up_while_dragging_and_back_after() {
        let mut note = FloatingNote::new("hello", Position::new(10, 5));
        note.press(Position::new(11, 6), Instant::now());
        note.drag_to(Position::new(14, 6));
        note.advance(Duration::from_secs(1));
        assert!((note.scale() - DRAG_SCALE).abs() < 1e-3);

        note.release(Position::new(14, 6), viewport());
        note.advance(Duration::from_millis(40));
        assert!(note.scale() < DRAG_SCALE && note.scale() > 1.0);
        note.advance(Duration::from_secs(1));
        assert!((note.scale() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_teardown_stops_animation() {
        let mut note = FloatingNote::new("hello", Position::default());
        assert!(note.is_animating());
        note.teardown();
        assert!(!note.is_animating());
        note.resume();
        assert!(note.is_animating());
    }

    #[test]
    fn test_contains_uses_clamped_rect() {
        let note = FloatingNote::new("hello", Position::new(70, 20));
        let vp = viewport();
        let r = note.rect(vp);
        assert_eq!(r.right(), 80);
        assert!(note.contains(Position::new(79, 23), vp));
        assert!(!note.contains(Position::new(0, 0), vp));
    }
}
