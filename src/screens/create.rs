use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tui_textarea::TextArea;

use crate::config::ThemeConfig;
use crate::error::{MemoError, ValidationError};
use crate::glass::{EffectHost, GlassOptions, GlassStyle, LiquidGlass};
use crate::notes::{self, MAX_CONTENT_CHARS};
use crate::store::Store;

use super::header_and_body;

const EDITOR_PLACEHOLDER: &str = "What's on your mind?";

pub struct CreateScreen {
    editor: TextArea<'static>,
    glass: LiquidGlass,
}

impl CreateScreen {
    pub fn new(style: GlassStyle) -> Self {
        let mut glass = LiquidGlass::new(GlassOptions {
            blur_intensity: 0.9,
            glass_style: style,
            ..GlassOptions::default()
        });
        glass.stop();
        let mut screen = Self {
            editor: TextArea::default(),
            glass,
        };
        screen.setup_editor();
        screen
    }

    fn setup_editor(&mut self) {
        self.editor.set_placeholder_text(EDITOR_PLACEHOLDER);
        self.editor
            .set_cursor_line_style(Style::default().remove_modifier(Modifier::UNDERLINED));
    }

    /// The draft survives navigation; only the glass stops.
    pub fn activate(&mut self) {
        self.glass.start();
    }

    pub fn deactivate(&mut self) {
        self.glass.stop();
    }

    pub fn is_animating(&self) -> bool {
        self.glass.is_animating()
    }

    pub fn advance(&mut self, dt: Duration) {
        self.glass.advance(dt);
    }

    pub fn content(&self) -> String {
        self.editor.lines().join("\n")
    }

    pub fn char_count(&self) -> usize {
        self.editor
            .lines()
            .iter()
            .map(|l| l.chars().count())
            .sum::<usize>()
            + self.editor.lines().len().saturating_sub(1)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.editor.lines().iter().all(|l| l.is_empty())
    }

    /// Feeds a key to the editor. Any edit that leaves the draft past the
    /// content limit is undone, whichever binding produced it.
    pub fn input(&mut self, key: KeyEvent) {
        if self.editor.input(key) && self.char_count() > MAX_CONTENT_CHARS {
            self.editor.undo();
        }
    }

    pub fn paste(&mut self, text: &str) {
        let room = MAX_CONTENT_CHARS.saturating_sub(self.char_count());
        let text: String = text.replace('\r', "").chars().take(room).collect();
        if !text.is_empty() {
            self.editor.insert_str(text);
        }
    }

    pub fn clear(&mut self) {
        self.editor = TextArea::default();
        self.setup_editor();
    }

    /// Validates the draft, then re-reads the stored collection, prepends
    /// the new note and writes it back. The draft is cleared only after the
    /// write succeeded.
    pub async fn save(&mut self, store: &Store, now: i64) -> Result<(), MemoError> {
        let content = self.content();
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }

        let existing = notes::load_notes(store).await?;
        let updated = notes::add_note(&existing, &content, now)?;
        notes::save_notes(store, &updated).await?;
        log::info!("create: saved note ({} notes stored)", updated.len());
        self.clear();
        Ok(())
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, theme: &ThemeConfig) {
        let (header, body) = header_and_body(area, 3);

        let title = Line::styled(
            " New Note",
            Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
        );
        let subtitle = Line::styled(
            " Capture your thoughts",
            Style::default().fg(theme.muted),
        );
        f.render_widget(Paragraph::new(vec![title, subtitle]), header);

        let card = Rect::new(
            body.x + 1,
            body.y,
            body.width.saturating_sub(2),
            body.height,
        );
        let panel = self.glass.panel(theme.background, theme.accent);
        let inner = panel.inner(card);
        f.render_widget(panel, card);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        self.editor.set_block(
            Block::default()
                .borders(Borders::NONE)
                .style(Style::default().fg(theme.foreground)),
        );
        self.editor
            .set_placeholder_style(Style::default().fg(theme.muted));
        f.render_widget(&self.editor, chunks[0]);

        let count = self.char_count();
        let count_style = if count >= MAX_CONTENT_CHARS {
            Style::default().fg(theme.danger)
        } else {
            Style::default().fg(theme.muted)
        };
        f.render_widget(
            Paragraph::new(format!("{}/{}", count, MAX_CONTENT_CHARS))
                .style(count_style)
                .alignment(Alignment::Right),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::notes::{load_notes, save_notes, Note, NOTES_KEY};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn type_text(screen: &mut CreateScreen, text: &str) {
        for c in text.chars() {
            let code = if c == '\n' {
                KeyCode::Enter
            } else {
                KeyCode::Char(c)
            };
            screen.input(KeyEvent::new(code, KeyModifiers::NONE));
        }
    }

    #[tokio::test]
    async fn test_save_prepends_to_existing_notes() {
        let store = Store::open_in_memory().unwrap();
        save_notes(&store, &[Note::new("older", 1)]).await.unwrap();

        let mut screen = CreateScreen::new(GlassStyle::Dark);
        type_text(&mut screen, "  Buy milk  ");
        screen.save(&store, 10).await.unwrap();

        let stored = load_notes(&store).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content, "Buy milk");
        assert_eq!(stored[0].created_at, 10);
        assert!(!stored[0].is_pinned);
        assert!(screen.is_empty());
    }

    #[tokio::test]
    async fn test_blank_draft_is_rejected_without_touching_store() {
        let mut screen = CreateScreen::new(GlassStyle::Dark);
        type_text(&mut screen, "   \n  ");

        // A disconnected store would fail any access.
        let err = screen.save(&Store::disconnected(), 0).await.unwrap_err();
        assert!(matches!(
            err,
            MemoError::Validation(ValidationError::EmptyContent)
        ));
        assert!(!screen.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_draft() {
        let mut screen = CreateScreen::new(GlassStyle::Dark);
        type_text(&mut screen, "keep me");

        let err = screen.save(&Store::disconnected(), 0).await.unwrap_err();
        assert!(matches!(err, MemoError::Storage(StorageError::Unavailable)));
        assert_eq!(screen.content(), "keep me");
    }

    #[tokio::test]
    async fn test_corrupted_collection_is_not_overwritten() {
        let store = Store::open_in_memory().unwrap();
        store.set(NOTES_KEY, "not json").await.unwrap();

        let mut screen = CreateScreen::new(GlassStyle::Dark);
        type_text(&mut screen, "hello");
        assert!(screen.save(&store, 0).await.is_err());
        assert_eq!(
            store.get(NOTES_KEY).await.unwrap().as_deref(),
            Some("not json")
        );
    }

    #[test]
    fn test_input_stops_at_limit() {
        let mut screen = CreateScreen::new(GlassStyle::Dark);
        screen.paste(&"x".repeat(MAX_CONTENT_CHARS + 50));
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS);

        type_text(&mut screen, "y");
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS);

        screen.input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS - 1);
    }

    #[test]
    fn test_control_bindings_cannot_grow_past_limit() {
        let mut screen = CreateScreen::new(GlassStyle::Dark);
        screen.paste(&"x".repeat(MAX_CONTENT_CHARS));
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);

        // Ctrl+M inserts a newline.
        screen.input(ctrl('m'));
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS);
        assert_eq!(screen.content(), "x".repeat(MAX_CONTENT_CHARS));

        // Cut the whole line, yank it back, then yank a second copy.
        screen.input(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE));
        screen.input(KeyEvent::new(KeyCode::Home, KeyModifiers::NONE));
        screen.input(ctrl('k'));
        assert_eq!(screen.char_count(), 0);
        screen.input(ctrl('y'));
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS);
        screen.input(ctrl('y'));
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS);

        // Editing below the limit still works afterwards.
        screen.input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        type_text(&mut screen, "\n");
        assert_eq!(screen.char_count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_char_count_includes_line_breaks() {
        let mut screen = CreateScreen::new(GlassStyle::Dark);
        type_text(&mut screen, "ab\ncd");
        assert_eq!(screen.content(), "ab\ncd");
        assert_eq!(screen.char_count(), 5);
    }

    #[test]
    fn test_clear_and_glass_lifecycle() {
        let mut screen = CreateScreen::new(GlassStyle::Dark);
        assert!(!screen.is_animating());
        screen.activate();
        assert!(screen.is_animating());

        type_text(&mut screen, "draft");
        screen.deactivate();
        assert!(!screen.is_animating());
        assert_eq!(screen.content(), "draft");

        screen.clear();
        assert!(screen.is_empty());
    }
}
