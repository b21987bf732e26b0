use std::time::Duration;

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::config::ThemeConfig;
use crate::error::MemoError;
use crate::glass::{EffectHost, GlassOptions, GlassStyle, LiquidGlass};
use crate::notes::{self, Note};
use crate::settings::{self, Settings, TextSize};
use crate::store::Store;

use super::header_and_body;

pub struct ListScreen {
    notes: Vec<Note>,
    settings: Settings,
    selected: Option<String>,
    expanded: Option<String>,
    scroll: usize,
    card_glass: LiquidGlass,
    empty_glass: LiquidGlass,
}

impl ListScreen {
    pub fn new(style: GlassStyle) -> Self {
        let mut card_glass = LiquidGlass::new(GlassOptions {
            blur_intensity: 1.0,
            glass_style: style,
            ..GlassOptions::default()
        });
        let mut empty_glass = LiquidGlass::new(GlassOptions {
            blur_intensity: 0.8,
            glass_style: style,
            ..GlassOptions::default()
        });
        // Surfaces run only while the screen is shown.
        card_glass.stop();
        empty_glass.stop();

        Self {
            notes: Vec::new(),
            settings: Settings::default(),
            selected: None,
            expanded: None,
            scroll: 0,
            card_glass,
            empty_glass,
        }
    }

    /// Loads a fresh snapshot. A corrupted notes record shows as an empty
    /// list and the error is still returned so the user sees an alert.
    pub async fn activate(&mut self, store: &Store) -> Result<(), MemoError> {
        self.card_glass.start();
        self.empty_glass.start();
        self.expanded = None;

        self.settings = match settings::fetch_settings(store).await {
            Ok(s) => s,
            Err(e) => {
                log::warn!("list: falling back to default settings: {}", e);
                Settings::default()
            }
        };

        match notes::load_notes(store).await {
            Ok(loaded) => {
                self.notes = loaded;
                self.fix_selection();
                Ok(())
            }
            Err(e) => {
                log::error!("list: failed to load notes: {}", e);
                self.notes.clear();
                self.fix_selection();
                Err(e.into())
            }
        }
    }

    pub fn deactivate(&mut self) {
        self.card_glass.stop();
        self.empty_glass.stop();
        self.notes.clear();
        self.selected = None;
        self.expanded = None;
        self.scroll = 0;
    }

    pub fn is_animating(&self) -> bool {
        self.card_glass.is_animating() || self.empty_glass.is_animating()
    }

    pub fn advance(&mut self, dt: Duration) {
        self.card_glass.advance(dt);
        self.empty_glass.advance(dt);
    }

    pub fn count(&self) -> usize {
        self.notes.len()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn displayed(&self) -> Vec<Note> {
        notes::sort_for_display(&self.notes)
    }

    pub fn selected_note(&self) -> Option<Note> {
        let id = self.selected.as_deref()?;
        self.notes.iter().find(|n| n.id == id).cloned()
    }

    fn selected_index(&self, displayed: &[Note]) -> Option<usize> {
        let id = self.selected.as_deref()?;
        displayed.iter().position(|n| n.id == id)
    }

    fn fix_selection(&mut self) {
        let displayed = self.displayed();
        if self.selected_index(&displayed).is_none() {
            self.selected = displayed.first().map(|n| n.id.clone());
        }
    }

    pub fn move_selection(&mut self, delta: i32) {
        let displayed = self.displayed();
        if displayed.is_empty() {
            return;
        }
        let current = self.selected_index(&displayed).unwrap_or(0) as i32;
        let next = (current + delta).clamp(0, displayed.len() as i32 - 1) as usize;
        self.selected = Some(displayed[next].id.clone());
    }

    /// Shows or hides the pin/delete row for the selected note.
    pub fn toggle_actions(&mut self) {
        self.expanded = match (&self.expanded, &self.selected) {
            (Some(open), Some(sel)) if open == sel => None,
            (_, sel) => sel.clone(),
        };
    }

    pub fn actions_open_for(&self, id: &str) -> bool {
        self.expanded.as_deref() == Some(id)
    }

    /// Flips the pin on the selected note. The snapshot only changes after
    /// the store accepted the new collection.
    pub async fn toggle_pin_selected(&mut self, store: &Store) -> Result<Option<bool>, MemoError> {
        let Some(id) = self.selected.clone() else {
            return Ok(None);
        };
        let updated = notes::toggle_pin(&self.notes, &id);
        notes::save_notes(store, &updated).await?;
        self.notes = updated;
        Ok(self.selected_note().map(|n| n.is_pinned))
    }

    pub async fn delete_selected(&mut self, store: &Store) -> Result<bool, MemoError> {
        let Some(id) = self.selected.clone() else {
            return Ok(false);
        };
        let displayed = self.displayed();
        let index = self.selected_index(&displayed).unwrap_or(0);

        let updated = notes::delete_note(&self.notes, &id);
        notes::save_notes(store, &updated).await?;
        self.notes = updated;
        if self.expanded.as_deref() == Some(id.as_str()) {
            self.expanded = None;
        }

        let displayed = self.displayed();
        self.selected = displayed
            .get(index.min(displayed.len().saturating_sub(1)))
            .map(|n| n.id.clone());
        Ok(true)
    }

    fn card_height(&self) -> u16 {
        self.settings.text_size.preview_lines() as u16 + 3
    }

    /// Draws the screen and returns the body area, which is where the
    /// floating memo may roam.
    pub fn render(&mut self, f: &mut Frame, area: Rect, theme: &ThemeConfig, now: i64) -> Rect {
        let (header, body) = header_and_body(area, 3);

        let title = Line::styled(
            " GlassMemo",
            Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
        );
        let subtitle = Line::styled(
            format!(" {} notes", self.count()),
            Style::default().fg(theme.muted),
        );
        f.render_widget(Paragraph::new(vec![title, subtitle]), header);

        let displayed = self.displayed();
        if displayed.is_empty() {
            self.render_empty(f, body, theme);
            return body;
        }

        let card_h = self.card_height();
        let visible = usize::from((body.height / card_h).max(1));
        let selected = self.selected_index(&displayed).unwrap_or(0);
        if selected < self.scroll {
            self.scroll = selected;
        } else if selected >= self.scroll + visible {
            self.scroll = selected + 1 - visible;
        }

        for (slot, (i, note)) in displayed
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible)
            .enumerate()
        {
            let y = body.y + slot as u16 * card_h;
            let height = card_h.min(body.bottom().saturating_sub(y));
            if height < 3 {
                break;
            }
            let card = Rect::new(body.x + 1, y, body.width.saturating_sub(2), height);
            self.render_card(f, card, note, i == selected, theme, now);
        }
        body
    }

    fn render_card(
        &self,
        f: &mut Frame,
        area: Rect,
        note: &Note,
        is_selected: bool,
        theme: &ThemeConfig,
        now: i64,
    ) {
        let border = if is_selected {
            theme.accent
        } else if note.is_pinned {
            theme.pinned
        } else {
            theme.border
        };
        let panel = self.card_glass.panel(theme.background, border);
        let inner = panel.inner(area);
        f.render_widget(panel, area);
        if inner.height == 0 {
            return;
        }

        let mut spans = Vec::new();
        if note.is_pinned {
            spans.push(Span::styled("⚑ ", Style::default().fg(theme.pinned)));
        }
        spans.push(Span::styled(
            notes::format_relative_date(note.created_at, now),
            Style::default().fg(theme.muted).add_modifier(Modifier::BOLD),
        ));
        let meta = Rect::new(inner.x, inner.y, inner.width, 1);
        f.render_widget(Paragraph::new(Line::from(spans)), meta);

        if self.actions_open_for(&note.id) {
            let pin_label = if note.is_pinned { "Unpin" } else { "Pin" };
            let actions = Line::from(vec![
                Span::styled(format!("[p] {}", pin_label), Style::default().fg(theme.accent)),
                Span::raw("  "),
                Span::styled("[d] Delete ", Style::default().fg(theme.danger)),
            ]);
            f.render_widget(Paragraph::new(actions).alignment(Alignment::Right), meta);
        }

        let mut content_style = Style::default().fg(theme.foreground);
        if self.settings.text_size == TextSize::Large {
            content_style = content_style.add_modifier(Modifier::BOLD);
        }
        let content = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            inner.height.saturating_sub(1),
        );
        f.render_widget(
            Paragraph::new(notes::preview_title(&note.content))
                .style(content_style)
                .wrap(Wrap { trim: true }),
            content,
        );
    }

    fn render_empty(&self, f: &mut Frame, body: Rect, theme: &ThemeConfig) {
        let area = Rect::new(
            body.x + 1,
            body.y,
            body.width.saturating_sub(2),
            body.height.min(8),
        );
        let panel = self.empty_glass.panel(theme.background, theme.border);
        let inner = panel.inner(area);
        f.render_widget(panel, area);

        let text = vec![
            Line::raw(""),
            Line::styled(
                "No notes yet",
                Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
            ),
            Line::styled(
                "Press n to create your first floating memo",
                Style::default().fg(theme.muted),
            ),
        ];
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }
}
