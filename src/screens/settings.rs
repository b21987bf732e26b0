use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::config::{ThemeConfig, APP_VERSION};
use crate::error::MemoError;
use crate::glass::{EffectHost, GlassOptions, GlassStyle, LiquidGlass};
use crate::notes;
use crate::settings::{self, SettingUpdate, Settings, TextSize, BLUR_PRESETS};
use crate::store::Store;

use super::header_and_body;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    HapticFeedback,
    BlurIntensity,
    TextSize,
    ClearAll,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 4] = [
        SettingsRow::HapticFeedback,
        SettingsRow::BlurIntensity,
        SettingsRow::TextSize,
        SettingsRow::ClearAll,
    ];

    fn label(&self) -> &'static str {
        match self {
            SettingsRow::HapticFeedback => "Haptic Feedback",
            SettingsRow::BlurIntensity => "Blur Intensity",
            SettingsRow::TextSize => "Text Size",
            SettingsRow::ClearAll => "Clear All Notes",
        }
    }
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let i = options.iter().position(|o| *o == current).unwrap_or(0);
    let n = options.len();
    let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
    options[next]
}

pub struct SettingsScreen {
    settings: Settings,
    notes_count: usize,
    selected: usize,
    glass: LiquidGlass,
}

impl SettingsScreen {
    pub fn new(style: GlassStyle) -> Self {
        let settings = Settings::default();
        let mut glass = LiquidGlass::new(GlassOptions {
            blur_intensity: settings.glass_intensity(),
            glass_style: style,
            ..GlassOptions::default()
        });
        glass.stop();
        Self {
            settings,
            notes_count: 0,
            selected: 0,
            glass,
        }
    }

    fn sync_glass(&mut self) {
        let mut options = *self.glass.options();
        options.blur_intensity = self.settings.glass_intensity();
        self.glass.configure(options);
    }

    /// Reads settings and the note count. Either record falling back to its
    /// default still surfaces the load error.
    pub async fn activate(&mut self, store: &Store) -> Result<(), MemoError> {
        self.glass.start();
        let mut first_error = None;

        match settings::fetch_settings(store).await {
            Ok(s) => self.settings = s,
            Err(e) => {
                log::warn!("settings: using defaults: {}", e);
                self.settings = Settings::default();
                first_error = Some(e);
            }
        }
        match notes::load_notes(store).await {
            Ok(n) => self.notes_count = n.len(),
            Err(e) => {
                log::warn!("settings: could not count notes: {}", e);
                self.notes_count = 0;
                first_error.get_or_insert(e);
            }
        }
        self.sync_glass();

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
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

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notes_count(&self) -> usize {
        self.notes_count
    }

    pub fn selected_row(&self) -> SettingsRow {
        SettingsRow::ALL[self.selected]
    }

    pub fn move_selection(&mut self, delta: i32) {
        let last = SettingsRow::ALL.len() as i32 - 1;
        self.selected = (self.selected as i32 + delta).clamp(0, last) as usize;
    }

    /// The change that activating the selected row in `forward` direction
    /// would make. `ClearAll` needs confirmation and returns `None`.
    pub fn pending_update(&self, forward: bool) -> Option<SettingUpdate> {
        match self.selected_row() {
            SettingsRow::HapticFeedback => Some(SettingUpdate::HapticFeedback(
                !self.settings.haptic_feedback,
            )),
            SettingsRow::BlurIntensity => Some(SettingUpdate::BlurIntensity(cycle(
                &BLUR_PRESETS,
                self.settings.blur_intensity,
                forward,
            ))),
            SettingsRow::TextSize => Some(SettingUpdate::TextSize(cycle(
                &TextSize::ALL,
                self.settings.text_size,
                forward,
            ))),
            SettingsRow::ClearAll => None,
        }
    }

    pub async fn apply(&mut self, store: &Store, update: SettingUpdate) -> Result<(), MemoError> {
        let next = settings::update_setting(&self.settings, update);
        settings::save_settings(store, &next).await?;
        log::debug!("settings: applied {:?}", update);
        self.settings = next;
        self.sync_glass();
        Ok(())
    }

    pub async fn clear_all(&mut self, store: &Store) -> Result<(), MemoError> {
        notes::clear_notes(store).await?;
        log::info!("settings: cleared {} notes", self.notes_count);
        self.notes_count = 0;
        Ok(())
    }

    fn value_label(&self, row: SettingsRow) -> String {
        match row {
            SettingsRow::HapticFeedback => {
                if self.settings.haptic_feedback { "[on]" } else { "[off]" }.to_string()
            }
            SettingsRow::BlurIntensity => BLUR_PRESETS
                .iter()
                .map(|v| {
                    if *v == self.settings.blur_intensity {
                        format!("[{}%]", v)
                    } else {
                        format!(" {}% ", v)
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
            SettingsRow::TextSize => TextSize::ALL
                .iter()
                .map(|s| {
                    if *s == self.settings.text_size {
                        format!("[{}]", s.label())
                    } else {
                        format!(" {} ", s.label())
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
            SettingsRow::ClearAll => format!("{} notes", self.notes_count),
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, theme: &ThemeConfig) {
        let (header, body) = header_and_body(area, 3);
        let title = Line::styled(
            " Settings",
            Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
        );
        let subtitle = Line::styled(" Customize your experience", Style::default().fg(theme.muted));
        f.render_widget(Paragraph::new(vec![title, subtitle]), header);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Length(5), Constraint::Min(0)])
            .split(body);

        let prefs = Rect::new(
            chunks[0].x + 1,
            chunks[0].y,
            chunks[0].width.saturating_sub(2),
            chunks[0].height,
        );
        let panel = self.glass.panel(theme.background, theme.border).title(" Preferences ");
        let inner = panel.inner(prefs);
        f.render_widget(panel, prefs);

        let lines: Vec<Line> = SettingsRow::ALL
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let selected = i == self.selected;
                let marker = if selected { "> " } else { "  " };
                let label_style = match row {
                    SettingsRow::ClearAll => Style::default().fg(theme.danger),
                    _ => Style::default().fg(theme.foreground),
                };
                let label_style = if selected {
                    label_style.add_modifier(Modifier::BOLD).bg(theme.selection_bg)
                } else {
                    label_style
                };
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(theme.accent)),
                    Span::styled(format!("{:<18}", row.label()), label_style),
                    Span::styled(self.value_label(*row), Style::default().fg(theme.muted)),
                ])
            })
            .collect();
        f.render_widget(Paragraph::new(lines), inner);

        let about = Rect::new(
            chunks[1].x + 1,
            chunks[1].y,
            chunks[1].width.saturating_sub(2),
            chunks[1].height,
        );
        let panel = self.glass.panel(theme.background, theme.border).title(" About ");
        let inner = panel.inner(about);
        f.render_widget(panel, about);
        let text = vec![
            Line::styled(
                format!("GlassMemo {}", APP_VERSION),
                Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
            ),
            Line::styled(
                "Floating notes behind liquid glass",
                Style::default().fg(theme.muted),
            ),
        ];
        f.render_widget(Paragraph::new(text), inner);
    }
}
