use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tokio::time;

use crate::config::{AppConfig, ThemeConfig};
use crate::error::{Alert, MemoError};
use crate::floating::{FloatingEvent, FloatingNote, Position};
use crate::notes;
use crate::screens::settings::SettingsRow;
use crate::screens::{centered_rect, CreateScreen, ListScreen, ScreenKind, SettingsScreen};
use crate::store::Store;

const FLASH: Duration = Duration::from_millis(300);
const CLOCK_TICK: Duration = Duration::from_secs(60);
const MAX_FRAME_STEP: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Paste(String),
    AnimationTick,
    ClockTick,
}

/// Terminal stand-in for device haptics: a bell and a short footer pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Light,
    Medium,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmAction {
    ClearDraft,
    ClearAllNotes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Dialog {
    Alert(Alert),
    Confirm {
        title: String,
        message: String,
        confirm_label: &'static str,
        action: ConfirmAction,
    },
}

pub struct App {
    store: Store,
    config: AppConfig,
    theme: ThemeConfig,
    active: ScreenKind,
    list: ListScreen,
    create: CreateScreen,
    settings: SettingsScreen,
    floating: FloatingNote,
    show_floating: bool,
    floating_viewport: Rect,
    dialog: Option<Dialog>,
    haptics_enabled: bool,
    flash: Option<(Feedback, Instant)>,
    bell_pending: bool,
    last_frame: Instant,
}

fn jump_target(key: &KeyEvent) -> Option<ScreenKind> {
    match key.code {
        KeyCode::Char('1') => Some(ScreenKind::List),
        KeyCode::Char('2') => Some(ScreenKind::Create),
        KeyCode::Char('3') => Some(ScreenKind::Settings),
        _ => None,
    }
}

impl App {
    pub async fn new(store: Store, config: AppConfig) -> Self {
        let style = config.glass_style();
        let show_floating = config.general.floating_widget;
        let mut floating = FloatingNote::new(String::new(), Position::new(2, 4));
        floating.teardown();

        let mut app = Self {
            store,
            theme: config.theme(),
            config,
            active: ScreenKind::List,
            list: ListScreen::new(style),
            create: CreateScreen::new(style),
            settings: SettingsScreen::new(style),
            floating,
            show_floating,
            floating_viewport: Rect::default(),
            dialog: None,
            haptics_enabled: true,
            flash: None,
            bell_pending: false,
            last_frame: Instant::now(),
        };
        app.enter(ScreenKind::List).await;
        app
    }

    /// Whether any mounted surface or gesture wants animation ticks.
    pub fn is_animating(&self) -> bool {
        let screen = match self.active {
            ScreenKind::List => {
                self.list.is_animating() || (self.show_floating && self.floating.is_animating())
            }
            ScreenKind::Create => self.create.is_animating(),
            ScreenKind::Settings => self.settings.is_animating(),
        };
        screen || self.flash.is_some()
    }

    async fn enter(&mut self, kind: ScreenKind) {
        self.active = kind;
        self.last_frame = Instant::now();
        let result = match kind {
            ScreenKind::List => {
                let r = self.list.activate(&self.store).await;
                self.haptics_enabled = self.list.settings().haptic_feedback;
                if self.show_floating {
                    self.floating.resume();
                }
                r.map_err(|e| (e, "load notes"))
            }
            ScreenKind::Create => {
                self.create.activate();
                Ok(())
            }
            ScreenKind::Settings => {
                let r = self.settings.activate(&self.store).await;
                self.haptics_enabled = self.settings.settings().haptic_feedback;
                r.map_err(|e| (e, "load settings"))
            }
        };
        if let Err((e, action)) = result {
            self.fail(e, action);
        }
    }

    fn leave(&mut self) {
        match self.active {
            ScreenKind::List => {
                self.list.deactivate();
                self.floating.cancel();
                self.floating.teardown();
            }
            ScreenKind::Create => self.create.deactivate(),
            ScreenKind::Settings => self.settings.deactivate(),
        }
    }

    pub async fn navigate(&mut self, kind: ScreenKind) {
        if kind == self.active {
            return;
        }
        log::debug!("navigate {:?} -> {:?}", self.active, kind);
        self.leave();
        self.enter(kind).await;
    }

    fn fail(&mut self, err: MemoError, action: &str) {
        match &err {
            MemoError::Storage(e) => log::error!("failed to {}: {}", action, e),
            MemoError::Validation(e) => log::info!("rejected {}: {}", action, e),
        }
        self.dialog = Some(Dialog::Alert(err.alert(action)));
    }

    fn haptic(&mut self, feedback: Feedback) {
        if !self.haptics_enabled {
            return;
        }
        self.bell_pending = true;
        self.flash = Some((feedback, Instant::now() + FLASH));
    }

    fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    fn toggle_floating(&mut self) {
        self.show_floating = !self.show_floating;
        if self.show_floating {
            self.floating.resume();
        } else {
            self.floating.cancel();
            self.floating.teardown();
        }
    }

    fn on_floating_event(&mut self, event: FloatingEvent) {
        match event {
            FloatingEvent::PositionCommitted(p) => {
                log::debug!("floating note moved to {},{}", p.x, p.y);
            }
            FloatingEvent::Saved(text) => {
                log::debug!("floating note edited ({} chars)", text.chars().count());
                self.haptic(Feedback::Light);
            }
        }
    }

    async fn save_draft(&mut self) {
        match self.create.save(&self.store, notes::now_millis()).await {
            Ok(()) => {
                self.haptic(Feedback::Success);
                self.navigate(ScreenKind::List).await;
            }
            Err(e) => {
                self.haptic(Feedback::Error);
                self.fail(e, "save note");
            }
        }
    }

    async fn confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::ClearDraft => {
                self.create.clear();
                self.haptic(Feedback::Light);
            }
            ConfirmAction::ClearAllNotes => match self.settings.clear_all(&self.store).await {
                Ok(()) => {
                    self.haptic(Feedback::Success);
                    self.dialog = Some(Dialog::Alert(Alert::new(
                        "Success",
                        "All notes have been deleted.",
                    )));
                }
                Err(e) => self.fail(e, "delete notes"),
            },
        }
    }

    async fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.dialog.clone() else {
            return;
        };
        match dialog {
            Dialog::Alert(_) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.dialog = None;
                }
            }
            Dialog::Confirm { action, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.dialog = None;
                    self.confirm(action).await;
                }
                KeyCode::Char('n') | KeyCode::Esc => self.dialog = None,
                _ => {}
            },
        }
    }

    async fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.dialog.is_some() {
            self.handle_dialog_key(key).await;
            return false;
        }

        if self.active == ScreenKind::List && self.floating.is_editing() {
            match key.code {
                KeyCode::Esc => self.floating.cancel(),
                KeyCode::Char('s') if ctrl => {
                    if let Some(event) = self.floating.save() {
                        self.on_floating_event(event);
                    }
                }
                _ => self.floating.input(key),
            }
            return false;
        }

        match key.code {
            KeyCode::Tab => {
                self.navigate(self.active.next()).await;
                return false;
            }
            KeyCode::BackTab => {
                self.navigate(self.active.prev()).await;
                return false;
            }
            _ => {}
        }

        // Alt+digit jumps from every screen, including Create where plain
        // digits are typed into the draft.
        if key.modifiers.contains(KeyModifiers::ALT) {
            if let Some(target) = jump_target(&key) {
                self.navigate(target).await;
                return false;
            }
        }

        match self.active {
            ScreenKind::List => self.handle_list_key(key).await,
            ScreenKind::Create => {
                self.handle_create_key(key).await;
                false
            }
            ScreenKind::Settings => self.handle_settings_key(key).await,
        }
    }

    async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        if let Some(kind) = jump_target(&key) {
            self.navigate(kind).await;
            return false;
        }
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => self.list.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.list.move_selection(-1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.list.selected_note().is_some() {
                    self.haptic(Feedback::Medium);
                }
                self.list.toggle_actions();
            }
            KeyCode::Char('p') => {
                if self.list.selected_note().is_some() {
                    self.haptic(Feedback::Light);
                }
                if let Err(e) = self.list.toggle_pin_selected(&self.store).await {
                    self.fail(e, "update note");
                }
            }
            KeyCode::Char('d') => {
                if self.list.selected_note().is_some() {
                    self.haptic(Feedback::Medium);
                }
                if let Err(e) = self.list.delete_selected(&self.store).await {
                    self.fail(e, "delete note");
                }
            }
            KeyCode::Char('n') => self.navigate(ScreenKind::Create).await,
            KeyCode::Char('f') => self.toggle_floating(),
            KeyCode::Char('e') if self.show_floating => self.floating.begin_edit(),
            _ => {}
        }
        false
    }

    async fn handle_create_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.navigate(ScreenKind::List).await,
            KeyCode::Char('s') if ctrl => self.save_draft().await,
            KeyCode::Char('l') if ctrl => {
                if self.create.content().trim().is_empty() {
                    self.create.clear();
                } else {
                    self.dialog = Some(Dialog::Confirm {
                        title: "Clear Note".to_string(),
                        message: "Are you sure you want to clear this note?".to_string(),
                        confirm_label: "Clear",
                        action: ConfirmAction::ClearDraft,
                    });
                }
            }
            _ => self.create.input(key),
        }
    }

    async fn handle_settings_key(&mut self, key: KeyEvent) -> bool {
        if let Some(kind) = jump_target(&key) {
            self.navigate(kind).await;
            return false;
        }
        let forward = match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.settings.move_selection(1);
                return false;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.settings.move_selection(-1);
                return false;
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => true,
            KeyCode::Char('h') | KeyCode::Left => false,
            _ => return false,
        };

        if self.settings.selected_row() == SettingsRow::ClearAll {
            if forward {
                self.dialog = Some(Dialog::Confirm {
                    title: "Clear All Notes".to_string(),
                    message: format!(
                        "Are you sure you want to delete all {} notes? This action cannot be undone.",
                        self.settings.notes_count()
                    ),
                    confirm_label: "Delete All",
                    action: ConfirmAction::ClearAllNotes,
                });
            }
            return false;
        }

        if let Some(update) = self.settings.pending_update(forward) {
            // Feedback follows the preference as it was before the change.
            let was_enabled = self.settings.settings().haptic_feedback;
            match self.settings.apply(&self.store, update).await {
                Ok(()) => {
                    self.haptics_enabled = was_enabled;
                    self.haptic(Feedback::Light);
                    self.haptics_enabled = self.settings.settings().haptic_feedback;
                }
                Err(e) => self.fail(e, "save settings"),
            }
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.active != ScreenKind::List || !self.show_floating || self.dialog.is_some() {
            return;
        }
        let at = Position::new(mouse.column, mouse.row);
        let viewport = self.floating_viewport;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.floating.contains(at, viewport) {
                    self.floating.press(at, Instant::now());
                    self.last_frame = Instant::now();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.floating.drag_to(at),
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(event) = self.floating.release(at, viewport) {
                    self.on_floating_event(event);
                }
            }
            _ => {}
        }
    }

    fn tick(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_frame).min(MAX_FRAME_STEP);
        self.last_frame = now;

        match self.active {
            ScreenKind::List => {
                self.list.advance(dt);
                if self.show_floating {
                    self.floating.advance(dt);
                    if self.floating.poll_long_press(now) {
                        self.haptic(Feedback::Medium);
                    }
                }
            }
            ScreenKind::Create => self.create.advance(dt),
            ScreenKind::Settings => self.settings.advance(dt),
        }

        if matches!(self.flash, Some((_, until)) if now >= until) {
            self.flash = None;
        }
    }

    pub async fn update(&mut self, msg: Message) -> bool {
        match msg {
            Message::Key(key) => {
                if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    return self.handle_key_event(key).await;
                }
            }
            Message::Mouse(mouse) => self.handle_mouse(mouse),
            Message::Resize(_w, _h) => {}
            Message::Paste(text) => {
                if self.dialog.is_none() && self.active == ScreenKind::Create {
                    self.create.paste(&text);
                }
            }
            Message::AnimationTick => self.tick(Instant::now()),
            Message::ClockTick => {}
        }
        false
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let fps = u64::from(self.config.general.animation_fps.clamp(1, 60));
        let mut animation_interval = time::interval(Duration::from_millis(1000 / fps));
        animation_interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        let mut clock_interval = time::interval(CLOCK_TICK);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _input_handle = std::thread::spawn(move || {
            while let Ok(evt) = event::read() {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        let mut should_render = true;

        loop {
            if self.take_bell() {
                let mut out = io::stdout();
                let _ = out.write_all(b"\x07").and_then(|_| out.flush());
            }

            if should_render {
                terminal.draw(|f| self.ui(f))?;
                should_render = false;
            }

            let mut messages = Vec::new();
            tokio::select! {
                Some(event) = rx.recv() => {
                    let process_event = |e| match e {
                        Event::Key(key) => Some(Message::Key(key)),
                        Event::Mouse(mouse) => Some(Message::Mouse(mouse)),
                        Event::Resize(w, h) => Some(Message::Resize(w, h)),
                        Event::Paste(text) => Some(Message::Paste(text)),
                        _ => None,
                    };
                    if let Some(m) = process_event(event) {
                        messages.push(m);
                    }
                    while let Ok(e) = rx.try_recv() {
                        if let Some(m) = process_event(e) {
                            messages.push(m);
                        }
                    }
                }
                _ = animation_interval.tick(), if self.is_animating() => messages.push(Message::AnimationTick),
                _ = clock_interval.tick() => messages.push(Message::ClockTick),
            }

            for msg in messages {
                if self.update(msg).await {
                    self.leave();
                    return Ok(());
                }
                should_render = true;
            }
        }
    }

    pub fn ui(&mut self, f: &mut Frame) {
        let theme = self.theme.clone();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        match self.active {
            ScreenKind::List => {
                let body = self.list.render(f, chunks[0], &theme, notes::now_millis());
                self.floating_viewport = body;
                if self.show_floating {
                    self.floating.render(f, body, &theme);
                }
            }
            ScreenKind::Create => self.create.render(f, chunks[0], &theme),
            ScreenKind::Settings => self.settings.render(f, chunks[0], &theme),
        }

        self.render_tabs(f, chunks[1], &theme);
        self.render_footer(f, chunks[2], &theme);

        if let Some(dialog) = &self.dialog {
            render_dialog(f, dialog, &theme);
        }
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect, theme: &ThemeConfig) {
        let titles: Vec<String> = ScreenKind::ALL
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{} {}", i + 1, k.title()))
            .collect();
        let selected = ScreenKind::ALL
            .iter()
            .position(|k| *k == self.active)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(theme.border)),
            )
            .style(Style::default().fg(theme.muted))
            .highlight_style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect, theme: &ThemeConfig) {
        let help = if self.active == ScreenKind::List && self.floating.is_editing() {
            "Esc: Cancel | Ctrl+S: Save memo"
        } else {
            match self.active {
                ScreenKind::List => {
                    "j/k: Move | Enter: Actions | p: Pin | d: Delete | n: New | f: Memo | e: Edit memo | q: Quit"
                }
                ScreenKind::Create => "Ctrl+S: Save | Ctrl+L: Clear | Esc: Back | Tab/Alt+1-3: Switch",
                ScreenKind::Settings => "j/k: Move | Enter/h/l: Change | q: Quit",
            }
        };

        let mut spans = Vec::new();
        if let Some((feedback, _)) = self.flash {
            let color = match feedback {
                Feedback::Light | Feedback::Medium => theme.accent,
                Feedback::Success => theme.success,
                Feedback::Error => theme.danger,
            };
            let mark = if feedback == Feedback::Light { " • " } else { " ● " };
            spans.push(Span::styled(mark, Style::default().fg(color)));
        } else {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(help, Style::default().fg(theme.muted)));
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_dialog(f: &mut Frame, dialog: &Dialog, theme: &ThemeConfig) {
    let (title, message, hint, border) = match dialog {
        Dialog::Alert(alert) => (
            alert.title.as_str(),
            alert.message.as_str(),
            "(Enter) OK".to_string(),
            theme.accent,
        ),
        Dialog::Confirm {
            title,
            message,
            confirm_label,
            ..
        } => (
            title.as_str(),
            message.as_str(),
            format!("(y) {}   (n) Cancel", confirm_label),
            theme.danger,
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(border));
    let text = vec![
        Line::raw(""),
        Line::styled(message.to_string(), Style::default().fg(theme.foreground)),
        Line::raw(""),
        Line::styled(hint, Style::default().fg(theme.muted)),
    ];
    let p = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
