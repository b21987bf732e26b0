//! Decorative translucent panel with an optional looping "liquid" sheen.
//!
//! A surface carries no data. Callers configure it, render it as a backdrop
//! and draw their own content into [`GlassPanel::inner`]. The animation only
//! advances while the surface is running, and the app polls its animation
//! interval only while some mounted surface reports [`LiquidGlass::is_animating`].

use std::f32::consts::TAU;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Widget};
use serde::{Deserialize, Serialize};

pub const ROTATION_PERIOD: Duration = Duration::from_secs(20);
pub const PULSE_PERIOD: Duration = Duration::from_secs(4);
pub const PULSE_PEAK: f32 = 1.02;

const NOISE_SIZE: usize = 16;
const NOISE_OPACITY: f32 = 0.05;
const MIN_INTENSITY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlassStyle {
    #[default]
    Adaptive,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlassOptions {
    /// 0..1; values below 0.1 are raised to 0.1 when drawn.
    pub blur_intensity: f32,
    pub glass_style: GlassStyle,
    pub liquid_animation: bool,
    pub corner_radius: u16,
}

impl Default for GlassOptions {
    fn default() -> Self {
        Self {
            blur_intensity: 0.8,
            glass_style: GlassStyle::Adaptive,
            liquid_animation: true,
            corner_radius: 20,
        }
    }
}

/// The host side of a visual effect: one-way configuration plus
/// fire-and-forget animation commands.
pub trait EffectHost {
    fn configure(&mut self, options: GlassOptions);
    fn start(&mut self);
    fn stop(&mut self);
}

/// Phase accumulator for the rotation and pulse loops.
#[derive(Debug, Clone, Default)]
pub struct LiquidClock {
    elapsed: Duration,
    running: bool,
}

impl LiquidClock {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn advance(&mut self, dt: Duration) {
        if self.running {
            // Keep the accumulator bounded; 20 s is a multiple of 4 s so both
            // loops stay in phase across the wrap.
            self.elapsed = Duration::from_nanos(
                ((self.elapsed + dt).as_nanos() % ROTATION_PERIOD.as_nanos()) as u64,
            );
        }
    }

    /// Gradient angle in radians, one full turn per `ROTATION_PERIOD`.
    pub fn rotation(&self) -> f32 {
        let t = self.elapsed.as_secs_f32() / ROTATION_PERIOD.as_secs_f32();
        (t * TAU) % TAU
    }

    /// Keyframes 1.0 -> 1.02 -> 1.0 at 0, 0.5 and 1.0 of `PULSE_PERIOD`.
    pub fn pulse_scale(&self) -> f32 {
        let period = PULSE_PERIOD.as_secs_f32();
        let t = (self.elapsed.as_secs_f32() % period) / period;
        let rise = if t <= 0.5 { t / 0.5 } else { (1.0 - t) / 0.5 };
        1.0 + (PULSE_PEAK - 1.0) * rise
    }
}

pub struct LiquidGlass {
    options: GlassOptions,
    clock: LiquidClock,
    noise: [[f32; NOISE_SIZE]; NOISE_SIZE],
}

impl LiquidGlass {
    pub fn new(options: GlassOptions) -> Self {
        let mut rng = StdRng::seed_from_u64(rand::random());
        let mut noise = [[0.0; NOISE_SIZE]; NOISE_SIZE];
        for row in noise.iter_mut() {
            for cell in row.iter_mut() {
                *cell = rng.random::<f32>();
            }
        }

        let mut glass = Self {
            options,
            clock: LiquidClock::default(),
            noise,
        };
        if options.liquid_animation {
            glass.clock.start();
        }
        glass
    }

    pub fn options(&self) -> &GlassOptions {
        &self.options
    }

    pub fn is_animating(&self) -> bool {
        self.clock.is_running()
    }

    pub fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    pub fn applied_intensity(&self) -> f32 {
        self.options.blur_intensity.clamp(MIN_INTENSITY, 1.0)
    }

    pub fn panel<'a>(&'a self, backdrop: Color, border: Color) -> GlassPanel<'a> {
        GlassPanel {
            glass: self,
            backdrop,
            border,
            title: None,
        }
    }
}

impl EffectHost for LiquidGlass {
    fn configure(&mut self, options: GlassOptions) {
        let toggled = options.liquid_animation != self.options.liquid_animation;
        self.options = options;
        if toggled {
            if options.liquid_animation {
                self.start();
            } else {
                self.stop();
            }
        }
    }

    fn start(&mut self) {
        if !self.clock.is_running() {
            log::debug!("liquid animation started");
        }
        self.clock.start();
    }

    fn stop(&mut self) {
        if self.clock.is_running() {
            log::debug!("liquid animation stopped");
        }
        self.clock.stop();
    }
}

impl Drop for LiquidGlass {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One frame of a [`LiquidGlass`] surface.
pub struct GlassPanel<'a> {
    glass: &'a LiquidGlass,
    backdrop: Color,
    border: Color,
    title: Option<Line<'a>>,
}

impl<'a> GlassPanel<'a> {
    pub fn title(mut self, title: impl Into<Line<'a>>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn block(&self) -> Block<'a> {
        let border_type = if self.glass.options.corner_radius > 0 {
            BorderType::Rounded
        } else {
            BorderType::Plain
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(Style::default().fg(self.border));
        if let Some(title) = &self.title {
            block = block.title(title.clone());
        }
        block
    }

    /// Area left for content inside the border.
    pub fn inner(&self, area: Rect) -> Rect {
        self.block().inner(area)
    }

    fn tint(&self) -> (u8, u8, u8) {
        match self.glass.options.glass_style {
            GlassStyle::Light => (248, 250, 252),
            GlassStyle::Dark => (15, 23, 42),
            GlassStyle::Adaptive => {
                let (r, g, b) = rgb(self.backdrop, (30, 41, 59));
                // Lift dark backdrops, darken light ones.
                if u16::from(r) + u16::from(g) + u16::from(b) < 384 {
                    (148, 163, 184)
                } else {
                    (71, 85, 105)
                }
            }
        }
    }

    fn cell_color(&self, area: Rect, x: u16, y: u16) -> Color {
        let glass = self.glass;
        let intensity = glass.applied_intensity();
        let base = rgb(self.backdrop, (15, 23, 42));
        let mut color = blend(base, self.tint(), 0.35 * intensity);

        // Cells are roughly twice as tall as wide.
        let half_w = f32::from(area.width.max(1)) / 2.0;
        let half_h = f32::from(area.height.max(1)) / 2.0;
        let dx = (f32::from(x - area.x) + 0.5 - half_w) / half_w;
        let dy = (f32::from(y - area.y) + 0.5 - half_h) / half_h;
        let radius = (dx * dx + dy * dy).sqrt().min(1.0);
        let lobe = (dy.atan2(dx) - glass.clock.rotation()).cos().max(0.0).powi(3);
        let pulse = 1.0 + (glass.clock.pulse_scale() - 1.0) * 25.0;
        let sheen = (lobe * (1.0 - radius) * 0.3 * intensity * pulse).min(1.0);
        color = blend(color, (255, 255, 255), sheen);

        let n = glass.noise[usize::from(y) % NOISE_SIZE][usize::from(x) % NOISE_SIZE];
        color = blend(color, (255, 255, 255), n * NOISE_OPACITY);

        Color::Rgb(color.0, color.1, color.2)
    }
}

impl Widget for GlassPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let bg = self.cell_color(area, x, y);
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(" ");
                    cell.set_bg(bg);
                }
            }
        }
        self.block().render(area, buf);
    }
}

fn rgb(color: Color, fallback: (u8, u8, u8)) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::White => (255, 255, 255),
        _ => fallback,
    }
}

fn blend(from: (u8, u8, u8), to: (u8, u8, u8), amount: f32) -> (u8, u8, u8) {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| {
        (f32::from(a) + (f32::from(b) - f32::from(a)) * amount).round() as u8
    };
    (mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}
