//! Desktop preview app for myrtio-light-show
//!
//! Runs the show renderer against an in-memory store and paints every
//! segment in a window. All state changes go through the intent channel,
//! the same way a device would drive the show.

use std::time::Instant as StdInstant;

use eframe::egui::{self};
use myrtio_light_show::storage::{DeviceFile, ShowStore};
use myrtio_light_show::timeline::{SegmentTarget, SequenceFile, TimelineEntry};
use myrtio_light_show::{
    EffectParams, Instant, IntentChannel, IntentSender, LayoutSpec, MemoryStore, Renderer, Rgb,
    Segment, ShowConfig, ShowIntent, SoftwareColorMath,
};

/// Size of each LED rectangle in pixels
const LED_SIZE: f32 = 12.0;

/// Gap between LEDs
const LED_GAP: f32 = 2.0;

/// Intent channel size
const INTENT_CHANNEL_SIZE: usize = 16;

/// Static intent channel for communication between UI and renderer
static INTENTS_CHANNEL: IntentChannel<INTENT_CHANNEL_SIZE> =
    IntentChannel::<INTENT_CHANNEL_SIZE>::new();

type PreviewRenderer = Renderer<'static, MemoryStore, SoftwareColorMath, INTENT_CHANNEL_SIZE>;

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_title("Light Show Preview"),
        ..Default::default()
    };

    eframe::run_native(
        "myrtio-light-preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new()))),
    )
}

/// Store with the built-ins plus a clock device and a show for it
fn preview_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    let desk = DeviceFile::new(
        "desk",
        vec![
            LayoutSpec::device("clock", "CLK4"),
            LayoutSpec::device("shelf", "LINE").with_brightness(120),
        ],
    );
    let clock_show = SequenceFile::new("clock")
        .with_entry(TimelineEntry::trigger(
            0,
            SegmentTarget::Index(0),
            "RNBW",
            EffectParams::default().with_kind(6).with_duration(4000.0),
        ))
        .with_entry(TimelineEntry::trigger(
            0,
            SegmentTarget::Index(1),
            "MARQ",
            EffectParams::default().with_kind(3).with_duration(300.0),
        ))
        .with_entry(TimelineEntry::trigger(
            8000,
            SegmentTarget::All,
            "PLSL",
            EffectParams::default().with_kind(5).with_color("random"),
        ))
        .with_entry(TimelineEntry::restart(12_000));

    for result in [
        store.write_device("desk", &desk),
        store.write_sequence("clock", &clock_show),
    ] {
        if let Err(err) = result {
            eprintln!("preview file not stored: {err}");
        }
    }
    store
}

struct PreviewApp {
    /// The renderer instance
    renderer: PreviewRenderer,
    /// Intent sender for UI changes
    intent_sender: IntentSender<'static, INTENT_CHANNEL_SIZE>,

    /// Synthetic time in milliseconds
    t_ms: u64,
    /// Wall-clock reference for delta time
    last_frame: StdInstant,
    /// Whether animation is playing
    playing: bool,
    /// Show speed in percent
    speed: u16,
    /// Display brightness (0-255)
    brightness: u8,
    /// LED pixel size for display
    led_size: f32,
}

impl PreviewApp {
    fn new() -> Self {
        let config = ShowConfig::default().with_brightness(255);
        let brightness = config.brightness;
        let speed = config.speed;
        let renderer = Renderer::new(
            INTENTS_CHANNEL.receiver(),
            preview_store(),
            SoftwareColorMath,
            config,
        );

        Self {
            renderer,
            intent_sender: INTENTS_CHANNEL.sender(),
            t_ms: 0,
            last_frame: StdInstant::now(),
            playing: true,
            speed,
            brightness,
            led_size: LED_SIZE,
        }
    }

    fn send(&self, intent: ShowIntent) {
        if let Err(err) = self.intent_sender.send(intent) {
            eprintln!("{err}");
        }
    }

    /// Reset time to zero and start the show over
    fn reset_time(&mut self) {
        self.t_ms = 0;
        self.last_frame = StdInstant::now();
        self.send(ShowIntent::Restart);
    }

    /// Update synthetic time based on wall clock
    fn update_time(&mut self) {
        let now = StdInstant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;

        if self.playing {
            #[allow(clippy::cast_possible_truncation)]
            let delta_ms = delta.as_millis().min(u128::from(u64::MAX)) as u64;
            self.t_ms = self.t_ms.saturating_add(delta_ms);
        }
    }

    fn playback_controls(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                if ui.button("⏮ Reset").clicked() {
                    self.reset_time();
                }
                if ui
                    .button(if self.playing { "⏸ Pause" } else { "▶ Play" })
                    .clicked()
                {
                    self.playing = !self.playing;
                }
            });

            ui.add_space(4.0);

            let secs = self.t_ms / 1000;
            let ms = self.t_ms % 1000;
            ui.label(format!("Time: {secs}.{ms:03}s"));

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                ui.label("Speed %:");
                let old_speed = self.speed;
                ui.add(egui::Slider::new(&mut self.speed, 10..=500).logarithmic(true));
                if self.speed != old_speed {
                    self.send(ShowIntent::SetSpeed(self.speed));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Brightness:");
                let old_brightness = self.brightness;
                ui.add(egui::DragValue::new(&mut self.brightness).range(0u8..=255u8));
                if self.brightness != old_brightness {
                    self.send(ShowIntent::SetBrightness(self.brightness));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Size:");
                ui.add(egui::Slider::new(&mut self.led_size, 4.0..=32.0));
            });
        });
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label("Sequence:");
                let current = self.renderer.sequence_name().to_owned();
                let mut selected = current.clone();
                egui::ComboBox::from_id_salt("sequence_selector")
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for name in self.renderer.store().sequence_names() {
                            ui.selectable_value(&mut selected, name.clone(), name);
                        }
                    });
                if selected != current {
                    self.send(ShowIntent::LoadSequence(selected));
                }
            });

            ui.horizontal(|ui| {
                if ui.button("Next").clicked() {
                    self.send(ShowIntent::Next { random: false });
                }
                if ui.button("Random").clicked() {
                    self.send(ShowIntent::Next { random: true });
                }
                if ui.button("Restart").clicked() {
                    self.send(ShowIntent::Restart);
                }
            });

            ui.horizontal(|ui| {
                ui.label("Device:");
                let current = self.renderer.device_name().to_owned();
                let mut selected = current.clone();
                egui::ComboBox::from_id_salt("device_selector")
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for name in self.renderer.store().device_names() {
                            ui.selectable_value(&mut selected, name.clone(), name);
                        }
                    });
                if selected != current {
                    self.send(ShowIntent::LoadDevice(selected));
                }
            });

            ui.label(format!(
                "Live instances: {}",
                self.renderer.registry().live_instances()
            ));
        });
    }
}

/// Color as shown on screen, with the display brightness applied
fn display_color(color: Rgb, brightness: u8) -> egui::Color32 {
    let scale = |channel: u8| {
        #[allow(clippy::cast_possible_truncation)]
        let scaled = (u16::from(channel) * u16::from(brightness) / 255) as u8;
        scaled
    };
    egui::Color32::from_rgb(scale(color.r), scale(color.g), scale(color.b))
}

/// Paint one segment: clocks on their grid, everything else as a wrapped strip
fn paint_segment(
    ui: &mut egui::Ui,
    segment: &Segment,
    colors: &[Rgb],
    brightness: u8,
    led_size: f32,
) {
    let layout = segment.layout();
    let brightness = layout.brightness().unwrap_or(brightness);
    let pitch = led_size + LED_GAP;
    let available_width = ui.available_width();
    let color_of = |pixel: usize| {
        let color = colors.get(layout.offset() + pixel).copied().unwrap_or_default();
        display_color(color, brightness)
    };

    ui.label(format!(
        "{} ({} px, {})",
        layout.name(),
        layout.len(),
        segment.action().map_or("idle", |tag| tag.as_str())
    ));

    if let Some(grid) = layout.grid() {
        #[allow(clippy::cast_precision_loss)]
        let size = egui::vec2(grid.width() as f32 * pitch, grid.height() as f32 * pitch);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let origin = response.rect.min;

        for pixel in 0..layout.len() {
            let Some((x, y)) = grid.position_of(pixel) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let rect = egui::Rect::from_min_size(
                egui::pos2(origin.x + x as f32 * pitch, origin.y + y as f32 * pitch),
                egui::vec2(led_size, led_size),
            );
            painter.rect_filled(rect, 3.0, color_of(pixel));
        }
        return;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let per_row = (available_width / pitch).floor().max(1.0) as usize;
    let rows = layout.len().div_ceil(per_row);
    #[allow(clippy::cast_precision_loss)]
    let height = rows as f32 * pitch;
    let (response, painter) =
        ui.allocate_painter(egui::vec2(available_width, height), egui::Sense::hover());
    let origin = response.rect.min;

    #[allow(clippy::cast_precision_loss)]
    for pixel in 0..layout.len() {
        let x = origin.x + (pixel % per_row) as f32 * pitch;
        let y = origin.y + (pixel / per_row) as f32 * pitch;
        let rect = egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(led_size, led_size));
        painter.rect_filled(rect, 3.0, color_of(pixel));
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_time();
        self.renderer.render(Instant::from_millis(self.t_ms));

        // Request continuous repaint for animation
        ctx.request_repaint();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                self.playback_controls(ui);
                ui.add_space(16.0);
                self.show_controls(ui);
            });

            ui.add_space(16.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                let colors = self.renderer.output_colors();
                for segment in self.renderer.segments() {
                    paint_segment(ui, segment, colors, self.renderer.brightness(), self.led_size);
                    ui.add_space(8.0);
                }
            });
        });
    }
}
