//! Interactive booth: a capture screen with a live preview and an edit screen
//! for theming, decorating and downloading the strip.

use std::{fs, path::PathBuf};

use eframe::{egui, App};
use egui::{pos2, vec2, Color32, ColorImage, Rect, Sense, TextureHandle, TextureOptions};
use image::RgbaImage;

use crate::{
    booth::{Booth, CaptureOutcome},
    capture::{filter_presets, CapturePipeline, FilterSpec, FrameSource},
    compositor::{
        floating_from_bytes, today_label, Compositor, DragState, FloatingSticker, Point, StripState, Viewport,
        STICKER_GLYPHS,
    },
    config::Settings,
    error::CaptureError,
    storage::KeyValueStore,
    text::TextPainter,
    theme::Theme,
};

// ------------------------- Helpers -------------------------

fn to_color_image(img: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied([img.width() as usize, img.height() as usize], img.as_raw())
}

fn upload(ctx: &egui::Context, slot: &mut Option<TextureHandle>, name: &str, img: &RgbaImage) {
    let color_image = to_color_image(img);
    match slot {
        Some(tex) => tex.set(color_image, TextureOptions::LINEAR),
        None => *slot = Some(ctx.load_texture(name, color_image, TextureOptions::LINEAR)),
    }
}

/// Largest size with the image's aspect ratio that fits `avail`.
fn fit(size: (u32, u32), avail: egui::Vec2) -> egui::Vec2 {
    let (w, h) = (size.0.max(1) as f32, size.1.max(1) as f32);
    let scale = (avail.x / w).min(avail.y / h).min(1.0).max(0.05);
    vec2(w * scale, h * scale)
}

fn to_point(p: egui::Pos2) -> Point {
    Point::new(p.x, p.y)
}

// ------------------------- Screens -------------------------

enum Screen {
    Capture,
    Edit(Box<EditScreen>),
}

struct EditScreen {
    compositor: Compositor,
    strip_tex: Option<TextureHandle>,
    dirty: bool,
    text_input: String,
    floating: Vec<FloatingSticker>,
    floating_tex: Vec<TextureHandle>,
    drag: DragState,
    viewport: Option<Viewport>,
    exported: Option<PathBuf>,
}

impl EditScreen {
    fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            strip_tex: None,
            dirty: true,
            text_input: String::new(),
            floating: Vec::new(),
            floating_tex: Vec::new(),
            drag: DragState::default(),
            viewport: None,
            exported: None,
        }
    }
}

// ------------------------- App State -------------------------

pub struct PhotoBoothApp {
    settings: Settings,
    text: TextPainter,
    booth: Booth,
    source: Option<Box<dyn FrameSource>>,
    screen: Screen,
    preview: Option<TextureHandle>,
    thumbs: Vec<TextureHandle>,
    custom_css: String,
    notice: Option<String>,
}

impl PhotoBoothApp {
    pub fn new(
        settings: Settings,
        source: Result<Box<dyn FrameSource>, CaptureError>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let text = TextPainter::discover(settings.font_path.as_deref());
        let pipeline = CapturePipeline::new(settings.vhs, text.clone());
        let (source, notice) = match source {
            Ok(source) => (Some(source), None),
            Err(err) => {
                log::error!("{err}");
                (
                    None,
                    Some("Could not access your camera. Please check the configured source.".to_string()),
                )
            }
        };
        Self {
            settings,
            text,
            booth: Booth::new(pipeline, store),
            source,
            screen: Screen::Capture,
            preview: None,
            thumbs: Vec::new(),
            custom_css: String::new(),
            notice,
        }
    }

    fn set_filter(&mut self, spec: FilterSpec) {
        if let Err(err) = self.booth.pipeline_mut().apply_filter(spec) {
            self.notice = Some(err.to_string());
        }
    }

    fn sync_thumbnails(&mut self, ctx: &egui::Context) {
        let stills = self.booth.session().stills();
        if self.thumbs.len() == stills.len() {
            return;
        }
        self.thumbs = stills
            .iter()
            .enumerate()
            .filter_map(|(i, still)| match still.decode() {
                Ok(img) => Some(ctx.load_texture(format!("thumb-{i}"), to_color_image(&img), TextureOptions::LINEAR)),
                Err(err) => {
                    log::warn!("Thumbnail {i}: {err}");
                    None
                }
            })
            .collect();
    }

    fn capture(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        match self.booth.capture(source.as_mut()) {
            Ok(outcome) => {
                if let Some(notice) = outcome.notice() {
                    self.notice = Some(notice);
                }
                outcome == CaptureOutcome::Completed
            }
            Err(err) => {
                log::error!("Capture failed: {err}");
                self.notice = Some(err.to_string());
                false
            }
        }
    }

    fn open_editor(&mut self, query: Option<&str>) {
        let stills = match self.booth.load_for_edit(query) {
            Ok(stills) => stills,
            Err(err) => {
                log::warn!("Cannot edit: {err}");
                self.notice = Some("No photos found! Please go back and capture some photos first.".into());
                return;
            }
        };
        let mut compositor = Compositor::new(self.settings.layout.clone(), self.settings.theme, self.text.clone());
        if let Err(err) = compositor.load(&stills) {
            self.notice = Some(err.to_string());
            return;
        }
        self.set_filter(FilterSpec::None);
        self.screen = Screen::Edit(Box::new(EditScreen::new(compositor)));
    }

    fn restart(&mut self) {
        if let Err(err) = self.booth.restart() {
            log::error!("Restart: {err}");
        }
        self.thumbs.clear();
        self.screen = Screen::Capture;
        self.notice = Some("Ready to take new photos! 📸".into());
    }

    fn date_label(&self) -> Option<String> {
        self.settings
            .date_stamp
            .then(today_label)
    }

    // ------------------------- Capture screen -------------------------

    fn capture_ui(&mut self, ctx: &egui::Context) {
        if let Some(source) = self.source.as_mut() {
            if let Some(frame) = source.frame() {
                let shown = self.booth.pipeline_mut().render(&frame, &mut rand::thread_rng());
                upload(ctx, &mut self.preview, "preview", &shown);
            }
            ctx.request_repaint();
        }
        self.sync_thumbnails(ctx);

        let mut next_filter = None;
        let mut open_editor = false;

        egui::SidePanel::left("filters")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Filters");
                ui.separator();
                let active = self.booth.pipeline().active_filter().clone();
                for preset in filter_presets() {
                    let spec = if preset.css == "none" {
                        FilterSpec::None
                    } else {
                        FilterSpec::Css(preset.css.into())
                    };
                    if ui.selectable_label(active == spec, preset.name).clicked() {
                        next_filter = Some(spec);
                    }
                }
                if ui.selectable_label(active == FilterSpec::Vhs, "VHS").clicked() {
                    next_filter = Some(FilterSpec::Vhs);
                }
                ui.separator();
                ui.label("Custom");
                ui.text_edit_singleline(&mut self.custom_css);
                if ui.button("Apply").clicked() {
                    next_filter = Some(FilterSpec::Css(self.custom_css.clone()));
                }
            });

        egui::TopBottomPanel::bottom("gallery")
            .default_height(140.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let remaining = self.booth.session().remaining();
                    let label = if remaining == 0 {
                        "Creating Photo Strip...".to_string()
                    } else {
                        format!("Capture Photo ({remaining} left)")
                    };
                    let can_capture = remaining > 0 && self.source.is_some();
                    if ui.add_enabled(can_capture, egui::Button::new(label)).clicked() && self.capture() {
                        open_editor = true;
                    }
                    if ui.button("Create Strip").clicked() {
                        if self.booth.session().is_empty() {
                            self.notice = Some("No photos captured yet! Take some photos first.".into());
                        } else {
                            open_editor = true;
                        }
                    }
                });
                ui.horizontal(|ui| {
                    for tex in &self.thumbs {
                        ui.image((tex.id(), fit(
                            (tex.size()[0] as u32, tex.size()[1] as u32),
                            vec2(160.0, 100.0),
                        )));
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| match &self.preview {
            Some(tex) => {
                let size = fit((tex.size()[0] as u32, tex.size()[1] as u32), ui.available_size());
                ui.centered_and_justified(|ui| ui.image((tex.id(), size)));
            }
            None => {
                ui.centered_and_justified(|ui| ui.label("Waiting for camera..."));
            }
        });

        if let Some(spec) = next_filter {
            self.set_filter(spec);
        }
        if open_editor {
            let query = match self.booth.finish() {
                Ok(query) => Some(query),
                Err(err) => {
                    log::warn!("Handoff unavailable: {err}");
                    None
                }
            };
            self.open_editor(query.as_deref());
        }
    }

    // ------------------------- Edit screen -------------------------

    fn edit_ui(&mut self, ctx: &egui::Context) {
        let date = self.date_label();
        let Screen::Edit(edit) = &mut self.screen else {
            return;
        };
        let mut back = false;
        let mut restart = false;

        if let StripState::Loading { .. } = edit.compositor.state() {
            match edit.compositor.poll() {
                Ok(StripState::Ready) => edit.dirty = true,
                Ok(_) => ctx.request_repaint(),
                Err(err) => {
                    log::error!("{err}");
                    self.notice = Some(err.to_string());
                    back = true;
                }
            }
        }
        let ready = edit.compositor.state() == StripState::Ready;
        if ready && edit.dirty {
            match edit.compositor.flatten(date.as_deref()) {
                Ok(strip) => upload(ctx, &mut edit.strip_tex, "strip", &strip.image),
                Err(err) => log::error!("Render failed: {err}"),
            }
            edit.dirty = false;
        }

        egui::SidePanel::left("decorate")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Theme");
                ui.horizontal_wrapped(|ui| {
                    for theme in Theme::ALL {
                        if ui
                            .selectable_label(edit.compositor.theme() == theme, theme.label())
                            .clicked()
                        {
                            edit.compositor.set_theme(theme);
                            edit.dirty = true;
                        }
                    }
                });
                if edit.compositor.theme().is_randomized() && ui.button("Reshuffle Background").clicked() {
                    edit.dirty = true;
                }
                ui.separator();
                ui.heading("Stickers");
                ui.add_enabled_ui(ready, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for glyph in STICKER_GLYPHS {
                            if ui.button(*glyph).clicked() {
                                match edit.compositor.add_sticker(glyph, &mut rand::thread_rng()) {
                                    Ok(_) => edit.dirty = true,
                                    Err(err) => self.notice = Some(err.to_string()),
                                }
                            }
                        }
                    });
                    if ui.button("Add Image Sticker...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Image", &["png", "jpg", "jpeg"])
                            .pick_file()
                        {
                            let drop_at = Point::new(20.0, 60.0);
                            let screen_pos = edit.viewport.map_or(drop_at, |vp| vp.to_screen(drop_at));
                            let loaded = fs::read(&path)
                                .map_err(|e| e.to_string())
                                .and_then(|bytes| {
                                    floating_from_bytes(&bytes, screen_pos, 80.0).map_err(|e| e.to_string())
                                });
                            match loaded {
                                Ok(sticker) => {
                                    edit.floating_tex.push(ctx.load_texture(
                                        format!("sticker-{}", edit.floating.len()),
                                        to_color_image(&sticker.image),
                                        TextureOptions::LINEAR,
                                    ));
                                    edit.floating.push(sticker);
                                }
                                Err(err) => {
                                    log::warn!("{}: {err}", path.display());
                                    self.notice = Some(format!("Could not load {}", path.display()));
                                }
                            }
                        }
                    }
                    ui.separator();
                    ui.heading("Text");
                    ui.text_edit_singleline(&mut edit.text_input);
                    if ui.button("Add Text").clicked() {
                        match edit.compositor.add_text(&edit.text_input) {
                            Ok(true) => {
                                edit.text_input.clear();
                                edit.dirty = true;
                            }
                            Ok(false) => {}
                            Err(err) => self.notice = Some(err.to_string()),
                        }
                    }
                    ui.separator();
                    if ui.button("Clear Decorations").clicked() {
                        match edit.compositor.clear_decorations() {
                            Ok(()) => {
                                edit.floating.clear();
                                edit.floating_tex.clear();
                                edit.dirty = true;
                            }
                            Err(err) => self.notice = Some(err.to_string()),
                        }
                    }
                    if ui.button("Download").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("PNG", &["png"])
                            .set_file_name(self.settings.download_name.as_str())
                            .save_file()
                        {
                            if let Some(vp) = edit.viewport {
                                if let Err(err) = edit.compositor.add_dragged(&edit.floating, &vp) {
                                    log::warn!("Dropping image stickers: {err}");
                                }
                            }
                            edit.floating.clear();
                            edit.floating_tex.clear();
                            match edit.compositor.export(date.as_deref(), self.booth.store_mut(), &path) {
                                Ok(strip) => {
                                    upload(ctx, &mut edit.strip_tex, "strip", &strip.image);
                                    edit.exported = Some(path);
                                    self.notice = Some("Photo strip downloaded! 🎉".into());
                                }
                                Err(err) => {
                                    log::error!("Export failed: {err}");
                                    self.notice = Some(err.to_string());
                                }
                            }
                        }
                    }
                });
                if let Some(path) = &edit.exported {
                    ui.label(format!("Saved to {}", path.display()));
                }
                ui.separator();
                if ui.button("Take New Photos").clicked() {
                    restart = true;
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(tex) = &edit.strip_tex else {
                ui.centered_and_justified(|ui| ui.spinner());
                return;
            };
            let pixel_size = (tex.size()[0] as u32, tex.size()[1] as u32);
            let size = fit(pixel_size, ui.available_size());
            let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
            let painter = ui.painter_at(ui.max_rect());
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(tex.id(), rect, uv, Color32::WHITE);

            let viewport = Viewport::new(to_point(rect.min), (rect.width(), rect.height()), pixel_size);
            edit.viewport = Some(viewport);

            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    edit.drag.begin(&edit.floating, to_point(pos));
                }
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    edit.drag.update(&mut edit.floating, to_point(pos));
                }
            } else if edit.drag.is_dragging() {
                edit.drag.end();
            }

            for (sticker, tex) in edit.floating.iter().zip(&edit.floating_tex) {
                let min = pos2(sticker.screen_pos.x, sticker.screen_pos.y);
                let r = Rect::from_min_size(min, vec2(sticker.display_size.0, sticker.display_size.1));
                painter.image(tex.id(), r, uv, Color32::WHITE);
            }
        });

        if back {
            self.screen = Screen::Capture;
        } else if restart {
            self.restart();
        }
    }
}

impl App for PhotoBoothApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("photobooth");
                ui.separator();
                ui.label(match &self.screen {
                    Screen::Capture => format!("{} of 3 photos", self.booth.session().len()),
                    Screen::Edit(edit) => format!("Strip: {}", edit.compositor.state().name()),
                });
            });
        });

        if matches!(self.screen, Screen::Capture) {
            self.capture_ui(ctx);
        } else {
            self.edit_ui(ctx);
        }

        let mut dismissed = false;
        if let Some(message) = &self.notice {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
        }
        if dismissed {
            self.notice = None;
        }
    }
}
