//! Photo strip compositor: decodes captured stills in parallel, lays them out
//! on a themed canvas, collects decorations and flattens everything into one
//! exportable raster.
//!
//! Drawing goes through a [`Scene`] first so the paint order can be inspected
//! without looking at pixels.

mod decoration;
mod drag;
mod layout;

pub use decoration::{Decoration, STICKER_GLYPHS, STICKER_SIZE};
pub use drag::{DragState, FloatingSticker, Viewport};
pub use layout::{LayoutConstants, Point, Rect, StripLayout};

use std::{
    fs,
    io::Cursor,
    path::Path,
    sync::{
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread,
};

use image::{DynamicImage, ImageError, ImageOutputFormat, RgbaImage};
use rand::Rng;

use crate::{
    error::CompositeError,
    raster::{draw_image, fill_rect, rgb, stroke_rect, Color, WHITE},
    session::StillImage,
    storage::{KeyValueStore, EDITED_STRIP_KEY},
    text::{Align, FontSpec, TextPainter},
    theme::Theme,
};

const FRAME_OUTLINE: Color = rgb(0xe0, 0xe0, 0xe0);
const TEXT_SIZE: f32 = 20.0;
const DATE_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripState {
    Empty,
    Loading { decoded: usize, expected: usize },
    Ready,
    Exported,
}

impl StripState {
    pub fn name(&self) -> &'static str {
        match self {
            StripState::Empty => "empty",
            StripState::Loading { .. } => "loading",
            StripState::Ready => "ready",
            StripState::Exported => "exported",
        }
    }
}

type DecodeResult = (usize, Result<RgbaImage, ImageError>);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp<'a> {
    Background(Theme),
    /// White mat plus outline around a photo slot.
    PhotoFrame(Rect),
    Photo { index: usize, rect: Rect },
    Decoration(&'a Decoration),
    Title {
        text: &'a str,
        position: Point,
        color: Color,
        font: FontSpec,
    },
    DateStamp {
        text: String,
        position: Point,
        color: Color,
        font: FontSpec,
    },
}

/// Ordered display list for one strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene<'a> {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp<'a>>,
}

/// The flattened strip.
#[derive(Debug, Clone)]
pub struct CompositeStrip {
    pub image: RgbaImage,
}

impl CompositeStrip {
    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone()).write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
        Ok(png)
    }
}

pub struct Compositor {
    theme: Theme,
    constants: LayoutConstants,
    layout: StripLayout,
    state: StripState,
    photos: Vec<Option<RgbaImage>>,
    pending: Option<Receiver<DecodeResult>>,
    decorations: Vec<Decoration>,
    text: TextPainter,
}

impl Compositor {
    pub fn new(constants: LayoutConstants, theme: Theme, text: TextPainter) -> Self {
        Self {
            theme,
            layout: StripLayout::compute(0, &constants),
            constants,
            state: StripState::Empty,
            photos: Vec::new(),
            pending: None,
            decorations: Vec::new(),
            text,
        }
    }

    pub fn state(&self) -> StripState {
        self.state
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    fn require_ready(&self) -> Result<(), CompositeError> {
        match self.state {
            StripState::Ready => Ok(()),
            StripState::Exported => Err(CompositeError::AlreadyExported),
            other => Err(CompositeError::NotReady(other.name())),
        }
    }

    fn begin_loading(&mut self, n: usize) -> Sender<DecodeResult> {
        let (tx, rx) = mpsc::channel();
        self.layout = StripLayout::compute(n, &self.constants);
        self.photos = vec![None; n];
        self.decorations.clear();
        self.pending = Some(rx);
        self.state = StripState::Loading {
            decoded: 0,
            expected: n,
        };
        tx
    }

    /// Starts one decode per still and enters `Loading`.
    pub fn load(&mut self, stills: &[StillImage]) -> Result<(), CompositeError> {
        if self.state == StripState::Exported {
            return Err(CompositeError::AlreadyExported);
        }
        if stills.is_empty() {
            return Err(CompositeError::NoPhotos);
        }
        let tx = self.begin_loading(stills.len());
        for (index, still) in stills.iter().enumerate() {
            let tx = tx.clone();
            let still = still.clone();
            thread::spawn(move || {
                // The receiver is gone if the load was superseded.
                let _ = tx.send((index, still.decode()));
            });
        }
        log::info!("Decoding {} photo(s)", stills.len());
        Ok(())
    }

    fn receive(&mut self, (index, result): DecodeResult) -> Result<(), CompositeError> {
        let StripState::Loading { decoded, expected } = self.state else {
            return Ok(());
        };
        match result {
            Ok(image) => {
                let fresh = self
                    .photos
                    .get_mut(index)
                    .map_or(false, |slot| slot.replace(image).is_none());
                let decoded = decoded + usize::from(fresh);
                log::debug!("Photo {index} decoded ({decoded}/{expected})");
                if decoded == expected {
                    self.pending = None;
                    self.state = StripState::Ready;
                    log::info!("Strip ready with {expected} photo(s)");
                } else {
                    self.state = StripState::Loading { decoded, expected };
                }
                Ok(())
            }
            Err(source) => {
                self.abort_loading();
                Err(CompositeError::Decode { index, source })
            }
        }
    }

    fn abort_loading(&mut self) {
        self.pending = None;
        self.photos.clear();
        self.state = StripState::Empty;
    }

    /// Drains finished decodes without blocking.
    pub fn poll(&mut self) -> Result<StripState, CompositeError> {
        while let Some(rx) = &self.pending {
            match rx.try_recv() {
                Ok(msg) => self.receive(msg)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.abort_loading();
                    return Err(CompositeError::WorkerLost);
                }
            }
        }
        Ok(self.state)
    }

    /// Blocks until every decode has reported.
    pub fn wait_ready(&mut self) -> Result<(), CompositeError> {
        while let Some(rx) = &self.pending {
            match rx.recv() {
                Ok(msg) => self.receive(msg)?,
                Err(_) => {
                    self.abort_loading();
                    return Err(CompositeError::WorkerLost);
                }
            }
        }
        self.require_ready()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            log::debug!("Theme set to {theme}");
            self.theme = theme;
        }
    }

    pub fn place_decoration(&mut self, decoration: Decoration) -> Result<(), CompositeError> {
        self.require_ready()?;
        log::debug!("Placing {} decoration", decoration.kind());
        self.decorations.push(decoration);
        Ok(())
    }

    /// Drops a sticker at a random spot away from the edges.
    pub fn add_sticker<R: Rng + ?Sized>(&mut self, glyph: &str, rng: &mut R) -> Result<Point, CompositeError> {
        self.require_ready()?;
        let (w, h) = (self.layout.width as f32, self.layout.height as f32);
        let x = rng.gen_range(25.0..(w - 25.0).max(26.0));
        let y = rng.gen_range(50.0..(h - 50.0).max(51.0));
        let position = Point::new(x, y);
        self.place_decoration(Decoration::Sticker {
            glyph: glyph.to_string(),
            position,
        })?;
        Ok(position)
    }

    /// Adds centred text near the bottom. Blank input is ignored.
    pub fn add_text(&mut self, content: &str) -> Result<bool, CompositeError> {
        self.require_ready()?;
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }
        let position = Point::new(self.layout.width as f32 / 2.0, self.layout.height as f32 - 30.0);
        self.place_decoration(Decoration::Text {
            content: content.to_string(),
            position,
            color: self.theme.text_color(),
            font: FontSpec::bold(TEXT_SIZE),
        })?;
        Ok(true)
    }

    /// Bakes screen-space stickers into the strip.
    pub fn add_dragged(&mut self, stickers: &[FloatingSticker], viewport: &Viewport) -> Result<usize, CompositeError> {
        self.require_ready()?;
        for sticker in stickers {
            self.decorations.push(sticker.bake(viewport));
        }
        Ok(stickers.len())
    }

    pub fn clear_decorations(&mut self) -> Result<(), CompositeError> {
        self.require_ready()?;
        self.decorations.clear();
        Ok(())
    }

    pub fn scene(&self, date: Option<&str>) -> Result<Scene<'_>, CompositeError> {
        self.require_ready()?;
        let mut ops = vec![DrawOp::Background(self.theme)];
        for (index, rect) in self.layout.slots.iter().enumerate() {
            ops.push(DrawOp::PhotoFrame(rect.inflate(self.constants.frame_inset as f32)));
            ops.push(DrawOp::Photo { index, rect: *rect });
        }
        ops.extend(self.decorations.iter().map(DrawOp::Decoration));
        let (w, h) = (self.layout.width as f32, self.layout.height as f32);
        ops.push(DrawOp::Title {
            text: &self.constants.title,
            position: Point::new(w / 2.0, self.constants.title_baseline),
            color: self.theme.text_color(),
            font: FontSpec::bold(self.constants.title_size),
        });
        if let Some(date) = date {
            ops.push(DrawOp::DateStamp {
                text: date.to_string(),
                position: Point::new(w / 2.0, h - 12.0),
                color: self.theme.text_color(),
                font: FontSpec::regular(DATE_SIZE),
            });
        }
        Ok(Scene {
            width: self.layout.width,
            height: self.layout.height,
            ops,
        })
    }

    fn rasterize<R: Rng + ?Sized>(&self, scene: &Scene<'_>, rng: &mut R) -> RgbaImage {
        let mut img = RgbaImage::new(scene.width, scene.height);
        for op in &scene.ops {
            match op {
                DrawOp::Background(theme) => theme.render_background(&mut img, rng),
                DrawOp::PhotoFrame(r) => {
                    fill_rect(&mut img, r.x, r.y, r.w, r.h, WHITE);
                    stroke_rect(&mut img, r.x, r.y, r.w, r.h, 1.0, FRAME_OUTLINE);
                }
                DrawOp::Photo { index, rect } => {
                    if let Some(Some(photo)) = self.photos.get(*index) {
                        draw_image(&mut img, photo, rect.x, rect.y, rect.w, rect.h);
                    }
                }
                DrawOp::Decoration(Decoration::Sticker { glyph, position }) => self.text.draw(
                    &mut img,
                    glyph,
                    position.x,
                    position.y + STICKER_SIZE / 3.0,
                    FontSpec::regular(STICKER_SIZE),
                    self.theme.text_color(),
                    Align::Center,
                ),
                DrawOp::Decoration(Decoration::Text {
                    content,
                    position,
                    color,
                    font,
                }) => self
                    .text
                    .draw(&mut img, content, position.x, position.y, *font, *color, Align::Center),
                DrawOp::Decoration(Decoration::Image {
                    pixels,
                    position,
                    size,
                }) => draw_image(&mut img, pixels, position.x, position.y, size.0, size.1),
                DrawOp::Title {
                    text,
                    position,
                    color,
                    font,
                } => self
                    .text
                    .draw(&mut img, text, position.x, position.y, *font, *color, Align::Center),
                DrawOp::DateStamp {
                    text,
                    position,
                    color,
                    font,
                } => self
                    .text
                    .draw(&mut img, text, position.x, position.y, *font, *color, Align::Center),
            }
        }
        img
    }

    pub fn render_with<R: Rng + ?Sized>(&self, rng: &mut R, date: Option<&str>) -> Result<CompositeStrip, CompositeError> {
        let scene = self.scene(date)?;
        Ok(CompositeStrip {
            image: self.rasterize(&scene, rng),
        })
    }

    pub fn flatten(&self, date: Option<&str>) -> Result<CompositeStrip, CompositeError> {
        self.render_with(&mut rand::thread_rng(), date)
    }

    /// Writes the PNG to `path`, stores its data URI and closes the strip.
    pub fn export(
        &mut self,
        date: Option<&str>,
        store: &mut dyn KeyValueStore,
        path: &Path,
    ) -> Result<CompositeStrip, CompositeError> {
        let strip = self.flatten(date)?;
        let png = strip.to_png()?;
        fs::write(path, &png)?;
        store.set(EDITED_STRIP_KEY, &StillImage::from_encoded(png)?.to_data_uri())?;
        self.state = StripState::Exported;
        log::info!("Exported strip to {}", path.display());
        Ok(strip)
    }
}

/// Date stamp text, e.g. `October 17, 2026`.
pub fn today_label() -> String {
    chrono::Local::now().format("%B %-d, %Y").to_string()
}

/// Wraps an uploaded picture for dragging.
pub fn floating_from_bytes(bytes: &[u8], screen_pos: Point, display_width: f32) -> Result<FloatingSticker, ImageError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    Ok(FloatingSticker::new(Arc::new(image), screen_pos, display_width))
}
