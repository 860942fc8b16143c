//! photostrip — a desktop photobooth.
//! - Live preview from a camera folder or test pattern, CSS-style filters and a VHS effect
//! - Up to three captures per session, handed to the editor via store or query string
//! - Themed vertical strips with emoji, text and draggable image stickers
//! - PNG export plus headless `strip`, `vhs` and `filter` commands

mod app;
mod booth;
mod capture;
mod compositor;
mod config;
mod error;
mod raster;
mod session;
mod storage;
mod text;
mod theme;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use eframe::egui;
use image::ImageError;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    app::PhotoBoothApp,
    capture::{ColorFilter, DirectorySource, EffectLoop, FrameSource, TestPattern},
    compositor::{today_label, Compositor},
    config::Settings,
    error::{CaptureError, CompositeError, FilterError, StoreError},
    session::{Session, StillImage},
    storage::{DirStore, KeyValueStore, MemoryStore},
    text::TextPainter,
    theme::Theme,
};

// ------------------------- CLI -------------------------

#[derive(Parser)]
#[command(name = "photostrip", version, about = "Photobooth strips from the desktop or the shell")]
struct Args {
    /// Optional settings file (.json / .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder or image to use as the camera
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Headless commands (no UI)
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Compose up to three images into a strip
    Strip {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print today's date under the photos
        #[arg(long)]
        date: bool,
        /// Emoji sticker to scatter on the strip (repeatable)
        #[arg(long)]
        sticker: Vec<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Run one frame of the VHS effect over an image
    Vhs {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Apply a CSS-style filter chain to an image
    Filter {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        spec: String,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Image: {0}")]
    Image(#[from] ImageError),
    #[error("IO: {0}")]
    Io(#[from] io::Error),
}

// ------------------------- Headless -------------------------

struct StripRequest<'a> {
    images: &'a [PathBuf],
    theme: Option<Theme>,
    out: Option<PathBuf>,
    date: bool,
    stickers: &'a [String],
    text: Option<&'a str>,
}

fn run_strip(settings: &Settings, req: StripRequest<'_>) -> Result<PathBuf, CliError> {
    let mut stills = Vec::with_capacity(req.images.len());
    for path in req.images {
        stills.push(StillImage::from_encoded(fs::read(path)?)?);
    }
    let session = Session::from_stills(stills);

    let painter = TextPainter::discover(settings.font_path.as_deref());
    let mut compositor = Compositor::new(settings.layout.clone(), req.theme.unwrap_or(settings.theme), painter);
    compositor.load(session.stills())?;
    compositor.wait_ready()?;

    let mut rng = rand::thread_rng();
    for glyph in req.stickers {
        compositor.add_sticker(glyph, &mut rng)?;
    }
    if let Some(text) = req.text {
        compositor.add_text(text)?;
    }

    let date = (req.date || settings.date_stamp).then(today_label);
    let out = req.out.unwrap_or_else(|| PathBuf::from(&settings.download_name));
    let mut store = DirStore::open(&settings.storage_dir)?;
    compositor.export(date.as_deref(), &mut store, &out)?;
    Ok(out)
}

fn run_vhs(settings: &Settings, input: &Path, output: &Path, seed: Option<u64>) -> Result<(), CliError> {
    let frame = image::open(input)?.to_rgba8();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut effect = EffectLoop::new(settings.vhs);
    effect.start();
    let out = effect.tick(&frame, &TextPainter::discover(settings.font_path.as_deref()), &mut rng);
    effect.stop();
    out.save(output)?;
    Ok(())
}

fn run_filter(input: &Path, output: &Path, spec: &str) -> Result<(), CliError> {
    let filter: ColorFilter = spec.parse()?;
    let mut img = image::open(input)?.to_rgba8();
    filter.apply(&mut img);
    img.save(output)?;
    Ok(())
}

fn run_headless(settings: &Settings, cmd: Cmd) -> Result<(), CliError> {
    match cmd {
        Cmd::Strip {
            images,
            theme,
            out,
            date,
            sticker,
            text,
        } => {
            let out = run_strip(
                settings,
                StripRequest {
                    images: &images,
                    theme,
                    out,
                    date,
                    stickers: &sticker,
                    text: text.as_deref(),
                },
            )?;
            log::info!("Wrote {}", out.display());
        }
        Cmd::Vhs {
            input,
            output,
            seed,
        } => {
            run_vhs(settings, &input, &output, seed)?;
            log::info!("Wrote {}", output.display());
        }
        Cmd::Filter {
            input,
            output,
            spec,
        } => {
            run_filter(&input, &output, &spec)?;
            log::info!("Wrote {}", output.display());
        }
    }
    Ok(())
}

// ------------------------- Entry -------------------------

fn open_source(settings: &Settings) -> Result<Box<dyn FrameSource>, CaptureError> {
    match &settings.source {
        Some(path) => Ok(Box::new(DirectorySource::open(path)?)),
        None => Ok(Box::new(TestPattern::new(640, 480))),
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = config::settings_or_default(args.config.as_deref());
    if let Some(source) = args.source {
        settings.source = Some(source);
    }

    if let Some(cmd) = args.cmd {
        if let Err(err) = run_headless(&settings, cmd) {
            log::error!("{err}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let source = open_source(&settings);
    let store: Box<dyn KeyValueStore> = match DirStore::open(&settings.storage_dir) {
        Ok(store) => Box::new(store),
        Err(err) => {
            log::warn!("Storage unavailable ({err}); photos will not survive a restart");
            Box::new(MemoryStore::new())
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([800.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "photostrip",
        options,
        Box::new(|_cc| Box::new(PhotoBoothApp::new(settings, source, store))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn cli_parses_strip_command() {
        let args = Args::try_parse_from([
            "photostrip",
            "strip",
            "a.png",
            "b.png",
            "--theme",
            "space",
            "--sticker",
            "🎉",
            "--sticker",
            "🌟",
            "--date",
        ])
        .unwrap();
        match args.cmd {
            Some(Cmd::Strip {
                images,
                theme,
                sticker,
                date,
                ..
            }) => {
                assert_eq!(images.len(), 2);
                assert_eq!(theme, Some(Theme::Space));
                assert_eq!(sticker, ["🎉", "🌟"]);
                assert!(date);
            }
            _ => panic!("expected strip command"),
        }
        assert!(Args::try_parse_from(["photostrip", "strip"]).is_err());
    }

    #[test]
    fn headless_strip_exports_png_and_store_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = Vec::new();
        for (i, shade) in [30u8, 120, 210].into_iter().enumerate() {
            let path = dir.path().join(format!("{i}.png"));
            RgbaImage::from_pixel(80, 30, Rgba([shade, shade, shade, 255]))
                .save(&path)
                .unwrap();
            images.push(path);
        }
        let settings = Settings {
            storage_dir: dir.path().join("store"),
            ..Settings::default()
        };
        let out = dir.path().join("strip.png");
        let written = run_strip(
            &settings,
            StripRequest {
                images: &images,
                theme: Some(Theme::Summer),
                out: Some(out.clone()),
                date: false,
                stickers: &[],
                text: Some("hi"),
            },
        )
        .unwrap();
        assert_eq!(written, out);
        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (400, 480));
        let store = DirStore::open(dir.path().join("store")).unwrap();
        assert!(store
            .get(storage::EDITED_STRIP_KEY)
            .unwrap()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[test]
    fn headless_filter_rejects_unknown_functions() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255])).save(&input).unwrap();
        let err = run_filter(&input, &dir.path().join("out.png"), "glow(2)").unwrap_err();
        assert!(matches!(err, CliError::Filter(FilterError::UnknownFunction(_))));
    }

    #[test]
    fn headless_vhs_is_reproducible_with_seed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        RgbaImage::from_pixel(32, 32, Rgba([128, 128, 128, 255])).save(&input).unwrap();
        let settings = Settings {
            vhs: capture::VhsParams {
                timestamp: false,
                ..Default::default()
            },
            ..Settings::default()
        };
        let (a, b) = (dir.path().join("a.png"), dir.path().join("b.png"));
        run_vhs(&settings, &input, &a, Some(4)).unwrap();
        run_vhs(&settings, &input, &b, Some(4)).unwrap();
        assert_eq!(image::open(&a).unwrap().to_rgba8(), image::open(&b).unwrap().to_rgba8());
    }
}
