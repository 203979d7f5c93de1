//! Demo driver: a simulated reading session against a synthetic document
//!
//! Opens a synthetic document through the geometry service, then scripts the
//! interactions the engine exists for: a smooth jump to the middle of the
//! document, three rapid zoom steps that collapse into a single geometry
//! recomputation, and a fit-to-width zoom - printing the visible window, the
//! render-gate decisions, and the renderer/cache traffic along the way.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use vellum::{
    Align, Effect, EngineConfig, PageRenderer, Reader, Readiness, RenderCache, RenderDecision,
    RenderKey, ScrollBehavior, ServiceResponse,
};
use vellum::provider::{SyntheticDocumentSpec, SyntheticProvider};
use vellum::service::GeometryService;

const FRAME: Duration = Duration::from_millis(16);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "vellum", about = "Virtualized scroll engine demo", version)]
struct Args {
    /// Pages in the synthetic document
    #[arg(long, default_value_t = 40)]
    pages: usize,

    /// Base page size at scale 1, as WxH
    #[arg(long, default_value = "600x800")]
    page_size: String,

    /// Viewport size, as WxH
    #[arg(long, default_value = "1000x700")]
    viewport: String,

    /// Optional TOML config file with engine tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Stand-in for a rasterizer: produces a label per page and counts calls
struct CountingRenderer {
    renders: usize,
}

impl PageRenderer for CountingRenderer {
    type Output = String;

    fn render_page(&mut self, scale: f32, page_index: usize, _rotate: i32) -> String {
        self.renders += 1;
        format!("page {page_index} at {scale:.2}")
    }
}

struct Session {
    reader: Reader,
    service: GeometryService,
    cache: RenderCache<String>,
    renderer: CountingRenderer,
    now: Instant,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = LevelFilter::from_str(&args.log_level)
        .map_err(|_| anyhow::anyhow!("invalid log level '{}'", args.log_level))?;
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;

    let (page_width, page_height) = parse_size(&args.page_size)?;
    let (viewport_width, viewport_height) = parse_size(&args.viewport)?;
    let config = match &args.config {
        Some(path) => EngineConfig::load_or_default(path),
        None => EngineConfig::default(),
    };

    let mut provider = SyntheticProvider::new();
    provider.insert(
        "demo",
        SyntheticDocumentSpec::uniform(args.pages, page_width, page_height),
    );

    let mut session = Session {
        reader: Reader::new(config.clone(), viewport_width, viewport_height),
        service: GeometryService::spawn(Box::new(provider)),
        cache: RenderCache::new(config.render_cache_capacity),
        renderer: CountingRenderer { renders: 0 },
        now: Instant::now(),
    };

    session.service.open("demo");
    session.wait_until_ready()?;
    println!(
        "ready: {} pages at scale {:.3}, content height {:.0}px",
        session.reader.api().page_count,
        session.reader.scale().unwrap_or(1.0),
        session.reader.total_size()
    );

    // Smooth jump to the middle of the document; fast frames gate to
    // placeholders, the settle frames render.
    session
        .reader
        .jump_to_page(args.pages / 2, Align::Center, ScrollBehavior::Smooth, session.now);
    session.run_frames(30, "jump")?;

    // Three rapid zoom steps inside the debounce window: one geometry
    // recomputation, anchored at the viewport center.
    let anchor = session.reader.virtual_item_and_offset_at(None);
    session.reader.increase_zoom(None, None, session.now);
    session.advance(Duration::from_millis(20));
    session.reader.increase_zoom(None, None, session.now);
    session.advance(Duration::from_millis(20));
    session.reader.increase_zoom(None, None, session.now);
    session.run_frames(20, "zoom x3")?;
    if let (Some(before), Some(after)) = (anchor, session.reader.virtual_item_and_offset_at(None)) {
        println!(
            "anchor held page {} at {:.1}% -> page {} at {:.1}%",
            before.index, before.percentage_offset_y, after.index, after.percentage_offset_y
        );
    }

    // Back to fit-width.
    session.reader.zoom_fit_width(session.now);
    session.run_frames(20, "fit width")?;

    println!(
        "renderer invoked {} times, cache holds {} pages",
        session.renderer.renders,
        session.cache.len()
    );
    Ok(())
}

impl Session {
    /// Pump service responses until the first geometry batch lands
    fn wait_until_ready(&mut self) -> Result<()> {
        while self.reader.readiness() != Readiness::Ready {
            let Some(response) = self.service.recv_timeout(RESPONSE_TIMEOUT) else {
                bail!("geometry service timed out");
            };
            self.apply_response(response)?;
        }
        Ok(())
    }

    /// Advance simulated frames: tick, drain responses, render the window
    fn run_frames(&mut self, frames: usize, label: &str) -> Result<()> {
        for _ in 0..frames {
            self.advance(FRAME);
            self.render_frame();
        }
        let window: Vec<usize> = self
            .reader
            .visible_pages()
            .iter()
            .map(|p| p.item.index)
            .collect();
        println!(
            "[{label}] scroll {:.0}px, scale {:.3}, visible {window:?}",
            self.reader.viewport().scroll_top,
            self.reader.scale().unwrap_or(1.0),
        );
        Ok(())
    }

    fn advance(&mut self, by: Duration) {
        self.now += by;
        let effects = self.reader.tick(self.now);
        self.dispatch(effects);
        while let Some(response) = self.service.try_recv() {
            // Response handling can only fail before a document is open.
            let _ = self.apply_response(response);
        }
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RequestGeometry { key, scale, rotation } => {
                    self.service.request_geometry(key, scale, rotation);
                    // Block for the batch so the scripted session stays
                    // deterministic; an interactive host would keep pumping.
                    while let Some(response) = self.service.recv_timeout(RESPONSE_TIMEOUT) {
                        let done = matches!(
                            &response,
                            ServiceResponse::Geometry { key: reply, .. } if *reply == key
                        );
                        let _ = self.apply_response(response);
                        if done {
                            break;
                        }
                    }
                }
                Effect::ApiChanged => {
                    let api = self.reader.api();
                    info!(
                        "api: scale {:?}, {} pages, {:?}",
                        api.scale, api.page_count, api.readiness
                    );
                }
            }
        }
    }

    fn apply_response(&mut self, response: ServiceResponse) -> Result<()> {
        let effects = match response {
            ServiceResponse::Opened { document, info } => {
                self.reader.document_opened(document, &info)
            }
            ServiceResponse::OpenFailed { source, error } => {
                self.reader.document_failed(&error);
                return Err(error).with_context(|| format!("opening '{source}'"));
            }
            ServiceResponse::Geometry { key, result } => {
                self.reader.geometry_resolved(key, result, self.now)
            }
        };
        self.dispatch(effects);
        Ok(())
    }

    /// Render the visible window through the LRU cache; placeholders cost
    /// nothing
    fn render_frame(&mut self) {
        let scale = self.reader.scale().unwrap_or(1.0);
        let renderer = &mut self.renderer;
        for placement in self.reader.visible_pages() {
            if placement.decision == RenderDecision::Full {
                let key = RenderKey::new(placement.item.index, scale, 0);
                self.cache.get_or_insert_with(key, || {
                    renderer.render_page(scale, placement.item.index, 0)
                });
            }
        }
    }
}

fn parse_size(s: &str) -> Result<(f32, f32)> {
    let (width, height) = s
        .split_once('x')
        .with_context(|| format!("expected WxH, got '{s}'"))?;
    Ok((
        width.trim().parse().with_context(|| format!("bad width in '{s}'"))?,
        height.trim().parse().with_context(|| format!("bad height in '{s}'"))?,
    ))
}
