//! Card sheet generation.
//!
//! The pipeline behind the command line. It runs in three steps so that
//! every input problem surfaces before the first page is drawn:
//!
//! ```text
//! 1. Plan     flags + config.toml + deck files  →  Vec<DeckJob>   (all validation)
//! 2. Render   DeckJob                           →  Vec<RenderedDeck>  (PDF bytes)
//! 3. Write    RenderedDeck                      →  files or stdout stream
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── black_card.pdf                  # single deck
//! ├── white_card.pdf
//! ├── expansion-black_card.pdf        # --recursive: prefixed with the deck name
//! └── expansion-white_card.pdf
//! ```
//!
//! With `--output -` both documents go to stdout, black first, behind a
//! `Content-Type: application/pdf` header and a blank line.

use crate::config::{self, CliOverrides, ConfigError, DeckConfig};
use crate::deck::{Card, Deck, DeckError, DeckKind, DeckSources, discover_decks};
use crate::fonts::{FamilySource, FontError, FontTable, build_font_registry};
use crate::geometry::{CardGeometry, GeometryError};
use crate::render::{
    CardStyle, DeckStats, DocumentBackend, FontFaces, Icon, PdfBackend, RenderError, render_deck,
};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header written before the PDF bytes in stream mode.
pub const STREAM_HEADER: &str = "Content-Type: application/pdf\n\n";

/// Deck name used when decks are given as explicit files.
const DEFAULT_DECK_NAME: &str = "cards";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("{0}")]
    Configuration(String),
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
    #[error(transparent)]
    InvalidGeometry(#[from] GeometryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("IO error on {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("IO error writing output stream: {0}")]
    Stream(#[source] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DeckError> for GenerateError {
    fn from(err: DeckError) -> Self {
        match err {
            DeckError::NotFound(path) => GenerateError::InputNotFound(path),
            DeckError::Io(path, e) => GenerateError::Io(path, e),
            DeckError::Walk(e) => GenerateError::Walk(e),
        }
    }
}

impl GenerateError {
    /// Errors caused by how the program was invoked rather than by its inputs.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerateError::Configuration(_))
    }
}

/// Where the deck files come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSelection {
    /// A directory holding `black.txt`/`white.txt`, optionally searched recursively.
    Directory { root: PathBuf, recursive: bool },
    /// Explicit deck files; at least one must be given.
    Files {
        black: Option<PathBuf>,
        white: Option<PathBuf>,
    },
}

/// Where finished documents go.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Directory(PathBuf),
    /// Both documents on one stream, CGI style.
    Stream,
}

impl OutputTarget {
    /// `-` means the stream, anything else is a directory.
    pub fn parse(value: &str) -> Self {
        match value {
            "-" => OutputTarget::Stream,
            dir => OutputTarget::Directory(PathBuf::from(dir)),
        }
    }
}

/// Everything one run needs, as decided by the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub input: InputSelection,
    pub output: OutputTarget,
    /// Explicit config file replacing the root `config.toml`.
    pub config_file: Option<PathBuf>,
    /// Icon replacing both `[icon] file` and a deck's `icon.png`.
    pub icon: Option<PathBuf>,
    pub overrides: CliOverrides,
}

/// A fully validated deck directory, ready to draw.
#[derive(Debug, Clone)]
pub struct DeckJob {
    pub name: String,
    /// Prefix for output file names (recursive mode only).
    pub prefix: Option<String>,
    pub config: DeckConfig,
    pub geometry: CardGeometry,
    pub family: FamilySource,
    /// Faces of `family`, read and parsed during planning.
    pub faces: FontFaces,
    /// Loaded decks in black, white order.
    pub decks: Vec<Deck>,
    pub icon: Option<Icon>,
}

impl DeckJob {
    pub fn output_file_name(&self, kind: DeckKind) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}-{}", kind.output_file_name()),
            None => kind.output_file_name().to_string(),
        }
    }

    pub fn style(&self) -> CardStyle {
        CardStyle {
            font_style: self.config.text.style,
            fit: self.config.text.fit_params(),
            icon_size: self.config.icon.size_mm(),
        }
    }

    fn back(&self) -> Option<Card> {
        self.config
            .backs
            .enabled
            .then(|| Card::new(&self.config.backs.text))
    }
}

/// One finished document.
#[derive(Debug, Clone)]
pub struct RenderedDeck {
    pub deck: String,
    pub kind: DeckKind,
    pub source: PathBuf,
    pub file_name: String,
    pub stats: DeckStats,
    /// `None` when the deck had no cards and no document was produced.
    pub bytes: Option<Vec<u8>>,
}

/// Summary of a run, printed by the CLI or serialized with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub decks: Vec<DeckReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckReport {
    pub deck: String,
    pub kind: DeckKind,
    pub source: PathBuf,
    pub cards: usize,
    pub pages: usize,
    pub clipped_cards: usize,
    /// Written file, or `None` for the stream and for skipped decks.
    pub output: Option<PathBuf>,
    pub skipped: bool,
}

// =============================================================================
// Plan
// =============================================================================

/// Resolve and validate every deck the options select.
pub fn plan(options: &GenerateOptions) -> Result<Vec<DeckJob>, GenerateError> {
    let (root, sources, recursive) = match &options.input {
        InputSelection::Directory { root, recursive } => {
            let sources = discover_decks(root, *recursive)?;
            if sources.is_empty() {
                return Err(GenerateError::InputNotFound(
                    root.join(DeckKind::White.source_file_name()),
                ));
            }
            (root.clone(), sources, *recursive)
        }
        InputSelection::Files { black, white } => {
            if black.is_none() && white.is_none() {
                return Err(GenerateError::Configuration(
                    "no decks given: use --directory, or --white and/or --black".into(),
                ));
            }
            for path in black.iter().chain(white.iter()) {
                if !path.is_file() {
                    return Err(GenerateError::InputNotFound(path.clone()));
                }
            }
            // config.toml and relative paths are looked up next to the first deck file
            let base_dir = black
                .iter()
                .chain(white.iter())
                .find_map(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let sources = DeckSources {
                name: DEFAULT_DECK_NAME.to_string(),
                base_dir: base_dir.clone(),
                black: black.clone(),
                white: white.clone(),
                icon: None,
            };
            (base_dir, vec![sources], false)
        }
    };

    let root_overlay = match &options.config_file {
        Some(path) => {
            if !path.is_file() {
                return Err(GenerateError::InputNotFound(path.clone()));
            }
            Some(config::load_config_file(path)?)
        }
        None => config::load_raw_config(&root)?,
    };
    let base = match root_overlay {
        Some(overlay) => config::merge_toml(config::stock_defaults_value()?, overlay),
        None => config::stock_defaults_value()?,
    };

    sources
        .iter()
        .map(|source| {
            let deck_overlay = if same_dir(&source.base_dir, &root) {
                None
            } else {
                config::load_raw_config(&source.base_dir)?
            };
            let config =
                config::resolve_config(base.clone(), deck_overlay)?.with_overrides(&options.overrides);
            let prefix = recursive.then(|| source.name.clone());
            plan_deck(source, config, prefix, options.icon.as_deref())
        })
        .collect()
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn plan_deck(
    sources: &DeckSources,
    config: DeckConfig,
    prefix: Option<String>,
    icon_override: Option<&Path>,
) -> Result<DeckJob, GenerateError> {
    let geometry = config.geometry();
    geometry.validate()?;

    let family = resolve_family(&config)?;
    let faces = FontFaces::load(&family)?;

    let decks = DeckKind::ALL
        .into_iter()
        .filter_map(|kind| sources.path(kind).map(|path| Deck::load(kind, path)))
        .collect::<Result<Vec<_>, _>>()?;

    let icon_path = match (icon_override, &config.icon.file) {
        (Some(path), _) => Some(required(path.to_path_buf())?),
        (None, Some(file)) => Some(required(file.clone())?),
        (None, None) => sources.icon.clone(),
    };
    let icon = icon_path.as_deref().map(Icon::load).transpose()?;

    info!(
        "planned deck '{}': {}x{} grid, {} font",
        sources.name, geometry.cards_across, geometry.cards_high, config.text.family
    );
    Ok(DeckJob {
        name: sources.name.clone(),
        prefix,
        config,
        geometry,
        family,
        faces,
        decks,
        icon,
    })
}

fn required(path: PathBuf) -> Result<PathBuf, GenerateError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(GenerateError::InputNotFound(path))
    }
}

/// Look up the configured family among built-ins and the configured font
/// directory. Config paths arrive already anchored to their config file.
fn resolve_family(config: &DeckConfig) -> Result<FamilySource, GenerateError> {
    let registry = build_font_registry(config.fonts.directory.as_deref())?;
    let mut table = FontTable::with_builtins();
    registry.merge_into(&mut table);

    let name = &config.text.family;
    match table.get(name) {
        Some(family) => Ok(family.clone()),
        None => Err(RenderError::UnknownFamily(
            name.clone(),
            table.names().collect::<Vec<_>>().join(", "),
        )
        .into()),
    }
}

// =============================================================================
// Render
// =============================================================================

/// Draw every deck of a job with the PDF backend.
pub fn render_job(job: &DeckJob) -> Result<Vec<RenderedDeck>, GenerateError> {
    render_job_with(job, |job| Ok(PdfBackend::new(&job.config.title, &job.faces)))
}

/// Draw every deck of a job with backends from `new_backend`, one per document.
pub fn render_job_with<B, F>(job: &DeckJob, mut new_backend: F) -> Result<Vec<RenderedDeck>, GenerateError>
where
    B: DocumentBackend,
    F: FnMut(&DeckJob) -> Result<B, RenderError>,
{
    let style = job.style();
    let back = job.back();
    let mut rendered = Vec::new();

    for deck in &job.decks {
        let file_name = job.output_file_name(deck.kind);
        if deck.is_empty() {
            warn!(
                "{} has no cards, not writing {}",
                deck.source.display(),
                file_name
            );
            rendered.push(RenderedDeck {
                deck: job.name.clone(),
                kind: deck.kind,
                source: deck.source.clone(),
                file_name,
                stats: DeckStats::default(),
                bytes: None,
            });
            continue;
        }

        let mut backend = new_backend(job)?;
        let stats = render_deck(
            &mut backend,
            &job.geometry,
            deck.kind,
            &deck.cards,
            &style,
            job.icon.as_ref(),
            back.as_ref(),
        )?;
        if stats.clipped_cards > 0 {
            warn!(
                "{}: {} card(s) clipped at {}pt",
                deck.source.display(),
                stats.clipped_cards,
                job.config.text.min_size
            );
        }
        info!(
            "rendered {} {} cards on {} pages",
            stats.cards,
            deck.kind.label(),
            stats.pages
        );
        rendered.push(RenderedDeck {
            deck: job.name.clone(),
            kind: deck.kind,
            source: deck.source.clone(),
            file_name,
            stats,
            bytes: Some(backend.finish()?),
        });
    }
    Ok(rendered)
}

// =============================================================================
// Write
// =============================================================================

/// Write documents to `target`. `stream` receives the stream-mode output.
pub fn write_outputs(
    rendered: &[RenderedDeck],
    target: &OutputTarget,
    stream: &mut impl Write,
) -> Result<RunReport, GenerateError> {
    let mut reports = Vec::new();

    match target {
        OutputTarget::Directory(dir) => {
            fs::create_dir_all(dir).map_err(|e| GenerateError::Io(dir.clone(), e))?;
            for deck in rendered {
                let output = match &deck.bytes {
                    Some(bytes) => {
                        let path = dir.join(&deck.file_name);
                        fs::write(&path, bytes).map_err(|e| GenerateError::Io(path.clone(), e))?;
                        info!("wrote {}", path.display());
                        Some(path)
                    }
                    None => None,
                };
                reports.push(deck_report(deck, output));
            }
        }
        OutputTarget::Stream => {
            stream
                .write_all(STREAM_HEADER.as_bytes())
                .map_err(GenerateError::Stream)?;
            for deck in rendered {
                if let Some(bytes) = &deck.bytes {
                    stream.write_all(bytes).map_err(GenerateError::Stream)?;
                }
                reports.push(deck_report(deck, None));
            }
            stream.flush().map_err(GenerateError::Stream)?;
        }
    }

    Ok(RunReport { decks: reports })
}

fn deck_report(deck: &RenderedDeck, output: Option<PathBuf>) -> DeckReport {
    DeckReport {
        deck: deck.deck.clone(),
        kind: deck.kind,
        source: deck.source.clone(),
        cards: deck.stats.cards,
        pages: deck.stats.pages,
        clipped_cards: deck.stats.clipped_cards,
        output,
        skipped: deck.bytes.is_none(),
    }
}

/// Plan, render and write everything the options select.
///
/// All decks are planned before any is drawn, so a bad input anywhere stops
/// the run without partial output.
pub fn generate(
    options: &GenerateOptions,
    stream: &mut impl Write,
) -> Result<RunReport, GenerateError> {
    let jobs = plan(options)?;
    let mut rendered = Vec::new();
    for job in &jobs {
        rendered.extend(render_job(job)?);
    }
    write_outputs(&rendered, &options.output, stream)
}
