//! Recursive walk of one asset category.
//!
//! The walker visits every regular file under a category's source root,
//! classifies it by extension, and exports or copies it when its output is
//! stale. Directories named after the exclusion marker (`editoronly` by
//! default) are pruned before they are entered, so nothing beneath them is
//! ever looked at.
//!
//! | Category | Extension | Handling | Output |
//! |---|---|---|---|
//! | maps | `.tmx` | Tiled `--export-map` | `.lua` |
//! | tilesets | `.tsx` | Tiled `--export-tileset` | `.lua` |
//! | tilesets | `.png` `.jpg` `.jpeg` `.gif` `.bmp` `.webp` | copy | unchanged |
//! | sprites | `.ase` `.aseprite` | Aseprite sheet export | `.json` + `.png` |
//!
//! Anything else is ignored. The first failure stops the walk; files handled
//! before it stay in place.

use crate::export::{ExportError, ExportKind, Exporter, ToolRunner};
use crate::paths::{Category, PathError, PathMapper, extension_of};
use crate::staleness::{needs_update, needs_update_any};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

const TILESET_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];
const SPRITE_EXTENSIONS: &[&str] = &["ase", "aseprite"];

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// How a recognized file is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Map,
    Tileset,
    TilesetImage,
    Sprite,
}

impl AssetKind {
    /// Classify a file found under `category`'s root. `None` means ignore.
    pub fn classify(category: Category, path: &Path) -> Option<AssetKind> {
        let ext = extension_of(path)?;
        let ext = ext.as_str();
        match category {
            Category::Maps if ext == "tmx" => Some(AssetKind::Map),
            Category::Tilesets if ext == "tsx" => Some(AssetKind::Tileset),
            Category::Tilesets if TILESET_IMAGE_EXTENSIONS.contains(&ext) => {
                Some(AssetKind::TilesetImage)
            }
            Category::Sprites if SPRITE_EXTENSIONS.contains(&ext) => Some(AssetKind::Sprite),
            _ => None,
        }
    }

    /// Tool export for this kind; `None` for plain copies.
    pub fn export_kind(self) -> Option<ExportKind> {
        match self {
            AssetKind::Map => Some(ExportKind::Map),
            AssetKind::Tileset => Some(ExportKind::Tileset),
            AssetKind::TilesetImage => None,
            AssetKind::Sprite => Some(ExportKind::Sprite),
        }
    }

    /// Short tag used in diagnostic lines.
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Map => "TMX",
            AssetKind::Tileset => "TSX",
            AssetKind::TilesetImage => "IMG",
            AssetKind::Sprite => "ASE",
        }
    }
}

/// Progress notification sent while walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// About to export or copy. Sent before the tool runs.
    Updating {
        kind: AssetKind,
        source: PathBuf,
        destination: PathBuf,
    },
    /// Dry run: would have been updated.
    Stale {
        kind: AssetKind,
        source: PathBuf,
        destination: PathBuf,
    },
    /// Output is current; nothing to do.
    Fresh {
        kind: AssetKind,
        source: PathBuf,
        destination: PathBuf,
    },
}

/// Per-walk counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub exported: u32,
    pub copied: u32,
    pub fresh: u32,
    /// Only counted in dry runs.
    pub stale: u32,
}

impl WalkStats {
    pub fn total(&self) -> u32 {
        self.exported + self.copied + self.fresh + self.stale
    }

    pub fn add(&mut self, other: &WalkStats) {
        self.exported += other.exported;
        self.copied += other.copied;
        self.fresh += other.fresh;
        self.stale += other.stale;
    }
}

impl fmt::Display for WalkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stale > 0 {
            write!(f, "{} stale, {} up to date", self.stale, self.fresh)
        } else {
            write!(
                f,
                "{} exported, {} copied, {} up to date",
                self.exported, self.copied, self.fresh
            )
        }
    }
}

/// Walks category roots and dispatches each file.
pub struct Walker<'a, R: ToolRunner> {
    exporter: &'a Exporter<R>,
    mapper: &'a PathMapper,
    exclude_dir: &'a str,
    dry_run: bool,
    events: Option<Sender<AssetEvent>>,
}

impl<'a, R: ToolRunner> Walker<'a, R> {
    pub fn new(exporter: &'a Exporter<R>, mapper: &'a PathMapper, exclude_dir: &'a str) -> Self {
        Self {
            exporter,
            mapper,
            exclude_dir,
            dry_run: false,
            events: None,
        }
    }

    /// Report stale assets without running tools or copying.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn events(mut self, events: Option<Sender<AssetEvent>>) -> Self {
        self.events = events;
        self
    }

    /// Walk `base` as the source root of `category`.
    ///
    /// A missing root is an error, not an empty walk.
    pub fn walk(&self, category: Category, base: &Path) -> Result<WalkStats, WalkError> {
        let mut stats = WalkStats::default();
        let entries = WalkDir::new(base)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e, self.exclude_dir));

        for entry in entries {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            match AssetKind::classify(category, path) {
                Some(kind) => self.visit(category, base, path, kind, &mut stats)?,
                None => tracing::trace!(path = %path.display(), "ignoring unrecognized file"),
            }
        }
        Ok(stats)
    }

    fn visit(
        &self,
        category: Category,
        base: &Path,
        source: &Path,
        kind: AssetKind,
        stats: &mut WalkStats,
    ) -> Result<(), WalkError> {
        let (destination, stale) = match kind.export_kind() {
            Some(export) => {
                let extensions = export.output_extensions();
                let primary = self.mapper.destination(category, base, source, extensions[0])?;
                let outputs: Vec<PathBuf> =
                    extensions.iter().map(|e| primary.with_extension(e)).collect();
                let stale = needs_update_any(source, &outputs)?;
                (primary, stale)
            }
            None => {
                let destination = self.mapper.passthrough(category, base, source)?;
                let stale = needs_update(source, &destination)?;
                (destination, stale)
            }
        };

        if !stale {
            tracing::debug!(source = %source.display(), "up to date");
            stats.fresh += 1;
            self.emit(AssetEvent::Fresh {
                kind,
                source: source.to_path_buf(),
                destination,
            });
            return Ok(());
        }

        if self.dry_run {
            stats.stale += 1;
            self.emit(AssetEvent::Stale {
                kind,
                source: source.to_path_buf(),
                destination,
            });
            return Ok(());
        }

        self.emit(AssetEvent::Updating {
            kind,
            source: source.to_path_buf(),
            destination: destination.clone(),
        });
        match kind.export_kind() {
            Some(export) => {
                self.exporter.export(export, source, &destination)?;
                stats.exported += 1;
            }
            None => {
                self.exporter.copy(source, &destination)?;
                stats.copied += 1;
            }
        }
        Ok(())
    }

    fn emit(&self, event: AssetEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}

/// True for a directory below the walk root whose name is the marker.
fn is_excluded(entry: &DirEntry, marker: &str) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == marker
}
