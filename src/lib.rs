//! # asset-export
//!
//! Incremental asset export for the game build. Source assets live in three
//! trees; each is mirrored into a subfolder of the output root:
//!
//! ```text
//! assets/tiled/maps/**.tmx       →  root/res/maps/**.lua          (tiled --export-map)
//! assets/tiled/tilesets/**.tsx   →  root/res/tilesets/**.lua      (tiled --export-tileset)
//! assets/tiled/tilesets/**.png   →  root/res/tilesets/**.png      (copied)
//! assets/ase/**.ase              →  root/res/sprites/**.json/.png (aseprite sheet export)
//! ```
//!
//! An asset is only touched when its output is missing or older than the
//! source. Any directory named `editoronly` is skipped along with everything
//! below it. The first tool failure ends the run with a non-zero exit code.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`staleness`] | mtime comparison deciding whether an output must be rebuilt |
//! | [`paths`] | Categories and pure source → destination path mapping |
//! | [`export`] | Tool invocation records, the [`export::ToolRunner`] seam, write-then-rename promotion |
//! | [`walk`] | Recursive walk of one category with `editoronly` pruning |
//! | [`pipeline`] | Runs the categories in order and builds the run report |
//! | [`config`] | `assetexport.toml` loading, env overrides, validation |
//! | [`output`] | Diagnostic line and summary formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Sequential, stop on first error
//!
//! Assets are exported one at a time and every tool call blocks. A failing
//! export aborts the run; outputs written before it are kept, and the next
//! run picks up where this one stopped because finished assets are fresh.
//!
//! ## Tools behind a trait
//!
//! Argument lists are built as [`export::ToolInvocation`] records rather than
//! command strings, and executed through [`export::ToolRunner`]. Tests run
//! the whole pipeline against a recording runner; the binary uses
//! [`export::ProcessRunner`].

pub mod config;
pub mod export;
pub mod logging;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod staleness;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
