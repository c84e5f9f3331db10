//! External tool invocation and promotion of exported files.
//!
//! Tiled and Aseprite are treated as black boxes. Each export is described
//! by a [`ToolInvocation`] record (program, argument list, files it will
//! write) built from [`ToolTemplates`], and executed through the
//! [`ToolRunner`] trait so tests can substitute a recording runner.
//!
//! ## Write-then-rename
//!
//! Tools never write into the output tree directly. They write next to the
//! source file, and only after a zero exit code is each file renamed into
//! its final location:
//!
//! ```text
//! assets/tiled/maps/world/a.tmx
//!   tiled --export-map lua a.tmx a.lua     → assets/tiled/maps/world/a.lua
//!   rename                                 → root/res/maps/world/a.lua
//! ```
//!
//! A failed tool leaves the output tree untouched. Whatever it wrote next to
//! the source stays there.

use crate::config::{AsepriteConfig, PipelineConfig, TiledConfig};
use crate::paths::{LUA_EXTENSION, SPRITE_DATA_EXTENSION, SPRITE_SHEET_EXTENSION, intermediate_path};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to start {}: {source}", tool.display())]
    Spawn { tool: PathBuf, source: io::Error },
    #[error("{} failed on {} ({})", tool.display(), asset.display(), describe_code(*code))]
    ToolFailed {
        tool: PathBuf,
        asset: PathBuf,
        code: Option<i32>,
    },
    #[error("{} exited successfully but did not write {}", tool.display(), output.display())]
    MissingOutput { tool: PathBuf, output: PathBuf },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

/// What an external tool is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Map,
    Tileset,
    Sprite,
}

impl ExportKind {
    /// Extensions of the files one export writes. The first is the primary
    /// destination; the rest share its stem.
    pub fn output_extensions(self) -> &'static [&'static str] {
        match self {
            ExportKind::Map | ExportKind::Tileset => &[LUA_EXTENSION],
            ExportKind::Sprite => &[SPRITE_DATA_EXTENSION, SPRITE_SHEET_EXTENSION],
        }
    }
}

/// A single, fully resolved tool command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Files the tool is expected to write, in [`ExportKind::output_extensions`] order.
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status of a finished tool. `None` means killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOutcome {
    pub code: Option<i32>,
}

impl ToolOutcome {
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a tool invocation to completion.
pub trait ToolRunner {
    /// Block until the tool exits. `Err` only when it could not be started.
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutcome>;
}

/// Production runner: spawns the program with inherited stdio and waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutcome> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()?;
        Ok(ToolOutcome {
            code: status.code(),
        })
    }
}

/// Argument templates for the two authoring tools.
#[derive(Debug, Clone, Default)]
pub struct ToolTemplates {
    pub tiled: TiledConfig,
    pub aseprite: AsepriteConfig,
}

impl ToolTemplates {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            tiled: config.tiled.clone(),
            aseprite: config.aseprite.clone(),
        }
    }

    /// Build the invocation for `kind`. Outputs go to intermediate paths
    /// beside `source`.
    pub fn invocation(&self, kind: ExportKind, source: &Path) -> ToolInvocation {
        match kind {
            ExportKind::Map => {
                self.tiled_export("--export-map", source, &intermediate_path(source, LUA_EXTENSION))
            }
            ExportKind::Tileset => self.tiled_export(
                "--export-tileset",
                source,
                &intermediate_path(source, LUA_EXTENSION),
            ),
            ExportKind::Sprite => self.sprite_export(
                source,
                &intermediate_path(source, SPRITE_DATA_EXTENSION),
                &intermediate_path(source, SPRITE_SHEET_EXTENSION),
            ),
        }
    }

    fn tiled_export(&self, verb: &str, source: &Path, output: &Path) -> ToolInvocation {
        let mut args: Vec<OsString> = self.tiled.export_options.iter().map(OsString::from).collect();
        args.push(verb.into());
        args.push(LUA_EXTENSION.into());
        args.push(source.into());
        args.push(output.into());
        ToolInvocation {
            program: self.tiled.program.clone(),
            args,
            outputs: vec![output.to_path_buf()],
        }
    }

    fn sprite_export(&self, source: &Path, data: &Path, sheet: &Path) -> ToolInvocation {
        let opts = &self.aseprite;
        let mut args: Vec<OsString> = vec![
            "-b".into(),
            source.into(),
            "--data".into(),
            data.into(),
            "--sheet".into(),
            sheet.into(),
            "--format".into(),
            "json-array".into(),
            "--sheet-type".into(),
            opts.sheet_type.as_str().into(),
        ];
        let flags = [
            (opts.trim, "--trim"),
            (opts.merge_duplicates, "--merge-duplicates"),
            (opts.list_tags, "--list-tags"),
            (opts.ignore_empty, "--ignore-empty"),
        ];
        args.extend(flags.iter().filter(|(on, _)| *on).map(|(_, f)| OsString::from(*f)));
        args.extend(opts.extra_args.iter().map(OsString::from));
        ToolInvocation {
            program: opts.program.clone(),
            args,
            outputs: vec![data.to_path_buf(), sheet.to_path_buf()],
        }
    }
}

/// Runs exports and pass-through copies.
pub struct Exporter<R: ToolRunner> {
    runner: R,
    tools: ToolTemplates,
}

impl<R: ToolRunner> Exporter<R> {
    pub fn new(runner: R, tools: ToolTemplates) -> Self {
        Self { runner, tools }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Export `source` so that its primary output lands at `destination`.
    ///
    /// Secondary outputs (the sprite sheet image) land beside `destination`
    /// with their own extension. Nothing is written under the destination
    /// tree unless the tool exits with status zero.
    pub fn export(
        &self,
        kind: ExportKind,
        source: &Path,
        destination: &Path,
    ) -> Result<(), ExportError> {
        let invocation = self.tools.invocation(kind, source);

        tracing::debug!(command = %invocation, "running export tool");
        let outcome = self
            .runner
            .run(&invocation)
            .map_err(|e| ExportError::Spawn {
                tool: invocation.program.clone(),
                source: e,
            })?;

        if !outcome.success() {
            for leftover in invocation.outputs.iter().filter(|p| p.exists()) {
                tracing::warn!(path = %leftover.display(), "intermediate file left behind by failed export");
            }
            return Err(ExportError::ToolFailed {
                tool: invocation.program,
                asset: source.to_path_buf(),
                code: outcome.code,
            });
        }

        if let Some(missing) = invocation.outputs.iter().find(|p| !p.exists()) {
            return Err(ExportError::MissingOutput {
                tool: invocation.program.clone(),
                output: missing.clone(),
            });
        }

        for (intermediate, ext) in invocation.outputs.iter().zip(kind.output_extensions()) {
            let target = destination.with_extension(ext);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(intermediate, &target)?;
        }
        Ok(())
    }

    /// Copy an already-final asset into place. No tool, no intermediate.
    pub fn copy(&self, source: &Path, destination: &Path) -> Result<(), ExportError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        Ok(())
    }
}
