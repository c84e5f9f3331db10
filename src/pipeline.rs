//! Full export run across categories.
//!
//! Categories run one after another in the order given (a full build is
//! maps, then tilesets, then sprites). The first failing category ends the
//! run; its error carries the category so the user knows where it stopped.

use crate::config::PipelineConfig;
use crate::export::{Exporter, ProcessRunner, ToolRunner, ToolTemplates};
use crate::paths::{Category, PathMapper};
use crate::walk::{AssetEvent, WalkError, WalkStats, Walker};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{category}: {source}")]
    Walk {
        category: Category,
        source: WalkError,
    },
}

/// What to run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub categories: Vec<Category>,
    pub dry_run: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            dry_run: false,
        }
    }
}

/// Result of one category walk.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub source_root: PathBuf,
    pub stats: WalkStats,
}

/// Result of a whole run, written by `build --report`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub output_root: PathBuf,
    pub categories: Vec<CategoryReport>,
}

impl RunReport {
    pub fn totals(&self) -> WalkStats {
        let mut totals = WalkStats::default();
        for report in &self.categories {
            totals.add(&report.stats);
        }
        totals
    }
}

/// Run the pipeline with real tool processes.
///
/// `config` paths must already be resolved against the project directory.
pub fn build(
    config: &PipelineConfig,
    options: &BuildOptions,
    events: Option<Sender<AssetEvent>>,
) -> Result<RunReport, PipelineError> {
    let exporter = Exporter::new(ProcessRunner, ToolTemplates::from_config(config));
    build_with_exporter(&exporter, config, options, events)
}

/// Run the pipeline with a specific exporter (allows testing with a mock runner).
pub fn build_with_exporter<R: ToolRunner>(
    exporter: &Exporter<R>,
    config: &PipelineConfig,
    options: &BuildOptions,
    events: Option<Sender<AssetEvent>>,
) -> Result<RunReport, PipelineError> {
    let mapper = PathMapper::new(&config.paths.output);
    let walker = Walker::new(exporter, &mapper, &config.paths.exclude_dir)
        .dry_run(options.dry_run)
        .events(events);

    let mut categories = Vec::new();
    for &category in &options.categories {
        let root = config.paths.source_root(category);
        tracing::info!(%category, root = %root.display(), "walking");
        let stats = walker
            .walk(category, root)
            .map_err(|source| PipelineError::Walk { category, source })?;
        categories.push(CategoryReport {
            category,
            source_root: root.to_path_buf(),
            stats,
        });
    }

    Ok(RunReport {
        dry_run: options.dry_run,
        output_root: config.paths.output.clone(),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::MockRunner;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    fn project() -> (TempDir, PipelineConfig) {
        let tmp = TempDir::new().unwrap();
        let config = PipelineConfig::default().rooted_at(tmp.path());
        for category in Category::ALL {
            std::fs::create_dir_all(config.paths.source_root(category)).unwrap();
        }
        (tmp, config)
    }

    #[test]
    fn full_build_runs_categories_in_order() {
        let (tmp, config) = project();
        write_file(&config.paths.maps.join("a.tmx"), "<map/>");
        write_file(&config.paths.tilesets.join("t.tsx"), "<tileset/>");
        write_file(&config.paths.tilesets.join("t.png"), "png");
        write_file(&config.paths.sprites.join("hero.ase"), "ase");

        let exporter = Exporter::new(MockRunner::succeeding(), ToolTemplates::from_config(&config));
        let report =
            build_with_exporter(&exporter, &config, &BuildOptions::default(), None).unwrap();

        let order: Vec<_> = report.categories.iter().map(|c| c.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        let totals = report.totals();
        assert_eq!(totals.exported, 3);
        assert_eq!(totals.copied, 1);

        let res = tmp.path().join("root/res");
        assert!(res.join("maps/a.lua").exists());
        assert!(res.join("tilesets/t.lua").exists());
        assert!(res.join("tilesets/t.png").exists());
        assert!(res.join("sprites/hero.json").exists());
        assert!(res.join("sprites/hero.png").exists());
    }

    #[test]
    fn failure_names_category_and_stops_later_categories() {
        let (_tmp, config) = project();
        write_file(&config.paths.maps.join("a.tmx"), "<map/>");
        write_file(&config.paths.sprites.join("hero.ase"), "ase");

        let exporter = Exporter::new(MockRunner::failing(1), ToolTemplates::from_config(&config));
        let err = build_with_exporter(&exporter, &config, &BuildOptions::default(), None)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Walk {
                category: Category::Maps,
                ..
            }
        ));
        assert!(err.to_string().starts_with("maps: "));
        assert_eq!(exporter.runner().get_invocations().len(), 1);
    }

    #[test]
    fn single_category_run() {
        let (_tmp, config) = project();
        write_file(&config.paths.maps.join("a.tmx"), "<map/>");
        write_file(&config.paths.sprites.join("hero.ase"), "ase");

        let exporter = Exporter::new(MockRunner::succeeding(), ToolTemplates::from_config(&config));
        let options = BuildOptions {
            categories: vec![Category::Sprites],
            dry_run: false,
        };
        let report = build_with_exporter(&exporter, &config, &options, None).unwrap();

        assert_eq!(report.categories.len(), 1);
        assert_eq!(exporter.runner().get_invocations().len(), 1);
        assert_eq!(
            exporter.runner().get_invocations()[0].program,
            PathBuf::from("aseprite")
        );
    }

    #[test]
    fn report_serializes_to_json() {
        let (_tmp, config) = project();
        let exporter = Exporter::new(MockRunner::succeeding(), ToolTemplates::from_config(&config));
        let report =
            build_with_exporter(&exporter, &config, &BuildOptions::default(), None).unwrap();

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["categories"][0]["category"], "maps");
        assert_eq!(json["categories"][2]["stats"]["exported"], 0);
    }
}
