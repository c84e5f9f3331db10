//! Pipeline configuration.
//!
//! Settings come from four layers, each overriding the one before:
//!
//! 1. stock defaults (the layout the game repo has always used)
//! 2. `assetexport.toml` in the project directory
//! 3. the `TILED` / `ASEPRITE` environment variables
//! 4. command-line flags (applied by the binary)
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! maps = "assets/tiled/maps"          # Tiled map sources (*.tmx)
//! tilesets = "assets/tiled/tilesets"  # Tiled tilesets (*.tsx) and their images
//! sprites = "assets/ase"              # Aseprite sources (*.ase, *.aseprite)
//! output = "root/res"                 # Output root; categories go in subfolders
//! exclude_dir = "editoronly"          # Directories with this name are never exported
//!
//! [tiled]
//! program = "tiled"                   # Overridden by $TILED
//! export_options = []                 # Extra flags placed before --export-map/--export-tileset
//!
//! [aseprite]
//! program = "aseprite"                # Overridden by $ASEPRITE
//! sheet_type = "packed"               # packed | rows | columns | horizontal | vertical
//! trim = true
//! merge_duplicates = true
//! list_tags = true
//! ignore_empty = false
//! extra_args = []
//! ```
//!
//! Config files are sparse; unknown keys are rejected to catch typos early.

use crate::paths::Category;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the project directory.
pub const CONFIG_FILENAME: &str = "assetexport.toml";

/// Environment variable overriding the Tiled executable.
pub const TILED_ENV: &str = "TILED";
/// Environment variable overriding the Aseprite executable.
pub const ASEPRITE_ENV: &str = "ASEPRITE";

const SHEET_TYPES: &[&str] = &["packed", "rows", "columns", "horizontal", "vertical"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Source roots, output root and the exclusion marker.
    pub paths: PathsConfig,
    /// Tiled invocation settings (maps and tilesets).
    pub tiled: TiledConfig,
    /// Aseprite invocation settings (sprite sheets).
    pub aseprite: AsepriteConfig,
}

/// Filesystem layout, relative to the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub maps: PathBuf,
    pub tilesets: PathBuf,
    pub sprites: PathBuf,
    pub output: PathBuf,
    /// Directory name pruned from every walk, with everything beneath it.
    pub exclude_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            maps: PathBuf::from("assets/tiled/maps"),
            tilesets: PathBuf::from("assets/tiled/tilesets"),
            sprites: PathBuf::from("assets/ase"),
            output: PathBuf::from("root/res"),
            exclude_dir: "editoronly".to_string(),
        }
    }
}

impl PathsConfig {
    /// Source root walked for `category`.
    pub fn source_root(&self, category: Category) -> &Path {
        match category {
            Category::Maps => &self.maps,
            Category::Tilesets => &self.tilesets,
            Category::Sprites => &self.sprites,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TiledConfig {
    pub program: PathBuf,
    /// Flags such as `--embed-tilesets`, passed before the export verb.
    pub export_options: Vec<String>,
}

impl Default for TiledConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tiled"),
            export_options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AsepriteConfig {
    pub program: PathBuf,
    pub sheet_type: String,
    pub trim: bool,
    pub merge_duplicates: bool,
    pub list_tags: bool,
    pub ignore_empty: bool,
    /// Appended after the built-in options.
    pub extra_args: Vec<String>,
}

impl Default for AsepriteConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("aseprite"),
            sheet_type: "packed".to_string(),
            trim: true,
            merge_duplicates: true,
            list_tags: true,
            ignore_empty: false,
            extra_args: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let marker = &self.paths.exclude_dir;
        if marker.is_empty() || marker.contains('/') || marker.contains('\\') {
            return Err(ConfigError::Validation(
                "paths.exclude_dir must be a single, non-empty directory name".into(),
            ));
        }
        if !SHEET_TYPES.contains(&self.aseprite.sheet_type.as_str()) {
            return Err(ConfigError::Validation(format!(
                "aseprite.sheet_type must be one of {}",
                SHEET_TYPES.join(", ")
            )));
        }
        if self.tiled.program.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "tiled.program must not be empty".into(),
            ));
        }
        if self.aseprite.program.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "aseprite.program must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Apply `TILED` / `ASEPRITE` overrides through a lookup function.
    ///
    /// Takes the lookup as a parameter so tests never mutate the process
    /// environment. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tiled) = lookup(TILED_ENV).filter(|v| !v.is_empty()) {
            self.tiled.program = PathBuf::from(tiled);
        }
        if let Some(aseprite) = lookup(ASEPRITE_ENV).filter(|v| !v.is_empty()) {
            self.aseprite.program = PathBuf::from(aseprite);
        }
    }

    /// Resolve every configured path against the project directory.
    ///
    /// Absolute paths are left alone.
    pub fn rooted_at(mut self, project: &Path) -> Self {
        let root = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = project.join(&*p);
            }
        };
        root(&mut self.paths.maps);
        root(&mut self.paths.tilesets);
        root(&mut self.paths.sprites);
        root(&mut self.paths.output);
        self
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `assetexport.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the file layer for a project directory (no env, no CLI).
pub fn load_config(project: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(load_raw_config(project)?)
}

/// Returns a fully commented stock `assetexport.toml`.
///
/// Used by the `gen-config` command.
pub fn stock_config_toml() -> &'static str {
    r##"# asset-export configuration
# ==========================
#
# Place this file as `assetexport.toml` in the project directory. Every key is
# optional; omitted keys keep the defaults shown here. Paths are relative to
# the project directory.

[paths]
# Tiled map sources. Every *.tmx is exported to <output>/maps/**.lua
maps = "assets/tiled/maps"
# Tiled tilesets. *.tsx is exported to <output>/tilesets/**.lua, images are
# copied unchanged.
tilesets = "assets/tiled/tilesets"
# Aseprite sources. Every *.ase / *.aseprite becomes <output>/sprites/**.json
# plus a packed .png sheet.
sprites = "assets/ase"
# Output root shared by all categories.
output = "root/res"
# Any directory with exactly this name is skipped, along with its contents.
exclude_dir = "editoronly"

[tiled]
# Tiled executable. The TILED environment variable takes precedence.
program = "tiled"
# Extra flags passed before --export-map / --export-tileset,
# e.g. ["--embed-tilesets", "--detach-templates"].
export_options = []

[aseprite]
# Aseprite executable. The ASEPRITE environment variable takes precedence.
program = "aseprite"
# Sheet layout: packed, rows, columns, horizontal or vertical.
sheet_type = "packed"
# Trim transparent borders from each frame.
trim = true
# Store identical frames once.
merge_duplicates = true
# Include animation tags in the JSON data.
list_tags = true
# Skip empty frames.
ignore_empty = false
# Appended verbatim after the options above.
extra_args = []
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn default_layout_matches_game_repo() {
        let config = PipelineConfig::default();
        assert_eq!(config.paths.maps, PathBuf::from("assets/tiled/maps"));
        assert_eq!(config.paths.tilesets, PathBuf::from("assets/tiled/tilesets"));
        assert_eq!(config.paths.sprites, PathBuf::from("assets/ase"));
        assert_eq!(config.paths.output, PathBuf::from("root/res"));
        assert_eq!(config.paths.exclude_dir, "editoronly");
        assert_eq!(config.tiled.program, PathBuf::from("tiled"));
        assert_eq!(config.aseprite.program, PathBuf::from("aseprite"));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[aseprite]
trim = false
"#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert!(!config.aseprite.trim);
        // Untouched values keep their defaults
        assert!(config.aseprite.merge_duplicates);
        assert_eq!(config.aseprite.sheet_type, "packed");
        assert_eq!(config.paths.output, PathBuf::from("root/res"));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.exclude_dir, "editoronly");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[paths]
output = "build/res"

[tiled]
export_options = ["--embed-tilesets"]
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.output, PathBuf::from("build/res"));
        assert_eq!(config.tiled.export_options, vec!["--embed-tilesets"]);
        assert_eq!(config.paths.maps, PathBuf::from("assets/tiled/maps"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[paths]\noutptu = \"x\"").unwrap();
        assert!(matches!(resolve_config(Some(overlay)), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_sheet_type_rejected() {
        let overlay: toml::Value = toml::from_str("[aseprite]\nsheet_type = \"spiral\"").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn exclude_dir_with_separator_rejected() {
        let mut config = PipelineConfig::default();
        config.paths.exclude_dir = "a/b".into();
        assert!(config.validate().is_err());
        config.paths.exclude_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[aseprite]\nlist_tags = false").unwrap();
        let merged = merge_toml(base, overlay);
        let config: PipelineConfig = merged.try_into().unwrap();
        assert!(!config.aseprite.list_tags);
        assert!(config.aseprite.trim);
    }

    #[test]
    fn env_overrides_tool_programs() {
        let env: HashMap<&str, &str> =
            HashMap::from([(TILED_ENV, "/opt/tiled/tiled"), (ASEPRITE_ENV, "")]);
        let mut config = PipelineConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.tiled.program, PathBuf::from("/opt/tiled/tiled"));
        // Empty variable leaves the default in place
        assert_eq!(config.aseprite.program, PathBuf::from("aseprite"));
    }

    #[test]
    fn rooted_at_joins_relative_paths_only() {
        let mut config = PipelineConfig::default();
        config.paths.output = PathBuf::from("/abs/out");
        let config = config.rooted_at(Path::new("/game"));
        assert_eq!(config.paths.maps, PathBuf::from("/game/assets/tiled/maps"));
        assert_eq!(config.paths.output, PathBuf::from("/abs/out"));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: PipelineConfig = toml::from_str(stock_config_toml()).unwrap();
        config.validate().unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(config.paths.maps, defaults.paths.maps);
        assert_eq!(config.aseprite.sheet_type, defaults.aseprite.sheet_type);
        assert_eq!(config.aseprite.ignore_empty, defaults.aseprite.ignore_empty);
    }
}
