//! Source → destination path mapping.
//!
//! Every source root is mirrored beneath its own subfolder of the output
//! root. For a file at `<base>/<rel>/<stem>.<ext>` the destination is
//!
//! ```text
//! <output_root>/<category>/<rel>/<stem>.<new_ext>
//! ```
//!
//! `<rel>` is taken from the directory that *contains* the file, so siblings
//! always land in the same destination directory. All functions here are
//! pure: they never touch the filesystem.
//!
//! | Source | Destination |
//! |---|---|
//! | `maps/world/a.tmx` | `res/maps/world/a.lua` |
//! | `tilesets/x/terrain.tsx` | `res/tilesets/x/terrain.lua` |
//! | `tilesets/x/tile.png` | `res/tilesets/x/tile.png` |
//! | `ase/chars/hero.ase` | `res/sprites/chars/hero.json` + `hero.png` |

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of Tiled's Lua export, used for both maps and tilesets.
pub const LUA_EXTENSION: &str = "lua";
/// Extension of the Aseprite sheet metadata.
pub const SPRITE_DATA_EXTENSION: &str = "json";
/// Extension of the packed Aseprite sheet image.
pub const SPRITE_SHEET_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum PathError {
    #[error("{} is not under base directory {}", path.display(), base.display())]
    OutsideBase { path: PathBuf, base: PathBuf },
    #[error("Path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
}

/// One of the three asset source trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Maps,
    Tilesets,
    Sprites,
}

impl Category {
    /// All categories, in the order a full build runs them.
    pub const ALL: [Category; 3] = [Category::Maps, Category::Tilesets, Category::Sprites];

    /// Subfolder of the output root this category is mirrored into.
    pub fn subfolder(self) -> &'static str {
        match self {
            Category::Maps => "maps",
            Category::Tilesets => "tilesets",
            Category::Sprites => "sprites",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subfolder())
    }
}

/// Re-roots source files under the output tree.
#[derive(Debug, Clone)]
pub struct PathMapper {
    output_root: PathBuf,
}

impl PathMapper {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Destination directory mirroring the directory that contains `source`.
    pub fn destination_dir(
        &self,
        category: Category,
        base: &Path,
        source: &Path,
    ) -> Result<PathBuf, PathError> {
        let parent = source.parent().unwrap_or(Path::new(""));
        let relative = parent
            .strip_prefix(base)
            .map_err(|_| PathError::OutsideBase {
                path: source.to_path_buf(),
                base: base.to_path_buf(),
            })?;
        Ok(self.output_root.join(category.subfolder()).join(relative))
    }

    /// Destination for an exported asset: same stem, new extension.
    pub fn destination(
        &self,
        category: Category,
        base: &Path,
        source: &Path,
        extension: &str,
    ) -> Result<PathBuf, PathError> {
        let stem = source
            .file_stem()
            .ok_or_else(|| PathError::NoFileName(source.to_path_buf()))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(extension);
        Ok(self.destination_dir(category, base, source)?.join(name))
    }

    /// Destination for a file copied through unchanged.
    pub fn passthrough(
        &self,
        category: Category,
        base: &Path,
        source: &Path,
    ) -> Result<PathBuf, PathError> {
        let name = source
            .file_name()
            .ok_or_else(|| PathError::NoFileName(source.to_path_buf()))?;
        Ok(self.destination_dir(category, base, source)?.join(name))
    }
}

/// Sibling of `source` with `extension` swapped in.
///
/// Tools write here first so a half-written file never appears in the
/// output tree.
pub fn intermediate_path(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}

/// Lowercased extension of `path`, if it has a UTF-8 one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> PathMapper {
        PathMapper::new("root/res")
    }

    #[test]
    fn map_mirrors_subdirectory() {
        let dst = mapper()
            .destination(
                Category::Maps,
                Path::new("assets/tiled/maps"),
                Path::new("assets/tiled/maps/world/a.tmx"),
                LUA_EXTENSION,
            )
            .unwrap();
        assert_eq!(dst, PathBuf::from("root/res/maps/world/a.lua"));
    }

    #[test]
    fn file_directly_in_base_maps_to_category_root() {
        let dst = mapper()
            .destination(
                Category::Maps,
                Path::new("assets/tiled/maps"),
                Path::new("assets/tiled/maps/town.tmx"),
                LUA_EXTENSION,
            )
            .unwrap();
        assert_eq!(dst, PathBuf::from("root/res/maps/town.lua"));
    }

    #[test]
    fn siblings_share_destination_dir() {
        let m = mapper();
        let base = Path::new("assets/ase");
        let a = m
            .destination_dir(Category::Sprites, base, Path::new("assets/ase/chars/hero.ase"))
            .unwrap();
        let b = m
            .destination_dir(Category::Sprites, base, Path::new("assets/ase/chars/slime.ase"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("root/res/sprites/chars"));
    }

    #[test]
    fn passthrough_keeps_extension() {
        let dst = mapper()
            .passthrough(
                Category::Tilesets,
                Path::new("assets/tiled/tilesets"),
                Path::new("assets/tiled/tilesets/x/tile.png"),
            )
            .unwrap();
        assert_eq!(dst, PathBuf::from("root/res/tilesets/x/tile.png"));
    }

    #[test]
    fn multi_dot_stem_is_preserved() {
        let dst = mapper()
            .destination(
                Category::Tilesets,
                Path::new("ts"),
                Path::new("ts/dungeon.v2.tsx"),
                LUA_EXTENSION,
            )
            .unwrap();
        assert_eq!(dst, PathBuf::from("root/res/tilesets/dungeon.v2.lua"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let m = mapper();
        let base = Path::new("assets/tiled/maps");
        let src = Path::new("assets/tiled/maps/a/b/c.tmx");
        let first = m.destination(Category::Maps, base, src, LUA_EXTENSION).unwrap();
        let second = m.destination(Category::Maps, base, src, LUA_EXTENSION).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("root/res/maps"));
    }

    #[test]
    fn source_outside_base_is_error() {
        let result = mapper().destination(
            Category::Maps,
            Path::new("assets/tiled/maps"),
            Path::new("elsewhere/a.tmx"),
            LUA_EXTENSION,
        );
        assert!(matches!(result, Err(PathError::OutsideBase { .. })));
    }

    #[test]
    fn intermediate_is_sibling_of_source() {
        assert_eq!(
            intermediate_path(Path::new("assets/tiled/maps/world/a.tmx"), LUA_EXTENSION),
            PathBuf::from("assets/tiled/maps/world/a.lua")
        );
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of(Path::new("Tile.PNG")).as_deref(), Some("png"));
        assert_eq!(extension_of(Path::new("README")), None);
    }
}
