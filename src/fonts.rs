//! Custom typeface discovery.
//!
//! A font directory holds one file per style, named after the family with an
//! optional style suffix:
//!
//! ```text
//! fonts/
//! ├── Open_Sans.ttf               → "Open Sans", normal
//! ├── Open_Sans_Italic.ttf        → "Open Sans", italic
//! ├── Open_Sans_Bold.ttf          → "Open Sans", bold
//! └── Open_Sans_Bold_Italic.ttf   → "Open Sans", bold italic
//! ```
//!
//! Missing styles are filled from the closest file that exists, following
//! [`FontStyle::fallback_chain`]. A family without a normal face is skipped.
//!
//! The resulting [`FontRegistry`] is merged into the backend's [`FontTable`],
//! which already knows the PDF built-in families. Names that are already in
//! the table are left alone.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error reading font directory {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// One of the four faces a family can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    Normal,
    Italic,
    Bold,
    BoldItalic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Normal,
        FontStyle::Italic,
        FontStyle::Bold,
        FontStyle::BoldItalic,
    ];

    /// Filename suffixes, checked in this order.
    const SUFFIXES: [(&'static str, FontStyle); 3] = [
        ("_Bold_Italic", FontStyle::BoldItalic),
        ("_Italic", FontStyle::Italic),
        ("_Bold", FontStyle::Bold),
    ];

    /// Slots to try, most preferred first, when resolving this style.
    pub fn fallback_chain(self) -> &'static [FontStyle] {
        match self {
            FontStyle::Normal => &[FontStyle::Normal],
            FontStyle::Italic => &[FontStyle::Italic, FontStyle::Normal],
            FontStyle::Bold => &[FontStyle::Bold, FontStyle::Normal],
            FontStyle::BoldItalic => &[
                FontStyle::BoldItalic,
                FontStyle::Italic,
                FontStyle::Bold,
                FontStyle::Normal,
            ],
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }

    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => FontStyle::Normal,
            (false, true) => FontStyle::Italic,
            (true, false) => FontStyle::Bold,
            (true, true) => FontStyle::BoldItalic,
        }
    }
}

/// Result of parsing a font file stem like `Open_Sans_Bold`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFontName {
    /// Display family name, underscores turned into spaces.
    pub family: String,
    pub style: FontStyle,
}

/// Split a font file stem into family and style.
///
/// - `"Arial"` → family="Arial", style=Normal
/// - `"Arial_Bold"` → family="Arial", style=Bold
/// - `"Open_Sans_Bold_Italic"` → family="Open Sans", style=BoldItalic
/// - `"Bold_Italic"` → family="Bold", style=Italic
/// - `"_Bold"` → family="", style=Bold (a family without a regular face, so never registered)
pub fn parse_font_file_name(stem: &str) -> ParsedFontName {
    for (suffix, style) in FontStyle::SUFFIXES {
        if let Some(base) = stem.strip_suffix(suffix) {
            return ParsedFontName {
                family: base.replace('_', " "),
                style,
            };
        }
    }
    ParsedFontName {
        family: stem.replace('_', " "),
        style: FontStyle::Normal,
    }
}

/// A family with every style slot filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontFamily {
    pub normal: PathBuf,
    pub italic: PathBuf,
    pub bold: PathBuf,
    pub bold_italic: PathBuf,
}

impl FontFamily {
    /// Fill every slot from the files found, or `None` without a normal face.
    pub fn resolve(found: &BTreeMap<FontStyle, PathBuf>) -> Option<Self> {
        let pick = |style: FontStyle| {
            style
                .fallback_chain()
                .iter()
                .find_map(|candidate| found.get(candidate))
                .cloned()
        };
        if !found.contains_key(&FontStyle::Normal) {
            return None;
        }
        Some(Self {
            normal: pick(FontStyle::Normal)?,
            italic: pick(FontStyle::Italic)?,
            bold: pick(FontStyle::Bold)?,
            bold_italic: pick(FontStyle::BoldItalic)?,
        })
    }

    pub fn path(&self, style: FontStyle) -> &Path {
        match style {
            FontStyle::Normal => &self.normal,
            FontStyle::Italic => &self.italic,
            FontStyle::Bold => &self.bold,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }
}

/// Custom families discovered on disk, keyed by display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontRegistry {
    pub families: BTreeMap<String, FontFamily>,
}

impl FontRegistry {
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn get(&self, family: &str) -> Option<&FontFamily> {
        self.families.get(family)
    }

    /// Add every family to `table` unless the name is already taken.
    /// Returns the names that were added.
    pub fn merge_into(&self, table: &mut FontTable) -> Vec<String> {
        let mut added = Vec::new();
        for (name, family) in &self.families {
            if table.contains(name) {
                debug!("font family '{name}' already registered, keeping existing entry");
                continue;
            }
            table
                .families
                .insert(name.clone(), FamilySource::Files(family.clone()));
            added.push(name.clone());
        }
        added
    }
}

/// PDF base-14 families available without embedding any file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFamily {
    Helvetica,
    Times,
    Courier,
}

/// Where the faces of a registered family come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FamilySource {
    Builtin(BuiltinFamily),
    Files(FontFamily),
}

/// The rendering side's family table.
#[derive(Debug, Clone, PartialEq)]
pub struct FontTable {
    families: BTreeMap<String, FamilySource>,
}

impl FontTable {
    /// Table holding only the built-in families.
    pub fn with_builtins() -> Self {
        let families = [
            ("Helvetica", BuiltinFamily::Helvetica),
            ("Times", BuiltinFamily::Times),
            ("Courier", BuiltinFamily::Courier),
        ]
        .into_iter()
        .map(|(name, family)| (name.to_string(), FamilySource::Builtin(family)))
        .collect();
        Self { families }
    }

    pub fn contains(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    pub fn get(&self, family: &str) -> Option<&FamilySource> {
        self.families.get(family)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
}

/// Group font file paths by family and style. Later duplicates win.
pub fn group_font_files(paths: &[PathBuf]) -> BTreeMap<String, BTreeMap<FontStyle, PathBuf>> {
    let mut grouped: BTreeMap<String, BTreeMap<FontStyle, PathBuf>> = BTreeMap::new();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let parsed = parse_font_file_name(stem);
        grouped
            .entry(parsed.family)
            .or_default()
            .insert(parsed.style, path.clone());
    }
    grouped
}

/// Scan `directory` (not recursively) for typeface files.
///
/// A missing or absent directory yields an empty registry.
pub fn build_font_registry(directory: Option<&Path>) -> Result<FontRegistry, FontError> {
    let Some(dir) = directory else {
        return Ok(FontRegistry::default());
    };
    if !dir.is_dir() {
        debug!("font directory {} not found, skipping", dir.display());
        return Ok(FontRegistry::default());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| FontError::Io(dir.to_path_buf(), e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_font_extension(p))
        .collect();
    paths.sort();

    let mut registry = FontRegistry::default();
    for (name, found) in group_font_files(&paths) {
        match FontFamily::resolve(&found) {
            Some(family) => {
                debug!("found font family '{name}' ({} files)", found.len());
                registry.families.insert(name, family);
            }
            None => warn!("font family '{name}' has no regular face, skipping"),
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    // =========================================================================
    // parse_font_file_name
    // =========================================================================

    #[test]
    fn plain_name_is_normal() {
        let p = parse_font_file_name("Arial");
        assert_eq!(p.family, "Arial");
        assert_eq!(p.style, FontStyle::Normal);
    }

    #[test]
    fn style_suffixes() {
        assert_eq!(parse_font_file_name("Arial_Bold").style, FontStyle::Bold);
        assert_eq!(parse_font_file_name("Arial_Italic").style, FontStyle::Italic);
        assert_eq!(
            parse_font_file_name("Arial_Bold_Italic").style,
            FontStyle::BoldItalic
        );
        assert_eq!(parse_font_file_name("Arial_Bold_Italic").family, "Arial");
    }

    #[test]
    fn underscores_become_spaces() {
        let p = parse_font_file_name("Open_Sans_Bold");
        assert_eq!(p.family, "Open Sans");
        assert_eq!(p.style, FontStyle::Bold);
    }

    #[test]
    fn suffix_must_be_at_the_end() {
        let p = parse_font_file_name("Arial_Bold_Condensed");
        assert_eq!(p.family, "Arial Bold Condensed");
        assert_eq!(p.style, FontStyle::Normal);
    }

    #[test]
    fn bare_suffix_leaves_an_empty_family() {
        let p = parse_font_file_name("_Bold");
        assert_eq!(p.family, "");
        assert_eq!(p.style, FontStyle::Bold);
    }

    #[test]
    fn style_word_as_family_name() {
        let p = parse_font_file_name("Bold_Italic");
        assert_eq!(p.family, "Bold");
        assert_eq!(p.style, FontStyle::Italic);
        assert_eq!(parse_font_file_name("Bold").style, FontStyle::Normal);
    }

    #[test]
    fn from_flags_round_trips() {
        for style in FontStyle::ALL {
            assert_eq!(FontStyle::from_flags(style.is_bold(), style.is_italic()), style);
        }
    }

    // =========================================================================
    // fallback rules
    // =========================================================================

    fn slots(entries: &[(FontStyle, &str)]) -> BTreeMap<FontStyle, PathBuf> {
        entries
            .iter()
            .map(|(s, p)| (*s, PathBuf::from(p)))
            .collect()
    }

    #[test]
    fn fallback_chains_start_with_the_style_itself() {
        for style in FontStyle::ALL {
            assert_eq!(style.fallback_chain()[0], style);
            assert_eq!(*style.fallback_chain().last().unwrap(), FontStyle::Normal);
        }
    }

    #[test]
    fn normal_only_fills_every_slot() {
        let family = FontFamily::resolve(&slots(&[(FontStyle::Normal, "a.ttf")])).unwrap();
        for style in FontStyle::ALL {
            assert_eq!(family.path(style), Path::new("a.ttf"));
        }
    }

    #[test]
    fn normal_and_bold_gives_bold_italic_from_bold() {
        let family = FontFamily::resolve(&slots(&[
            (FontStyle::Normal, "a.ttf"),
            (FontStyle::Bold, "a_b.ttf"),
        ]))
        .unwrap();
        assert_eq!(family.italic, PathBuf::from("a.ttf"));
        assert_eq!(family.bold, PathBuf::from("a_b.ttf"));
        assert_eq!(family.bold_italic, PathBuf::from("a_b.ttf"));
    }

    #[test]
    fn italic_wins_over_bold_for_bold_italic() {
        let family = FontFamily::resolve(&slots(&[
            (FontStyle::Normal, "n"),
            (FontStyle::Bold, "b"),
            (FontStyle::Italic, "i"),
        ]))
        .unwrap();
        assert_eq!(family.bold_italic, PathBuf::from("i"));
    }

    #[test]
    fn explicit_bold_italic_is_kept() {
        let family = FontFamily::resolve(&slots(&[
            (FontStyle::Normal, "n"),
            (FontStyle::Italic, "i"),
            (FontStyle::BoldItalic, "bi"),
        ]))
        .unwrap();
        assert_eq!(family.bold_italic, PathBuf::from("bi"));
        assert_eq!(family.bold, PathBuf::from("n"));
    }

    #[test]
    fn family_without_normal_is_rejected() {
        assert!(FontFamily::resolve(&slots(&[(FontStyle::Bold, "b")])).is_none());
    }

    // =========================================================================
    // build_font_registry
    // =========================================================================

    #[test]
    fn absent_directory_is_empty() {
        assert!(build_font_registry(None).unwrap().is_empty());
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(build_font_registry(Some(&missing)).unwrap().is_empty());
    }

    #[test]
    fn arial_with_bold() {
        let tmp = TempDir::new().unwrap();
        let normal = touch(tmp.path(), "Arial.ttf");
        let bold = touch(tmp.path(), "Arial_Bold.ttf");

        let registry = build_font_registry(Some(tmp.path())).unwrap();
        let arial = registry.get("Arial").unwrap();
        assert_eq!(arial.normal, normal);
        assert_eq!(arial.bold, bold);
        assert_eq!(arial.italic, normal);
        assert_eq!(arial.bold_italic, bold);
    }

    #[test]
    fn ignores_non_font_files_and_orphans() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Open_Sans.OTF");
        touch(tmp.path(), "Lonely_Bold.ttf");
        touch(tmp.path(), "_Italic.ttf");
        touch(tmp.path(), "README.txt");
        fs::create_dir(tmp.path().join("Nested.ttf")).unwrap();

        let registry = build_font_registry(Some(tmp.path())).unwrap();
        let names: Vec<&str> = registry.families.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Open Sans"]);
    }

    // =========================================================================
    // FontTable
    // =========================================================================

    #[test]
    fn merge_keeps_existing_families() {
        let mut registry = FontRegistry::default();
        let family = FontFamily::resolve(&slots(&[(FontStyle::Normal, "h.ttf")])).unwrap();
        registry
            .families
            .insert("Helvetica".to_string(), family.clone());
        registry.families.insert("Arial".to_string(), family.clone());

        let mut table = FontTable::with_builtins();
        let added = registry.merge_into(&mut table);

        assert_eq!(added, vec!["Arial".to_string()]);
        assert_eq!(
            table.get("Helvetica"),
            Some(&FamilySource::Builtin(BuiltinFamily::Helvetica))
        );
        assert_eq!(table.get("Arial"), Some(&FamilySource::Files(family)));
    }

    #[test]
    fn builtin_table_names() {
        let table = FontTable::with_builtins();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["Courier", "Helvetica", "Times"]);
    }
}
