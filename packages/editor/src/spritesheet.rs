//! Spritesheets and their sprite collections

use std::path::{Path, PathBuf};

use rcss_parser::{reserved_property, SPRITESHEET_KEYWORD, UNNAMED};
use serde::Serialize;

use crate::sprite::Sprite;

/// Inclusive, 1-based span of lines in the last-saved file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line <= self.end
    }

    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Ordered sprites with a unique-name index and a selection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpriteList {
    sprites: Vec<Sprite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<String>,
}

impl SpriteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sprites.iter().map(|s| s.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.sprites.iter().position(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    /// Append a sprite. Returns false, leaving the list untouched, when the
    /// name is already taken.
    pub fn push(&mut self, sprite: Sprite) -> bool {
        if self.contains(&sprite.name) {
            return false;
        }
        self.sprites.push(sprite);
        true
    }

    /// Insert at `index`, clamped to the end of the list
    pub fn insert(&mut self, index: usize, sprite: Sprite) -> bool {
        if self.contains(&sprite.name) {
            return false;
        }
        let index = index.min(self.sprites.len());
        self.sprites.insert(index, sprite);
        true
    }

    /// Remove by name, clearing the selection if it pointed at the sprite
    pub fn remove(&mut self, name: &str) -> Option<(usize, Sprite)> {
        let index = self.index_of(name)?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        Some((index, self.sprites.remove(index)))
    }

    /// Swap in a new version of the sprite at `index`. A selection that
    /// followed the old name follows the new one.
    pub fn replace(&mut self, index: usize, sprite: Sprite) -> Option<Sprite> {
        let slot = self.sprites.get_mut(index)?;
        if self.selected.as_deref() == Some(slot.name.as_str()) {
            self.selected = Some(sprite.name.clone());
        }
        Some(std::mem::replace(slot, sprite))
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Sprite> {
        self.sprites.get_mut(index)
    }

    pub fn selected(&self) -> Option<&Sprite> {
        self.selected.as_deref().and_then(|name| self.get(name))
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        self.selected = Some(name.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Every sprite under the point, in list order
    pub fn hit_test(&self, px: f64, py: f64) -> Vec<&Sprite> {
        self.sprites.iter().filter(|s| s.hit_test(px, py)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spritesheet {
    pub name: String,
    /// Image path, relative to `basepath`
    pub source: String,
    pub resolution: Option<f64>,
    pub basepath: PathBuf,
    pub line_range: Option<LineRange>,
    pub sprites: SpriteList,
}

impl Spritesheet {
    /// A sheet that has never been written to a file
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            resolution: None,
            basepath: PathBuf::new(),
            line_range: None,
            sprites: SpriteList::new(),
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_basepath(mut self, basepath: impl Into<PathBuf>) -> Self {
        self.basepath = basepath.into();
        self
    }

    /// The image path resolved against `basepath`
    pub fn source_path(&self) -> PathBuf {
        self.basepath.join(&self.source)
    }

    pub fn hit_test(&self, px: f64, py: f64) -> Vec<&Sprite> {
        self.sprites.hit_test(px, py)
    }

    /// RCSS text for this sheet, ending with a newline
    pub fn serialize(&self) -> String {
        let mut out = String::from("@");
        out.push_str(SPRITESHEET_KEYWORD);
        if self.name != UNNAMED {
            out.push(' ');
            out.push_str(&self.name);
        }
        out.push_str("\n{\n");

        let path = self.source_path().display().to_string().replace("*/", "*\\/");
        out.push_str(&format!("\t/* Path: {} */\n", path));
        out.push_str(&format!("\tsrc: {};\n", quote_source(&self.source)));
        if let Some(resolution) = self.resolution.filter(|r| *r != 0.0) {
            out.push_str(&format!("\tresolution: {}x;\n", resolution));
        }
        out.push('\n');

        for sprite in self.sprites.iter() {
            out.push('\t');
            out.push_str(&sprite.to_rcss());
            out.push('\n');
        }
        out.push_str("}\n");

        out
    }
}

fn quote_source(source: &str) -> String {
    let plain = !source.is_empty()
        && source
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-'));
    if plain {
        return source.to_string();
    }

    let quote = if source.contains('"') && !source.contains('\'') {
        '\''
    } else {
        '"'
    };

    let mut out = String::with_capacity(source.len() + 2);
    out.push(quote);
    for c in source.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            // Line breaks cannot appear raw inside a string
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            '\x0c' => out.push_str("\\c "),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Whether `name` lexes as a single identifier
pub fn is_identifier(name: &str) -> bool {
    let rest = name.strip_prefix('-').unwrap_or(name);
    let mut chars = rest.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii())
}

/// Whether `name` can be written as a sprite declaration and read back as one
pub fn is_valid_sprite_name(name: &str) -> bool {
    is_identifier(name) && reserved_property(name).is_none()
}

/// Sprite id for an image found under `root`: the relative path without its
/// extension, with separators replaced by `-`
pub fn sprite_id_from_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Spritesheet {
        let mut sheet = Spritesheet::new("hud", "hud.png").with_resolution(2.0);
        sheet.sprites.push(Sprite::new("cursor", 10, 20, 30, 40));
        sheet.sprites.push(Sprite::new("health", 0, 0, 64, 8));
        sheet
    }

    #[test]
    fn test_serialize() {
        let text = sheet().serialize();

        assert_eq!(
            text,
            "@spritesheet hud\n{\n\t/* Path: hud.png */\n\tsrc: hud.png;\n\tresolution: 2x;\n\n\tcursor: 10px 20px 30px 40px;\n\thealth: 0px 0px 64px 8px;\n}\n"
        );
    }

    #[test]
    fn test_serialize_omits_resolution_and_quotes_source() {
        let sheet = Spritesheet::new(UNNAMED, "my icons.png").with_basepath("assets");
        let text = sheet.serialize();

        assert!(text.starts_with("@spritesheet\n{\n"));
        assert!(text.contains("/* Path: assets"));
        assert!(text.contains("src: \"my icons.png\";"));
        assert!(!text.contains("resolution"));
    }

    #[test]
    fn test_serialize_escapes_mixed_quotes() {
        let mut sheet = Spritesheet::new("hud", "it's \"x\".png");
        sheet.sprites.push(Sprite::new("curseur_é", 0, 0, 4, 4));
        let text = sheet.serialize();
        assert!(text.contains(r#"src: "it's \"x\".png";"#));

        let parsed = rcss_parser::parse_rcss(&text);
        let rule = parsed.spritesheets().next().unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(rule.source(), Some("it's \"x\".png"));
        assert_eq!(rule.sprites[0].name, "curseur_é");

        let odd = Spritesheet::new("odd", "a\\b\nc.png").serialize();
        let parsed = rcss_parser::parse_rcss(&odd);
        let rule = parsed.spritesheets().next().unwrap();
        assert_eq!(rule.source(), Some("a\\b\nc.png"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("cursor"));
        assert!(is_identifier("-ui_arrow-2"));
        assert!(is_identifier("título"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_serialize_reparses() {
        let original = sheet();
        let parsed = rcss_parser::parse_rcss(&original.serialize());
        let rule = parsed.spritesheets().next().unwrap();

        assert!(parsed.errors.is_empty());
        assert_eq!(rule.name, "hud");
        assert_eq!(rule.source(), Some("hud.png"));
        assert_eq!(rule.resolution(), Some(2.0));
        assert_eq!(rule.sprites.len(), 2);
    }

    #[test]
    fn test_sprite_list_rejects_duplicates() {
        let mut list = SpriteList::new();

        assert!(list.push(Sprite::new("a", 0, 0, 1, 1)));
        assert!(!list.push(Sprite::new("a", 5, 5, 1, 1)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("a").unwrap().x(), 0);
    }

    #[test]
    fn test_selection_follows_rename_and_clears_on_remove() {
        let mut list = SpriteList::new();
        list.push(Sprite::new("a", 0, 0, 1, 1));

        assert!(list.select("a"));
        assert!(!list.select("missing"));
        list.replace(0, Sprite::new("b", 0, 0, 1, 1));
        assert_eq!(list.selected_name(), Some("b"));

        let (index, removed) = list.remove("b").unwrap();
        assert_eq!(index, 0);
        assert_eq!(removed.name, "b");
        assert!(list.selected().is_none());
    }

    #[test]
    fn test_hit_test_returns_all_candidates() {
        let mut sheet = Spritesheet::new("s", "s.png");
        sheet.sprites.push(Sprite::new("big", 0, 0, 100, 100));
        sheet.sprites.push(Sprite::new("small", 10, 10, 10, 10));
        sheet.sprites.push(Sprite::new("away", 200, 200, 10, 10));

        let names: Vec<_> = sheet.hit_test(15.0, 15.0).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["big", "small"]);
        assert!(sheet.hit_test(0.0, 0.0).is_empty());
    }

    #[test]
    fn test_line_range() {
        let range = LineRange::new(3, 7);

        assert!(range.contains(3));
        assert!(range.contains(7));
        assert!(!range.contains(8));
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn test_names() {
        assert!(is_identifier("cursor"));
        assert!(is_identifier("title-bar-l"));
        assert!(is_identifier("-x"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
        assert!(!is_valid_sprite_name("src"));
        assert!(is_valid_sprite_name("source"));
    }

    #[test]
    fn test_sprite_id_from_path() {
        let root = Path::new("art");

        assert_eq!(
            sprite_id_from_path(root, Path::new("art/ui/buttons/ok.png")),
            Some("ui-buttons-ok".to_string())
        );
        assert_eq!(
            sprite_id_from_path(root, Path::new("art/cursor.tga")),
            Some("cursor".to_string())
        );
        assert_eq!(sprite_id_from_path(root, Path::new("other/x.png")), None);
    }
}
