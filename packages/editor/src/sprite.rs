//! Sprite rectangles
//!
//! Geometry is stored non-negative. A rectangle drawn "backwards" (negative
//! width or height) is folded into an origin shift plus a flip flag, and
//! unfolded again when written back to RCSS.

use std::fmt;

use rcss_parser::SpriteDecl;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn parse(axis: &str) -> Option<Self> {
        match axis {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprite {
    pub name: String,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    flipped_x: bool,
    flipped_y: bool,
}

impl Sprite {
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        let mut sprite = Self {
            name: name.into(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            flipped_x: false,
            flipped_y: false,
        };
        sprite.set_geometry(x, y, width, height);
        sprite
    }

    pub fn from_decl(decl: &SpriteDecl) -> Self {
        Self::new(decl.name.clone(), decl.x, decl.y, decl.width, decl.height)
    }

    /// Replace the rectangle. Each negative extent shifts the origin and
    /// toggles the flip flag of its axis.
    pub fn set_geometry(&mut self, mut x: i32, mut y: i32, mut width: i32, mut height: i32) {
        if width < 0 {
            x = x.saturating_add(width);
            width = width.saturating_neg();
            self.flipped_x = !self.flipped_x;
        }
        if height < 0 {
            y = y.saturating_add(height);
            height = height.saturating_neg();
            self.flipped_y = !self.flipped_y;
        }

        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// `(x, y, width, height)`
    pub fn geometry(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.width, self.height)
    }

    pub fn is_flipped_x(&self) -> bool {
        self.flipped_x
    }

    pub fn is_flipped_y(&self) -> bool {
        self.flipped_y
    }

    pub fn flip(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.flip_x(),
            Axis::Y => self.flip_y(),
        }
    }

    pub fn flip_x(&mut self) {
        self.flipped_x = !self.flipped_x;
    }

    pub fn flip_y(&mut self) {
        self.flipped_y = !self.flipped_y;
    }

    /// Strict containment: points on the left or top edge miss
    pub fn hit_test(&self, px: f64, py: f64) -> bool {
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        px > x && py > y && px < x + f64::from(self.width) && py < y + f64::from(self.height)
    }

    /// `name: Xpx Ypx Wpx Hpx;`, with flipped axes written as negative extents
    pub fn to_rcss(&self) -> String {
        let (mut x, mut y, mut width, mut height) = self.geometry();
        if self.flipped_x {
            x = x.saturating_add(width);
            width = -width;
        }
        if self.flipped_y {
            y = y.saturating_add(height);
            height = -height;
        }

        format!("{}: {}px {}px {}px {}px;", self.name, x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcss_parser::parse_rcss;

    fn reparse(line: &str) -> Sprite {
        let source = format!("@spritesheet s {{ src: s.png; {} }}", line);
        let parsed = parse_rcss(&source);
        let sheet = parsed.spritesheets().next().unwrap();
        Sprite::from_decl(&sheet.sprites[0])
    }

    #[test]
    fn test_negative_extent_is_normalized() {
        let sprite = Sprite::new("back", 40, 50, -30, -10);

        assert_eq!(sprite.geometry(), (10, 40, 30, 10));
        assert!(sprite.is_flipped_x());
        assert!(sprite.is_flipped_y());
    }

    #[test]
    fn test_set_geometry_toggles_flip() {
        let mut sprite = Sprite::new("a", 0, 0, 10, 10);

        sprite.set_geometry(20, 0, -10, 10);
        assert!(sprite.is_flipped_x());
        sprite.set_geometry(20, 0, -10, 10);
        assert!(!sprite.is_flipped_x());
        assert_eq!(sprite.geometry(), (10, 0, 10, 10));
    }

    #[test]
    fn test_flip_is_self_inverse() {
        let mut sprite = Sprite::new("a", 1, 2, 3, 4);

        sprite.flip_x();
        sprite.flip_x();
        assert!(!sprite.is_flipped_x());
        assert_eq!(sprite.geometry(), (1, 2, 3, 4));
    }

    #[test]
    fn test_to_rcss() {
        assert_eq!(
            Sprite::new("cursor", 10, 20, 30, 40).to_rcss(),
            "cursor: 10px 20px 30px 40px;"
        );

        let mut flipped = Sprite::new("cursor", 10, 20, 30, 40);
        flipped.flip(Axis::X);
        assert_eq!(flipped.to_rcss(), "cursor: 40px 20px -30px 40px;");
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        for (w, h) in [(-30, 40), (30, -40), (-30, -40)] {
            let mut sprite = Sprite::new("s", 0, 0, 1, 1);
            sprite.set_geometry(100, 100, w, h);

            let first = sprite.to_rcss();
            let second = reparse(&first).to_rcss();
            assert_eq!(first, second);
            assert_eq!(reparse(&first), sprite);
        }
    }

    #[test]
    fn test_hit_test_is_strict() {
        let sprite = Sprite::new("a", 10, 10, 20, 20);

        assert!(sprite.hit_test(15.0, 15.0));
        assert!(!sprite.hit_test(10.0, 15.0));
        assert!(!sprite.hit_test(15.0, 10.0));
        assert!(!sprite.hit_test(30.0, 15.0));
        assert!(sprite.hit_test(29.5, 29.5));
    }

    #[test]
    fn test_axis_parse() {
        assert_eq!(Axis::parse("x"), Some(Axis::X));
        assert_eq!(Axis::parse("y"), Some(Axis::Y));
        assert_eq!(Axis::parse("z"), None);
        assert_eq!(Axis::parse("X"), None);
    }
}
