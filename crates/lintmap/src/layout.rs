//! Diagram layout.
//!
//! The layout engine turns the class/association graph into box centers on
//! the canvas. Box sizes come from [`measure_title`]; positions come from the
//! force-directed [`Engine`].

mod force;

use indexmap::IndexMap;
use unicode_width::UnicodeWidthStr;

use lintmap_core::{
    geometry::{Bounds, Point, Size},
    identifier::EntityKey,
};

use crate::config::NodeStyle;

pub use force::Engine;

/// A box to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub key: EntityKey,
    pub size: Size,
}

impl LayoutNode {
    pub fn new(key: EntityKey, size: Size) -> Self {
        Self { key, size }
    }
}

/// Computed box centers, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    positions: IndexMap<EntityKey, Bounds>,
}

impl Layout {
    pub fn position(&self, key: &EntityKey) -> Option<Point> {
        self.positions.get(key).map(|bounds| bounds.center())
    }

    pub fn bounds(&self, key: &EntityKey) -> Option<Bounds> {
        self.positions.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, Point)> {
        self.positions
            .iter()
            .map(|(key, bounds)| (key, bounds.center()))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Bounds enclosing every box, or `None` for an empty layout.
    pub fn extent(&self) -> Option<Bounds> {
        self.positions
            .values()
            .copied()
            .reduce(|acc, bounds| acc.merge(&bounds))
    }
}

/// Size of a class box showing `title`.
///
/// The title is measured in terminal columns so wide glyphs count double;
/// the configured padding is added on each axis.
///
/// # Examples
///
/// ```
/// # use lintmap::{config::NodeStyle, layout::measure_title};
/// let style = NodeStyle::default();
/// let size = measure_title("Shape", &style);
/// assert_eq!(size.width(), 5.0 * style.char_width() + style.padding());
/// ```
pub fn measure_title(title: &str, style: &NodeStyle) -> Size {
    let columns = title
        .lines()
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0);
    let lines = title.lines().count().max(1);
    Size::new(
        columns as f64 * style.char_width(),
        lines as f64 * style.line_height(),
    )
    .add_padding(style.insets())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_glyphs_take_two_columns() {
        let style = NodeStyle::default();
        let narrow = measure_title("ab", &style);
        let wide = measure_title("图表", &style);
        assert_eq!(wide.width() - style.padding(), 2.0 * (narrow.width() - style.padding()));
    }

    #[test]
    fn test_empty_title_keeps_padding() {
        let style = NodeStyle::default();
        let size = measure_title("", &style);
        assert_eq!(size.width(), style.padding());
        assert_eq!(size.height(), style.line_height() + style.padding());
    }
}
