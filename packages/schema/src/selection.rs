use crate::Path;
use serde::{Deserialize, Serialize};

/// A position inside a text leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// Anchor/focus range used to scope search and replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Selection spanning whole leaves from `start` to `end`
    pub fn between(start: impl Into<Path>, end: impl Into<Path>, end_offset: usize) -> Self {
        Self {
            anchor: Point::new(start, 0),
            focus: Point::new(end, end_offset),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus in document order
    pub fn ordered(&self) -> (&Point, &Point) {
        let anchor_first = (&self.anchor.path, self.anchor.offset)
            <= (&self.focus.path, self.focus.offset);
        if anchor_first {
            (&self.anchor, &self.focus)
        } else {
            (&self.focus, &self.anchor)
        }
    }

    /// Whether the leaf at `path` intersects this selection
    pub fn intersects(&self, path: &Path) -> bool {
        let (start, end) = self.ordered();
        let after_start = *path >= start.path || path.is_ancestor_of(&start.path);
        let before_end = *path <= end.path || end.path.is_ancestor_of(path);
        after_start && before_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed() {
        let point = Point::new(vec![0, 0], 3);
        assert!(Selection::new(point.clone(), point).is_collapsed());
        assert!(!Selection::between(vec![0, 0], vec![0, 0], 3).is_collapsed());
    }

    #[test]
    fn test_intersects_backwards_selection() {
        let selection = Selection::new(Point::new(vec![2, 0], 4), Point::new(vec![1, 0], 0));

        assert!(selection.intersects(&Path::from(vec![1, 0])));
        assert!(selection.intersects(&Path::from(vec![1, 1])));
        assert!(selection.intersects(&Path::from(vec![2, 0])));
        assert!(!selection.intersects(&Path::from(vec![0, 0])));
        assert!(!selection.intersects(&Path::from(vec![2, 1])));
    }
}
