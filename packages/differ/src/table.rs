//! # Table Comparator
//!
//! Tables get their own walk so that row-count churn degrades into a single
//! replace instead of a long run of cell operations.
//!
//! ```text
//! |rows(target) - rows(live)| > threshold → Replace(table)
//! otherwise:
//!     Update(table attributes)
//!     per row index: Insert/Remove row at the tail,
//!                    or Update(row attributes)
//!                       + Insert/Remove cells at the row tail
//!                       + cell comparator for shared cells
//! ```
//!
//! Ragged rows are fine. A table child that is not a `table-row` element is
//! not: the table cannot be walked row by row and the diff fails.

use crate::differ::Walk;
use crate::DiffError;
use quill_schema::{Element, Node, Path};
use tracing::debug;

pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "table-row";

impl<'a> Walk<'a> {
    pub(crate) fn table(
        &mut self,
        target: &Element,
        live: &Element,
        path: &Path,
        depth: usize,
    ) -> Result<(), DiffError> {
        let target_rows = rows(target, path)?;
        let live_rows = rows(live, path)?;

        let delta = target_rows.len().abs_diff(live_rows.len());
        if delta > self.config.table_row_replace_threshold {
            debug!(%path, delta, "Row delta over threshold, replacing table");
            self.replace(path.clone(), &Node::Element(target.clone()));
            return Ok(());
        }

        self.element_update(target, live, path);

        let len = target_rows.len().max(live_rows.len());
        for i in 0..len {
            let row_path = path.child(i);
            match (target_rows.get(i), live_rows.get(i)) {
                (Some(t), Some(l)) => self.row(t, l, &row_path, depth + 1)?,
                (Some(_), None) => self.insert(row_path, &target.children[i]),
                (None, Some(_)) => self.remove(row_path),
                (None, None) => {}
            }
        }
        let surplus = live_rows.len().saturating_sub(target_rows.len());
        if surplus > 1 {
            let start = self.ops.len() - surplus;
            self.ops[start..].reverse();
        }

        Ok(())
    }

    fn row(
        &mut self,
        target: &Element,
        live: &Element,
        path: &Path,
        depth: usize,
    ) -> Result<(), DiffError> {
        if target.meta().short_circuits(&live.meta()) {
            return Ok(());
        }

        self.element_update(target, live, path);

        let len = target.children.len().max(live.children.len());
        for i in 0..len {
            let cell_path = path.child(i);
            match (target.children.get(i), live.children.get(i)) {
                (Some(Node::Element(t)), Some(Node::Element(l))) if t.kind == l.kind => {
                    self.cell(t, l, &cell_path, depth + 1)?
                }
                (Some(t), Some(_)) => self.replace(cell_path, t),
                (Some(t), None) => self.insert(cell_path, t),
                (None, Some(_)) => self.remove(cell_path),
                (None, None) => {}
            }
        }

        let surplus = live.children.len().saturating_sub(target.children.len());
        if surplus > 1 {
            let start = self.ops.len() - surplus;
            self.ops[start..].reverse();
        }

        Ok(())
    }

    /// Generic element comparison scoped to one cell
    fn cell(
        &mut self,
        target: &Element,
        live: &Element,
        path: &Path,
        depth: usize,
    ) -> Result<(), DiffError> {
        if target.meta().short_circuits(&live.meta()) {
            return Ok(());
        }
        if is_blank(target) && is_blank(live) && same_shape(target, live) {
            return Ok(());
        }

        self.element_update(target, live, path);
        self.list(&target.children, &live.children, path, depth)
    }
}

fn rows<'n>(table: &'n Element, path: &Path) -> Result<Vec<&'n Element>, DiffError> {
    table
        .children
        .iter()
        .enumerate()
        .map(|(index, child)| match child {
            Node::Element(row) if row.kind == TABLE_ROW => Ok(row),
            _ => Err(DiffError::MalformedTable {
                path: path.clone(),
                index,
            }),
        })
        .collect()
}

/// Every child is an unmarked empty text leaf
fn is_blank(cell: &Element) -> bool {
    cell.children.iter().all(Node::is_empty_text)
}

fn same_shape(a: &Element, b: &Element) -> bool {
    a.children.len() == b.children.len() && a.attributes == b.attributes && a.meta() == b.meta()
}
