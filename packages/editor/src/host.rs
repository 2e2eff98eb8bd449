use crate::HostError;
use quill_schema::{find, Node, Path, Properties, Selection};

/// Mutation surface of the live document.
///
/// The engine never edits the live tree directly. Every change goes through
/// these primitives, and paths are re-read from [`HostEditor::children`]
/// right before each call.
pub trait HostEditor {
    /// Current top-level blocks
    fn children(&self) -> &[Node];

    fn node_at(&self, path: &Path) -> Option<&Node> {
        find(self.children(), path)
    }

    /// Insert `node` so that it ends up at `path`
    fn insert_at(&mut self, path: &Path, node: Node) -> Result<(), HostError>;

    fn remove_at(&mut self, path: &Path) -> Result<(), HostError>;

    /// Merge attribute or mark changes (and metadata) into the node at `path`
    fn set_properties(&mut self, path: &Path, properties: &Properties) -> Result<(), HostError>;

    fn set_text(&mut self, path: &Path, text: &str) -> Result<(), HostError>;

    fn selection_is_collapsed(&self, scope: &Selection) -> bool {
        scope.is_collapsed()
    }
}
