//! Category stacks: the ordered sequence of per-pass category ids that
//! names a bucket of records agreeing on a prefix of key bytes.

use std::fmt;

/// An ordered sequence of category ids accumulated across radix passes.
///
/// Kept as a byte sequence directly rather than the `/`-joined string the
/// original implementation used as a map key — the string form is derived
/// only when a path needs to be constructed (see [`CategoryStack::path_segment`]
/// and [`CategoryStack::to_path_string`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryStack(Vec<u8>);

impl CategoryStack {
    /// The empty stack, used for the very first pass.
    pub fn root() -> Self {
        CategoryStack(Vec::new())
    }

    /// Builds a stack from an explicit sequence of category ids.
    pub fn from_ids(ids: impl Into<Vec<u8>>) -> Self {
        CategoryStack(ids.into())
    }

    /// Returns a new stack with `category_id` appended.
    pub fn pushed(&self, category_id: u8) -> Self {
        let mut ids = self.0.clone();
        ids.push(category_id);
        CategoryStack(ids)
    }

    /// Number of passes this stack has accumulated, i.e. its depth.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The category ids, in pass order (`c0, c1, ..., c_{k-1}`).
    pub fn ids(&self) -> &[u8] {
        &self.0
    }

    /// Renders one path segment per category id, e.g. `"3/201/7"`, for use
    /// in intermediate object naming.
    pub fn to_path_string(&self) -> String {
        self.0
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for CategoryStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}
