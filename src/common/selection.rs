use crate::common;

use indexmap::IndexMap;

/// Separator for attribute path components.
const PATH_SEPARATOR: &str = ".";

/// Nested attribute selection.
///
/// ```rust
/// use dynamodb_table::common::selection;
/// use indexmap::IndexMap;
///
/// // #owner.#name, #owner.#email, #status
/// let selection = selection::SelectionMap::Node(IndexMap::from([
///     (
///         "owner".to_string(),
///         selection::SelectionMap::Leaves(vec!["name".to_string(), "email".to_string()]),
///     ),
///     ("status".to_string(), selection::SelectionMap::Leaves(Vec::new())),
/// ]));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectionMap {
    /// A flat list of attribute names.
    Leaves(Vec<String>),
    /// Attribute paths; a node whose child is an empty `Leaves` selects the node itself.
    Node(IndexMap<String, SelectionMap>),
}

impl SelectionMap {
    /// Render every selected path below `path`, binding one name placeholder per segment.
    pub(crate) fn render(
        self,
        path: &[String],
        expressions: &mut common::Accumulator,
    ) -> Vec<String> {
        match self {
            Self::Leaves(leaves) => leaves
                .into_iter()
                .map(|leaf| {
                    let placeholder = expressions.name_placeholder(&leaf);
                    common::extend_path(path, placeholder).join(PATH_SEPARATOR)
                })
                .collect(),
            Self::Node(map) => map
                .into_iter()
                .flat_map(|(key, value)| {
                    let placeholder = expressions.name_placeholder(&key);
                    let new_path = common::extend_path(path, placeholder);
                    match value {
                        Self::Leaves(leaves) if leaves.is_empty() => {
                            vec![new_path.join(PATH_SEPARATOR)]
                        }
                        value => value.render(&new_path, expressions),
                    }
                })
                .collect(),
        }
    }
}

/// A projection, in any of the accepted forms.
///
/// A raw string is appended verbatim and registers no placeholders, so reserved words are
/// the caller's concern. A list of names registers one `#<name>` placeholder per name, with
/// characters other than ASCII letters and digits replaced by `_`.
///
/// ```rust
/// use dynamodb_table::common::selection::Projection;
///
/// let raw: Projection = "pk, sk".into();
/// let names: Projection = ["name", "status"].into();
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Projection {
    /// A raw projection expression.
    Raw(String),
    /// Attribute names or paths resolved through placeholders.
    Selection(SelectionMap),
}

impl Projection {
    pub(crate) fn render(self, expressions: &mut common::Accumulator) -> String {
        match self {
            Self::Raw(expression) => expression,
            Self::Selection(selection) => selection.render(&[], expressions).join(", "),
        }
    }
}

impl From<&str> for Projection {
    fn from(expression: &str) -> Self {
        Self::Raw(expression.to_string())
    }
}

impl From<String> for Projection {
    fn from(expression: String) -> Self {
        Self::Raw(expression)
    }
}

impl From<SelectionMap> for Projection {
    fn from(selection: SelectionMap) -> Self {
        Self::Selection(selection)
    }
}

impl From<Vec<String>> for Projection {
    fn from(names: Vec<String>) -> Self {
        Self::Selection(SelectionMap::Leaves(names))
    }
}

impl From<Vec<&str>> for Projection {
    fn from(names: Vec<&str>) -> Self {
        names
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into()
    }
}

impl<const N: usize> From<[&str; N]> for Projection {
    fn from(names: [&str; N]) -> Self {
        Vec::from(names).into()
    }
}
