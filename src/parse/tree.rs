use std::borrow::Cow;
use std::fmt::{self, Display};

/// Element match by tag name and optional class, e.g. `div.counter_box`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    tag: &'static str,
    class: Option<&'static str>,
}

impl Query {
    pub const fn tag(tag: &'static str) -> Self {
        Self { tag, class: None }
    }

    pub const fn class(self, class: &'static str) -> Self {
        Self {
            tag: self.tag,
            class: Some(class),
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            Some(class) => write!(f, "{}.{class}", self.tag),
            None => f.write_str(self.tag),
        }
    }
}

/// One step of a pre-order walk below a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit<'s, N> {
    Enter(N),
    Text(Cow<'s, str>),
}

/// Read-only view of a parsed page. Only elements are nodes; text is reached through [`walk`].
///
/// [`walk`]: DocumentTree::walk
pub trait DocumentTree {
    type Node: Copy + PartialEq;

    fn root(&self) -> Self::Node;
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    /// Element children, in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    fn tag_name(&self, node: Self::Node) -> &str;
    fn has_class(&self, node: Self::Node, class: &str) -> bool;
    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;
    /// Everything below `node` (not `node` itself), in document order.
    fn walk(&self, node: Self::Node) -> Vec<Visit<'_, Self::Node>>;

    fn matches(&self, node: Self::Node, query: &Query) -> bool {
        self.tag_name(node).eq_ignore_ascii_case(query.tag)
            && query.class.map_or(true, |class| self.has_class(node, class))
    }

    fn find_all(&self, scope: Self::Node, query: &Query) -> Vec<Self::Node> {
        self.walk(scope)
            .into_iter()
            .filter_map(|visit| match visit {
                Visit::Enter(node) if self.matches(node, query) => Some(node),
                _ => None,
            })
            .collect()
    }

    fn ancestor(&self, node: Self::Node, depth: usize) -> Option<Self::Node> {
        (0..depth).try_fold(node, |current, _| self.parent(current))
    }

    fn text(&self, node: Self::Node) -> String {
        self.walk(node)
            .into_iter()
            .filter_map(|visit| match visit {
                Visit::Text(text) => Some(text),
                Visit::Enter(_) => None,
            })
            .collect()
    }
}
