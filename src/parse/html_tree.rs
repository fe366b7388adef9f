use scraper::{ElementRef, Html, Node};

use super::normalize_whitespace;
use super::tree::{DocumentTree, Visit};

/// [`DocumentTree`] over a page parsed by `scraper`. Text nodes are read whitespace-normalized.
#[derive(Debug, Clone, Copy)]
pub struct HtmlTree<'a>(&'a Html);

impl<'a> HtmlTree<'a> {
    pub const fn new(html: &'a Html) -> Self {
        Self(html)
    }
}

impl<'a> DocumentTree for HtmlTree<'a> {
    type Node = ElementRef<'a>;

    fn root(&self) -> ElementRef<'a> {
        self.0.root_element()
    }

    fn parent(&self, node: ElementRef<'a>) -> Option<ElementRef<'a>> {
        node.parent().and_then(ElementRef::wrap)
    }

    fn children(&self, node: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        node.children().filter_map(ElementRef::wrap).collect()
    }

    fn tag_name(&self, node: ElementRef<'a>) -> &str {
        node.value().name()
    }

    fn has_class(&self, node: ElementRef<'a>, class: &str) -> bool {
        node.value().classes().any(|c| c == class)
    }

    fn attr(&self, node: ElementRef<'a>, name: &str) -> Option<&str> {
        node.value().attr(name)
    }

    fn walk(&self, node: ElementRef<'a>) -> Vec<Visit<'_, ElementRef<'a>>> {
        node.descendants()
            .skip(1) // the node itself
            .filter_map(|descendant| {
                if let Some(element) = ElementRef::wrap(descendant) {
                    return Some(Visit::Enter(element));
                }
                match descendant.value() {
                    Node::Text(text) => Some(Visit::Text(normalize_whitespace(text))),
                    _ => None,
                }
            })
            .collect()
    }
}
