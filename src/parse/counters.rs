use super::cleanup::{clean_counter, CleanupOptions};
use super::dietary::Annotations;
use super::tree::{DocumentTree, Query, Visit};

pub const COUNTER_BOX: Query = Query::tag("div").class("counter_box");
/// Mensaria only: snacks and other offers outside the counters.
pub const SPECIAL_BOX: Query = Query::tag("div").class("specialbox");
pub const SPECIAL_COUNTER: Query = Query::tag("div").class("specialcounter");
const SPECIAL_LABEL: Query = Query::tag("span");

/// One serving counter's text, dietary markers already in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterBlock {
    raw: String,
}

impl CounterBlock {
    pub fn cleaned(&self, options: &CleanupOptions<'_>) -> String {
        clean_counter(&self.raw, options)
    }
}

/// Text content of `node` with each marker rendered as ` [Tag]` right before its element.
pub fn annotated_text<T: DocumentTree>(
    tree: &T,
    node: T::Node,
    annotations: &Annotations<T::Node>,
) -> String {
    let mut out = String::new();
    for visit in tree.walk(node) {
        match visit {
            Visit::Enter(element) => push_markers(&mut out, annotations, element),
            Visit::Text(text) => out.push_str(&text),
        }
    }
    out
}

fn push_markers<N: Copy + PartialEq>(out: &mut String, annotations: &Annotations<N>, node: N) {
    for tag in annotations.markers_for(node) {
        out.push(' ');
        out.push_str(&tag.to_string());
    }
}

/// The first special box as one block. Each special counter's label starts a
/// `### ` line and is followed by a `|`, so its offers land on the lines below.
pub fn special_block<T: DocumentTree>(
    tree: &T,
    annotations: &Annotations<T::Node>,
) -> Option<CounterBlock> {
    let special = tree.find_all(tree.root(), &SPECIAL_BOX).into_iter().next()?;
    let labels: Vec<T::Node> = tree
        .find_all(special, &SPECIAL_COUNTER)
        .into_iter()
        .filter_map(|counter| tree.find_all(counter, &SPECIAL_LABEL).into_iter().next())
        .collect();

    let mut raw = String::new();
    // byte offsets right after each label's text
    let mut label_ends = vec![];
    for visit in tree.walk(special) {
        match visit {
            Visit::Enter(element) => {
                push_markers(&mut raw, annotations, element);
                if labels.contains(&element) {
                    raw.push_str("\n### ");
                    label_ends.push(raw.len() + annotated_text(tree, element, annotations).len());
                }
            }
            Visit::Text(text) => raw.push_str(&text),
        }
    }
    for end in label_ends.into_iter().rev() {
        raw.insert(end, '|');
    }
    Some(CounterBlock { raw })
}

/// Counter boxes at or below each scope, in document order.
pub fn counter_blocks<T: DocumentTree>(
    tree: &T,
    scopes: &[T::Node],
    annotations: &Annotations<T::Node>,
) -> Vec<CounterBlock> {
    scopes
        .iter()
        .flat_map(|&scope| {
            let own = tree.matches(scope, &COUNTER_BOX).then_some(scope);
            own.into_iter().chain(tree.find_all(scope, &COUNTER_BOX))
        })
        .map(|counter| CounterBlock {
            raw: annotated_text(tree, counter, annotations),
        })
        .collect()
}

/// Cleans every block and appends it with a trailing newline.
pub fn render_blocks(blocks: &[CounterBlock], options: &CleanupOptions<'_>) -> String {
    blocks.iter().fold(String::new(), |mut out, block| {
        out.push_str(&block.cleaned(options));
        out.push('\n');
        out
    })
}
