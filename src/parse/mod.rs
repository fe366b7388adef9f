pub mod cleanup;
pub mod counters;
pub mod dietary;
mod html_tree;
mod normalize_whitespace;
pub mod tree;
pub mod week;

pub use html_tree::HtmlTree;
pub use normalize_whitespace::normalize_whitespace;
