//! Minimal document model for newsletter bodies and the sibling-range sectioner built on it.

pub mod arena;
pub mod clean;
pub mod color;
pub mod html;
pub mod section;
pub mod tree;

pub use arena::{Arena, NodeId, NodeKind};
pub use clean::{clean_html, collapse_whitespace};
pub use color::HtmlColor;
pub use html::{element, inline_color, select_ids, text_of, HtmlNodeId, HtmlSection};
pub use section::{Section, SectionOptions, Sectioner};
pub use tree::DomTree;
