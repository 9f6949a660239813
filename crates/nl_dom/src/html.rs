use scraper::{ElementRef, Html, Node, Selector};

use crate::clean::collapse_whitespace;
use crate::color::HtmlColor;
use crate::section::Section;
use crate::tree::DomTree;

pub use ego_tree::NodeId as HtmlNodeId;

pub type HtmlSection = Section<HtmlNodeId>;

impl DomTree for Html {
    type NodeId = HtmlNodeId;
    type Fragment = Html;

    fn parent(&self, node: HtmlNodeId) -> Option<HtmlNodeId> {
        self.tree.get(node)?.parent().map(|p| p.id())
    }

    fn next_sibling(&self, node: HtmlNodeId) -> Option<HtmlNodeId> {
        self.tree.get(node)?.next_sibling().map(|s| s.id())
    }

    fn text_content(&self, node: HtmlNodeId) -> String {
        let Some(node) = self.tree.get(node) else {
            return String::new();
        };
        match node.value() {
            Node::Text(text) => String::from(&**text),
            Node::Element(_) => ElementRef::wrap(node)
                .map(|el| el.text().collect())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Serializes the nodes and parses them back as a standalone fragment.
    ///
    /// Table rows and cells are re-wrapped in their table context, otherwise
    /// the parser would drop the `tr`/`td` tags outside a table.
    fn fragment(&self, nodes: &[HtmlNodeId]) -> Html {
        let mut markup = String::new();
        for id in nodes {
            let Some(node) = self.tree.get(*id) else {
                continue;
            };
            match node.value() {
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(node) {
                        markup.push_str(&el.html());
                    }
                }
                Node::Text(text) => markup.push_str(&escape_text(text)),
                _ => {}
            }
        }

        let context = nodes
            .first()
            .and_then(|id| self.tree.get(*id))
            .and_then(|node| node.parent())
            .and_then(|parent| parent.value().as_element().map(|el| el.name().to_string()));

        let wrapped = match context.as_deref() {
            Some("table") | Some("tbody") | Some("thead") | Some("tfoot") => format!("<table>{}</table>", markup),
            Some("tr") => format!("<table><tr>{}</tr></table>", markup),
            _ => markup,
        };

        Html::parse_fragment(&wrapped)
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Ids of the elements matching `selector`, in document order.
pub fn select_ids(html: &Html, selector: &Selector) -> Vec<HtmlNodeId> {
    html.select(selector).map(|el| el.id()).collect()
}

pub fn element(html: &Html, id: HtmlNodeId) -> Option<ElementRef<'_>> {
    html.tree.get(id).and_then(ElementRef::wrap)
}

/// Visible text of an element with whitespace collapsed.
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Color of an inline style property; `background-color` also honours the `bgcolor` attribute.
pub fn inline_color(element: ElementRef<'_>, property: &str) -> Option<HtmlColor> {
    let value = element.value();
    value
        .attr("style")
        .and_then(|style| HtmlColor::of_style(style, property))
        .or_else(|| {
            if property.eq_ignore_ascii_case("background-color") {
                value.attr("bgcolor").and_then(HtmlColor::parse)
            } else {
                None
            }
        })
}
