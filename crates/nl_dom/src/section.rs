use std::collections::HashSet;

use nl_core::{Error, Result};
use scraper::{Html, Selector};

use crate::clean::collapse_whitespace;
use crate::html::{select_ids, HtmlNodeId};
use crate::tree::DomTree;

/// A run of siblings from `start` (inclusive) to `end` (exclusive, `None` = last sibling).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<N> {
    pub title: String,
    pub start: N,
    pub end: Option<N>,
}

pub struct SectionOptions<'a, N> {
    filter: Box<dyn Fn(N) -> bool + 'a>,
    title_of: Option<Box<dyn Fn(N) -> String + 'a>>,
    stop: Option<N>,
}

impl<'a, N> Default for SectionOptions<'a, N> {
    fn default() -> Self {
        Self {
            filter: Box::new(|_| true),
            title_of: None,
            stop: None,
        }
    }
}

impl<'a, N> SectionOptions<'a, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the matched nodes accepted by `filter`.
    pub fn filter(mut self, filter: impl Fn(N) -> bool + 'a) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Computes section titles from the matched node. Defaults to its text.
    pub fn title_of(mut self, title_of: impl Fn(N) -> String + 'a) -> Self {
        self.title_of = Some(Box::new(title_of));
        self
    }

    /// Ends the last section before `stop` instead of at the last sibling.
    pub fn stop_at(mut self, stop: N) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Slices a flat document into sections along sibling ranges.
///
/// Newsletter bodies rarely wrap an article in its own element, so sections
/// are carved between marker nodes rather than taken from subtrees.
pub struct Sectioner<'t, T: DomTree> {
    tree: &'t T,
}

impl<'t, T: DomTree> Sectioner<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        Self { tree }
    }

    /// One section per accepted marker, delimited by the markers' boundaries
    /// under their deepest common ancestor.
    ///
    /// Markers at or after the stop node are dropped, so no section reaches
    /// past it.
    pub fn extract_sections<I>(&self, matches: I, options: &SectionOptions<'_, T::NodeId>) -> Result<Vec<Section<T::NodeId>>>
    where
        I: IntoIterator<Item = T::NodeId>,
    {
        let matched: Vec<T::NodeId> = matches
            .into_iter()
            .filter(|node| (options.filter)(*node))
            .filter(|node| options.stop.map_or(true, |stop| !self.at_or_after(*node, stop)))
            .collect();
        if matched.is_empty() {
            return Ok(Vec::new());
        }

        let ancestor = self
            .common_ancestor(&matched)
            .ok_or_else(|| Error::Dom("matched nodes have no common ancestor".to_string()))?;

        let boundaries = matched
            .iter()
            .map(|node| self.boundary(*node, ancestor))
            .collect::<Result<Vec<_>>>()?;

        // A stop outside the common ancestor comes after every marker, so the last section runs to the end.
        let last = boundaries[boundaries.len() - 1];
        let stop = match options.stop.and_then(|stop| self.boundary(stop, ancestor).ok()) {
            Some(stop) if stop == last => self.tree.next_sibling(stop),
            stop => stop,
        };

        let sections = matched
            .iter()
            .enumerate()
            .map(|(i, node)| Section {
                title: match &options.title_of {
                    Some(title_of) => title_of(*node),
                    None => collapse_whitespace(&self.tree.text_content(*node)),
                },
                start: boundaries[i],
                end: boundaries.get(i + 1).copied().or(stop),
            })
            .collect();

        Ok(sections)
    }

    /// Whether `node` is `other`, lies inside it or follows it in document order.
    pub fn at_or_after(&self, node: T::NodeId, other: T::NodeId) -> bool {
        if node == other {
            return true;
        }
        let Some(ancestor) = self.common_ancestor(&[node, other]) else {
            return false;
        };
        match (self.boundary(node, ancestor), self.boundary(other, ancestor)) {
            // One contains the other.
            (Ok(a), Ok(b)) if a == b => a == other,
            (Ok(a), Ok(b)) => self.precedes(b, a),
            _ => false,
        }
    }

    /// Whether sibling `a` comes before sibling `b`.
    fn precedes(&self, a: T::NodeId, b: T::NodeId) -> bool {
        let mut current = self.tree.next_sibling(a);
        while let Some(node) = current {
            if node == b {
                return true;
            }
            current = self.tree.next_sibling(node);
        }
        false
    }

    /// Deepest node that is an ancestor of every node in `nodes`.
    pub fn common_ancestor(&self, nodes: &[T::NodeId]) -> Option<T::NodeId> {
        let (first, rest) = nodes.split_first()?;
        let mut chain = self.tree.ancestors(*first);
        for node in rest {
            let others: HashSet<T::NodeId> = self.tree.ancestors(*node).into_iter().collect();
            chain.retain(|candidate| others.contains(candidate));
        }
        chain.first().copied()
    }

    /// The ancestor-or-self of `node` whose parent is `ancestor`.
    pub fn boundary(&self, node: T::NodeId, ancestor: T::NodeId) -> Result<T::NodeId> {
        let mut current = node;
        loop {
            match self.tree.parent(current) {
                Some(parent) if parent == ancestor => return Ok(current),
                Some(parent) => current = parent,
                None => return Err(Error::Dom(format!("{:?} is not below {:?}", node, ancestor))),
            }
        }
    }

    /// Siblings covered by `section`, in document order.
    pub fn sibling_range(&self, section: &Section<T::NodeId>) -> Result<Vec<T::NodeId>> {
        if self.tree.parent(section.start).is_none() {
            return Err(Error::Dom("section start has no parent".to_string()));
        }

        let mut nodes = Vec::new();
        let mut current = Some(section.start);
        while let Some(node) = current {
            if Some(node) == section.end {
                break;
            }
            nodes.push(node);
            current = self.tree.next_sibling(node);
        }
        Ok(nodes)
    }

    /// Copies the section's siblings into a standalone fragment and hands it to `body`.
    pub fn process<R>(&self, section: &Section<T::NodeId>, body: impl FnOnce(T::Fragment) -> R) -> Result<R> {
        let nodes = self.sibling_range(section)?;
        Ok(body(self.tree.fragment(&nodes)))
    }
}

impl<'t> Sectioner<'t, Html> {
    /// Sections marked by the elements matching a CSS selector.
    pub fn extract_by_selector(
        &self,
        selector: &Selector,
        options: &SectionOptions<'_, HtmlNodeId>,
    ) -> Result<Vec<Section<HtmlNodeId>>> {
        self.extract_sections(select_ids(self.tree, selector), options)
    }
}
