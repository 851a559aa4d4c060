//! Attribute rewrites on a parsed document
//!
//! Rewrite rules are collected against element node ids while the document is
//! only borrowed for selection. [`Rewrites::apply`] then edits the tree in one
//! pass, and the caller serializes it with `Html::html`.

use ego_tree::NodeId;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::Element;
use scraper::{Html, Node, StrTendril};
use std::collections::HashMap;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// An element inserted at the start of `<head>`
#[derive(Debug)]
struct HeadElement {
    name: String,
    attrs: Vec<(String, String)>,
}

/// Pending attribute changes for one document
#[derive(Debug, Default)]
pub struct Rewrites {
    /// New attribute values per element; `None` removes the attribute
    attrs: HashMap<NodeId, Vec<(String, Option<String>)>>,
    head_prepend: Vec<HeadElement>,
}

impl Rewrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing an existing value or appending it
    pub fn set(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        self.push(node, name, Some(value.into()));
    }

    /// Removes an attribute if present
    pub fn remove(&mut self, node: NodeId, name: &str) {
        self.push(node, name, None);
    }

    fn push(&mut self, node: NodeId, name: &str, value: Option<String>) {
        let entries = self.attrs.entry(node).or_default();
        // Later rules win over earlier ones for the same attribute
        entries.retain(|(existing, _)| existing != name);
        entries.push((name.to_string(), value));
    }

    /// Inserts an element at the start of `<head>`, after any inserted earlier
    pub fn prepend_to_head(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.head_prepend.push(HeadElement {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }

    /// Number of elements with attribute changes
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Applies every recorded change to `document`
    ///
    /// Only attributes without a namespace are touched, so `xlink:href` and
    /// friends survive a rewrite of a plain `href`.
    pub fn apply(self, document: &mut Html) {
        for (id, changes) in self.attrs {
            let Some(mut node) = document.tree.get_mut(id) else {
                continue;
            };
            let Node::Element(element) = node.value() else {
                continue;
            };
            for (name, value) in changes {
                let key = attr_name(&name);
                match value {
                    Some(value) => {
                        element.attrs.insert(key, StrTendril::from(value));
                    }
                    None => {
                        element.attrs.shift_remove(&key);
                    }
                }
            }
        }

        if self.head_prepend.is_empty() {
            return;
        }
        let Some(head) = head_id(document) else {
            tracing::warn!("Document has no <head>, skipping injected elements");
            return;
        };
        if let Some(mut head) = document.tree.get_mut(head) {
            for inserted in self.head_prepend.into_iter().rev() {
                head.prepend(Node::Element(new_element(inserted)));
            }
        }
    }
}

fn attr_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

fn head_id(document: &Html) -> Option<NodeId> {
    document
        .root_element()
        .children()
        .find(|child| matches!(child.value(), Node::Element(e) if e.name() == "head"))
        .map(|head| head.id())
}

fn new_element(inserted: HeadElement) -> Element {
    let name = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(inserted.name.as_str()),
    );
    let attrs = inserted
        .attrs
        .into_iter()
        .map(|(k, v)| Attribute {
            name: attr_name(&k),
            value: v.into(),
        })
        .collect();
    Element::new(name, attrs)
}
