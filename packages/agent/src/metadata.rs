//! Per-element metadata side table
//!
//! Entries are keyed by [`NodeKey`] and never hold the node itself. Only the
//! attribute-derived part (identity and names) is cached, and only while the
//! node's identity attribute still reads the same. Editability depends on
//! computed style and classes, which host commands change freely, so it is
//! recomputed on every lookup.

use crate::classify::{element_editability, is_preformatted, Editability};
use crate::dom::{Dom, NodeKey};
use liveedit_protocol::{Identity, IDENTITY_ATTR, NAME_ATTR};
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct ElementMetadata {
    /// Identity attribute value the entry was computed from
    pub raw: Option<String>,
    pub identity: Option<Identity>,
    pub display_name: String,
    pub tag_name: String,
    pub editability: Editability,
    pub preformatted: bool,
}

impl ElementMetadata {
    pub fn compute<D: Dom>(dom: &D, element: &D::Node) -> Self {
        Self::from_naming(dom, element, Naming::compute(dom, element))
    }

    fn from_naming<D: Dom>(dom: &D, element: &D::Node, naming: Naming) -> Self {
        Self {
            raw: naming.raw,
            identity: naming.identity,
            display_name: naming.display_name,
            tag_name: naming.tag_name,
            editability: element_editability(dom, element),
            preformatted: is_preformatted(dom, element),
        }
    }
}

/// The attribute-derived half of [`ElementMetadata`]
#[derive(Debug, Clone, PartialEq)]
struct Naming {
    raw: Option<String>,
    identity: Option<Identity>,
    display_name: String,
    tag_name: String,
}

impl Naming {
    fn compute<D: Dom>(dom: &D, element: &D::Node) -> Self {
        let raw = dom.attribute(element, IDENTITY_ATTR);
        let tag_name = dom.tag_name(element);
        let display_name = dom
            .attribute(element, NAME_ATTR)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| tag_name.clone());

        Self {
            identity: raw.as_deref().and_then(Identity::parse),
            raw,
            display_name,
            tag_name,
        }
    }
}

#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<NodeKey, Naming>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<D: Dom>(&mut self, dom: &D, element: &D::Node) -> ElementMetadata {
        let key = dom.node_key(element);
        let raw = dom.attribute(element, IDENTITY_ATTR);

        let naming = match self.entries.get(&key) {
            Some(entry) if entry.raw == raw => entry.clone(),
            stale => {
                if stale.is_some() {
                    trace!(key = key.0, "Stale element metadata");
                }
                let naming = Naming::compute(dom, element);
                self.entries.insert(key, naming.clone());
                naming
            }
        };

        ElementMetadata::from_naming(dom, element, naming)
    }

    pub fn forget(&mut self, key: NodeKey) {
        self.entries.remove(&key);
    }

    /// Drop entries for nodes no longer in the document.
    pub fn prune<D: Dom>(&mut self, dom: &D) {
        let live: HashSet<NodeKey> = dom
            .identified_elements()
            .iter()
            .map(|element| dom.node_key(element))
            .collect();
        self.entries.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
