use std::collections::HashMap;

use crate::json_stable::{stringify_attrs, stringify_marks};
use crate::model::{Attrs, Mark};

/// Index of a descriptor inside a [`MetaTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaId(u32);

impl MetaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural identity of one linearized position: the owning node, its
/// marks and attributes, and where it sits in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeta {
    pub kind: String,
    pub marks: Vec<Mark>,
    pub attrs: Attrs,
    /// Ancestor type chain, outermost first, e.g. `doc>blockquote`.
    pub ancestors: String,
    /// Stable JSON list of the ancestors' attributes.
    pub ancestor_attrs: String,
    /// Number of ancestors; top-level blocks have depth 1.
    pub depth: usize,
    pub list: bool,
    pub line_break: bool,
    identity: String,
}

impl NodeMeta {
    pub(crate) fn new(
        kind: &str,
        marks: &[Mark],
        attrs: &Attrs,
        ancestors: &Ancestor,
        list: bool,
        line_break: bool,
    ) -> Self {
        let mut identity = String::with_capacity(kind.len() + ancestors.chain.len() + 16);
        identity.push_str(kind);
        identity.push_str(&stringify_marks(marks));
        identity.push_str(&stringify_attrs(attrs));
        identity.push_str(&ancestors.chain);
        identity.push('[');
        identity.push_str(&ancestors.attrs);
        identity.push(']');
        Self {
            kind: kind.to_owned(),
            marks: marks.to_vec(),
            attrs: attrs.clone(),
            ancestors: ancestors.chain.clone(),
            ancestor_attrs: format!("[{}]", ancestors.attrs),
            depth: ancestors.depth,
            list,
            line_break,
            identity,
        }
    }

    /// Concatenation of type, stable marks, stable attrs, ancestor chain and
    /// stable ancestor attrs. Two descriptors are equal iff their
    /// identities are.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// One entry of the linearizer's ancestor stack, with the joined chain
/// strings of everything above it precomputed.
#[derive(Debug, Clone)]
pub(crate) struct Ancestor {
    pub(crate) chain: String,
    pub(crate) attrs: String,
    pub(crate) depth: usize,
}

impl Ancestor {
    pub(crate) fn root(kind: &str, attrs: &Attrs) -> Self {
        Self {
            chain: kind.to_owned(),
            attrs: stringify_attrs(attrs),
            depth: 1,
        }
    }

    pub(crate) fn child(&self, kind: &str, attrs: &Attrs) -> Self {
        Self {
            chain: format!("{}>{}", self.chain, kind),
            attrs: format!("{},{}", self.attrs, stringify_attrs(attrs)),
            depth: self.depth + 1,
        }
    }
}

/// Arena of interned descriptors. Equal descriptors share one id.
#[derive(Debug, Default)]
pub struct MetaTable {
    metas: Vec<NodeMeta>,
    by_identity: HashMap<String, MetaId>,
}

impl MetaTable {
    pub fn intern(&mut self, meta: NodeMeta) -> MetaId {
        if let Some(id) = self.by_identity.get(meta.identity()) {
            return *id;
        }
        let id = MetaId(self.metas.len() as u32);
        self.by_identity.insert(meta.identity.clone(), id);
        self.metas.push(meta);
        id
    }

    pub fn get(&self, id: MetaId) -> &NodeMeta {
        &self.metas[id.index()]
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}
