//! Inheritance forest restricted to included types.

use std::collections::{HashMap, HashSet};

use propweave_core::{TypeDescriptor, TypeName, TypeRepository};
use tracing::debug;

use crate::cancel::{checkpoint, CancellationSignal};
use crate::error::{WeaveError, WeaveResult};
use crate::filter::Inclusion;

/// A type together with its direct known subtypes.
#[derive(Debug, Clone)]
pub struct TypeNode<'r> {
    pub descriptor: &'r TypeDescriptor,
    /// Direct subtypes, in the order they were attached.
    pub children: Vec<TypeNode<'r>>,
}

impl<'r> TypeNode<'r> {
    pub fn name(&self) -> &'r TypeName {
        &self.descriptor.name
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &TypeNode<'r>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Names of every descendant, pre-order, excluding this node.
    pub fn descendant_names(&self) -> Vec<TypeName> {
        self.walk().skip(1).map(|n| n.name().clone()).collect()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        self.walk().count()
    }
}

/// Ordered sequence of independent inheritance trees.
#[derive(Debug, Clone, Default)]
pub struct Forest<'r> {
    pub roots: Vec<TypeNode<'r>>,
}

impl<'r> Forest<'r> {
    /// Pre-order walk over every tree, roots in order.
    pub fn walk(&self) -> impl Iterator<Item = &TypeNode<'r>> {
        self.roots.iter().flat_map(|root| root.walk())
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(TypeNode::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find the node for `name`.
    pub fn find(&self, name: &str) -> Option<&TypeNode<'r>> {
        self.walk().find(|n| n.name().as_str() == name)
    }

    /// Qualified names in pre-order.
    pub fn names(&self) -> Vec<&'r str> {
        self.walk().map(|n| n.name().as_str()).collect()
    }
}

/// Builds the [`Forest`] of included types.
///
/// Nodes live in an arena while the forest is assembled: every type is
/// resolved through [`ForestBuilder::ensure_node`], which builds the base
/// chain first and attaches each node under its parent exactly once.
pub struct ForestBuilder<'r, 'i> {
    repo: &'r TypeRepository,
    inclusion: &'i Inclusion<'r>,
    slots: Vec<Slot<'r>>,
    built: HashMap<&'r str, usize>,
    in_progress: HashSet<&'r str>,
    roots: Vec<usize>,
}

struct Slot<'r> {
    descriptor: &'r TypeDescriptor,
    children: Vec<usize>,
}

impl<'r, 'i> ForestBuilder<'r, 'i> {
    pub fn new(repo: &'r TypeRepository, inclusion: &'i Inclusion<'r>) -> Self {
        Self {
            repo,
            inclusion,
            slots: Vec::with_capacity(inclusion.len()),
            built: HashMap::with_capacity(inclusion.len()),
            in_progress: HashSet::new(),
            roots: Vec::new(),
        }
    }

    /// Build the forest, polling `cancel` before each pending type.
    pub fn build(mut self, cancel: &dyn CancellationSignal) -> WeaveResult<Forest<'r>> {
        let inclusion = self.inclusion;
        for &descriptor in inclusion.types() {
            if self.built.contains_key(descriptor.name.as_str()) {
                continue;
            }
            checkpoint(cancel, "forest construction")?;
            self.ensure_node(descriptor)?;
        }

        if self.slots.len() != self.inclusion.len() {
            return Err(WeaveError::inconsistent(format!(
                "forest holds {} nodes for {} included types",
                self.slots.len(),
                self.inclusion.len()
            )));
        }

        let roots = self
            .roots
            .iter()
            .map(|&idx| materialize(&self.slots, idx))
            .collect::<Vec<_>>();

        debug!(roots = roots.len(), nodes = self.slots.len(), "forest built");
        Ok(Forest { roots })
    }

    fn ensure_node(&mut self, descriptor: &'r TypeDescriptor) -> WeaveResult<usize> {
        let name = descriptor.name.as_str();
        if let Some(&idx) = self.built.get(name) {
            return Ok(idx);
        }
        if !self.in_progress.insert(name) {
            return Err(WeaveError::inconsistent(format!(
                "inheritance cycle through {name}"
            )));
        }

        let parent = match self.parent_of(descriptor) {
            Some(base) => Some(self.ensure_node(base)?),
            None => None,
        };

        let idx = self.slots.len();
        self.slots.push(Slot {
            descriptor,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.slots[parent].children.push(idx),
            None => self.roots.push(idx),
        }

        self.in_progress.remove(name);
        if self.built.insert(name, idx).is_some() {
            return Err(WeaveError::inconsistent(format!("type {name} built twice")));
        }
        Ok(idx)
    }

    /// The base to attach under, or `None` when the type is a root.
    fn parent_of(&self, descriptor: &'r TypeDescriptor) -> Option<&'r TypeDescriptor> {
        let base_name = descriptor.base.as_ref()?;
        let Some(base) = self.repo.resolve_base(descriptor) else {
            debug!(type_name = %descriptor.name, base = %base_name, "base not resolvable, rooting");
            return None;
        };
        if !self.repo.is_local(base) || !self.inclusion.contains(base.name.as_str()) {
            return None;
        }
        Some(base)
    }
}

fn materialize<'r>(slots: &[Slot<'r>], idx: usize) -> TypeNode<'r> {
    let slot = &slots[idx];
    TypeNode {
        descriptor: slot.descriptor,
        children: slot
            .children
            .iter()
            .map(|&child| materialize(slots, child))
            .collect(),
    }
}
