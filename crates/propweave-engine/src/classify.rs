//! Detection of subtrees that already notify through inheritance.

use propweave_core::{TypeName, TypeRepository};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::{checkpoint, CancellationSignal};
use crate::error::WeaveResult;
use crate::forest::{Forest, TypeNode};

/// Why a node ended up with the capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOrigin {
    /// The type or an ancestor already implements the capability.
    Inherited,
    /// The type requested injection and was accepted.
    Injected,
}

impl NotifyOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            NotifyOrigin::Inherited => "inherited",
            NotifyOrigin::Injected => "injected",
        }
    }
}

/// A node finalized as having the capability, with its whole subtree.
#[derive(Debug, Clone)]
pub struct NotifyNode<'r> {
    pub node: TypeNode<'r>,
    pub origin: NotifyOrigin,
}

impl<'r> NotifyNode<'r> {
    pub fn name(&self) -> &'r TypeName {
        self.node.name()
    }
}

/// Result of [`NotifierClassifier::extract_notifiers`].
#[derive(Debug, Clone, Default)]
pub struct Classification<'r> {
    /// The forest with every notifying subtree removed.
    pub remaining: Forest<'r>,
    /// Notifying subtrees, in visit order.
    pub notifiers: Vec<NotifyNode<'r>>,
}

/// Finds nodes whose inheritance chain already implements the capability.
pub struct NotifierClassifier<'r, 'n> {
    repo: &'r TypeRepository,
    capability: &'n str,
}

impl<'r, 'n> NotifierClassifier<'r, 'n> {
    pub fn new(repo: &'r TypeRepository, capability: &'n str) -> Self {
        Self { repo, capability }
    }

    /// Split `forest` into notifying subtrees and what remains.
    ///
    /// A notifying node is not descended into: its subtypes inherit the
    /// capability and leave the forest together with it.
    pub fn extract_notifiers(
        &self,
        forest: Forest<'r>,
        cancel: &dyn CancellationSignal,
    ) -> WeaveResult<Classification<'r>> {
        let mut notifiers = Vec::new();
        let mut remaining = Vec::with_capacity(forest.roots.len());

        for root in forest.roots {
            checkpoint(cancel, "notifier classification")?;
            remaining.extend(self.classify(vec![root], &mut notifiers));
        }

        debug!(
            notifiers = notifiers.len(),
            remaining_roots = remaining.len(),
            "notifier classification done"
        );
        Ok(Classification {
            remaining: Forest { roots: remaining },
            notifiers,
        })
    }

    fn classify(
        &self,
        nodes: Vec<TypeNode<'r>>,
        notifiers: &mut Vec<NotifyNode<'r>>,
    ) -> Vec<TypeNode<'r>> {
        let mut kept = Vec::with_capacity(nodes.len());
        for mut node in nodes {
            if self.repo.hierarchy_implements(node.descriptor, self.capability) {
                debug!(type_name = %node.name(), pruned = node.size(), "already notifies");
                notifiers.push(NotifyNode {
                    node,
                    origin: NotifyOrigin::Inherited,
                });
                continue;
            }
            node.children = self.classify(std::mem::take(&mut node.children), notifiers);
            kept.push(node);
        }
        kept
    }
}
