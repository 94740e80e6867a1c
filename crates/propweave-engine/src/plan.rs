//! Injection planning for types that request the capability.

use std::fmt;

use propweave_core::{simple_name, TypeDescriptor, TypeName, TypeRepository, WellKnownNames};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cancel::{checkpoint, CancellationSignal};
use crate::classify::{NotifyNode, NotifyOrigin};
use crate::error::{WeaveError, WeaveResult};
use crate::forest::{Forest, TypeNode};

/// Contradiction found on a type that requests injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictReason {
    /// The inheritance chain already implements the capability.
    ImplementsCapability,
    /// The type declares the notification event itself.
    DeclaresEvent,
}

impl ConflictReason {
    /// Stable reason code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            ConflictReason::ImplementsCapability => "implements-capability",
            ConflictReason::DeclaresEvent => "declares-event",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A fatal conflict on one type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Conflict {
    pub type_name: TypeName,
    pub reason: ConflictReason,
    pub message: String,
}

impl Conflict {
    fn implements_capability(type_name: &TypeName, names: &WellKnownNames) -> Self {
        Self {
            type_name: type_name.clone(),
            reason: ConflictReason::ImplementsCapability,
            message: format!(
                "The type '{}' already implements {} so [{}] is redundant.",
                type_name,
                simple_name(&names.capability),
                simple_name(&names.add_annotation)
            ),
        }
    }

    fn declares_event(type_name: &TypeName, names: &WellKnownNames) -> Self {
        Self {
            type_name: type_name.clone(),
            reason: ConflictReason::DeclaresEvent,
            message: format!(
                "The type '{}' already has a {event} event. \
                 If type has a [{}] then the {event} event can be removed.",
                type_name,
                simple_name(&names.add_annotation),
                event = names.event_name,
            ),
        }
    }
}

/// What to do when a conflict is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Abort planning at the first conflict.
    #[default]
    FailFast,
    /// Record every conflict in visit order, then fail.
    CollectAll,
}

/// Output of [`InjectionPlanner::plan_injections`].
#[derive(Debug, Clone, Default)]
pub struct InjectionPlan<'r> {
    /// Accepted types, in visit order.
    pub injections: Vec<NotifyNode<'r>>,
    /// Conflicts, in visit order. Only populated under `CollectAll`.
    pub conflicts: Vec<Conflict>,
}

impl<'r> InjectionPlan<'r> {
    /// Accepted injections, or every recorded conflict.
    pub fn into_result(self) -> WeaveResult<Vec<NotifyNode<'r>>> {
        if self.conflicts.is_empty() {
            Ok(self.injections)
        } else {
            Err(WeaveError::Conflicts(self.conflicts))
        }
    }
}

/// Selects annotated types for synthesis.
pub struct InjectionPlanner<'r, 'n> {
    repo: &'r TypeRepository,
    names: &'n WellKnownNames,
    policy: ConflictPolicy,
}

impl<'r, 'n> InjectionPlanner<'r, 'n> {
    pub fn new(
        repo: &'r TypeRepository,
        names: &'n WellKnownNames,
        policy: ConflictPolicy,
    ) -> Self {
        Self {
            repo,
            names,
            policy,
        }
    }

    /// Walk the forest left after notifier extraction and select every type
    /// that requests injection.
    ///
    /// Accepted types are not descended into. Under [`ConflictPolicy::FailFast`]
    /// the first conflict is returned as an error.
    pub fn plan_injections(
        &self,
        forest: Forest<'r>,
        cancel: &dyn CancellationSignal,
    ) -> WeaveResult<InjectionPlan<'r>> {
        let mut plan = InjectionPlan::default();
        for root in forest.roots {
            checkpoint(cancel, "injection planning")?;
            self.visit(root, &mut plan)?;
        }

        debug!(
            injections = plan.injections.len(),
            conflicts = plan.conflicts.len(),
            "injection planning done"
        );
        Ok(plan)
    }

    fn visit(&self, node: TypeNode<'r>, plan: &mut InjectionPlan<'r>) -> WeaveResult<()> {
        if !node.descriptor.has_annotation(&self.names.add_annotation) {
            for child in node.children {
                self.visit(child, plan)?;
            }
            return Ok(());
        }

        if let Some(conflict) = self.validate(node.descriptor) {
            warn!(type_name = %conflict.type_name, reason = %conflict.reason, "weaving conflict");
            return match self.policy {
                ConflictPolicy::FailFast => Err(conflict.into()),
                ConflictPolicy::CollectAll => {
                    plan.conflicts.push(conflict);
                    Ok(())
                }
            };
        }

        debug!(type_name = %node.name(), covered = node.size() - 1, "selected for injection");
        plan.injections.push(NotifyNode {
            node,
            origin: NotifyOrigin::Injected,
        });
        Ok(())
    }

    /// Check (a) inheritance, then (b) a hand-written event.
    fn validate(&self, descriptor: &TypeDescriptor) -> Option<Conflict> {
        if self
            .repo
            .hierarchy_implements(descriptor, &self.names.capability)
        {
            return Some(Conflict::implements_capability(&descriptor.name, self.names));
        }
        if descriptor.declares_notify_event {
            return Some(Conflict::declares_event(&descriptor.name, self.names));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NeverCancel;
    use crate::config::WeaverConfig;
    use crate::filter::InclusionFilter;
    use crate::forest::ForestBuilder;
    use propweave_core::{ADD_NOTIFY_ANNOTATION, NOTIFY_CAPABILITY};

    fn forest(repo: &TypeRepository) -> Forest<'_> {
        let inclusion = InclusionFilter::new(&WeaverConfig::default()).unwrap().evaluate(repo);
        ForestBuilder::new(repo, &inclusion).build(&NeverCancel).unwrap()
    }

    fn plan<'r>(
        repo: &'r TypeRepository,
        policy: ConflictPolicy,
    ) -> WeaveResult<InjectionPlan<'r>> {
        let names = WellKnownNames::default();
        InjectionPlanner::new(repo, &names, policy).plan_injections(forest(repo), &NeverCancel)
    }

    #[test]
    fn annotated_type_is_selected_and_children_skipped() {
        let repo = TypeRepository::with_types(
            "App",
            vec![
                TypeDescriptor::class("App.Base", "App"),
                TypeDescriptor::class("App.Mid", "App")
                    .with_base("App.Base")
                    .with_annotation(ADD_NOTIFY_ANNOTATION),
                TypeDescriptor::class("App.Leaf", "App")
                    .with_base("App.Mid")
                    .with_annotation(ADD_NOTIFY_ANNOTATION),
            ],
        )
        .unwrap();

        let plan = plan(&repo, ConflictPolicy::FailFast).unwrap();
        let selected: Vec<_> = plan.injections.iter().map(|n| n.name().as_str()).collect();
        assert_eq!(selected, vec!["App.Mid"]);
        assert_eq!(plan.injections[0].origin, NotifyOrigin::Injected);
        assert_eq!(plan.injections[0].node.descendant_names(), vec![TypeName::from("App.Leaf")]);
    }

    #[test]
    fn own_event_is_a_conflict() {
        let repo = TypeRepository::with_types(
            "App",
            vec![TypeDescriptor::class("App.Dup", "App")
                .with_annotation(ADD_NOTIFY_ANNOTATION)
                .with_notify_event()],
        )
        .unwrap();

        let err = plan(&repo, ConflictPolicy::FailFast).unwrap_err();
        let conflicts = err.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].type_name.as_str(), "App.Dup");
        assert_eq!(conflicts[0].reason, ConflictReason::DeclaresEvent);
        assert_eq!(
            conflicts[0].message,
            "The type 'App.Dup' already has a PropertyChanged event. If type has a \
             [AddINotifyPropertyChangedInterfaceAttribute] then the PropertyChanged \
             event can be removed."
        );
    }

    #[test]
    fn inherited_capability_is_checked_before_own_event() {
        // Planning on an unclassified forest: the notifier pass normally removes this.
        let repo = TypeRepository::with_types(
            "App",
            vec![TypeDescriptor::class("App.Both", "App")
                .with_interface(NOTIFY_CAPABILITY)
                .with_annotation(ADD_NOTIFY_ANNOTATION)
                .with_notify_event()],
        )
        .unwrap();

        let err = plan(&repo, ConflictPolicy::FailFast).unwrap_err();
        assert_eq!(err.conflicts()[0].reason, ConflictReason::ImplementsCapability);
        assert!(err.to_string().contains("already implements INotifyPropertyChanged"));
    }

    #[test]
    fn collect_all_reports_conflicts_in_visit_order() {
        let repo = TypeRepository::with_types(
            "App",
            vec![
                TypeDescriptor::class("App.Second", "App")
                    .with_base("App.Root")
                    .with_annotation(ADD_NOTIFY_ANNOTATION)
                    .with_notify_event(),
                TypeDescriptor::class("App.Root", "App"),
                TypeDescriptor::class("App.First", "App")
                    .with_base("App.Root")
                    .with_annotation(ADD_NOTIFY_ANNOTATION)
                    .with_notify_event(),
                TypeDescriptor::class("App.Fine", "App").with_annotation(ADD_NOTIFY_ANNOTATION),
            ],
        )
        .unwrap();

        let plan = plan(&repo, ConflictPolicy::CollectAll).unwrap();
        let conflicted: Vec<_> = plan.conflicts.iter().map(|c| c.type_name.as_str()).collect();
        // Root is built while resolving Second, so Second is its first child.
        assert_eq!(conflicted, vec!["App.Second", "App.First"]);
        assert_eq!(plan.injections.len(), 1);

        let err = plan.into_result().unwrap_err();
        assert_eq!(err.conflicts().len(), 2);
        assert!(err.to_string().contains("and 1 more"));
    }

    #[test]
    fn unannotated_types_are_untouched() {
        let repo = TypeRepository::with_types(
            "App",
            vec![
                TypeDescriptor::class("App.A", "App"),
                TypeDescriptor::class("App.B", "App").with_base("App.A"),
            ],
        )
        .unwrap();

        let plan = plan(&repo, ConflictPolicy::FailFast).unwrap();
        assert!(plan.injections.is_empty());
        assert!(plan.conflicts.is_empty());
    }
}
