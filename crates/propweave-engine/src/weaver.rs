//! Pipeline wiring the filter, forest, classifier and planner together.

use std::collections::{HashMap, HashSet};

use propweave_core::{TypeName, TypeRepository};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, info_span};

use crate::cancel::{CancellationSignal, NeverCancel};
use crate::classify::{NotifierClassifier, NotifyNode, NotifyOrigin};
use crate::config::WeaverConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::filter::{Inclusion, InclusionFilter};
use crate::forest::ForestBuilder;
use crate::inject::CapabilityInjector;
use crate::plan::InjectionPlanner;
use crate::synthesis::SynthesisPlan;

/// A type that ends up with the capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedType {
    pub name: TypeName,
    pub origin: NotifyOrigin,
    /// Included subtypes under this type, pre-order. Subtrees that already
    /// notified on their own are appended after them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub covered: Vec<TypeName>,
}

impl From<&NotifyNode<'_>> for SelectedType {
    fn from(node: &NotifyNode<'_>) -> Self {
        Self {
            name: node.name().clone(),
            origin: node.origin,
            covered: node.node.descendant_names(),
        }
    }
}

/// Final decision of one weaving run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaveOutcome {
    /// Subtrees that already notify, in visit order.
    pub inherited: Vec<SelectedType>,
    /// Types accepted for injection, in visit order.
    pub injected: Vec<SelectedType>,
    /// Members to synthesize, one per injected type and in the same order.
    pub synthesis: Vec<SynthesisPlan>,
}

impl WeaveOutcome {
    /// Every notify node, inherited ones first.
    pub fn selected_types(&self) -> impl Iterator<Item = &SelectedType> {
        self.inherited.iter().chain(self.injected.iter())
    }

    /// Whether no type was selected at all.
    pub fn is_empty(&self) -> bool {
        self.inherited.is_empty() && self.injected.is_empty()
    }

    /// Stamp the capability marker on every injected type in `repo`.
    pub fn apply(&self, repo: &mut TypeRepository, capability: &str) -> WeaveResult<usize> {
        CapabilityInjector::new(capability).apply(repo, self.injected.iter().map(|t| &t.name))
    }
}

/// Entry point of the weaving pipeline.
///
/// Holds the configuration and the compiled inclusion filter; a single
/// `Weaver` can classify any number of repositories.
pub struct Weaver {
    config: WeaverConfig,
    filter: InclusionFilter,
}

impl Weaver {
    /// Compile `config` into a weaver.
    pub fn new(config: WeaverConfig) -> WeaveResult<Self> {
        let filter = InclusionFilter::new(&config)?;
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &WeaverConfig {
        &self.config
    }

    /// Classify `repo` without cancellation.
    pub fn run(&self, repo: &TypeRepository) -> WeaveResult<WeaveOutcome> {
        self.run_with_cancel(repo, &NeverCancel)
    }

    /// Classify `repo`, polling `cancel` between root subtrees.
    ///
    /// The repository is never mutated; call [`WeaveOutcome::apply`] or
    /// [`Weaver::weave`] to stamp the selected types.
    pub fn run_with_cancel(
        &self,
        repo: &TypeRepository,
        cancel: &dyn CancellationSignal,
    ) -> WeaveResult<WeaveOutcome> {
        let _span = info_span!("weave", module = %repo.module()).entered();

        if self.config.disabled {
            info!("weaving disabled by configuration");
            return Ok(WeaveOutcome::default());
        }

        let names = &self.config.names;

        let inclusion = {
            let _span = debug_span!("filter").entered();
            self.filter.evaluate(repo)
        };

        let forest = {
            let _span = debug_span!("forest").entered();
            ForestBuilder::new(repo, &inclusion).build(cancel)?
        };

        let classification = {
            let _span = debug_span!("classify").entered();
            NotifierClassifier::new(repo, &names.capability).extract_notifiers(forest, cancel)?
        };

        let injections = {
            let _span = debug_span!("plan").entered();
            InjectionPlanner::new(repo, names, self.config.conflict_policy)
                .plan_injections(classification.remaining, cancel)?
                .into_result()?
        };

        let mut injected: Vec<SelectedType> = injections.iter().map(SelectedType::from).collect();
        let inherited = fold_into_injected(
            repo,
            &inclusion,
            classification.notifiers.iter().map(SelectedType::from).collect(),
            &mut injected,
        );
        let invoker_name = self.config.invoker_name();
        let outcome = WeaveOutcome {
            inherited,
            synthesis: injections
                .iter()
                .map(|n| SynthesisPlan::for_type(n.node.descriptor, names, invoker_name))
                .collect(),
            injected,
        };
        ensure_disjoint(&outcome)?;

        info!(
            included = inclusion.len(),
            inherited = outcome.inherited.len(),
            injected = outcome.injected.len(),
            "weaving plan ready"
        );
        Ok(outcome)
    }

    /// Classify `repo` and stamp the accepted types in one go.
    ///
    /// Nothing is stamped unless classification succeeds as a whole.
    pub fn weave(
        &self,
        repo: &mut TypeRepository,
        cancel: &dyn CancellationSignal,
    ) -> WeaveResult<WeaveOutcome> {
        let outcome = self.run_with_cancel(repo, cancel)?;
        let stamped = outcome.apply(repo, &self.config.names.capability)?;
        info!(stamped, "capability applied");
        Ok(outcome)
    }
}

/// Move notifiers found below an injected type into that type's `covered`
/// list, so no selected type has a selected ancestor.
///
/// The classifier prunes notifiers before planning, which leaves such
/// subtrees detached from the injected type that now sits above them.
fn fold_into_injected(
    repo: &TypeRepository,
    inclusion: &Inclusion<'_>,
    inherited: Vec<SelectedType>,
    injected: &mut [SelectedType],
) -> Vec<SelectedType> {
    let positions: HashMap<TypeName, usize> = injected
        .iter()
        .enumerate()
        .map(|(idx, selected)| (selected.name.clone(), idx))
        .collect();

    let mut kept = Vec::with_capacity(inherited.len());
    for notifier in inherited {
        match injected_ancestor(repo, inclusion, &notifier.name, &positions) {
            Some(idx) => {
                let target = &mut injected[idx];
                debug!(
                    type_name = %notifier.name,
                    under = %target.name,
                    "folded into injected type"
                );
                target.covered.push(notifier.name);
                target.covered.extend(notifier.covered);
            }
            None => kept.push(notifier),
        }
    }
    kept
}

/// Nearest injected ancestor reachable inside the forest, if any.
fn injected_ancestor(
    repo: &TypeRepository,
    inclusion: &Inclusion<'_>,
    name: &TypeName,
    positions: &HashMap<TypeName, usize>,
) -> Option<usize> {
    let descriptor = repo.get(name.as_str())?;
    repo.ancestors(descriptor)
        .take_while(|a| repo.is_local(a) && inclusion.contains(a.name.as_str()))
        .find_map(|a| positions.get(a.name.as_str()).copied())
}

/// No type may be selected, or covered by a selected type, twice.
fn ensure_disjoint(outcome: &WeaveOutcome) -> WeaveResult<()> {
    let mut seen = HashSet::new();
    for selected in outcome.selected_types() {
        for name in std::iter::once(&selected.name).chain(selected.covered.iter()) {
            if !seen.insert(name) {
                return Err(WeaveError::inconsistent(format!(
                    "type {name} reached by more than one notify node"
                )));
            }
        }
    }
    Ok(())
}
