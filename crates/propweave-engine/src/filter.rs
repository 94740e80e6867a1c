//! Inclusion filter deciding which types take part in weaving.

use std::collections::HashSet;

use propweave_core::{TypeDescriptor, TypeRepository, WellKnownNames};
use regex::Regex;
use tracing::debug;

use crate::config::{WeaverConfig, WeavingMode};
use crate::error::{WeaveError, WeaveResult};

/// Compiled inclusion predicate.
///
/// Built once from a [`WeaverConfig`]; patterns are compiled up front so an
/// invalid expression fails before any classification starts.
#[derive(Debug, Clone)]
pub struct InclusionFilter {
    mode: WeavingMode,
    patterns: Vec<Regex>,
    add_annotation: String,
    opt_out_annotation: String,
}

impl InclusionFilter {
    /// Compile the filter described by `config`.
    pub fn new(config: &WeaverConfig) -> WeaveResult<Self> {
        let patterns = config
            .namespace_filters
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| WeaveError::InvalidNamespacePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<WeaveResult<Vec<_>>>()?;

        Ok(Self::with_patterns(config.weaving_mode(), patterns, &config.names))
    }

    /// Build a filter from already compiled patterns.
    pub fn with_patterns(mode: WeavingMode, patterns: Vec<Regex>, names: &WellKnownNames) -> Self {
        Self {
            mode,
            patterns,
            add_annotation: names.add_annotation.clone(),
            opt_out_annotation: names.opt_out_annotation.clone(),
        }
    }

    /// Whether the qualified name passes the namespace patterns.
    pub fn matches_namespace(&self, descriptor: &TypeDescriptor) -> bool {
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|pattern| pattern.is_match(descriptor.name.as_str()))
    }

    /// Whether `descriptor` takes part in weaving.
    pub fn include(&self, repo: &TypeRepository, descriptor: &TypeDescriptor) -> bool {
        if !self.matches_namespace(descriptor) {
            return false;
        }
        match self.mode {
            WeavingMode::All => true,
            WeavingMode::OptIn => {
                repo.hierarchy_has_annotation(descriptor, &self.add_annotation)
                    && !descriptor.has_annotation(&self.opt_out_annotation)
            }
        }
    }

    /// Evaluate the filter once over every candidate of `repo`.
    ///
    /// Candidates are the classes declared by the woven module.
    pub fn evaluate<'r>(&self, repo: &'r TypeRepository) -> Inclusion<'r> {
        let included: Vec<&'r TypeDescriptor> = repo
            .local_types()
            .filter(|t| t.is_class)
            .filter(|t| self.include(repo, t))
            .collect();
        let names = included.iter().map(|t| t.name.as_str()).collect();

        debug!(
            candidates = repo.local_types().filter(|t| t.is_class).count(),
            included = included.len(),
            "inclusion filter evaluated"
        );

        Inclusion { included, names }
    }
}

/// Memoized result of an [`InclusionFilter`] over one repository.
#[derive(Debug, Clone)]
pub struct Inclusion<'r> {
    included: Vec<&'r TypeDescriptor>,
    names: HashSet<&'r str>,
}

impl<'r> Inclusion<'r> {
    /// Whether the type with qualified name `name` was included.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Included descriptors in declaration order.
    pub fn types(&self) -> &[&'r TypeDescriptor] {
        &self.included
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}
