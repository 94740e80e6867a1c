//! Read-only repository over every known type descriptor.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use tracing::debug;

use crate::descriptor::{ModuleId, TypeDescriptor, TypeName};
use crate::error::{RepositoryError, RepositoryResult};
use crate::manifest::TypeManifest;

/// All descriptors visible to one weaving run.
///
/// Descriptors keep their insertion order, which is the declaration order the
/// rest of the pipeline relies on for deterministic output.
#[derive(Debug, Clone, Default)]
pub struct TypeRepository {
    module: ModuleId,
    types: Vec<TypeDescriptor>,
    index: HashMap<TypeName, usize>,
}

impl TypeRepository {
    /// Create an empty repository weaving `module`.
    pub fn new(module: impl Into<ModuleId>) -> Self {
        Self {
            module: module.into(),
            types: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a validated repository from a list of descriptors.
    pub fn with_types(
        module: impl Into<ModuleId>,
        types: impl IntoIterator<Item = TypeDescriptor>,
    ) -> RepositoryResult<Self> {
        let mut repo = Self::new(module);
        for descriptor in types {
            repo.insert(descriptor)?;
        }
        repo.validate()?;
        Ok(repo)
    }

    /// Build a validated repository from module manifests.
    ///
    /// Manifests of modules other than `module` only serve to resolve
    /// ancestors that live outside the woven module.
    pub fn from_manifests(
        module: impl Into<ModuleId>,
        manifests: impl IntoIterator<Item = TypeManifest>,
    ) -> RepositoryResult<Self> {
        let mut repo = Self::new(module);
        for manifest in manifests {
            debug!(module = %manifest.module, types = manifest.types.len(), "loading manifest");
            for descriptor in manifest.types {
                repo.insert(descriptor)?;
            }
        }
        repo.validate()?;
        Ok(repo)
    }

    /// Add a descriptor. Names must be unique.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> RepositoryResult<()> {
        if self.index.contains_key(&descriptor.name) {
            return Err(RepositoryError::DuplicateType {
                name: descriptor.name,
            });
        }
        self.index.insert(descriptor.name.clone(), self.types.len());
        self.types.push(descriptor);
        Ok(())
    }

    /// The module being woven.
    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a descriptor by qualified name.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    /// Mutable lookup, used by the apply step only.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDescriptor> {
        self.index.get(name).map(|&i| &mut self.types[i])
    }

    /// All descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    /// Descriptors declared by the woven module, in declaration order.
    pub fn local_types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter().filter(|t| t.module == self.module)
    }

    /// Whether `descriptor` is declared by the woven module.
    pub fn is_local(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor.module == self.module
    }

    /// Resolve the direct base of `descriptor`, if it is known.
    pub fn resolve_base(&self, descriptor: &TypeDescriptor) -> Option<&TypeDescriptor> {
        descriptor.base.as_ref().and_then(|base| self.get(base.as_str()))
    }

    /// Walk the resolvable ancestors of `descriptor`, nearest first.
    ///
    /// The walk stops at the first base that cannot be resolved.
    pub fn ancestors<'a>(&'a self, descriptor: &'a TypeDescriptor) -> Ancestors<'a> {
        Ancestors {
            repo: self,
            next: self.resolve_base(descriptor),
            remaining: self.types.len(),
        }
    }

    /// Whether `descriptor` or any resolvable ancestor carries `annotation`.
    pub fn hierarchy_has_annotation(&self, descriptor: &TypeDescriptor, annotation: &str) -> bool {
        std::iter::once(descriptor)
            .chain(self.ancestors(descriptor))
            .any(|t| t.has_annotation(annotation))
    }

    /// Whether `descriptor` or any resolvable ancestor implements `interface`,
    /// either directly or through an inherited interface.
    pub fn hierarchy_implements(&self, descriptor: &TypeDescriptor, interface: &str) -> bool {
        std::iter::once(descriptor)
            .chain(self.ancestors(descriptor))
            .any(|t| self.implements_directly(t, interface))
    }

    fn implements_directly(&self, descriptor: &TypeDescriptor, interface: &str) -> bool {
        let mut stack: Vec<&str> = descriptor.interfaces.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();

        while let Some(candidate) = stack.pop() {
            if candidate == interface {
                return true;
            }
            if !seen.insert(candidate) {
                continue;
            }
            if let Some(parent) = self.get(candidate) {
                stack.extend(parent.interfaces.iter().map(String::as_str));
            }
        }
        false
    }

    /// Inheritance digraph with an edge from every type to its resolvable base.
    /// Returns the graph and a mapping from type name to node index.
    pub fn inheritance_graph(&self) -> (StableDiGraph<TypeName, ()>, HashMap<TypeName, NodeIndex>) {
        let mut graph = StableDiGraph::new();
        let mut name_to_index = HashMap::new();

        for descriptor in &self.types {
            let idx = graph.add_node(descriptor.name.clone());
            name_to_index.insert(descriptor.name.clone(), idx);
        }

        for descriptor in &self.types {
            if let Some(base) = &descriptor.base {
                if let (Some(&from), Some(&to)) =
                    (name_to_index.get(&descriptor.name), name_to_index.get(base))
                {
                    graph.add_edge(from, to, ());
                }
            }
        }

        (graph, name_to_index)
    }

    /// Check that base-type references are acyclic.
    pub fn validate(&self) -> RepositoryResult<()> {
        let (graph, _) = self.inheritance_graph();
        toposort(&graph, None).map_err(|cycle| RepositoryError::InheritanceCycle {
            name: graph[cycle.node_id()].clone(),
        })?;
        Ok(())
    }

    /// Manifest of every descriptor declared by `module`.
    pub fn manifest_for(&self, module: &ModuleId) -> TypeManifest {
        TypeManifest {
            module: module.clone(),
            types: self
                .types
                .iter()
                .filter(|t| &t.module == module)
                .cloned()
                .collect(),
        }
    }
}

/// Iterator over the resolvable ancestors of a type.
pub struct Ancestors<'a> {
    repo: &'a TypeRepository,
    next: Option<&'a TypeDescriptor>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        // Bounded so an unvalidated repository with a cycle cannot spin forever.
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = self.repo.resolve_base(current);
        Some(current)
    }
}
