//! Registry of conversions chained by shortest-path search.

use std::cell::RefCell;
use std::rc::Rc;

use itertools::Itertools;
use morphbus_core::{Error, Identifier, NameResolver, Payload, Result, Tag};
use tracing::{debug, trace};

use crate::graph::{Conversion, ConversionGraph, Step};

/// Registry of transmogrifiers between tags.
///
/// Conversions form a directed graph. [`TransmogrifierRegistry::transmogrify`]
/// finds the chain with the fewest steps from the value's tag to the target
/// and runs it, feeding each step's output into the next. Paths are searched
/// on every call; nothing is cached.
pub struct TransmogrifierRegistry {
    resolver: Rc<NameResolver>,
    default_namespace: String,
    graph: RefCell<ConversionGraph>,
}

impl TransmogrifierRegistry {
    /// Create a registry over `resolver` with the root namespace.
    #[must_use]
    pub fn new(resolver: Rc<NameResolver>) -> Self {
        TransmogrifierRegistryBuilder::new()
            .with_resolver(resolver)
            .build()
    }

    /// Start building a registry.
    #[must_use]
    pub const fn builder() -> TransmogrifierRegistryBuilder {
        TransmogrifierRegistryBuilder::new()
    }

    /// Register `conversion` as the edge `from -> to`.
    ///
    /// Returns the canonical target tag.
    ///
    /// # Errors
    ///
    /// - [`Error::UnresolvedName`] if either identifier cannot be resolved
    /// - [`Error::DuplicateEdge`] if the edge exists and `overwrite` is false
    pub fn register(
        &self,
        from: impl Into<Identifier>,
        to: impl Into<Identifier>,
        overwrite: bool,
        conversion: Conversion,
    ) -> Result<Tag> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        let mut graph = self.graph.borrow_mut();

        if !overwrite && graph.contains_edge(&from, &to) {
            return Err(Error::duplicate_edge(&from, &to));
        }

        let replaced = graph
            .insert(from.clone(), to.clone(), conversion)
            .is_some();
        debug!(from = %from, to = %to, replaced, "Registered transmogrifier");
        Ok(to)
    }

    /// Remove the edge `from -> to`. Removing a missing edge is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] if either identifier cannot be resolved.
    pub fn deregister(&self, from: impl Into<Identifier>, to: impl Into<Identifier>) -> Result<()> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        let removed = self.graph.borrow_mut().remove(&from, &to);
        debug!(from = %from, to = %to, removed, "Deregistered transmogrifier");
        Ok(())
    }

    /// Remove every conversion.
    pub fn clear(&self) {
        debug!("Clearing transmogrifier registry");
        self.graph.borrow_mut().clear();
    }

    /// Whether the edge `from -> to` is registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] if either identifier cannot be resolved.
    pub fn contains(&self, from: impl Into<Identifier>, to: impl Into<Identifier>) -> Result<bool> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        Ok(self.graph.borrow().contains_edge(&from, &to))
    }

    /// Number of registered conversions.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.borrow().edge_count()
    }

    /// Number of tags touched by some conversion.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.borrow().vertex_count()
    }

    /// Namespace symbolic names are resolved in.
    #[must_use]
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// The resolver used to canonicalize identifiers.
    #[must_use]
    pub const fn resolver(&self) -> &Rc<NameResolver> {
        &self.resolver
    }

    /// Convert `value` to `to`, verifying every step.
    ///
    /// # Errors
    ///
    /// - [`Error::UnresolvedName`] if `to` cannot be resolved
    /// - [`Error::NoPathFound`] if no chain leads from the value to `to`
    /// - [`Error::EmptyResult`] if a step produced nothing
    /// - [`Error::ResultMismatch`] if a step produced a value of the wrong tag
    /// - [`Error::ConversionFailed`] if a conversion returned an error
    pub fn transmogrify(&self, value: &Payload, to: impl Into<Identifier>) -> Result<Payload> {
        let to = self.resolve(to)?;
        self.execute(value, &to, true)?
            .ok_or_else(|| Error::empty_result(self.resolver.tag_of(value), &to))
    }

    /// Convert `value` to `to`, optionally verifying every step.
    ///
    /// Without verification a step producing nothing ends the chain with
    /// `Ok(None)` and step results are passed on whatever their tag.
    ///
    /// # Errors
    ///
    /// As [`TransmogrifierRegistry::transmogrify`]; `EmptyResult` and
    /// `ResultMismatch` only when `verify` is set.
    pub fn transmogrify_with(
        &self,
        value: &Payload,
        to: impl Into<Identifier>,
        verify: bool,
    ) -> Result<Option<Payload>> {
        let to = self.resolve(to)?;
        self.execute(value, &to, verify)
    }

    fn execute(&self, value: &Payload, to: &Tag, verify: bool) -> Result<Option<Payload>> {
        let steps = self.plan(value, to)?;

        let Some((first, rest)) = steps.split_first() else {
            debug!(to = %to, "Value already has target tag");
            return Ok(Some(value.clone()));
        };

        let mut current = self.run_step(first, value, verify)?;
        for step in rest {
            let Some(input) = current else {
                return Ok(None);
            };
            current = self.run_step(step, &input, verify)?;
        }
        Ok(current)
    }

    /// Resolve the value's source tag and search the chain to `to`. The graph
    /// borrow ends here so conversions may call back into the registry.
    fn plan(&self, value: &Payload, to: &Tag) -> Result<Vec<Step>> {
        let graph = self.graph.borrow();
        let source = match value {
            Payload::Typed(_) => Some(self.resolver.tag_of(value)),
            Payload::Structural(map) => graph.source_for(map),
        };

        let steps = source
            .and_then(|from| graph.shortest_path(&from, to))
            .ok_or_else(|| Error::no_path_found(self.resolver.tag_of(value), to))?;

        debug!(
            to = %to,
            path = %steps
                .first()
                .map(|step| &step.from)
                .into_iter()
                .chain(steps.iter().map(|step| &step.to))
                .join(" -> "),
            steps = steps.len(),
            "Resolved conversion path"
        );
        Ok(steps)
    }

    fn run_step(&self, step: &Step, input: &Payload, verify: bool) -> Result<Option<Payload>> {
        trace!(from = %step.from, to = %step.to, "Running transmogrifier");

        let output = (step.conversion)(input)
            .map_err(|source| Error::conversion_failed(&step.from, &step.to, source))?;

        match output {
            None if verify => Err(Error::empty_result(&step.from, &step.to)),
            None => Ok(None),
            Some(result) if verify && !self.resolver.conforms(&result, &step.to) => Err(
                Error::result_mismatch(&step.from, &step.to, self.resolver.tag_of(&result)),
            ),
            Some(result) => Ok(Some(result)),
        }
    }

    fn resolve(&self, id: impl Into<Identifier>) -> Result<Tag> {
        self.resolver.resolve(&id.into(), &self.default_namespace)
    }
}

/// Builder for [`TransmogrifierRegistry`].
#[derive(Default)]
pub struct TransmogrifierRegistryBuilder {
    resolver: Option<Rc<NameResolver>>,
    default_namespace: String,
}

impl TransmogrifierRegistryBuilder {
    /// Create a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolver: None,
            default_namespace: String::new(),
        }
    }

    /// Set the name resolver. An empty resolver is used otherwise.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Rc<NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the namespace symbolic names are resolved in.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Build the registry.
    #[must_use]
    pub fn build(self) -> TransmogrifierRegistry {
        TransmogrifierRegistry {
            resolver: self.resolver.unwrap_or_default(),
            default_namespace: self.default_namespace,
            graph: RefCell::new(ConversionGraph::new()),
        }
    }
}
