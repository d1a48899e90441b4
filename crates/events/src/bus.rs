//! Event bus for synchronous in-process pub/sub.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use morphbus_core::{Error, Identifier, NameResolver, Payload, Result, Tag};
use tracing::{debug, trace};

use crate::handlers::{Handler, HandlerClass, HandlerTable};

/// Event bus dispatching published payloads to subscribed handlers.
///
/// Dispatch is synchronous: [`EventBus::publish`] returns once every matched
/// handler has run. Handler classes are visited in ascending order, handlers
/// within a class in subscription order. The bus is `!Sync`; a multithreaded
/// host must confine it to one thread or guard it externally.
pub struct EventBus<C = i32> {
    resolver: Rc<NameResolver>,
    default_namespace: String,
    handlers: RefCell<HandlerTable<C>>,
}

impl EventBus {
    /// Create an event bus over `resolver` with the root namespace and
    /// integer handler classes.
    #[must_use]
    pub fn new(resolver: Rc<NameResolver>) -> Self {
        EventBusBuilder::new().with_resolver(resolver).build()
    }

    /// Start building an event bus.
    #[must_use]
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }
}

impl<C: HandlerClass> EventBus<C> {
    /// Subscribe `handler` to `id` in the default handler class.
    ///
    /// Returns the canonical tag the handler was stored under.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] if `id` cannot be resolved.
    pub fn subscribe(&self, id: impl Into<Identifier>, handler: Handler) -> Result<Tag> {
        self.subscribe_in(id, C::default(), handler)
    }

    /// Subscribe `handler` to `id` in handler class `class`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] if `id` cannot be resolved.
    pub fn subscribe_in(&self, id: impl Into<Identifier>, class: C, handler: Handler) -> Result<Tag> {
        let tag = self.resolve(id)?;
        debug!(tag = %tag, class = ?class, "Subscribing handler");
        self.handlers
            .borrow_mut()
            .insert(class, tag.clone(), handler);
        Ok(tag)
    }

    /// Remove `handler` from `id` in the default handler class.
    ///
    /// Removing a handler that is not subscribed is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] if `id` cannot be resolved.
    pub fn unsubscribe(&self, id: impl Into<Identifier>, handler: &Handler) -> Result<Tag> {
        self.unsubscribe_in(id, &C::default(), handler)
    }

    /// Remove `handler` from `id` in handler class `class`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] if `id` cannot be resolved.
    pub fn unsubscribe_in(
        &self,
        id: impl Into<Identifier>,
        class: &C,
        handler: &Handler,
    ) -> Result<Tag> {
        let tag = self.resolve(id)?;
        let removed = self.handlers.borrow_mut().remove(class, &tag, handler);
        debug!(tag = %tag, class = ?class, removed, "Unsubscribing handler");
        Ok(tag)
    }

    /// Publish an event to every matching handler.
    ///
    /// Typed events reach handlers subscribed to their exact type; structural
    /// events reach every handler whose prototype they match. Handlers see the
    /// subscriptions as they were when `publish` was called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerFailed`] for the first failing handler; the
    /// remaining handlers are not invoked.
    pub fn publish(&self, event: &Payload) -> Result<()> {
        let tag = self.resolver.tag_of(event);
        let handlers = self.handlers.borrow().matching(&tag);

        debug!(tag = %tag, handlers = handlers.len(), "Publishing event");

        for (position, handler) in handlers.iter().enumerate() {
            trace!(tag = %tag, position, "Invoking handler");
            handler(event).map_err(|source| Error::handler_failed(&tag, source))?;
        }
        Ok(())
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        debug!("Clearing event bus");
        self.handlers.borrow_mut().clear();
    }

    /// Number of subscribed handlers across all classes.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().handler_count()
    }

    /// Number of buckets in handler class `class`.
    #[must_use]
    pub fn bucket_count(&self, class: &C) -> usize {
        self.handlers.borrow().bucket_count(class)
    }

    /// Whether no handler is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handler_count() == 0
    }

    /// Namespace symbolic event names are resolved in.
    #[must_use]
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// The resolver used to canonicalize identifiers.
    #[must_use]
    pub const fn resolver(&self) -> &Rc<NameResolver> {
        &self.resolver
    }

    fn resolve(&self, id: impl Into<Identifier>) -> Result<Tag> {
        self.resolver.resolve(&id.into(), &self.default_namespace)
    }
}

/// Builder for [`EventBus`].
pub struct EventBusBuilder<C = i32> {
    resolver: Option<Rc<NameResolver>>,
    default_namespace: String,
    classes: PhantomData<C>,
}

impl EventBusBuilder {
    /// Create a new builder for a bus with integer handler classes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolver: None,
            default_namespace: String::new(),
            classes: PhantomData,
        }
    }
}

impl<C: HandlerClass> EventBusBuilder<C> {
    /// Set the name resolver. An empty resolver is used otherwise.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Rc<NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the namespace symbolic event names are resolved in.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Use `D` as the handler class type.
    #[must_use]
    pub fn with_handler_classes<D: HandlerClass>(self) -> EventBusBuilder<D> {
        EventBusBuilder {
            resolver: self.resolver,
            default_namespace: self.default_namespace,
            classes: PhantomData,
        }
    }

    /// Build the event bus.
    #[must_use]
    pub fn build(self) -> EventBus<C> {
        EventBus {
            resolver: self.resolver.unwrap_or_default(),
            default_namespace: self.default_namespace,
            handlers: RefCell::new(HandlerTable::new()),
        }
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
