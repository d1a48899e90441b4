//! One event bus and one transmogrifier registry behind a fluent API.

use std::rc::Rc;

use morphbus_core::{Config, Error, Identifier, NameResolver, Payload, Result, Tag};
use morphbus_events::{handler, EventBus, Handler};
use morphbus_transmogrifiers::{Conversion, TransmogrifierRegistry};
use tracing::debug;

/// An explicitly constructed context pairing an [`EventBus`] with a
/// [`TransmogrifierRegistry`] over one shared [`NameResolver`].
///
/// ```
/// use std::rc::Rc;
/// use morphbus::{handler, NameResolver, Payload, World};
///
/// struct Ping;
///
/// let world = World::new(Rc::new(NameResolver::new().with_type::<Ping>("net::Ping")));
/// world.on_event("net::Ping").with(handler(|_| Ok(()))).subscribe()?;
/// world.publish(&Payload::new(Ping))?;
/// # Ok::<(), morphbus::Error>(())
/// ```
pub struct World {
    bus: Rc<EventBus>,
    registry: Rc<TransmogrifierRegistry>,
    raise_on_empty: bool,
}

impl World {
    /// Create a world with both engines in the root namespace.
    #[must_use]
    pub fn new(resolver: Rc<NameResolver>) -> Self {
        Self::from_config(resolver, &Config::default())
    }

    /// Create a world with namespaces and defaults taken from `config`.
    #[must_use]
    pub fn from_config(resolver: Rc<NameResolver>, config: &Config) -> Self {
        let bus = EventBus::builder()
            .with_resolver(resolver.clone())
            .with_namespace(config.events_namespace.clone())
            .build();
        let registry = TransmogrifierRegistry::builder()
            .with_resolver(resolver)
            .with_namespace(config.transmogrifiers_namespace.clone())
            .build();

        Self {
            bus: Rc::new(bus),
            registry: Rc::new(registry),
            raise_on_empty: config.raise_on_empty,
        }
    }

    /// The event bus.
    #[must_use]
    pub const fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// The transmogrifier registry.
    #[must_use]
    pub const fn registry(&self) -> &Rc<TransmogrifierRegistry> {
        &self.registry
    }

    /// Start a subscription to `id`.
    pub fn on_event(&self, id: impl Into<Identifier>) -> OnEvent<'_> {
        OnEvent {
            world: self,
            id: id.into(),
            class: 0,
            handler: None,
        }
    }

    /// Publish `event` on the bus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerFailed`] for the first failing handler.
    pub fn publish(&self, event: &Payload) -> Result<()> {
        self.bus.publish(event)
    }

    /// Start registering a conversion from `from`.
    pub fn on_transmogrify(&self, from: impl Into<Identifier>) -> OnTransmogrify<'_> {
        OnTransmogrify {
            world: self,
            from: from.into(),
            to: None,
            overwrite: false,
            conversion: None,
        }
    }

    /// Start converting `value`.
    pub const fn transmogrify<'a>(&'a self, value: &'a Payload) -> Transmogrify<'a> {
        Transmogrify { world: self, value }
    }

    /// Start registering a conversion whose results are republished.
    ///
    /// Events of tag `from` are converted and the result is published on the
    /// bus. Empty or mismatched results are dropped unless
    /// [`AutoTransmogrify::raise_on_empty`] is set.
    pub fn autotransmogrify(&self, from: impl Into<Identifier>) -> AutoTransmogrify<'_> {
        AutoTransmogrify {
            world: self,
            from: from.into(),
            to: None,
            class: 0,
            raise_on_empty: self.raise_on_empty,
            conversion: None,
        }
    }

    /// Remove every subscription and conversion.
    pub fn clear(&self) {
        self.bus.clear();
        self.registry.clear();
    }
}

/// Builder returned by [`World::on_event`].
#[must_use = "call subscribe() to register the handler"]
pub struct OnEvent<'a> {
    world: &'a World,
    id: Identifier,
    class: i32,
    handler: Option<Handler>,
}

impl OnEvent<'_> {
    /// Dispatch in handler class `class` instead of the default `0`.
    pub const fn class(mut self, class: i32) -> Self {
        self.class = class;
        self
    }

    /// The handler to subscribe.
    pub fn with(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Subscribe the handler. Returns the canonical tag.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHandler`] if no handler was given
    /// - [`Error::UnresolvedName`] if the event cannot be resolved
    pub fn subscribe(self) -> Result<Tag> {
        let handler = self
            .handler
            .ok_or_else(|| Error::invalid_handler("no event handler given"))?;
        self.world.bus.subscribe_in(self.id, self.class, handler)
    }
}

/// Builder returned by [`World::on_transmogrify`].
#[must_use = "call register() to add the conversion"]
pub struct OnTransmogrify<'a> {
    world: &'a World,
    from: Identifier,
    to: Option<Identifier>,
    overwrite: bool,
    conversion: Option<Conversion>,
}

impl OnTransmogrify<'_> {
    /// Target of the conversion.
    pub fn to(mut self, to: impl Into<Identifier>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Replace an existing conversion between the same tags.
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// The conversion function.
    pub fn with(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Register the conversion. Returns the canonical target tag.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHandler`] if no conversion was given
    /// - [`Error::UnresolvedName`] if no target was given or a tag cannot be
    ///   resolved
    /// - [`Error::DuplicateEdge`] if the edge exists and overwrite is off
    pub fn register(self) -> Result<Tag> {
        let conversion = self
            .conversion
            .ok_or_else(|| Error::invalid_handler("no transmogrifier given"))?;
        let to = self.to.ok_or_else(|| Error::unresolved_name(""))?;
        self.world
            .registry
            .register(self.from, to, self.overwrite, conversion)
    }
}

/// Builder returned by [`World::transmogrify`].
pub struct Transmogrify<'a> {
    world: &'a World,
    value: &'a Payload,
}

impl Transmogrify<'_> {
    /// Convert to `to`, verifying every step.
    ///
    /// # Errors
    ///
    /// See [`TransmogrifierRegistry::transmogrify`].
    pub fn to(self, to: impl Into<Identifier>) -> Result<Payload> {
        self.world.registry.transmogrify(self.value, to)
    }

    /// Convert to `to` without verifying intermediate results.
    ///
    /// # Errors
    ///
    /// See [`TransmogrifierRegistry::transmogrify_with`].
    pub fn to_unverified(self, to: impl Into<Identifier>) -> Result<Option<Payload>> {
        self.world.registry.transmogrify_with(self.value, to, false)
    }
}

/// Builder returned by [`World::autotransmogrify`].
#[must_use = "call register() to add the conversion"]
pub struct AutoTransmogrify<'a> {
    world: &'a World,
    from: Identifier,
    to: Option<Identifier>,
    class: i32,
    raise_on_empty: bool,
    conversion: Option<Conversion>,
}

impl AutoTransmogrify<'_> {
    /// Target of the conversion.
    pub fn to(mut self, to: impl Into<Identifier>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Propagate empty and mismatched results out of `publish`.
    pub const fn raise_on_empty(mut self, raise: bool) -> Self {
        self.raise_on_empty = raise;
        self
    }

    /// Handler class of the republishing subscription.
    pub const fn class(mut self, class: i32) -> Self {
        self.class = class;
        self
    }

    /// The conversion function.
    pub fn with(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Register the conversion and subscribe the republishing handler.
    /// Returns the canonical target tag.
    ///
    /// # Errors
    ///
    /// As [`OnTransmogrify::register`], plus [`Error::UnresolvedName`] if
    /// the source cannot be resolved as an event.
    pub fn register(self) -> Result<Tag> {
        let conversion = self
            .conversion
            .ok_or_else(|| Error::invalid_handler("no transmogrifier given"))?;
        let to = self.to.ok_or_else(|| Error::unresolved_name(""))?;
        let world = self.world;

        // Resolve the event side first so a failure leaves no edge behind.
        let source = world
            .bus
            .resolver()
            .resolve(&self.from, world.bus.default_namespace())?;
        let target = world
            .registry
            .register(self.from, to, false, conversion)?;

        let bus = Rc::downgrade(&world.bus);
        let registry = Rc::downgrade(&world.registry);
        let raise_on_empty = self.raise_on_empty;
        let destination = target.clone();

        world.bus.subscribe_in(
            source,
            self.class,
            handler(move |event| {
                let (Some(bus), Some(registry)) = (bus.upgrade(), registry.upgrade()) else {
                    return Ok(());
                };
                match registry.transmogrify(event, &destination) {
                    Ok(converted) => Ok(bus.publish(&converted)?),
                    Err(err) if err.is_verification_failure() && !raise_on_empty => {
                        debug!(to = %destination, error = %err, "Dropping autotransmogrify result");
                        Ok(())
                    }
                    Err(err) => Err(err.into()),
                }
            }),
        )?;

        Ok(target)
    }
}
