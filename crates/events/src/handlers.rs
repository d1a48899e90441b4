//! Handler storage: handler-class buckets keyed by tag.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use morphbus_core::{best_match, matches, BoxError, Payload, Tag};

/// Outcome of a single handler invocation.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// An event handler. Identity (for unsubscribing) is pointer identity.
pub type Handler = Rc<dyn Fn(&Payload) -> HandlerResult>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Payload) -> HandlerResult + 'static,
{
    Rc::new(f)
}

/// Priority value ordering dispatch across handler buckets.
///
/// Lower classes are dispatched first; `Default::default()` is used when a
/// caller does not name a class.
pub trait HandlerClass: Ord + Clone + Default + fmt::Debug + 'static {}

impl<T: Ord + Clone + Default + fmt::Debug + 'static> HandlerClass for T {}

struct Bucket {
    key: Tag,
    handlers: Vec<Handler>,
}

/// Buckets of handlers grouped by class.
///
/// Within a class there is at most one bucket per exact tag. A prototype key
/// joins an existing bucket only when the two prototypes match each other,
/// and every matching bucket is consulted when read.
pub(crate) struct HandlerTable<C> {
    classes: BTreeMap<C, Vec<Bucket>>,
}

impl<C: HandlerClass> HandlerTable<C> {
    pub(crate) const fn new() -> Self {
        Self {
            classes: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, class: C, key: Tag, handler: Handler) {
        let buckets = self.classes.entry(class).or_default();
        match write_position(buckets, &key).and_then(|pos| buckets.get_mut(pos)) {
            Some(bucket) => bucket.handlers.push(handler),
            None => buckets.push(Bucket {
                key,
                handlers: vec![handler],
            }),
        }
    }

    /// Remove `handler` from the first bucket holding it under a key
    /// equivalent to `key`. Returns whether it was present.
    pub(crate) fn remove(&mut self, class: &C, key: &Tag, handler: &Handler) -> bool {
        let Some(buckets) = self.classes.get_mut(class) else {
            return false;
        };
        let Some(pos) = buckets.iter().position(|bucket| {
            equivalent(&bucket.key, key) && bucket.handlers.iter().any(|h| Rc::ptr_eq(h, handler))
        }) else {
            return false;
        };
        let Some(bucket) = buckets.get_mut(pos) else {
            return false;
        };

        bucket.handlers.retain(|h| !Rc::ptr_eq(h, handler));

        if bucket.handlers.is_empty() {
            buckets.remove(pos);
        }
        if buckets.is_empty() {
            self.classes.remove(class);
        }
        true
    }

    /// Snapshot every handler matching `tag`, in dispatch order.
    pub(crate) fn matching(&self, tag: &Tag) -> Vec<Handler> {
        self.classes
            .values()
            .flat_map(|buckets| read_buckets(buckets, tag))
            .flat_map(|bucket| bucket.handlers.iter().cloned())
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.classes.clear();
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.classes
            .values()
            .flatten()
            .map(|bucket| bucket.handlers.len())
            .sum()
    }

    pub(crate) fn bucket_count(&self, class: &C) -> usize {
        self.classes.get(class).map_or(0, Vec::len)
    }
}

/// The bucket a new key joins: among buckets whose prototype matches the key
/// in both directions, the best scoring one, earliest first on ties.
fn write_position(buckets: &[Bucket], key: &Tag) -> Option<usize> {
    match key {
        Tag::Exact(_) => buckets.iter().position(|bucket| bucket.key == *key),
        Tag::Prototype(prototype) => best_match(
            prototype.as_map(),
            buckets
                .iter()
                .enumerate()
                .filter(|(_, bucket)| equivalent(&bucket.key, key))
                .filter_map(|(pos, bucket)| bucket.key.as_prototype().map(|p| (pos, p))),
        ),
    }
}

/// Exact keys are equivalent when equal; prototypes when each matches the
/// other, so a bucket never holds a handler its own key would reject.
fn equivalent(bucket: &Tag, key: &Tag) -> bool {
    match (bucket, key) {
        (Tag::Exact(_), Tag::Exact(_)) => bucket == key,
        (Tag::Prototype(existing), Tag::Prototype(new)) => {
            matches(new.as_map(), existing) && matches(existing.as_map(), new)
        }
        _ => false,
    }
}

fn read_buckets<'a>(buckets: &'a [Bucket], tag: &'a Tag) -> impl Iterator<Item = &'a Bucket> {
    buckets.iter().filter(move |bucket| match (tag, &bucket.key) {
        (Tag::Exact(_), Tag::Exact(_)) => bucket.key == *tag,
        (Tag::Prototype(event), Tag::Prototype(prototype)) => matches(event.as_map(), prototype),
        _ => false,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use morphbus_core::Prototype;
    use serde_json::json;

    use super::*;

    fn noop() -> Handler {
        handler(|_| Ok(()))
    }

    fn proto(value: serde_json::Value) -> Tag {
        Tag::Prototype(Prototype::new(value).unwrap())
    }

    #[test]
    fn should_keep_one_bucket_per_exact_tag() {
        let mut table = HandlerTable::<i32>::new();
        table.insert(0, Tag::exact("A"), noop());
        table.insert(0, Tag::exact("A"), noop());
        table.insert(0, Tag::exact("B"), noop());

        assert_eq!(table.bucket_count(&0), 2);
        assert_eq!(table.handler_count(), 3);
    }

    #[test]
    fn should_collapse_prototypes_into_best_existing_bucket() {
        let mut table = HandlerTable::<i32>::new();
        table.insert(0, proto(json!({"a": 42})), noop());
        table.insert(0, proto(json!({"a": null})), noop());
        assert_eq!(table.bucket_count(&0), 2, "wildcard conflicts with concrete key");

        table.insert(0, proto(json!({"a": null})), noop());
        assert_eq!(table.bucket_count(&0), 2, "second wildcard joins the first");
    }

    #[test]
    fn should_not_join_broader_or_narrower_buckets() {
        let mut table = HandlerTable::<i32>::new();
        table.insert(0, proto(json!({"a": null})), noop());
        table.insert(0, proto(json!({"a": null, "b": null})), noop());
        table.insert(0, proto(json!({"a": 1})), noop());
        assert_eq!(table.bucket_count(&0), 3);

        assert_eq!(table.matching(&proto(json!({"a": 2}))).len(), 1);
        assert_eq!(table.matching(&proto(json!({"a": 1, "b": 2}))).len(), 3);
    }

    #[test]
    fn should_drop_empty_buckets_and_classes() {
        let mut table = HandlerTable::<i32>::new();
        let h = noop();
        table.insert(3, Tag::exact("A"), h.clone());

        assert!(table.remove(&3, &Tag::exact("A"), &h));
        assert_eq!(table.bucket_count(&3), 0);
        assert!(table.classes.is_empty());
        assert!(!table.remove(&3, &Tag::exact("A"), &h));
    }

    #[test]
    fn should_not_mix_exact_and_structural_buckets() {
        let mut table = HandlerTable::<i32>::new();
        table.insert(0, Tag::exact("A"), noop());
        table.insert(0, proto(json!({})), noop());

        assert_eq!(table.matching(&Tag::exact("A")).len(), 1);
        assert_eq!(table.matching(&proto(json!({"x": 1}))).len(), 1);
    }
}
