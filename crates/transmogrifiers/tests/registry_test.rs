//! Behavioral tests for conversion chaining.
//!
//! Covers shortest-path selection, verification, duplicate edges,
//! deregistration, cycles and structural source selection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::cell::Cell;
use std::rc::Rc;

use morphbus_core::{Error, Identifier, NameResolver, Payload, Prototype, Result, Tag};
use morphbus_transmogrifiers::{conversion, Conversion, TransmogrifierRegistry};
use serde_json::json;

#[derive(Debug, PartialEq)]
struct A(i64);
#[derive(Debug, PartialEq)]
struct B(i64);
#[derive(Debug, PartialEq)]
struct C(i64);

fn setup_registry() -> TransmogrifierRegistry {
    let resolver = NameResolver::new()
        .with_type::<A>("chain::A")
        .with_type::<B>("chain::B")
        .with_type::<C>("chain::C");
    TransmogrifierRegistry::builder()
        .with_resolver(Rc::new(resolver))
        .with_namespace("chain")
        .build()
}

/// A conversion that counts its invocations and maps the inner number.
fn counted<F>(calls: &Rc<Cell<usize>>, f: F) -> Conversion
where
    F: Fn(&Payload) -> Option<Payload> + 'static,
{
    let calls = calls.clone();
    conversion(move |value| {
        calls.set(calls.get() + 1);
        Ok(f(value))
    })
}

fn a_to_b(calls: &Rc<Cell<usize>>) -> Conversion {
    counted(calls, |v| v.downcast_ref::<A>().map(|a| Payload::new(B(a.0 + 1))))
}

fn b_to_c(calls: &Rc<Cell<usize>>) -> Conversion {
    counted(calls, |v| v.downcast_ref::<B>().map(|b| Payload::new(C(b.0 * 10))))
}

fn a_to_c(calls: &Rc<Cell<usize>>) -> Conversion {
    counted(calls, |v| v.downcast_ref::<A>().map(|a| Payload::new(C(-a.0))))
}

fn calls() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

// ==========================================================================
// Chaining
// ==========================================================================

#[test]
fn should_run_each_step_of_a_chain_once() -> Result<()> {
    let registry = setup_registry();
    let (ab, bc) = (calls(), calls());
    registry.register("chain::A", "chain::B", false, a_to_b(&ab))?;
    registry.register("chain::B", "chain::C", false, b_to_c(&bc))?;

    let result = registry.transmogrify(&Payload::new(A(1)), "chain::C")?;

    assert_eq!(result.downcast_ref::<C>(), Some(&C(20)));
    assert_eq!(ab.get(), 1);
    assert_eq!(bc.get(), 1);
    Ok(())
}

#[test]
fn should_prefer_direct_edge_over_longer_chain() -> Result<()> {
    let registry = setup_registry();
    let (ab, bc, ac) = (calls(), calls(), calls());
    registry.register("chain::A", "chain::B", false, a_to_b(&ab))?;
    registry.register("chain::B", "chain::C", false, b_to_c(&bc))?;
    registry.register("chain::A", "chain::C", false, a_to_c(&ac))?;

    let result = registry.transmogrify(&Payload::new(A(7)), Identifier::of::<C>())?;

    assert_eq!(result.downcast_ref::<C>(), Some(&C(-7)));
    assert_eq!((ab.get(), bc.get(), ac.get()), (0, 0, 1));
    Ok(())
}

#[test]
fn should_fail_without_path_and_invoke_nothing() -> Result<()> {
    let registry = setup_registry();
    let (ab, bc) = (calls(), calls());
    registry.register("chain::A", "chain::B", false, a_to_b(&ab))?;
    registry.register("chain::C", "chain::B", false, b_to_c(&bc))?;

    let result = registry.transmogrify(&Payload::new(A(1)), "chain::C");

    assert!(matches!(result, Err(Error::NoPathFound { .. })));
    assert_eq!(ab.get() + bc.get(), 0);
    Ok(())
}

#[test]
fn should_fail_for_tags_absent_from_the_graph() {
    let registry = setup_registry();
    let result = registry.transmogrify(&Payload::new(A(1)), "chain::A");
    assert!(matches!(result, Err(Error::NoPathFound { .. })));
}

#[test]
fn should_terminate_on_cyclic_graphs() -> Result<()> {
    let registry = setup_registry();
    let (ab, ba) = (calls(), calls());
    registry.register("chain::A", "chain::B", false, a_to_b(&ab))?;
    registry.register(
        "chain::B",
        "chain::A",
        false,
        counted(&ba, |v| v.downcast_ref::<B>().map(|b| Payload::new(A(b.0)))),
    )?;
    registry.register("chain::C", "chain::C", false, conversion(|v| Ok(Some(v.clone()))))?;

    let result = registry.transmogrify(&Payload::new(A(1)), "chain::C");
    assert!(matches!(result, Err(Error::NoPathFound { .. })));

    let round_trip = registry.transmogrify(&Payload::new(B(5)), "chain::A")?;
    assert_eq!(round_trip.downcast_ref::<A>(), Some(&A(5)));
    assert_eq!((ab.get(), ba.get()), (0, 1));
    Ok(())
}

// ==========================================================================
// Verification
// ==========================================================================

#[test]
fn should_verify_result_tags() -> Result<()> {
    let registry = setup_registry();
    let lying = calls();
    // Declared A -> B, actually produces C.
    registry.register(
        "chain::A",
        "chain::B",
        false,
        counted(&lying, |v| v.downcast_ref::<A>().map(|a| Payload::new(C(a.0)))),
    )?;
    let value = Payload::new(A(3));

    let verified = registry.transmogrify(&value, "chain::B");
    match verified {
        Err(Error::ResultMismatch { from, to, actual }) => {
            assert_eq!(from, "chain::A");
            assert_eq!(to, "chain::B");
            assert_eq!(actual, "chain::C");
        }
        other => panic!("expected ResultMismatch, got {other:?}"),
    }

    let unverified = registry.transmogrify_with(&value, "chain::B", false)?;
    assert_eq!(unverified.as_ref().and_then(Payload::downcast_ref::<C>), Some(&C(3)));
    assert_eq!(lying.get(), 2);
    Ok(())
}

#[test]
fn should_stop_unverified_chain_at_empty_result() -> Result<()> {
    let registry = setup_registry();
    let bc = calls();
    registry.register("chain::A", "chain::B", false, conversion(|_| Ok(None)))?;
    registry.register("chain::B", "chain::C", false, b_to_c(&bc))?;

    let result = registry.transmogrify_with(&Payload::new(A(1)), "chain::C", false)?;
    assert!(result.is_none());
    assert_eq!(bc.get(), 0);

    let verified = registry.transmogrify(&Payload::new(A(1)), "chain::C");
    assert!(matches!(verified, Err(Error::EmptyResult { .. })));
    Ok(())
}

// ==========================================================================
// Registration
// ==========================================================================

#[test]
fn should_respect_overwrite_flag() -> Result<()> {
    let registry = setup_registry();
    let (first, second) = (calls(), calls());
    registry.register("chain::A", "chain::B", false, a_to_b(&first))?;

    let duplicate = registry.register("chain::A", "chain::B", false, a_to_b(&second));
    assert!(matches!(duplicate, Err(Error::DuplicateEdge { .. })));

    registry.transmogrify(&Payload::new(A(0)), "chain::B")?;
    assert_eq!((first.get(), second.get()), (1, 0));

    registry.register("chain::A", "chain::B", true, a_to_b(&second))?;
    registry.transmogrify(&Payload::new(A(0)), "chain::B")?;
    assert_eq!((first.get(), second.get()), (1, 1));
    Ok(())
}

#[test]
fn should_fail_after_deregistering_edge() -> Result<()> {
    let registry = setup_registry();
    let (ab, bc) = (calls(), calls());
    registry.register("chain::A", "chain::B", false, a_to_b(&ab))?;
    registry.register("chain::B", "chain::C", false, b_to_c(&bc))?;
    registry.transmogrify(&Payload::new(A(1)), "chain::C")?;

    registry.deregister("chain::B", "chain::C")?;

    let result = registry.transmogrify(&Payload::new(A(1)), "chain::C");
    assert!(matches!(result, Err(Error::NoPathFound { .. })));
    assert!(!registry.contains("chain::B", "chain::C")?);
    assert_eq!(registry.vertex_count(), 2);
    Ok(())
}

#[test]
fn should_clear_all_edges() -> Result<()> {
    let registry = setup_registry();
    registry.register("chain::A", "chain::B", false, a_to_b(&calls()))?;
    registry.clear();

    assert_eq!(registry.edge_count(), 0);
    assert_eq!(registry.vertex_count(), 0);
    assert!(registry.transmogrify(&Payload::new(A(1)), "chain::B").is_err());
    Ok(())
}

#[test]
fn should_resolve_symbols_in_default_namespace() -> Result<()> {
    let registry = setup_registry();
    let to = registry.register(Identifier::symbol("a"), Identifier::symbol("b"), false, a_to_b(&calls()))?;

    assert_eq!(to, Tag::exact("chain::B"));
    assert_eq!(registry.default_namespace(), "chain");
    assert!(registry.contains(Identifier::of::<A>(), Identifier::of::<B>())?);
    Ok(())
}

// ==========================================================================
// Structural values
// ==========================================================================

#[test]
fn should_convert_structural_value_through_best_source() -> Result<()> {
    let registry = setup_registry();
    let (broad, narrow) = (calls(), calls());
    registry.register(
        Prototype::new(json!({"kind": null}))?,
        "chain::A",
        false,
        counted(&broad, |_| Some(Payload::new(A(0)))),
    )?;
    registry.register(
        Prototype::new(json!({"kind": "point", "x": null}))?,
        "chain::A",
        false,
        counted(&narrow, |v| {
            let x = v.as_structure()?.get("x")?.as_i64()?;
            Some(Payload::new(A(x)))
        }),
    )?;

    let value = Payload::structural(json!({"kind": "point", "x": 4, "y": 2}))?;
    let result = registry.transmogrify(&value, "chain::A")?;

    assert_eq!(result.downcast_ref::<A>(), Some(&A(4)));
    assert_eq!((broad.get(), narrow.get()), (0, 1));
    Ok(())
}

#[test]
fn should_verify_structural_targets_by_prototype() -> Result<()> {
    let registry = setup_registry();
    let target = Prototype::new(json!({"value": null}))?;
    registry.register(
        "chain::A",
        target.clone(),
        false,
        conversion(|v| {
            let a = v.downcast_ref::<A>().ok_or("not an A")?;
            Ok(Some(Payload::structural(json!({"value": a.0, "unit": "m"}))?))
        }),
    )?;

    let result = registry.transmogrify(&Payload::new(A(9)), target)?;
    assert_eq!(result.as_structure().and_then(|m| m.get("value")), Some(&json!(9)));
    Ok(())
}

#[test]
fn should_leave_input_untouched() -> Result<()> {
    let registry = setup_registry();
    registry.register("chain::A", "chain::B", false, a_to_b(&calls()))?;

    let value = Payload::new(A(41));
    registry.transmogrify(&value, "chain::B")?;

    assert_eq!(value.downcast_ref::<A>(), Some(&A(41)));
    Ok(())
}
