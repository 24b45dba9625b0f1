//! Randomised operation sequences checked against the world's invariants and
//! a plain shadow model.

use std::collections::HashMap;

use nickel_core::{Entity, Position, Velocity, World};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tag(u16);

#[derive(Debug, Clone)]
enum Op {
    Create,
    Destroy(usize),
    AddPosition(usize, f32),
    AddVelocity(usize, f32),
    AddTag(usize, u16),
    RemovePosition(usize),
    RemoveVelocity(usize),
    RemoveTag(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        1 => any::<usize>().prop_map(Op::Destroy),
        2 => (any::<usize>(), -100.0f32..100.0).prop_map(|(i, v)| Op::AddPosition(i, v)),
        2 => (any::<usize>(), -100.0f32..100.0).prop_map(|(i, v)| Op::AddVelocity(i, v)),
        2 => (any::<usize>(), any::<u16>()).prop_map(|(i, v)| Op::AddTag(i, v)),
        1 => any::<usize>().prop_map(Op::RemovePosition),
        1 => any::<usize>().prop_map(Op::RemoveVelocity),
        1 => any::<usize>().prop_map(Op::RemoveTag),
    ]
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Shadow {
    position: Option<Position>,
    velocity: Option<Velocity>,
    tag: Option<Tag>,
}

fn pick(handles: &[Entity], i: usize) -> Option<Entity> {
    (!handles.is_empty()).then(|| handles[i % handles.len()])
}

proptest! {
    #[test]
    fn prop_world_matches_shadow_model(ops in proptest::collection::vec(op(), 1..200)) {
        let mut world = World::new();
        let mut handles: Vec<Entity> = Vec::new();
        let mut shadow: HashMap<Entity, Shadow> = HashMap::new();

        for op in ops {
            match op {
                Op::Create => {
                    let e = world.create_entity().unwrap();
                    prop_assert!(!shadow.contains_key(&e));
                    handles.push(e);
                    shadow.insert(e, Shadow::default());
                }
                Op::Destroy(i) => {
                    if let Some(e) = pick(&handles, i) {
                        let was_alive = shadow.remove(&e).is_some();
                        prop_assert_eq!(world.destroy_entity(e), was_alive);
                    }
                }
                Op::AddPosition(i, v) => {
                    if let Some(e) = pick(&handles, i) {
                        let ok = world.add_component(e, Position::new(v, -v)).is_ok();
                        prop_assert_eq!(ok, shadow.contains_key(&e));
                        if let Some(s) = shadow.get_mut(&e) {
                            s.position = Some(Position::new(v, -v));
                        }
                    }
                }
                Op::AddVelocity(i, v) => {
                    if let Some(e) = pick(&handles, i) {
                        let ok = world.add_component(e, Velocity::new(v, v)).is_ok();
                        prop_assert_eq!(ok, shadow.contains_key(&e));
                        if let Some(s) = shadow.get_mut(&e) {
                            s.velocity = Some(Velocity::new(v, v));
                        }
                    }
                }
                Op::AddTag(i, v) => {
                    if let Some(e) = pick(&handles, i) {
                        let ok = world.add_component(e, Tag(v)).is_ok();
                        prop_assert_eq!(ok, shadow.contains_key(&e));
                        if let Some(s) = shadow.get_mut(&e) {
                            s.tag = Some(Tag(v));
                        }
                    }
                }
                Op::RemovePosition(i) => {
                    if let Some(e) = pick(&handles, i) {
                        let expected = shadow.get_mut(&e).and_then(|s| s.position.take());
                        prop_assert_eq!(world.remove_component::<Position>(e).ok(), expected);
                    }
                }
                Op::RemoveVelocity(i) => {
                    if let Some(e) = pick(&handles, i) {
                        let expected = shadow.get_mut(&e).and_then(|s| s.velocity.take());
                        prop_assert_eq!(world.remove_component::<Velocity>(e).ok(), expected);
                    }
                }
                Op::RemoveTag(i) => {
                    if let Some(e) = pick(&handles, i) {
                        let expected = shadow.get_mut(&e).and_then(|s| s.tag.take());
                        prop_assert_eq!(world.remove_component::<Tag>(e).ok(), expected);
                    }
                }
            }

            prop_assert!(world.check_invariants().is_ok(), "{:?}", world.check_invariants());
        }

        prop_assert_eq!(world.entity_count(), shadow.len());
        for &e in &handles {
            match shadow.get(&e) {
                Some(s) => {
                    prop_assert!(world.is_alive(e));
                    prop_assert_eq!(world.get_component::<Position>(e), s.position.as_ref());
                    prop_assert_eq!(world.get_component::<Velocity>(e), s.velocity.as_ref());
                    prop_assert_eq!(world.get_component::<Tag>(e), s.tag.as_ref());
                    let (table, row) = world.location(e).unwrap();
                    prop_assert_eq!(world.table(table).unwrap().entities()[row], e);
                }
                None => prop_assert!(!world.is_alive(e)),
            }
        }
    }
}
