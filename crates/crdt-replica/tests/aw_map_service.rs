//! Add-wins map updates and removals, end to end through a replica.

use crdt_client::prelude::*;
use crdt_client::ClientError;
use crdt_replica::{Replica, ReplicaConfig};

struct Fixture {
    replica: Replica,
    maps: AwMapService,
    ints: IntegerService,
    counters: CounterService,
    sets: SetService,
}

impl Fixture {
    fn new() -> Self {
        Self {
            replica: Replica::new(ReplicaConfig::new("test")).unwrap(),
            maps: AwMapService::new(),
            ints: IntegerService::new(),
            counters: CounterService::new(),
            sets: SetService::new(),
        }
    }
}

#[test]
fn update_map_assigns_nested_integer() {
    let mut f = Fixture::new();
    let map = f.maps.get_key("key1").unwrap();
    let x = f.ints.get_key("x").unwrap();

    let update = f
        .maps
        .update_map(&map, [f.ints.assign_integer(&x, 1)])
        .unwrap();
    f.replica.apply_update(&update).unwrap();

    assert_eq!(
        f.replica.read_key_in_map(&map, &x.typed()).unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn remove_key_resets_nested_integer() {
    let mut f = Fixture::new();
    let map = f.maps.get_key("key1").unwrap();
    let x = f.ints.get_key("x").unwrap();

    f.replica
        .apply_update(&f.maps.update_map(&map, [f.ints.assign_integer(&x, 1)]).unwrap())
        .unwrap();
    f.replica
        .apply_update(&f.maps.remove_key(&map, [&x]).unwrap())
        .unwrap();

    assert_eq!(
        f.replica.read_key_in_map(&map, &x.typed()).unwrap(),
        Value::Integer(0)
    );
}

#[test]
fn one_update_carries_entries_of_several_kinds() {
    let mut f = Fixture::new();
    let map = f.maps.get_key("key2").unwrap();
    let y = f.ints.get_key("y").unwrap();
    let z = f.counters.get_key("z").unwrap();

    let update = f
        .maps
        .update_map(
            &map,
            [
                f.ints.assign_integer(&y, 1),
                f.counters.increment_counter(&z, 3),
            ],
        )
        .unwrap();
    f.replica.apply_update(&update).unwrap();

    let client = CrdtClient::new(&mut f.replica);
    assert_eq!(client.read_key_in_map(&map, &y).unwrap(), 1);
    assert_eq!(client.read_key_in_map(&map, &z).unwrap(), 3);
}

#[test]
fn remove_key_resets_every_listed_entry() {
    let mut f = Fixture::new();
    let map = f.maps.get_key("key2").unwrap();
    let y = f.ints.get_key("y").unwrap();
    let z = f.counters.get_key("z").unwrap();

    f.replica
        .apply_update(
            &f.maps
                .update_map(
                    &map,
                    [
                        f.ints.assign_integer(&y, 1),
                        f.counters.increment_counter(&z, 3),
                    ],
                )
                .unwrap(),
        )
        .unwrap();
    f.replica
        .apply_update(&f.maps.remove_key(&map, [y.typed(), z.typed()]).unwrap())
        .unwrap();

    assert_eq!(
        f.replica.read_key_in_map(&map, &y.typed()).unwrap(),
        Value::Integer(0)
    );
    assert_eq!(
        f.replica.read_key_in_map(&map, &z.typed()).unwrap(),
        Value::Counter(0)
    );
    assert_eq!(f.replica.read(&map.typed()).unwrap(), Value::Map(Default::default()));
}

#[test]
fn missing_nested_set_reads_empty() {
    let f = Fixture::new();
    let map = f.maps.get_key("key2").unwrap();
    let missing = f.sets.get_key("notExistsSet").unwrap();

    assert_eq!(
        f.replica.read_key_in_map(&map, &missing.typed()).unwrap(),
        Value::Set(vec![])
    );
}

#[test]
fn repeated_removal_is_idempotent() {
    let mut once = Fixture::new();
    let mut twice = Fixture::new();

    for f in [&mut once, &mut twice] {
        let map = f.maps.get_key("m").unwrap();
        let x = f.ints.get_key("x").unwrap();
        f.replica
            .apply_update(&f.maps.update_map(&map, [f.ints.assign_integer(&x, 9)]).unwrap())
            .unwrap();
    }

    let map = once.maps.get_key("m").unwrap();
    let x = once.ints.get_key("x").unwrap();
    let removal = once.maps.remove_key(&map, [&x]).unwrap();

    once.replica.apply_update(&removal).unwrap();
    twice.replica.apply_update(&removal).unwrap();
    twice.replica.apply_update(&removal).unwrap();

    assert_eq!(
        once.replica.read(&map.typed()).unwrap(),
        twice.replica.read(&map.typed()).unwrap()
    );
}

#[test]
fn readded_entry_starts_from_identity() {
    let mut f = Fixture::new();
    let map = f.maps.get_key("m").unwrap();
    let z = f.counters.get_key("z").unwrap();

    let bump = f
        .maps
        .update_map(&map, [f.counters.increment_counter(&z, 5)])
        .unwrap();
    f.replica.apply_update(&bump).unwrap();
    f.replica
        .apply_update(&f.maps.remove_key(&map, [&z]).unwrap())
        .unwrap();
    f.replica.apply_update(&bump).unwrap();

    assert_eq!(
        f.replica.read_key_in_map(&map, &z.typed()).unwrap(),
        Value::Counter(5)
    );
}

#[test]
fn nested_maps_compose() {
    let mut f = Fixture::new();
    let outer = f.maps.get_key("outer").unwrap();
    let inner = f.maps.get_key("inner").unwrap();
    let tags = f.sets.get_key("tags").unwrap();

    let update = f
        .maps
        .update_map(
            &outer,
            [f
                .maps
                .update_map(&inner, [f.sets.add_elements(&tags, ["b", "a"])])
                .unwrap()],
        )
        .unwrap();
    f.replica.apply_update(&update).unwrap();

    let inner_value = f
        .replica
        .read_key_in_map(&outer, &inner.typed())
        .unwrap();
    assert_eq!(
        inner_value.get(&tags.typed()),
        Value::Set(vec!["a".into(), "b".into()])
    );
}

#[test]
fn invalid_descriptor_never_touches_state() {
    let mut f = Fixture::new();
    let key = TypedKey::new("n", CrdtKind::Integer).unwrap();

    let err = UpdateOp::new(key.clone(), crdt_client::Operation::IncrementCounter(1)).unwrap_err();
    assert_eq!(
        err,
        ClientError::TypeMismatch {
            expected: CrdtKind::Counter,
            found: CrdtKind::Integer,
        }
    );
    assert!(f.replica.is_empty());

    assert_eq!(
        f.maps
            .update_map(&f.maps.get_key("m").unwrap(), Vec::new())
            .unwrap_err(),
        ClientError::EmptyUpdate
    );
    f.replica.apply_updates(&[]).unwrap();
    assert!(f.replica.is_empty());
}

#[test]
fn descriptors_shipped_as_json_apply_identically() {
    let mut f = Fixture::new();
    let map = f.maps.get_key("key2").unwrap();
    let y = f.ints.get_key("y").unwrap();
    let z = f.counters.get_key("z").unwrap();

    let update = f
        .maps
        .update_map(
            &map,
            [
                f.ints.assign_integer(&y, 1),
                f.counters.increment_counter(&z, 3),
            ],
        )
        .unwrap();
    let wire = serde_json::to_string(&update).unwrap();
    let received: UpdateOp = serde_json::from_str(&wire).unwrap();
    assert_eq!(received, update);

    f.replica.apply_update(&received).unwrap();
    assert_eq!(
        f.replica.read_key_in_map(&map, &z.typed()).unwrap(),
        Value::Counter(3)
    );
}
