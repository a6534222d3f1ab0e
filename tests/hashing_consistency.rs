use mdpkit::{
    state::{HashingScheme, ObjectHashing, ObjectInstance, ObjectState, OoState, SimpleHashing},
    value::ValueTable,
};

fn blocks(first: (&str, i64), second: (&str, i64)) -> ObjectState {
    ObjectState::new(vec![
        ObjectInstance::new(first.0, "block").with("x", first.1),
        ObjectInstance::new(second.0, "block").with("x", second.1),
    ])
}

#[test]
fn object_identity_free_hashing_shares_table_entries() {
    let mut table = ValueTable::new(|s: &ObjectState| s.objects().len() as f64);
    let a = ObjectHashing.hash_state(&blocks(("b0", 1), ("b1", 2))).unwrap();
    let b = ObjectHashing.hash_state(&blocks(("b1", 2), ("b0", 1))).unwrap();
    let c = ObjectHashing.hash_state(&blocks(("x", 1), ("y", 2))).unwrap();

    assert_eq!(table.value(&a), 2.0);
    table.set(&b, 7.5);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(&c), Some(7.5));
}

#[test]
fn name_sensitive_hashing_keeps_renamed_objects_apart() {
    let mut table = ValueTable::constant(0.0);
    let a = SimpleHashing.hash_state(&blocks(("b0", 1), ("b1", 2))).unwrap();
    let b = SimpleHashing.hash_state(&blocks(("b1", 1), ("b0", 2))).unwrap();
    table.set(&a, 1.0);
    assert_eq!(table.peek(&b), 0.0);
    assert!(!table.contains(&b));
}

#[test]
fn peeking_does_not_store_but_lookup_does() {
    let mut table = ValueTable::constant(-3.0);
    let s = SimpleHashing.hash_state(&blocks(("a", 0), ("b", 0))).unwrap();
    assert_eq!(table.peek(&s), -3.0);
    assert!(table.is_empty());
    assert_eq!(table.value(&s), -3.0);
    assert_eq!(table.states(), &[s.clone()]);
    assert!(!table.ensure(&s));
}
