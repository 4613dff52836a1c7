// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::IndexMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Key(usize);

impl From<Key> for usize {
    fn from(value: Key) -> Self {
        value.0
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key(value)
    }
}

#[test]
fn insert_and_get() {
    let mut map = IndexMap::new();
    map.insert(Key(3), "three");
    assert_eq!(map.get(Key(3)), Some(&"three"));
    assert_eq!(map.get(Key(0)), None);
    assert_eq!(map.get(Key(7)), None);
}

#[test]
fn overwrite() {
    let mut map = IndexMap::new();
    map.insert(Key(1), 10);
    map.insert(Key(1), 20);
    assert_eq!(map.get(Key(1)), Some(&20));
}

#[test]
fn iter_skips_holes() {
    let mut map = IndexMap::new();
    map.insert(Key(0), 'a');
    map.insert(Key(4), 'b');
    let entries: Vec<(Key, &char)> = map.iter().collect();
    assert_eq!(entries, vec![(Key(0), &'a'), (Key(4), &'b')]);
}

#[test]
fn from_iter_collects() {
    let map: IndexMap<Key, i32> = [(Key(2), 4), (Key(0), 1)].into_iter().collect();
    assert_eq!(map.get(Key(0)), Some(&1));
    assert_eq!(map.get(Key(2)), Some(&4));
    assert!(!map.is_empty());
}
