use quill_primitives::Change;

use super::*;

fn red(from: CharIdx, to: CharIdx) -> StyleRange {
	StyleRange::new(from, to, "color:red")
}

#[test]
fn test_map_shifts_range_after_insert() {
	let set = DecorationSet::from_ranges([red(10, 20)]);
	let cs = ChangeSet::from_changes(40, [Change::insert(5, "12345")]);
	assert_eq!(set.map(&cs).as_slice(), &[red(15, 25)]);
}

#[test]
fn test_map_drops_deleted_range() {
	let set = DecorationSet::from_ranges([red(10, 20), red(25, 30)]);
	let cs = ChangeSet::from_changes(40, [Change::delete(10, 20)]);
	let mapped = set.map(&cs);
	assert!(mapped.find(10, 10).is_empty());
	assert_eq!(mapped.as_slice(), &[red(15, 20)]);
}

#[test]
fn test_map_does_not_absorb_edge_insertions() {
	let set = DecorationSet::from_ranges([red(10, 20)]);
	let at_start = ChangeSet::from_changes(40, [Change::insert(10, "ab")]);
	assert_eq!(set.map(&at_start).as_slice(), &[red(12, 22)]);

	let at_end = ChangeSet::from_changes(40, [Change::insert(20, "ab")]);
	assert_eq!(set.map(&at_end).as_slice(), &[red(10, 20)]);

	let inside = ChangeSet::from_changes(40, [Change::insert(15, "ab")]);
	assert_eq!(set.map(&inside).as_slice(), &[red(10, 22)]);
}

#[test]
fn test_map_identity_shares_snapshot() {
	let set = DecorationSet::from_ranges([red(1, 2)]);
	let mapped = set.map(&ChangeSet::identity(10));
	assert!(Arc::ptr_eq(&set.ranges, &mapped.ranges));
}

#[test]
fn test_find_includes_touching_ranges() {
	let set = DecorationSet::from_ranges([red(0, 5), red(5, 8), red(9, 12), red(20, 22)]);
	assert_eq!(set.find(5, 9), vec![red(0, 5), red(5, 8), red(9, 12)]);
	assert_eq!(set.find(13, 19), Vec::<StyleRange>::new());
	assert_eq!(set.find(21, 21), vec![red(20, 22)]);
}

#[test]
fn test_remove_range_then_add() {
	let set = DecorationSet::from_ranges([red(1, 3), red(10, 12), red(20, 25)]);
	let next = set.remove_range(9, 15).add([StyleRange::new(10, 14, "color:blue")]);
	assert_eq!(
		next.as_slice(),
		&[red(1, 3), StyleRange::new(10, 14, "color:blue"), red(20, 25)]
	);
	// The original snapshot is untouched.
	assert_eq!(set.len(), 3);
	assert_eq!(set.as_slice()[1], red(10, 12));
}

#[test]
fn test_from_ranges_sorts_and_drops_empty() {
	let set = DecorationSet::from_ranges([red(9, 10), red(4, 4), red(1, 2)]);
	assert_eq!(set.as_slice(), &[red(1, 2), red(9, 10)]);
	assert!(DecorationSet::empty().is_empty());
}
