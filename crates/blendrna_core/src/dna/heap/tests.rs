use crate::dna::{DnaError, Heap};

#[test]
fn allocations_are_zeroed_and_disjoint() {
	let mut heap = Heap::new();
	let a = heap.alloc(24);
	let b = heap.alloc(8);
	assert!(b >= a + 24, "blocks must not overlap");
	assert_eq!(heap.bytes(a, 24), Some(&[0_u8; 24][..]));
	assert!(heap.bytes(a + 20, 8).is_none(), "range past the block end is unmapped");
	assert!(heap.block_at(a + 24).is_none(), "one-past-the-end is not inside any block");
}

#[test]
fn pointers_round_trip() {
	let mut heap = Heap::new();
	let a = heap.alloc(16);
	let b = heap.alloc(16);
	assert!(heap.write_ptr(a + 8, b));
	assert_eq!(heap.read_ptr(a + 8), Some(b));
	assert!(!heap.write_ptr(0, b), "null is never mapped");
}

#[test]
fn insert_rejects_overlap() {
	let mut heap = Heap::new();
	heap.insert(0x10_0000, vec![1; 32], Some(0), 1).expect("first insert");
	let err = heap.insert(0x10_0010, vec![2; 8], None, 1).expect_err("overlap is rejected");
	assert!(matches!(err, DnaError::HeapOverlap { addr: 0x10_0010 }));
	heap.insert(0x10_0020, vec![3; 8], None, 1).expect("adjacent insert");
	assert_eq!(heap.bytes(0x10_0020, 1), Some(&[3_u8][..]));

	let fresh = heap.alloc(4);
	assert!(fresh > 0x10_0028, "allocations continue after imported blocks");
}

#[test]
fn strings_are_bounded() {
	let mut heap = Heap::new();
	let addr = heap.alloc_cstr("hello");
	assert_eq!(heap.read_cstr(addr, None).as_deref(), Some("hello"));
	assert_eq!(heap.read_cstr(addr, Some(3)).as_deref(), Some("hel"));
}

#[test]
fn custom_values_follow_mapping() {
	let mut heap = Heap::new();
	let addr = heap.alloc(8);
	assert!(heap.set_custom(addr, "weight", serde_json::json!(0.5)));
	assert!(!heap.set_custom(0xdead_0000, "weight", serde_json::json!(1)));
	assert_eq!(heap.custom(addr, "weight"), Some(&serde_json::json!(0.5)));
	assert_eq!(heap.remove_custom_key("weight"), 1);
	assert!(heap.custom(addr, "weight").is_none());
}

#[test]
fn insert_rejects_blocks_past_the_address_space() {
	let mut heap = Heap::new();
	let err = heap.insert(u64::MAX - 4, vec![0; 8], None, 1).expect_err("block wraps");
	assert!(matches!(err, DnaError::HeapAddressOutOfRange { .. }));
	assert!(heap.is_empty());
}
