use blendrna::dna::{LayoutTable, encode_blend};

use crate::cmd::test_support::{fixture, run_blendrna, run_blendrna_json};

const ITEM: u64 = 0x1000;
const TAGS: [u64; 2] = [0x2000, 0x2100];

// Item "crate" with count 7, the hidden bit set, and two linked tags.
fn write_blend(name: &str) -> String {
	let layout = LayoutTable::from_json(&blendrna_testkit::fixture_text("item_layout.json")).expect("layout fixture parses");
	let (item_nr, _) = layout.find_struct("Item").expect("Item declared");
	let (tag_nr, _) = layout.find_struct("Tag").expect("Tag declared");

	let mut item = vec![0_u8; 91];
	item[..5].copy_from_slice(b"crate");
	item[64..68].copy_from_slice(&7_i32.to_le_bytes());
	item[68..76].copy_from_slice(&TAGS[0].to_le_bytes());
	item[76..84].copy_from_slice(&TAGS[1].to_le_bytes());
	item[85..89].copy_from_slice(&0.5_f32.to_le_bytes());
	item[89..91].copy_from_slice(&2_i16.to_le_bytes());

	let mut first = vec![0_u8; 48];
	first[..8].copy_from_slice(&TAGS[1].to_le_bytes());
	first[16..21].copy_from_slice(b"metal");
	let mut second = vec![0_u8; 48];
	second[8..16].copy_from_slice(&TAGS[0].to_le_bytes());
	second[16..20].copy_from_slice(b"wood");

	let bytes = encode_blend(
		&layout,
		&[(*b"DATA", ITEM, item_nr, item.as_slice()), (*b"DATA", TAGS[0], tag_nr, first.as_slice()), (*b"DATA", TAGS[1], tag_nr, second.as_slice())],
	);
	let path = blendrna_testkit::scratch_path(name);
	std::fs::write(&path, bytes).expect("scratch blend written");
	path.to_string_lossy().into_owned()
}

#[test]
fn read_json_lists_property_values() {
	let blend = write_blend("read_item.blend");
	let manifest = fixture("item_schema.json");
	let json = run_blendrna_json(&["read", &blend, "--manifest", &manifest, "--struct", "Item", "--addr", "0x1000", "--json"]);

	assert_eq!(json["struct"], "Item");
	assert_eq!(json["addr"], "0x1000");
	assert_eq!(json["name"], "crate");

	let props = json["properties"].as_array().expect("properties array");
	let value = |identifier: &str| {
		props
			.iter()
			.find(|prop| prop["identifier"] == identifier)
			.map(|prop| prop["value"].clone())
			.unwrap_or_default()
	};
	assert_eq!(value("count"), 7);
	assert_eq!(value("weight"), 0.5);
	assert_eq!(value("hidden"), true);
	assert_eq!(value("selected"), false);
	assert_eq!(value("tags"), serde_json::json!(["0x2000", "0x2100"]));
	assert!(value("rna_type").is_null(), "descriptor pointers have no address");
}

#[test]
fn read_text_names_the_instance() {
	let blend = write_blend("read_item_text.blend");
	let manifest = fixture("item_schema.json");
	let output = run_blendrna(&["read", &blend, "--manifest", &manifest, "--struct", "Item", "--addr", "4096"]);
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("name: crate"), "unexpected output: {stdout}");
	assert!(stdout.contains("  count = 7"), "unexpected output: {stdout}");
}

#[test]
fn bad_address_literal_fails() {
	let blend = write_blend("read_item_bad.blend");
	let manifest = fixture("item_schema.json");
	let output = run_blendrna(&["read", &blend, "--manifest", &manifest, "--struct", "Item", "--addr", "nowhere"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("invalid address literal"));
}
