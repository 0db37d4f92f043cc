use crate::dna::{BlendSource, Compression, DnaError, LayoutBuilder, LayoutTable, encode_blend};

fn layout() -> LayoutTable {
	LayoutBuilder::new(8)
		.struct_def("Item", &[("Item", "*next"), ("char", "name[16]"), ("int", "count")])
		.build()
		.expect("layout builds")
}

#[test]
fn layout_table_survives_a_file_round_trip() {
	let layout = layout();
	let source = BlendSource::from_bytes(encode_blend(&layout, &[])).expect("source decodes");
	assert_eq!(source.compression, Compression::None);

	let parsed = source.layout_table().expect("DNA1 parses");
	assert_eq!(parsed.types, layout.types);
	assert_eq!(parsed.names, layout.names);
	assert_eq!(parsed.tlen, layout.tlen);
	assert_eq!(parsed.struct_size("Item"), Some(28));
}

#[test]
fn compressed_files_decode() {
	let raw = encode_blend(&layout(), &[]);
	let packed = zstd::encode_all(raw.as_slice(), 3).expect("zstd encode");
	let source = BlendSource::from_bytes(packed).expect("compressed source decodes");
	assert_eq!(source.compression, Compression::Zstd);
	assert!(source.layout_table().is_ok());
}

#[test]
fn stored_blocks_load_at_their_addresses() {
	let layout = layout();
	let (sdna_nr, _) = layout.find_struct("Item").expect("Item declared");
	let mut payload = vec![0_u8; 28];
	payload[24..28].copy_from_slice(&7_i32.to_le_bytes());
	let bytes = encode_blend(&layout, &[(*b"DATA", 0x4000, sdna_nr, &payload), (*b"DATA", 0x4010, sdna_nr, &payload)]);

	let source = BlendSource::from_bytes(bytes).expect("source decodes");
	let (heap, skipped) = source.load_heap().expect("heap loads");
	assert_eq!(skipped, 1, "second block overlaps the first");
	assert_eq!(heap.len(), 1);
	assert_eq!(heap.bytes(0x4000 + 24, 4), Some(&7_i32.to_le_bytes()[..]));
	assert_eq!(heap.blocks()[0].sdna_nr, Some(sdna_nr));
}

#[test]
fn missing_layout_block_is_an_error() {
	let mut bytes = b"BLENDER17-01v0500".to_vec();
	bytes.extend_from_slice(b"ENDB");
	bytes.extend_from_slice(&[0_u8; 28]);
	let source = BlendSource::from_bytes(bytes).expect("source decodes");
	assert!(matches!(source.layout_table(), Err(DnaError::LayoutBlockMissing)));
}
