use vexlift_decoder::{decode_one, decode_prefixes, scan_prefixes, DecodeMode};

fn assert_prefix_api_matches_decode_one(mode: DecodeMode, bytes: &[u8]) {
    let decoded = decode_one(mode, 0, bytes).expect("decode_one");

    let prefixes_only = decode_prefixes(mode, bytes).expect("decode_prefixes");
    assert_eq!(prefixes_only, decoded.prefixes);

    let (prefixes, _consumed) = scan_prefixes(mode, bytes).expect("scan_prefixes");
    assert_eq!(prefixes, decoded.prefixes);
}

#[test]
fn reports_expected_consumed_prefix_lengths() {
    assert_eq!(scan_prefixes(DecodeMode::Bits64, &[0x90]).unwrap().1, 0);
    assert_eq!(scan_prefixes(DecodeMode::Bits64, &[0x66, 0x90]).unwrap().1, 1);
    assert_eq!(
        scan_prefixes(DecodeMode::Bits64, &[0x66, 0x67, 0x90]).unwrap().1,
        2
    );
    // A REX byte is not a legacy prefix, so the legacy scanner stops before it.
    assert_eq!(scan_prefixes(DecodeMode::Bits64, &[0x48, 0x90]).unwrap().1, 0);
}

#[test]
fn duplicate_prefixes_of_the_same_kind_collapse() {
    let (prefixes, consumed) =
        scan_prefixes(DecodeMode::Bits32, &[0x66, 0x66, 0x66, 0x90]).unwrap();
    assert!(prefixes.operand_size_override);
    assert_eq!(consumed, 3);
}

#[test]
fn lock_rep_and_repne_are_tracked_independently_of_segment_overrides() {
    // lock add dword ptr [eax], 1
    let bytes = [0xF0, 0x83, 0x00, 0x01];
    assert_prefix_api_matches_decode_one(DecodeMode::Bits32, &bytes);

    let decoded = decode_one(DecodeMode::Bits32, 0, &bytes).expect("decode_one");
    assert!(decoded.prefixes.lock);
    assert!(!decoded.prefixes.rep);
    assert!(!decoded.prefixes.repne);
}

#[test]
fn segment_override_prefix_is_recorded() {
    use vexlift_decoder::Segment;

    // fs: mov eax, [eax]
    let bytes = [0x64, 0x8B, 0x00];
    let decoded = decode_one(DecodeMode::Bits32, 0, &bytes).expect("decode");
    assert_eq!(decoded.prefixes.segment, Some(Segment::Fs));
}

#[test]
fn rep_and_repne_are_mutually_exclusive_and_last_one_wins() {
    let (prefixes, _) = scan_prefixes(DecodeMode::Bits64, &[0xF3, 0xF2, 0x90]).unwrap();
    assert!(prefixes.repne);
    assert!(!prefixes.rep);
}
