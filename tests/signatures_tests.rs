use clipscope::signatures::{
    CWS_MAGIC, FWS_MAGIC, MAX_SIGNATURE_MATCHES, OLE_MAGIC, PIC_SHAPE_MARKER, ZIP_MAGIC,
};
use clipscope::{SignatureKind, SignatureScanner, scan_signatures};

#[test]
fn test_marker_at_three_offsets() {
    let mut data = vec![0u8; 1100];
    for offset in [0, 50, 1000] {
        data[offset..offset + 3].copy_from_slice(&FWS_MAGIC);
    }

    let matches = scan_signatures(&data);
    assert_eq!(matches.len(), 3);
    let offsets: Vec<usize> = matches.iter().map(|m| m.offset).collect();
    assert_eq!(offsets, vec![0, 50, 1000]);
    assert!(matches.iter().all(|m| m.kind == SignatureKind::Fws));
}

#[test]
fn test_mixed_kinds_sorted_by_offset() {
    let mut data = vec![0u8; 512];
    data[400..408].copy_from_slice(&OLE_MAGIC);
    data[10..14].copy_from_slice(&ZIP_MAGIC);
    data[200..209].copy_from_slice(PIC_SHAPE_MARKER);
    data[300..303].copy_from_slice(&CWS_MAGIC);

    let kinds: Vec<(SignatureKind, usize)> = scan_signatures(&data)
        .into_iter()
        .map(|m| (m.kind, m.offset))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (SignatureKind::Zip, 10),
            (SignatureKind::PicShape, 200),
            (SignatureKind::Cws, 300),
            (SignatureKind::Ole, 400),
        ]
    );
}

#[test]
fn test_scan_is_capped() {
    let data = ZIP_MAGIC.repeat(500);
    let matches = scan_signatures(&data);
    assert_eq!(matches.len(), MAX_SIGNATURE_MATCHES);
    assert_eq!(matches.last().unwrap().offset, (MAX_SIGNATURE_MATCHES - 1) * 4);
}

#[test]
fn test_first_container() {
    let mut data = vec![0u8; 64];
    data[5..8].copy_from_slice(&ZIP_MAGIC[..3]);
    data[20..23].copy_from_slice(&CWS_MAGIC);
    data[40..43].copy_from_slice(&FWS_MAGIC);

    let scanner = SignatureScanner::new();
    let first = scanner.first_container(&data).unwrap();
    assert_eq!(first.kind, SignatureKind::Cws);
    assert_eq!(first.offset, 20);
    assert_eq!(scanner.first(&data, SignatureKind::Fws), Some(40));
    assert_eq!(scanner.first(&data, SignatureKind::Zip), None);
}
