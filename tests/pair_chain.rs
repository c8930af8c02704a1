//! End-to-end scenarios over a small fixture protocol modeled on a 9P-style envelope: a fixed
//! header that dispatches by message type to either a length-prefixed string body or a body
//! holding a runtime-counted array of fixed-size qid records.

use std::rc::Rc;

use pairframe::{
    CdrCount, CdrEntry, FieldSpec, HeadLayout, NextHead, ParseError, Pair, PrimitiveKind,
    Scalar, SuccessorRule,
};

const T_VERSION: u8 = 100;
const R_WALK: u8 = 107;

fn qid_layout() -> Rc<HeadLayout> {
    HeadLayout::new(
        "p9_qid",
        13,
        vec![
            FieldSpec::new("qtype", PrimitiveKind::U8, 0),
            FieldSpec::new("version", PrimitiveKind::U32, 1),
            FieldSpec::new("path", PrimitiveKind::U64, 5),
        ],
        SuccessorRule::ArrayDelegate,
    )
}

fn char_layout() -> Rc<HeadLayout> {
    HeadLayout::new(
        "p9_char",
        1,
        vec![FieldSpec::new("value", PrimitiveKind::U8, 0)],
        SuccessorRule::ArrayDelegate,
    )
}

fn string_layout() -> Rc<HeadLayout> {
    HeadLayout::new(
        "p9_string",
        2,
        vec![FieldSpec::new("len", PrimitiveKind::U16, 0)],
        SuccessorRule::CdrMap(vec![CdrEntry {
            name: "chars",
            element: char_layout(),
            count: CdrCount::FromField("len"),
        }]),
    )
}

fn walk_body_layout() -> Rc<HeadLayout> {
    HeadLayout::new(
        "p9_walk_body",
        2,
        vec![FieldSpec::new("nwqid", PrimitiveKind::U16, 0)],
        SuccessorRule::CdrMap(vec![CdrEntry {
            name: "wqid",
            element: qid_layout(),
            count: CdrCount::FromField("nwqid"),
        }]),
    )
}

fn envelope_layout() -> Rc<HeadLayout> {
    HeadLayout::new(
        "p9_msg",
        7,
        vec![
            FieldSpec::new("size", PrimitiveKind::U32, 0),
            FieldSpec::new("mtype", PrimitiveKind::U8, 4),
            FieldSpec::new("tag", PrimitiveKind::U16, 5),
        ],
        SuccessorRule::Homogeneous(Rc::new(|head| {
            let mtype = head.get("mtype")?.as_u64().unwrap() as u8;
            match mtype {
                T_VERSION => Ok(NextHead::Layout(string_layout())),
                R_WALK => Ok(NextHead::Layout(walk_body_layout())),
                _ => Ok(NextHead::End),
            }
        })),
    )
}

fn le16(v: u16) -> [u8; 2] {
    v.to_le_bytes()
}
fn le32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}
fn le64(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

fn qid_bytes(qtype: u8, version: u32, path: u64) -> Vec<u8> {
    let mut out = vec![qtype];
    out.extend_from_slice(&le32(version));
    out.extend_from_slice(&le64(path));
    out
}

/// Brings up `env_logger` once so tests exercising the `debug!`/`warn!` sites around
/// construction and handover can be run with `RUST_LOG=pairframe=debug` to inspect them.
fn init_logging() {
    let _ = env_logger::try_init();
}

#[test]
fn tversion_envelope_resolves_to_string_body() {
    init_logging();
    let mut buf = vec![];
    buf.extend_from_slice(&le32(0)); // size, unused by the parser itself
    buf.push(T_VERSION);
    buf.extend_from_slice(&le16(7)); // tag
    buf.extend_from_slice(&le16(4)); // len
    buf.extend_from_slice(b"9P2k");

    let msg = Pair::new(&buf, envelope_layout()).unwrap();
    assert_eq!(msg.layout_name(), "p9_msg");

    let tail = msg.tail().unwrap().expect("version messages carry a string body");
    assert_eq!(tail.layout_name(), "p9_string");

    let c0 = tail.index("chars", 0).unwrap();
    assert_eq!(c0.head().get("value").unwrap().as_u64(), Some(b'9' as u64));
    let c3 = tail.index("chars", 3).unwrap();
    assert_eq!(c3.head().get("value").unwrap().as_u64(), Some(b'k' as u64));
}

#[test]
fn named_lookup_walks_the_tail_chain() {
    let mut buf = vec![];
    buf.extend_from_slice(&le32(0));
    buf.push(T_VERSION);
    buf.extend_from_slice(&le16(42));
    buf.extend_from_slice(&le16(2));
    buf.extend_from_slice(b"ok");

    let msg = Pair::new(&buf, envelope_layout()).unwrap();
    match msg.lookup("tag").unwrap() {
        pairframe::Lookup::Value(v) => assert_eq!(v.as_u64(), Some(42)),
        pairframe::Lookup::Pair(_) => panic!("tag is a scalar field"),
    }
    // "len" lives on the string body, not the envelope; lookup should follow the tail to find it.
    match msg.lookup("len").unwrap() {
        pairframe::Lookup::Value(v) => assert_eq!(v.as_u64(), Some(2)),
        pairframe::Lookup::Pair(_) => panic!("len is a scalar field"),
    }
}

#[test]
fn rwalk_array_supports_indexed_and_sequential_access() {
    let mut buf = vec![];
    buf.extend_from_slice(&le32(0));
    buf.push(R_WALK);
    buf.extend_from_slice(&le16(1));
    buf.extend_from_slice(&le16(3)); // nwqid
    buf.extend_from_slice(&qid_bytes(0, 1, 100));
    buf.extend_from_slice(&qid_bytes(0, 1, 101));
    buf.extend_from_slice(&qid_bytes(0, 1, 102));

    let msg = Pair::new(&buf, envelope_layout()).unwrap();
    let body = msg.tail().unwrap().unwrap();
    assert_eq!(body.layout_name(), "p9_walk_body");

    // Indexed access (O(1) fast path: both entry types are ArrayDelegate-backed).
    let q1 = body.index("wqid", 1).unwrap();
    assert_eq!(q1.head().get("path").unwrap().as_u64(), Some(101));

    // Out of range is reported, not panicked.
    let err = body.index("wqid", 3).unwrap_err();
    assert!(matches!(err, ParseError::OutOfRange { count: 3, index: 3, .. }));

    // Sequential walk via tail()/handover reaches the same elements in order.
    let q0 = body.tail().unwrap().expect("first qid");
    assert_eq!(q0.head().get("path").unwrap().as_u64(), Some(100));
    let q1_via_tail = q0.tail().unwrap().expect("second qid via handover");
    assert_eq!(q1_via_tail.head().get("path").unwrap().as_u64(), Some(101));
    let q2_via_tail = q1_via_tail.tail().unwrap().expect("third qid via handover");
    assert_eq!(q2_via_tail.head().get("path").unwrap().as_u64(), Some(102));
    assert!(q2_via_tail.tail().unwrap().is_none());
}

#[test]
fn head_overflow_is_reported_not_panicked() {
    init_logging();
    let buf = [0u8; 3]; // envelope head needs 7 bytes
    let err = Pair::new(&buf, envelope_layout()).unwrap_err();
    assert!(matches!(
        err,
        ParseError::HeadOverflow {
            head_size: 7,
            buffer_len: 3,
            ..
        }
    ));
}

#[test]
fn unknown_field_does_not_panic() {
    let mut buf = vec![];
    buf.extend_from_slice(&le32(0));
    buf.push(0); // unrecognized mtype, chain ends after the envelope
    buf.extend_from_slice(&le16(0));

    let msg = Pair::new(&buf, envelope_layout()).unwrap();
    assert!(msg.tail().unwrap().is_none());
    let err = msg.lookup("does_not_exist").unwrap_err();
    assert!(matches!(err, ParseError::UnknownField { .. }));
}

#[test]
fn set_mutates_in_place_and_is_visible_through_the_chain() {
    let mut buf = vec![];
    buf.extend_from_slice(&le32(0));
    buf.push(T_VERSION);
    buf.extend_from_slice(&le16(7));
    buf.extend_from_slice(&le16(2));
    buf.extend_from_slice(b"hi");

    let msg = Pair::new(&buf, envelope_layout()).unwrap();
    msg.set("tag", Scalar::U16(99)).unwrap();
    assert_eq!(msg.head().get("tag").unwrap().as_u64(), Some(99));

    let wrong_width = msg.set("tag", Scalar::U32(1));
    assert!(matches!(wrong_width, Err(ParseError::ValueOutOfRange { .. })));
}

#[test]
fn full_buffer_spans_the_whole_resolved_chain() {
    let mut buf = vec![];
    buf.extend_from_slice(&le32(0));
    buf.push(T_VERSION);
    buf.extend_from_slice(&le16(7));
    buf.extend_from_slice(&le16(3));
    buf.extend_from_slice(b"abc");
    buf.push(0xFF); // trailing byte outside the resolved chain

    let msg = Pair::new(&buf, envelope_layout()).unwrap();
    let full = msg.full_buffer().unwrap();
    assert_eq!(full.len(), 7 + 2 + 3);
    assert_eq!(msg.raw_buffer().len(), buf.len());
}
