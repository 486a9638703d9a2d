use super::*;
use crate::class_def::ClassDef;
use crate::rpc::Fault;
use crate::ErrorKind;
use std::io::Write as _;
use std::rc::Rc;

fn bytes_of(f: impl FnOnce(&mut Encoder<Vec<u8>>) -> Result<()>) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    f(&mut enc).unwrap();
    enc.into_inner().unwrap()
}

// ========================================================================
// Skalare
// ========================================================================

#[test]
fn scalars_use_compact_forms() {
    assert_eq!(bytes_of(|e| e.write_null()), [b'N']);
    assert_eq!(bytes_of(|e| e.write_bool(true)), [b'T']);
    assert_eq!(bytes_of(|e| e.write_bool(false)), [b'F']);
    assert_eq!(bytes_of(|e| e.write_int(0)), [0x90]);
    assert_eq!(bytes_of(|e| e.write_int(-16)), [0x80]);
    assert_eq!(bytes_of(|e| e.write_int(48)), [0xc8, 0x30]);
    assert_eq!(bytes_of(|e| e.write_int(262_143)), [0xd7, 0xff, 0xff]);
    assert_eq!(bytes_of(|e| e.write_int(262_144)), [b'I', 0x00, 0x04, 0x00, 0x00]);
    assert_eq!(bytes_of(|e| e.write_long(0)), [0xe0]);
    assert_eq!(bytes_of(|e| e.write_long(300)), [0xf9, 0x2c]);
    assert_eq!(bytes_of(|e| e.write_long(1 << 31)), [b'L', 0, 0, 0, 0x80, 0, 0, 0, 0]);
    assert_eq!(bytes_of(|e| e.write_long(1 << 20)), [0x59, 0x00, 0x10, 0x00, 0x00]);
}

#[test]
fn doubles() {
    assert_eq!(bytes_of(|e| e.write_double(0.0)), [0x5b]);
    assert_eq!(bytes_of(|e| e.write_double(1.0)), [0x5c]);
    assert_eq!(bytes_of(|e| e.write_double(-128.0)), [0x5d, 0x80]);
    assert_eq!(bytes_of(|e| e.write_double(32767.0)), [0x5e, 0x7f, 0xff]);
    assert_eq!(bytes_of(|e| e.write_double(12.25)), [0x5f, 0x00, 0x00, 0x2f, 0xda]);
    let neg_zero = bytes_of(|e| e.write_double(-0.0));
    assert_eq!(neg_zero[0], b'D');
    assert_eq!(neg_zero.len(), 9);
}

#[test]
fn dates() {
    // 09:51:31 UTC, 1998-05-08
    assert_eq!(
        bytes_of(|e| e.write_date(894_621_091_000)),
        [0x4a, 0x00, 0x00, 0x00, 0xd0, 0x4b, 0x92, 0x84, 0xb8]
    );
    // 09:51:00 UTC, 1998-05-08
    assert_eq!(
        bytes_of(|e| e.write_date(894_621_060_000)),
        [0x4b, 0x00, 0xe3, 0x83, 0x8f]
    );
}

#[test]
fn strings_and_binaries() {
    assert_eq!(bytes_of(|e| e.write_string("")), [0x00]);
    assert_eq!(bytes_of(|e| e.write_string("hello")), [0x05, b'h', b'e', b'l', b'l', b'o']);
    assert_eq!(bytes_of(|e| e.write_string("\u{00c3}")), [0x01, 0xc3, 0x83]);
    assert_eq!(bytes_of(|e| e.write_bytes(&[])), [0x20]);
    assert_eq!(bytes_of(|e| e.write_bytes(&[1, 2, 3])), [0x23, 1, 2, 3]);

    let long = "x".repeat(40);
    let out = bytes_of(|e| e.write_string(&long));
    assert_eq!(&out[..2], &[0x30, 40]);
}

#[test]
fn small_chunk_size_splits_strings() {
    let config = EncoderConfig::default().with_string_chunk_size(2);
    let mut enc = Encoder::with_config(Vec::new(), config);
    enc.write_string("abcde").unwrap();
    let out = enc.into_inner().unwrap();
    assert_eq!(
        out,
        [b'R', 0, 2, b'a', b'b', b'R', 0, 2, b'c', b'd', 0x01, b'e']
    );
}

#[test]
fn string_units_keep_lone_surrogates() {
    let out = bytes_of(|e| e.write_string_units(&[0xd800]));
    assert_eq!(out, [0x01, 0xed, 0xa0, 0x80]);
}

// ========================================================================
// Container
// ========================================================================

#[test]
fn list_forms() {
    let out = bytes_of(|e| {
        e.write_list_begin(Some(2), Some("[int"))?;
        e.write_int(0)?;
        e.write_int(1)?;
        e.write_list_end()
    });
    assert_eq!(out, [0x72, 0x04, b'[', b'i', b'n', b't', 0x90, 0x91]);

    let out = bytes_of(|e| {
        e.write_list_begin(None, None)?;
        e.write_int(0)?;
        e.write_list_end()
    });
    assert_eq!(out, [0x57, 0x90, b'Z']);

    let out = bytes_of(|e| {
        e.write_list_begin(Some(8), None)?;
        for i in 0..8 {
            e.write_int(i)?;
        }
        e.write_list_end()
    });
    assert_eq!(&out[..2], &[0x58, 0x98]);
    assert_eq!(out.len(), 10);
}

#[test]
fn second_use_of_type_writes_index() {
    let out = bytes_of(|e| {
        e.write_list_begin(Some(0), Some("[int"))?;
        e.write_list_end()?;
        e.write_list_begin(Some(0), Some("[int"))?;
        e.write_list_end()
    });
    assert_eq!(out, [0x70, 0x04, b'[', b'i', b'n', b't', 0x70, 0x90]);
}

#[test]
fn map_forms() {
    let out = bytes_of(|e| {
        e.write_map_begin(None)?;
        e.write_int(1)?;
        e.write_string("fee")?;
        e.write_map_end()
    });
    assert_eq!(out, [b'H', 0x91, 0x03, b'f', b'e', b'e', b'Z']);

    let out = bytes_of(|e| {
        e.write_map_begin(Some("Car"))?;
        e.write_map_end()
    });
    assert_eq!(out, [b'M', 0x03, b'C', b'a', b'r', b'Z']);
}

#[test]
fn object_writes_definition_once() {
    let car = Rc::new(ClassDef::new("Car", ["color", "model"]).unwrap());
    let out = bytes_of(|e| {
        for color in ["red", "blue"] {
            e.write_object_begin(&car)?;
            e.write_string(color)?;
            e.write_string("corvette")?;
            e.write_object_end()?;
        }
        Ok(())
    });
    let mut expected = vec![b'C', 0x03, b'C', b'a', b'r', 0x92];
    expected.extend_from_slice(b"\x05color\x05model");
    expected.extend_from_slice(b"\x60\x03red\x08corvette");
    expected.extend_from_slice(b"\x60\x04blue\x08corvette");
    assert_eq!(out, expected);
}

#[test]
fn seventeenth_class_uses_long_form() {
    let out = bytes_of(|e| {
        for i in 0..17 {
            let class = Rc::new(ClassDef::new(&format!("C{i}"), Vec::<&str>::new())?);
            let id = e.write_object_begin(&class)?;
            assert_eq!(id, i);
            e.write_object_end()?;
        }
        Ok(())
    });
    assert_eq!(&out[out.len() - 2..], &[b'O', 0xa0]);
}

#[test]
fn empty_class_name_rejected() {
    let class = Rc::new(ClassDef::from_parts("".into(), Vec::new()));
    let mut enc = Encoder::new(Vec::new());
    let err = enc.write_object_begin(&class).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}

// ========================================================================
// Rahmenprüfung
// ========================================================================

#[test]
fn fixed_list_overflow_is_state_error() {
    let mut enc = Encoder::new(Vec::new());
    enc.write_list_begin(Some(1), None).unwrap();
    enc.write_int(1).unwrap();
    assert_eq!(enc.write_int(2).unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn incomplete_fixed_list_cannot_end() {
    let mut enc = Encoder::new(Vec::new());
    enc.write_list_begin(Some(2), None).unwrap();
    enc.write_int(1).unwrap();
    assert_eq!(enc.write_list_end().unwrap_err().kind(), ErrorKind::State);
    assert_eq!(enc.depth(), 1);
}

#[test]
fn mismatched_end_is_state_error() {
    let mut enc = Encoder::new(Vec::new());
    enc.write_map_begin(None).unwrap();
    assert!(enc.write_list_end().is_err());
    enc.write_int(1).unwrap();
    assert!(enc.write_map_end().is_err());
    enc.write_int(2).unwrap();
    enc.write_map_end().unwrap();
    assert_eq!(enc.depth(), 0);
}

#[test]
fn object_field_count_enforced() {
    let class = Rc::new(ClassDef::new("P", ["x"]).unwrap());
    let mut enc = Encoder::new(Vec::new());
    enc.write_object_begin(&class).unwrap();
    assert!(enc.write_object_end().is_err());
    enc.write_int(1).unwrap();
    assert!(enc.write_int(2).is_err());
    enc.write_object_end().unwrap();

    let bad = Value::object(Rc::clone(&class), vec![]);
    assert_eq!(enc.write_value(&bad).unwrap_err().kind(), ErrorKind::Argument);
}

#[test]
fn rpc_inside_container_is_state_error() {
    let mut enc = Encoder::new(Vec::new());
    enc.write_list_begin(None, None).unwrap();
    assert_eq!(enc.write_version().unwrap_err().kind(), ErrorKind::State);
    assert_eq!(
        enc.write_streaming_value(&Value::Null).unwrap_err().kind(),
        ErrorKind::State
    );
}

// ========================================================================
// Referenzen
// ========================================================================

#[test]
fn shared_list_becomes_back_reference() {
    let inner = Value::list(vec![]);
    let outer = Value::list(vec![inner.clone(), inner]);
    let out = bytes_of(|e| e.write_value(&outer));
    assert_eq!(out, [0x7a, 0x78, b'Q', 0x91]);
}

#[test]
fn cyclic_list_refers_to_itself() {
    let list = Value::list(vec![]);
    if let Value::List(l) = &list {
        l.borrow_mut().items.push(list.clone());
    }
    let out = bytes_of(|e| e.write_value(&list));
    assert_eq!(out, [0x79, b'Q', 0x90]);
    if let Value::List(l) = &list {
        l.borrow_mut().items.clear();
    }
}

#[test]
fn manual_add_ref_claims_next_container() {
    let v = Value::map(vec![]);
    let mut enc = Encoder::new(Vec::new());
    enc.write_list_begin(None, None).unwrap();
    assert!(!enc.add_ref(&v).unwrap());
    enc.write_map_begin(None).unwrap();
    enc.write_map_end().unwrap();
    assert_eq!(enc.get_ref(&v), Some(1));
    assert!(enc.add_ref(&v).unwrap());
    enc.write_list_end().unwrap();
    let out = enc.into_inner().unwrap();
    assert_eq!(out, [0x57, b'H', b'Z', b'Q', 0x91, b'Z']);
}

#[test]
fn scalar_after_add_ref_is_state_error() {
    let v = Value::list(vec![]);
    let mut enc = Encoder::new(Vec::new());
    enc.add_ref(&v).unwrap();
    assert_eq!(enc.write_int(1).unwrap_err().kind(), ErrorKind::State);
    assert_eq!(enc.add_ref(&v).unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn scalars_are_never_registered() {
    let mut enc = Encoder::new(Vec::new());
    assert!(!enc.add_ref(&Value::Int(3)).unwrap());
    enc.write_int(3).unwrap();
    assert_eq!(enc.get_ref(&Value::Int(3)), None);
}

#[test]
fn remove_and_replace_ref() {
    let a = Value::list(vec![]);
    let b = Value::list(vec![]);
    let mut enc = Encoder::new(Vec::new());
    enc.write_value(&a).unwrap();
    assert!(enc.replace_ref(&a, &b));
    assert_eq!(enc.get_ref(&b), Some(0));
    assert_eq!(enc.get_ref(&a), None);
    assert!(enc.remove_ref(&b));
    assert!(!enc.remove_ref(&b));
}

#[test]
fn failed_container_write_releases_its_id() {
    let list = Value::typed_list("", vec![]);
    let map = Value::map(vec![]);
    let mut enc = Encoder::new(Vec::new());
    assert_eq!(enc.write_value(&list).unwrap_err().kind(), ErrorKind::Argument);
    assert_eq!(enc.get_ref(&list), None);
    {
        let _held = map.as_map().unwrap().borrow_mut();
        assert_eq!(enc.write_value(&map).unwrap_err().kind(), ErrorKind::State);
    }
    assert_eq!(enc.get_ref(&map), None);

    if let Value::List(l) = &list {
        l.borrow_mut().type_name = None;
    }
    enc.write_value(&list).unwrap();
    enc.write_value(&map).unwrap();
    enc.write_value(&list).unwrap();
    assert_eq!(enc.get_ref(&map), Some(1));
    assert_eq!(enc.into_inner().unwrap(), [0x78, b'H', b'Z', b'Q', 0x90]);
}

#[test]
fn write_ref_checks_range() {
    let mut enc = Encoder::new(Vec::new());
    assert_eq!(enc.write_ref(0).unwrap_err().kind(), ErrorKind::Argument);
    enc.write_list_begin(Some(0), None).unwrap();
    enc.write_list_end().unwrap();
    enc.write_ref(0).unwrap();
    assert_eq!(enc.into_inner().unwrap(), [0x78, b'Q', 0x90]);
}

#[test]
fn reset_references_restarts_ids_but_keeps_classes() {
    let class = Rc::new(ClassDef::new("A", Vec::<&str>::new()).unwrap());
    let v = Value::object(Rc::clone(&class), vec![]);
    let mut enc = Encoder::new(Vec::new());
    enc.write_value(&v).unwrap();
    enc.reset_references();
    enc.write_value(&v).unwrap();
    let out = enc.into_inner().unwrap();
    assert_eq!(out, [b'C', 0x01, b'A', 0x90, 0x60, 0x60]);
}

#[test]
fn reset_clears_classes_and_types() {
    let class = Rc::new(ClassDef::new("A", Vec::<&str>::new()).unwrap());
    let mut enc = Encoder::new(Vec::new());
    enc.write_object_begin(&class).unwrap();
    enc.write_object_end().unwrap();
    enc.reset();
    enc.write_object_begin(&class).unwrap();
    enc.write_object_end().unwrap();
    let out = enc.into_inner().unwrap();
    assert_eq!(out, [b'C', 0x01, b'A', 0x90, 0x60, b'C', 0x01, b'A', 0x90, 0x60]);
}

// ========================================================================
// Binär-Streaming
// ========================================================================

#[test]
fn binary_writer_emits_chunks() {
    let config = EncoderConfig::default().with_binary_chunk_size(4);
    let mut enc = Encoder::with_config(Vec::new(), config);
    let mut w = enc.binary_writer().unwrap();
    w.write_all(&[1, 2, 3, 4, 5]).unwrap();
    w.finish().unwrap();
    let out = enc.into_inner().unwrap();
    assert_eq!(out, [b'A', 0, 4, 1, 2, 3, 4, 0x21, 5]);
}

#[test]
fn dropped_binary_writer_still_closes_value() {
    let mut enc = Encoder::new(Vec::new());
    {
        let mut w = enc.binary_writer().unwrap();
        w.write_all(&[9]).unwrap();
    }
    enc.write_null().unwrap();
    assert_eq!(enc.into_inner().unwrap(), [0x21, 9, b'N']);
}

#[test]
fn byte_stream_copies_reader() {
    let config = EncoderConfig::default().with_binary_chunk_size(2);
    let mut enc = Encoder::with_config(Vec::new(), config);
    let n = enc.write_byte_stream(&mut &[1u8, 2, 3][..]).unwrap();
    assert_eq!(n, 3);
    assert_eq!(enc.into_inner().unwrap(), [b'A', 0, 2, 1, 2, 0x21, 3]);
}

#[test]
fn byte_stream_of_exact_chunk_multiple_ends_with_empty_chunk() {
    let config = EncoderConfig::default().with_binary_chunk_size(2);
    let mut enc = Encoder::with_config(Vec::new(), config);
    enc.write_byte_stream(&mut &[1u8, 2][..]).unwrap();
    assert_eq!(enc.into_inner().unwrap(), [b'A', 0, 2, 1, 2, 0x20]);
}

// ========================================================================
// RPC und Pakete
// ========================================================================

#[test]
fn call_wire_form() {
    let out = bytes_of(|e| e.call("add2", &[Value::Int(2), Value::Int(3)]));
    assert_eq!(
        out,
        [b'H', 0x02, 0x00, b'C', 0x04, b'a', b'd', b'd', b'2', 0x92, 0x92, 0x93]
    );
}

#[test]
fn reply_wire_form() {
    let out = bytes_of(|e| e.write_reply(&Value::Int(5)));
    assert_eq!(out, [b'H', 0x02, 0x00, b'R', 0x95]);
}

#[test]
fn fault_wire_form() {
    let out = bytes_of(|e| e.write_fault(&Fault::new("E", "m")));
    let mut expected = vec![b'H', 0x02, 0x00, b'F', b'H'];
    expected.extend_from_slice(b"\x04code\x01E\x07message\x01mZ");
    assert_eq!(out, expected);
}

#[test]
fn empty_method_rejected() {
    let mut enc = Encoder::new(Vec::new());
    assert_eq!(enc.start_call("", 0).unwrap_err().kind(), ErrorKind::Argument);
}

#[test]
fn envelope_and_message_framing() {
    let out = bytes_of(|e| {
        e.start_envelope("Identity")?;
        e.write_int(0)?;
        e.complete_envelope()?;
        e.start_message()?;
        e.write_null()?;
        e.complete_message()
    });
    let mut expected = vec![b'E', 0x08];
    expected.extend_from_slice(b"Identity");
    expected.extend_from_slice(&[0x90, b'Z', b'p', 0x02, 0x00, b'N', b'Z']);
    assert_eq!(out, expected);
}

#[test]
fn streaming_value_is_packet_framed() {
    let out = bytes_of(|e| e.write_streaming_value(&Value::Int(1)));
    assert_eq!(out, [0x80, 0x01, 0x91, 0x80, 0x00]);
}

#[test]
fn streaming_values_restart_references() {
    let shared = Value::list(vec![]);
    let mut enc = Encoder::new(Vec::new());
    enc.write_streaming_value(&shared).unwrap();
    enc.write_streaming_value(&shared).unwrap();
    let out = enc.into_inner().unwrap();
    assert_eq!(out, [0x80, 0x01, 0x78, 0x80, 0x00, 0x80, 0x01, 0x78, 0x80, 0x00]);
}

// ========================================================================
// Serialize
// ========================================================================

#[test]
fn serialize_native_types() {
    let out = bytes_of(|e| e.serialize(&vec![Some(1i64), None]));
    assert_eq!(out, [0x7a, 0xe1, b'N']);
    let mut enc = Encoder::new(Vec::new());
    assert_eq!(enc.serialize(&u64::MAX).unwrap_err().kind(), ErrorKind::Argument);
}
