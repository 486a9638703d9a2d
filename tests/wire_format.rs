//! Byte-exact fixtures of the Hessian 2.0 grammar.

use hessian2::encoder::Encoder;
use hessian2::{decode, encode, ClassDef, Value};
use std::rc::Rc;

/// Kodiert `value` und prüft Bytes und Rückweg.
fn check(value: Value, expected: &[u8]) {
    let bytes = encode(&value).unwrap();
    assert_eq!(bytes, expected, "encoding {value:?}");
    assert_eq!(decode(expected).unwrap(), value, "decoding {expected:02x?}");
}

fn prefixed(header: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = header.to_vec();
    out.extend_from_slice(body);
    out
}

#[test]
fn null_and_booleans() {
    check(Value::Null, b"N");
    check(Value::Bool(true), b"T");
    check(Value::Bool(false), b"F");
}

#[test]
fn int_forms() {
    check(Value::Int(0), &[0x90]);
    check(Value::Int(-16), &[0x80]);
    check(Value::Int(47), &[0xbf]);
    check(Value::Int(-2048), &[0xc0, 0x00]);
    check(Value::Int(-256), &[0xc7, 0x00]);
    check(Value::Int(2047), &[0xcf, 0xff]);
    check(Value::Int(-262_144), &[0xd0, 0x00, 0x00]);
    check(Value::Int(262_143), &[0xd7, 0xff, 0xff]);
    check(Value::Int(i32::MAX), &[b'I', 0x7f, 0xff, 0xff, 0xff]);
}

#[test]
fn long_forms() {
    check(Value::Long(0), &[0xe0]);
    check(Value::Long(-8), &[0xd8]);
    check(Value::Long(15), &[0xef]);
    check(Value::Long(-2048), &[0xf0, 0x00]);
    check(Value::Long(2047), &[0xff, 0xff]);
    check(Value::Long(-262_144), &[0x38, 0x00, 0x00]);
    check(Value::Long(262_143), &[0x3f, 0xff, 0xff]);
    check(Value::Long(300_000), &[0x59, 0x00, 0x04, 0x93, 0xe0]);
    check(
        Value::Long(1 << 40),
        &[b'L', 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
}

#[test]
fn double_forms() {
    check(Value::Double(0.0), &[0x5b]);
    check(Value::Double(1.0), &[0x5c]);
    check(Value::Double(-128.0), &[0x5d, 0x80]);
    check(Value::Double(127.0), &[0x5d, 0x7f]);
    check(Value::Double(-32768.0), &[0x5e, 0x80, 0x00]);
    check(Value::Double(12.25), &[0x5f, 0x00, 0x00, 0x2f, 0xda]);
    check(
        Value::Double(12.25e10),
        &[b'D', 0x42, 0x3c, 0x85, 0x91, 0xa9, 0x00, 0x00, 0x00],
    );
}

#[test]
fn date_forms() {
    check(
        Value::Date(894_621_091_000),
        &[0x4a, 0x00, 0x00, 0x00, 0xd0, 0x4b, 0x92, 0x84, 0xb8],
    );
    check(Value::Date(894_621_060_000), &[0x4b, 0x00, 0xe3, 0x83, 0x8f]);
}

#[test]
fn string_forms() {
    check(Value::from(""), &[0x00]);
    check(Value::from("hello"), b"\x05hello");
    check(Value::from("\u{0080}"), &[0x01, 0xc2, 0x80]);
    check(Value::from("\u{4e2d}"), &[0x01, 0xe4, 0xb8, 0xad]);

    let s = "a".repeat(32);
    let mut expected = vec![0x30, 0x20];
    expected.extend_from_slice(s.as_bytes());
    check(Value::from(s.as_str()), &expected);

    let s = "a".repeat(1024);
    let mut expected = vec![b'S', 0x04, 0x00];
    expected.extend_from_slice(s.as_bytes());
    check(Value::from(s.as_str()), &expected);
}

#[test]
fn binary_forms() {
    check(Value::Binary(vec![]), &[0x20]);
    check(Value::Binary(vec![0xff; 15]), &prefixed(&[0x2f], &[0xff; 15]));
    check(Value::Binary(vec![0; 16]), &prefixed(&[0x34, 0x10], &[0; 16]));
    check(Value::Binary(vec![1; 1024]), &prefixed(&[b'B', 0x04, 0x00], &[1; 1024]));
}

#[test]
fn list_forms() {
    check(Value::list(vec![]), &[0x78]);
    check(
        Value::typed_list("[int", vec![Value::Int(0), Value::Int(1)]),
        &[0x72, 0x04, b'[', b'i', b'n', b't', 0x90, 0x91],
    );
    let eight: Vec<Value> = (0..8).map(Value::Int).collect();
    let mut expected = vec![0x58, 0x98];
    expected.extend(0x90..0x98);
    check(Value::list(eight.clone()), &expected);

    let mut expected = vec![b'V', 0x04, b'[', b'i', b'n', b't', 0x98];
    expected.extend(0x90..0x98);
    check(Value::typed_list("[int", eight), &expected);
}

#[test]
fn variable_lists_decode() {
    assert_eq!(
        decode(&[0x55, 0x04, b'[', b'i', b'n', b't', 0x90, 0x91, b'Z']).unwrap(),
        Value::typed_list("[int", vec![Value::Int(0), Value::Int(1)])
    );
    assert_eq!(
        decode(&[0x57, 0x90, 0x91, b'Z']).unwrap(),
        Value::list(vec![Value::Int(0), Value::Int(1)])
    );
}

#[test]
fn map_forms() {
    check(
        Value::map(vec![
            (Value::Int(1), "fee".into()),
            (Value::Int(16), "fie".into()),
            (Value::Int(256), "foe".into()),
        ]),
        b"H\x91\x03fee\xa0\x03fie\xc9\x00\x03foeZ",
    );
    check(
        Value::typed_map("com.caucho.test.Car", vec![("color".into(), "red".into())]),
        b"M\x13com.caucho.test.Car\x05color\x03redZ",
    );
}

#[test]
fn object_forms() {
    let car = Rc::new(ClassDef::new("example.Car", ["color", "model"]).unwrap());
    let v = Value::list(vec![
        Value::object(Rc::clone(&car), vec!["red".into(), "corvette".into()]),
        Value::object(car, vec!["green".into(), "civic".into()]),
    ]);
    let mut expected = vec![0x7a];
    expected.extend_from_slice(b"C\x0bexample.Car\x92\x05color\x05model");
    expected.extend_from_slice(b"\x60\x03red\x08corvette");
    expected.extend_from_slice(b"\x60\x05green\x05civic");
    check(v, &expected);
}

#[test]
fn object_long_form_decodes() {
    let bytes = b"C\x01A\x91\x01xO\x90\x91";
    let v = decode(bytes).unwrap();
    assert_eq!(v.as_object().unwrap().borrow().get("x"), Some(&Value::Int(1)));
}

#[test]
fn back_reference_form() {
    let shared = Value::list(vec![]);
    check(Value::list(vec![shared.clone(), shared]), &[0x7a, 0x78, b'Q', 0x91]);
}

#[test]
fn chunked_binary_decodes() {
    let bytes = [b'A', 0x00, 0x02, 1, 2, b'A', 0x00, 0x01, 3, 0x21, 4];
    assert_eq!(decode(&bytes).unwrap(), Value::Binary(vec![1, 2, 3, 4]));
}

#[test]
fn chunked_string_with_long_final_chunk() {
    let bytes = [b'R', 0x00, 0x01, b'a', b'S', 0x00, 0x01, b'b'];
    assert_eq!(decode(&bytes).unwrap(), Value::from("ab"));
}

#[test]
fn packet_headers() {
    let mut enc = Encoder::new(Vec::new());
    enc.write_streaming_value(&Value::from("a".repeat(200).as_str())).unwrap();
    let out = enc.into_inner().unwrap();
    // 202 Payload-Bytes: 0x80, dann 1|0000001, 0|1001010
    assert_eq!(&out[..3], &[0x80, 0x81, 0x4a]);
    assert_eq!(&out[out.len() - 2..], &[0x80, 0x00]);
    assert_eq!(out.len(), 3 + 202 + 2);

    // Leser akzeptiert führende Nullgruppen
    let bytes = [0x80, 0x80, 0x01, 0x91, 0x80, 0x00];
    assert_eq!(hessian2::decode_packets(&bytes).unwrap(), [Value::Int(1)]);
}
