#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Was dekodiert und sich wieder kodieren lässt, muss identisch zurückkommen.
    let Ok(values) = hessian2::decode_all(data) else {
        return;
    };
    let mut enc = hessian2::Encoder::new(Vec::new());
    if values.iter().any(|v| enc.write_value(v).is_err()) {
        return;
    }
    let bytes = enc.into_inner().expect("flush into Vec");
    let back = hessian2::decode_all(&bytes).expect("decode re-encoded");
    assert_eq!(values, back);
});
