#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Beliebige Bytes dürfen nur Fehler liefern, nie paniken.
    let _ = hessian2::decode_all(data);
    let mut dec = hessian2::Decoder::new(data);
    let _ = dec.read_call();
});
