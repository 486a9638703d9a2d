#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Hessian -> JSON -> Hessian
    if let Ok(value) = hessian2::decode(data) {
        let json = hessian2::json::to_json(&value);
        let _ = hessian2::json::from_json(&json).and_then(|v| hessian2::encode(&v));
    }
});
