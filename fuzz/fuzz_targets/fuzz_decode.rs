// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use formseal::codec::StateEncoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // decode must reject garbage without panicking, and anything it accepts
    // must be exactly the canonical encoding
    if let Ok(state) = StateEncoder::decode(data) {
        assert_eq!(StateEncoder::encode(&state), data);
    }
});
