// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use formseal::codec::cipher::CipherCodec;
use formseal::codec::hash::HashCodec;
use formseal::codec::memory::MemoryCodec;
use formseal::codec::{StateCodec, Submission};
use formseal::engine_core::crypto::KeyRing;
use formseal::{KeyScope, SessionState, Token};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // no token string may open, and none may panic
    let session = SessionState::new(2, KeyScope::Process);
    let token = Token::new(data);
    let submission = Submission::token_only(&session);

    assert!(MemoryCodec::new().open_token(&token, &submission).is_err());
    assert!(CipherCodec::new(KeyRing::generate(), 4000)
        .open_token(&token, &submission)
        .is_err());
    assert!(HashCodec::new(KeyRing::generate(), 4000)
        .open_token(&token, &submission)
        .is_err());
});
