//! Fuzz target for body decoding.
//!
//! This tests that `decode_source` and `maybe_decompress` never panic
//! on arbitrary input.

#![no_main]

use doc_synchronizer::event::{maybe_decompress, WriteEvent, WriteKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = maybe_decompress(data);

    let event = WriteEvent::new(WriteKind::Index, "doc", "1", 1, data.to_vec());
    // Either a document or a decode error, never a panic
    let _ = event.decode_source();
});
