#![no_main]
use libfuzzer_sys::fuzz_target;
use mathguard_engine::{KatexEngine, RenderEngine, RenderOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(math) = std::str::from_utf8(data) {
        // Any verdict is fine; rendering must not panic or overflow the stack.
        let inline = KatexEngine.render(math, &RenderOptions::inline());
        let display = KatexEngine.render(math, &RenderOptions::display());
        if let Err(error) = inline.and(display) {
            assert!(!error.message.is_empty());
        }
    }
});
