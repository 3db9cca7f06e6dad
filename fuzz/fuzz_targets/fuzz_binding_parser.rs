#![no_main]

use bindery_binding::Binding;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(binding) = source.parse::<Binding>() else {
        return;
    };

    // A parsed binding prints back to source that parses to the same binding.
    let printed = binding.to_string();
    let reparsed: Binding = printed
        .parse()
        .unwrap_or_else(|err| panic!("{printed:?} failed to reparse: {err}"));
    assert_eq!(binding, reparsed);
    assert!(!binding.left().is_empty());
    assert!(!binding.right().is_empty());
});
