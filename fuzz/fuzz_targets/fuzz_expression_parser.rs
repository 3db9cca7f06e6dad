#![no_main]

use bindery_binding::{Context, Expression, find_ext_attrs};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(expression) = Expression::parse(source) else {
        assert!(find_ext_attrs(source).is_err());
        return;
    };

    let refs = find_ext_attrs(source).expect("parsed source has references");
    for path in &refs {
        assert!(path.contains('.'), "{path:?} is not dotted");
    }
    let mut seen = refs.clone();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), refs.len(), "duplicate references in {refs:?}");

    // Evaluation may fail, but never panics.
    let _ = expression.eval(&Context::new());
});
