#![forbid(unsafe_code)]

//! Static extraction of dotted references.
//!
//! A pull binding listens on every external attribute its expression names.
//! The names are found syntactically: each maximal `name.attr[.attr..]` chain
//! is one reference, and a call contributes the chain that names the callee
//! (`handler.func(10)` references `handler.func`) plus whatever its arguments
//! reference. Nothing is evaluated.

use ahash::AHashSet;
use bindery_core::Result;

use super::ast::Expr;
use super::parser::parse;

/// Dotted references in `expr`, deduplicated, in order of first occurrence.
#[must_use]
pub fn references(expr: &Expr) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = AHashSet::new();
    collect(expr, &mut |path| {
        if seen.insert(path.clone()) {
            out.push(path);
        }
    });
    out
}

/// Parse `source` and return its dotted references.
///
/// ```
/// use bindery_binding::expr::find_ext_attrs;
///
/// let refs = find_ext_attrs("object.foo + handler.func(10)").unwrap();
/// assert_eq!(refs, ["object.foo", "handler.func"]);
/// ```
pub fn find_ext_attrs(source: &str) -> Result<Vec<String>> {
    parse(source).map(|expr| references(&expr))
}

fn collect(expr: &Expr, emit: &mut dyn FnMut(String)) {
    match expr {
        Expr::Literal(_) | Expr::Name(_) => {}
        Expr::Attr { object, .. } => match expr.dotted_path() {
            Some(path) => emit(path),
            None => collect(object, emit),
        },
        Expr::Call { func, args } => {
            collect(func, emit);
            for arg in args {
                collect(arg, emit);
            }
        }
        Expr::Index { object, index } => {
            collect(object, emit);
            collect(index, emit);
        }
        Expr::Unary { operand, .. } => collect(operand, emit),
        Expr::Binary { left, right, .. } => {
            collect(left, emit);
            collect(right, emit);
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            collect(then, emit);
            collect(condition, emit);
            collect(otherwise, emit);
        }
        Expr::Tuple(items) => {
            for item in items {
                collect(item, emit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::names::is_keyword;
    use proptest::prelude::*;

    #[test]
    fn calls_contribute_the_callee_chain() {
        assert_eq!(
            find_ext_attrs("object.foo + handler.func(10)").unwrap(),
            ["object.foo", "handler.func"]
        );
    }

    #[test]
    fn chains_are_kept_whole() {
        assert_eq!(find_ext_attrs("a.b.c * 2").unwrap(), ["a.b.c"]);
    }

    #[test]
    fn arguments_and_call_results() {
        assert_eq!(
            find_ext_attrs("fmt(model.x, other.y).upper").unwrap(),
            ["model.x", "other.y"]
        );
        assert_eq!(find_ext_attrs("str(m.count)").unwrap(), ["m.count"]);
    }

    #[test]
    fn bare_names_and_strings_are_not_references() {
        assert!(find_ext_attrs("x + 1").unwrap().is_empty());
        assert!(find_ext_attrs("'object.foo'").unwrap().is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(
            find_ext_attrs("m.a + m.b * m.a").unwrap(),
            ["m.a", "m.b"]
        );
    }

    #[test]
    fn conditional_lists_branches_in_source_order() {
        assert_eq!(
            find_ext_attrs("m.on if m.enabled else m.off").unwrap(),
            ["m.on", "m.enabled", "m.off"]
        );
    }

    fn ident() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_]{0,6}".prop_filter("reserved word", |s| !is_keyword(s))
    }

    proptest! {
        #[test]
        fn simple_reference_is_its_own_reference(a in ident(), b in ident()) {
            let source = format!("{a}.{b}");
            prop_assert_eq!(find_ext_attrs(&source).unwrap(), vec![source.clone()]);
        }

        #[test]
        fn sum_of_attribute_and_call(
            a in ident(), b in ident(), c in ident(), d in ident(), n in 0i64..1000,
        ) {
            let source = format!("{a}.{b} + {c}.{d}({n})");
            let mut expected = vec![format!("{a}.{b}")];
            if (c.as_str(), d.as_str()) != (a.as_str(), b.as_str()) {
                expected.push(format!("{c}.{d}"));
            }
            prop_assert_eq!(find_ext_attrs(&source).unwrap(), expected);
        }

        #[test]
        fn every_reference_appears_in_the_source(
            names in proptest::collection::vec((ident(), ident()), 1..5),
        ) {
            let source = names
                .iter()
                .map(|(obj, attr)| format!("{obj}.{attr}"))
                .collect::<Vec<_>>()
                .join(" - ");
            for reference in find_ext_attrs(&source).unwrap() {
                prop_assert!(source.contains(&reference));
            }
        }
    }
}
