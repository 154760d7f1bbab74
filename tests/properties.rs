use proptest::prelude::*;
use vibescript::execute;

fn single_number(output: &[String]) -> f64 {
    assert_eq!(output.len(), 1, "{:?}", output);
    output[0].parse().unwrap_or_else(|_| panic!("not a number: {}", output[0]))
}

proptest! {
    #[test]
    fn division_round_trips(a in -1_000_000i32..1_000_000, b in -1000i32..1000) {
        prop_assume!(b != 0);
        let output = execute(&format!("say {} / {} * {}", a, b, b));
        let value = single_number(&output);
        prop_assert!((value - a as f64).abs() < 1e-6, "{} / {} * {} gave {}", a, b, b, value);
    }

    #[test]
    fn division_and_modulo_by_zero_fail(a in -1000i32..1000) {
        let a = a.abs();
        for op in ["/", "%"] {
            let output = execute(&format!("say {} {} 0", a, op));
            prop_assert_eq!(output.len(), 1);
            prop_assert!(output[0].contains("division by zero"), "{}", output[0]);
        }
    }

    #[test]
    fn push_appends_and_pop_removes(items in prop::collection::vec(0u16..1000, 0..20), extra in 0u16..1000) {
        let literal = items.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
        let source = format!(
            "hold xs = [{literal}]\n\
             push(xs, {extra})\n\
             say size(xs)\n\
             say xs[size(xs) - 1]\n\
             pop(xs)\n\
             say size(xs)\n\
             say xs"
        );
        let output = execute(&source);
        prop_assert_eq!(output, vec![
            (items.len() + 1).to_string(),
            extra.to_string(),
            items.len().to_string(),
            format!("[{}]", literal),
        ]);
    }

    #[test]
    fn stringify_is_stable(items in prop::collection::vec("[a-z]{0,6}", 0..8)) {
        let literal = items.iter().map(|s| format!("\"{}\"", s)).collect::<Vec<_>>().join(", ");
        let output = execute(&format!("hold xs = [{literal}]\nsay xs\nsay xs\nsay str(xs) == str(xs)"));
        prop_assert_eq!(&output[0], &output[1]);
        prop_assert_eq!(&output[0], &format!("[{}]", items.join(", ")));
        prop_assert_eq!(&output[2], "bet");
    }

    #[test]
    fn shadowing_never_touches_outer(outer in 0u32..1000, inner in 0u32..1000) {
        let source = format!(
            "hold x = {outer}\n{{ hold x = {inner}\n x = x + 1 }}\nsay x"
        );
        prop_assert_eq!(execute(&source), vec![outer.to_string()]);
    }

    #[test]
    fn hold_is_reassignable_and_lock_is_not(first in 0u32..1000, second in 0u32..1000) {
        let held = execute(&format!("hold v = {first}\n{{ v = {second} }}\nsay v"));
        prop_assert_eq!(held, vec![second.to_string()]);

        let locked = execute(&format!("lock v = {first}\nsay v\nv = {second}"));
        prop_assert_eq!(locked.len(), 2);
        prop_assert_eq!(&locked[0], &first.to_string());
        prop_assert!(locked[1].contains("cannot reassign constant 'v'"));
    }
}
