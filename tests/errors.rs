use pretty_assertions::assert_eq;
use vibescript::{execute, parse, parse_all, ErrorKind, Interpreter, Phase, Silent};

fn last_line(source: &str) -> String {
    execute(source).pop().unwrap_or_default()
}

#[test]
fn test_undefined_variable_diagnostic() {
    assert_eq!(
        execute("say nope"),
        ["[line 1:5] RuntimeError: undefined variable 'nope'"]
    );
}

#[test]
fn test_partial_output_preserved() {
    let output = execute("say 1\nsay 2\nsay 1 / 0\nsay 4");
    assert_eq!(output.len(), 3);
    assert_eq!(&output[..2], ["1", "2"]);
    assert!(output[2].starts_with("[line 3:"), "{}", output[2]);
    assert!(output[2].contains("division by zero"));
}

#[test]
fn test_constant_reassignment() {
    let line = last_line("lock x = 1\nx = 2");
    assert!(line.contains("cannot reassign constant 'x'"), "{}", line);

    let nested = last_line("lock x = 1\nskill f() { x = 3 }\nf()");
    assert!(nested.contains("cannot reassign constant 'x'"), "{}", nested);
}

#[test]
fn test_runtime_type_errors() {
    assert!(last_line("say [1] + 1").contains("cannot add array and number"));
    assert!(last_line("say null + null").contains("cannot add null and null"));
    assert!(last_line("say 1 < \"2\"").contains("operand must be a number for '<'"));
    assert!(last_line("say 4 % 0").contains("division by zero"));
}

#[test]
fn test_call_errors() {
    let not_callable = last_line("hold x = 5\nx()");
    assert!(not_callable.contains("number is not callable"), "{}", not_callable);

    let arity = last_line("skill f(a, b) { give a }\nf(1)");
    assert!(
        arity.contains("wrong arity: expected 2 arguments but got 1"),
        "{}",
        arity
    );
}

#[test]
fn test_iteration_errors() {
    assert!(last_line("each (x in 5) say x").contains("cannot iterate over number"));
    assert!(last_line("each (i from \"a\" to 3) say i").contains("range bounds must be numbers"));
}

#[test]
fn test_lex_errors() {
    let line = last_line("say @");
    assert!(line.contains("LexError"), "{}", line);
    assert!(line.contains("unexpected character '@'"), "{}", line);

    let line = last_line("say \"open");
    assert!(line.contains("unterminated string"), "{}", line);
}

#[test]
fn test_parse_error_stops_before_running() {
    let output = execute("say 1\nhold = 2");
    assert_eq!(output.len(), 1);
    assert!(output[0].contains("ParseError"), "{}", output[0]);
}

#[test]
fn test_parse_all_collects_every_error() {
    let errors = parse_all("hold = 1;\nsay (2;\nlock z 3;\nsay 4").unwrap_err();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.phase() == Phase::Parse));
    let lines: Vec<usize> = errors.iter().filter_map(|e| e.span.map(|s| s.line)).collect();
    assert_eq!(lines, [1, 2, 3]);
}

#[test]
fn test_parse_all_reports_lex_error_alone() {
    let errors = parse_all("say 1\nsay #").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::UnexpectedCharacter('#'));
}

#[test]
fn test_error_with_source_excerpt() {
    let source = "hold x = 1\nsay x + nope";
    let program = parse(source).unwrap();
    let mut interpreter = Interpreter::with_io(Silent, Silent);
    let err = interpreter.run(&program).unwrap_err().with_source(source);

    assert_eq!(
        err.to_string(),
        format!(
            "[line 2:9] RuntimeError: undefined variable 'nope'\n  | say x + nope\n  | {}^",
            " ".repeat(8)
        )
    );
}

#[test]
fn test_signals_outside_construct_are_errors() {
    assert!(last_line("stop").contains("'stop' outside of loop"));
    assert!(last_line("skip").contains("'skip' outside of loop"));
    assert!(last_line("give 5").contains("'give' outside of skill"));
    assert!(last_line("skill f() { skip }\nf()").contains("'skip' outside of loop"));
}

#[test]
fn test_infinite_loop_detected() {
    let output = execute("say \"start\"\nkeep (bet) { }\nsay \"never\"");
    assert_eq!(output.len(), 2);
    assert_eq!(output[0], "start");
    assert!(output[1].contains("possible infinite loop"), "{}", output[1]);
}

#[test]
fn test_infinite_loop_escapes_try() {
    let output = execute("try { keep (bet) { } } caught { say \"retrying\" }");
    assert_eq!(output.len(), 1);
    assert!(output[0].contains("possible infinite loop"), "{}", output[0]);
}

#[test]
fn test_unbounded_recursion() {
    let line = last_line("skill loop(n) { give loop(n) }\nloop(1)");
    assert!(line.contains("stack overflow"), "{}", line);
}

#[test]
fn test_deep_nesting_is_a_parse_error() {
    let source = format!("say {}1", "(".repeat(20_000));
    let output = execute(&source);
    assert_eq!(output.len(), 1);
    assert!(output[0].contains("ParseError"), "{}", output[0]);
    assert!(output[0].contains("nesting too deep"), "{}", output[0]);

    let blocks = format!("{}say 1{}", "{".repeat(5_000), "}".repeat(5_000));
    assert!(last_line(&blocks).contains("nesting too deep"));
}
