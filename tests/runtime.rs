//! Runtime behaviour: errors, the dry pass, input and run control

use pretty_assertions::assert_eq;
use respawn::host::{BufferedHost, Session};
use respawn::interpreter::RuntimeError;
use respawn::pipeline::{self, PipelineError};

fn runtime_error(source: &str, host: &mut BufferedHost) -> RuntimeError {
    match pipeline::execute(source, host) {
        Err(PipelineError::Runtime(err)) => err,
        Err(other) => panic!("expected a runtime error, got:\n{}", other.render(source)),
        Ok(()) => panic!("program ran to completion"),
    }
}

#[test]
fn test_array_bounds() {
    let ok = "hp a[3]: [1, 2, 3]\nplay() {\n\ta[2]: 9\n\tshootNxt(a[2])\n}";
    let mut host = BufferedHost::new();
    pipeline::execute(ok, &mut host).unwrap();
    assert_eq!(host.output(), "9\n");

    let source = "hp a[3]: [1, 2, 3]\nplay() {\n\tshootNxt(\"before\")\n\ta[3]: 1\n}";
    let mut host = BufferedHost::new();
    let err = runtime_error(source, &mut host);
    assert!(matches!(err, RuntimeError::IndexOutOfBounds { index: 3, len: 3, .. }));
    assert_eq!(err.span().start.line, 4);
    // the dry pass stops the run before anything is printed
    assert_eq!(host.output(), "");
}

#[test]
fn test_negative_index_is_out_of_bounds() {
    let source = "hp a[]: [1]\nhp i: -1\nplay() {\n\tshootNxt(a[i])\n}";
    let err = runtime_error(source, &mut BufferedHost::new());
    assert!(matches!(err, RuntimeError::IndexOutOfBounds { index: -1, .. }));
}

#[test]
fn test_division_and_modulo_by_zero() {
    let cases = [
        "play() {\n\thp z: 0\n\tshootNxt(5 / z)\n}",
        "play() {\n\txp z: 0.0\n\tshootNxt(5.0 / z)\n}",
    ];
    for source in cases {
        let err = runtime_error(source, &mut BufferedHost::new());
        assert!(matches!(err, RuntimeError::DivisionByZero { .. }), "{}", source);
    }

    let source = "play() {\n\thp z: 0\n\tshootNxt(5 % z)\n}";
    let err = runtime_error(source, &mut BufferedHost::new());
    assert!(matches!(err, RuntimeError::ModuloByZero { .. }));
}

#[test]
fn test_hp_overflow_is_an_error() {
    let source = "hp big: 3037000500\nplay() {\n\tshootNxt(big * big)\n}";
    let err = runtime_error(source, &mut BufferedHost::new());
    assert!(matches!(err, RuntimeError::Overflow { .. }));
}

#[test]
fn test_drop_from_empty_array() {
    let source = "hp a[]: [1]\nplay() {\n\thp x: a.drop()\n\thp y: a.drop()\n}";
    let err = runtime_error(source, &mut BufferedHost::new());
    assert!(matches!(err, RuntimeError::EmptyArray { ref name, .. } if name == "a"));
}

#[test]
fn test_dead_global_is_not_revived_by_assignment() {
    let source = "hp g: dead\nset() {\n\tg: 1\n}\nplay() {\n\tset()\n}";
    let mut host = BufferedHost::new();
    let err = runtime_error(source, &mut host);
    assert!(matches!(err, RuntimeError::DeadValue { ref message, .. } if message.contains("redeclare")));
    assert_eq!(err.span().start.line, 3);
}

#[test]
fn test_immutable_bindings_are_rejected_before_running() {
    let source = "immo hp k: 10\nplay() {\n\tk: 5\n}";
    let err = pipeline::parse(source).unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
}

#[test]
fn test_multi_value_recall_needs_matching_targets() {
    let single = "pair() {\n\trecall 1, 2\n}\nplay() {\n\thp q: pair()\n}";
    assert!(matches!(
        pipeline::parse(single),
        Err(PipelineError::Parse(_))
    ));

    let batch = "pair() {\n\trecall 1, 2\n}\nplay() {\n\thp q, r: pair()\n\tshootNxt(q + r)\n}";
    let mut host = BufferedHost::new();
    pipeline::execute(batch, &mut host).unwrap();
    assert_eq!(host.output(), "3\n");
}

#[test]
fn test_live_input() {
    let source = r#"
play() {
	comms name: load("Name?")
	hp lives: loadNum("Lives?")
	shootNxt(name + " has " + toComms(lives * 2))
}
"#;
    let mut host = BufferedHost::with_inputs(["Ana", " 4 "]);
    pipeline::execute(source, &mut host).unwrap();
    assert_eq!(host.output(), "Ana has 8\n");
    // only the live pass asks
    assert_eq!(host.prompts(), ["Name?", "Lives?"]);
}

#[test]
fn test_decimal_input_into_xp() {
    let source = "play() {\n\txp speed: loadNum(\"Speed?\")\n\tshootNxt(speed * 2)\n}";
    let mut host = BufferedHost::with_inputs(["1.25"]);
    pipeline::execute(source, &mut host).unwrap();
    assert_eq!(host.output(), "2.5\n");
}

#[test]
fn test_bad_number_input() {
    let source = "play() {\n\thp n: loadNum(\"n?\")\n}";
    let mut host = BufferedHost::with_inputs(["many"]);
    let err = runtime_error(source, &mut host);
    assert!(matches!(err, RuntimeError::InvalidNumber { ref input, .. } if input == "many"));
}

#[test]
fn test_input_dependent_error_surfaces_in_live_pass() {
    let source = r#"
play() {
	hp d: loadNum("Divisor?")
	shootNxt("start")
	shootNxt(10 / d)
}
"#;
    let mut host = BufferedHost::with_inputs(["0"]);
    let err = runtime_error(source, &mut host);
    assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
    assert_eq!(host.output(), "start\n");
}

#[test]
fn test_dry_pass_bounds_unbounded_loops() {
    // the loop only ends on live input
    let source = r#"
play() {
	hp n: loadNum("Rounds?")
	hp i: 0
	while i != n {
		i += 1
	}
	shootNxt(i)
}
"#;
    let mut host = BufferedHost::with_inputs(["3"]);
    pipeline::execute(source, &mut host).unwrap();
    assert_eq!(host.output(), "3\n");
}

#[test]
fn test_long_deterministic_loop_is_left_to_the_live_pass() {
    let source = r#"
hp a[]: []
play() {
	for i: 0, i < 1500, i += 1 {
		a.join(i)
	}
	shootNxt(a[1200])
	shootNxt(rounds(a))
}
"#;
    let mut host = BufferedHost::new();
    pipeline::execute(source, &mut host).unwrap();
    assert_eq!(host.output(), "1200\n1500\n");
}

#[test]
fn test_closed_input_is_a_host_error() {
    let source = "play() {\n\tcomms s: load(\"?\")\n}";
    let err = runtime_error(source, &mut BufferedHost::new());
    assert!(matches!(err, RuntimeError::Host { .. }));
}

#[test]
fn test_stale_token_cancels_input_wait() {
    let source = "play() {\n\tshootNxt(\"hi\")\n\tcomms s: load(\"?\")\n}";
    let program = pipeline::parse(source).unwrap();
    let session = Session::new();
    let stale = session.begin_run();
    session.begin_run();

    let mut host = BufferedHost::with_inputs(["unused"]);
    let err = pipeline::run(&program, &mut host, Some(stale)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::Cancelled { .. })
    ));
    assert_eq!(host.output(), "hi\n");
}

#[test]
fn test_stale_token_stops_a_busy_loop() {
    let source = "play() {\n\thp n: 0\n\twhile true {\n\t\tn += 1\n\t}\n}";
    let program = pipeline::parse(source).unwrap();
    let session = Session::new();
    let stale = session.begin_run();
    session.begin_run();

    let err = pipeline::run(&program, &mut BufferedHost::new(), Some(stale)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::Cancelled { .. })
    ));
}

#[test]
fn test_runtime_report_points_at_source() {
    let source = "play() {\n\thp z: 0\n\thp x: 4 / z\n}";
    let mut host = BufferedHost::new();
    let err = pipeline::execute(source, &mut host).unwrap_err();
    let report = err.render(source);
    assert!(report.starts_with("Runtime Error: division by zero at line 3"));
    assert!(report.contains("3 |     hp x: 4 / z"));
}
