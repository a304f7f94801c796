//! End-to-end language tests
//!
//! Each test runs a whole program through the public pipeline against a
//! `BufferedHost` and checks what it printed.

use pretty_assertions::assert_eq;
use respawn::host::BufferedHost;
use respawn::parser::token::tokens_to_source;
use respawn::pipeline::{self, PipelineError};

/// Run `source` with no input and return its output
fn run(source: &str) -> String {
    let mut host = BufferedHost::new();
    if let Err(err) = pipeline::execute(source, &mut host) {
        panic!("program failed:\n{}", err.render(source));
    }
    host.output()
}

#[test]
fn test_hello() {
    let source = "play() {\n\tshootNxt(\"gg\")\n}\n";
    assert_eq!(run(source), "gg\n");
}

#[test]
fn test_numeric_kinds_and_promotion() {
    let source = r#"
hp e: -1
play() {
	shootNxt(7 / 2)
	shootNxt(-7 / 2)
	shootNxt(7.0 / 2)
	shootNxt(2 ^ 3)
	shootNxt(2 ^ e)
	xp speed: 2
	shootNxt(speed)
	shootNxt(7 % 3)
}
"#;
    assert_eq!(run(source), "3\n-3\n3.5\n8\n0.5\n2.0\n1\n");
}

#[test]
fn test_shoot_joins_on_one_line() {
    let source = "play() {\n\tshoot(\"score: \")\n\tshoot(10)\n\tshootNxt(\"\")\n\tshootNxt(true)\n}";
    assert_eq!(run(source), "score: 10\ntrue\n");
}

#[test]
fn test_comms_builtins() {
    let source = r#"
comms tag: "noob"
play() {
	comms shout: levelUp(tag) + "!"
	shootNxt(shout)
	shootNxt(rounds(shout))
	shootNxt(levelDown("GG"))
	tag[0]: "b"
	shootNxt(tag)
}
"#;
    assert_eq!(run(source), "NOOB!\n5\ngg\nboob\n");
}

#[test]
fn test_chained_relational() {
    let source = r#"
play() {
	shootNxt(1 < 2 < 3)
	shootNxt(1 < 3 < 2)
	shootNxt(3 >= 3 > 1)
	shootNxt(1 < 2 AND 2 > 3)
	shootNxt(1 < 2 OR 2 > 3)
	shootNxt(!(1 == 1))
}
"#;
    assert_eq!(run(source), "true\nfalse\ntrue\nfalse\ntrue\nfalse\n");
}

#[test]
fn test_if_elif_else() {
    let source = r#"
hp x: 3
play() {
	if x > 5 {
		shootNxt("high")
	}
	elif x > 2 {
		shootNxt("mid")
	}
	else {
		shootNxt("low")
	}
}
"#;
    assert_eq!(run(source), "mid\n");
}

#[test]
fn test_loops_with_checkpoint_and_resume() {
    let source = r#"
play() {
	for i: 0, i < 6, i += 1 {
		if i == 1 {
			resume
		}
		if i == 4 {
			checkpoint
		}
		shoot(i)
	}
	shootNxt("")
	hp n: 3
	while n > 0 {
		shoot(n)
		n -= 1
	}
	shootNxt("")
	grind {
		shootNxt("once")
	}
	while false
}
"#;
    assert_eq!(run(source), "023\n321\nonce\n");
}

#[test]
fn test_flank_picks_one_arm() {
    let source = r#"
play() {
	for n: 1, n <= 4, n += 1 {
		flank n {
			choice 1, 2: shoot("low ")
			choice 3:
				shoot("three ")
			backup: shoot("other ")
		}
	}
}
"#;
    assert_eq!(run(source), "low low three other ");
}

#[test]
fn test_arrays() {
    let source = r#"
hp a[3]: [1, 2, 3]
hp m[][]: [[1, 2], [3, 4]]
play() {
	a[2]: 30
	a.join(4)
	shootNxt(rounds(a))
	hp last: a.drop()
	shootNxt(last)
	hp first: a.drop(0)
	shootNxt(first)
	shootNxt(a[0] + a[1])
	shootNxt(a.seek(30))
	shootNxt(a.seek(99))
	m.join([5, 6])
	m[0].join(9)
	shootNxt(rounds(m[0]))
	shootNxt(m.seek([5, 6]))
	hp r[]: m.drop()
	shootNxt(r[0] + r[1])
	hp c[]: r
	c[0]: 100
	shootNxt(r[0])
}
"#;
    assert_eq!(run(source), "4\n4\n1\n32\n1\n-1\n3\n2\n11\n5\n");
}

#[test]
fn test_struct_defaults() {
    let source = r#"
build Point { hp x: 7, hp y }
access Point p: 4
access Point q
play() {
	shootNxt(p.x)
	shootNxt(p.y)
	shootNxt(q.x)
	q.y: 2
	shootNxt(q.y)
}
"#;
    assert_eq!(run(source), "4\n0\n7\n2\n");
}

#[test]
fn test_functions() {
    let source = r#"
fact(n) {
	if n <= 1 {
		recall 1
	}
	recall n * fact(n - 1)
}
greet(name, punct: "!") {
	shootNxt("hi " + name + punct)
}
pair() {
	recall 3, 4
}
play() {
	shootNxt(fact(5))
	greet("Ana")
	greet("Bo", "?")
	hp a, b: pair()
	shootNxt(a * b)
}
"#;
    assert_eq!(run(source), "120\nhi Ana!\nhi Bo?\n12\n");
}

#[test]
fn test_batch_declarations() {
    let source = r#"
hp a, b, c: 2
hp d, e: 1, 5
play() {
	shootNxt(a + b + c + d + e)
}
"#;
    assert_eq!(run(source), "12\n");
}

#[test]
fn test_inner_scope_shadows_then_restores() {
    let source = r#"
hp x: 1
play() {
	if true {
		hp x: 2
		shootNxt(x)
	}
	shootNxt(x)
	x += 10
	shootNxt(x)
}
"#;
    assert_eq!(run(source), "2\n1\n11\n");
}

#[test]
fn test_conversions_and_format() {
    let source = r#"
xp pi: 3.14159
play() {
	shootNxt(pi.2f)
	shootNxt(toHp(pi))
	shootNxt(toXp(2))
	shootNxt(toHp("-12") + 1)
	shootNxt(toComms(5) + "0")
	shootNxt(toHp(true))
}
"#;
    assert_eq!(run(source), "3.14\n3\n2.0\n-11\n50\n1\n");
}

#[test]
fn test_dead_redeclaration() {
    let source = "play() {\n\thp x: dead\n\thp x: 4\n\tshootNxt(x)\n}";
    assert_eq!(run(source), "4\n");
}

#[test]
fn test_tokens_round_trip_without_comments() {
    let source = "hp a[3]: [1, -2, 3]\nplay() {\n\tshootNxt(a[0] - 1)\n}\n";
    let output = pipeline::analyze(source);
    assert!(output.is_clean());
    assert_eq!(tokens_to_source(&output.tokens), source);
}

#[test]
fn test_parse_errors_stop_before_running() {
    let source = "play() {\n\tshootNxt(\"early\")\n\tshootNxt(missing)\n}";
    let mut host = BufferedHost::new();
    let err = pipeline::execute(source, &mut host).unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
    assert_eq!(host.output(), "");
    assert!(err.render(source).contains("3 |"));
}
