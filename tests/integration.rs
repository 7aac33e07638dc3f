//! Integration tests for the full pipeline

use loxwalk::ast::load_json;
use loxwalk::common::NodeIdGen;
use loxwalk::config::Config;
use loxwalk::interp::Interpreter;
use loxwalk::resolve::{Resolver, ResolverOptions};
use pretty_assertions::assert_eq;

const FIB: &str = include_str!("../demos/fib.json");
const COUNTER: &str = include_str!("../demos/counter.json");
const SAMPLE_CONFIG: &str = include_str!("../demos/loxw.toml");

/// Load, resolve and run a JSON program, capturing what it prints
fn run_captured(src: &str, config: &Config) -> Interpreter {
    let program = load_json(src, &mut NodeIdGen::new()).expect("Invalid program");
    let tables = Resolver::new(config.resolver)
        .resolve(&program)
        .expect("Resolution failed");
    let mut interpreter = Interpreter::with_config(&config.interpreter)
        .capture_output()
        .with_resolution(tables);
    interpreter.interpret(&program);
    interpreter
}

#[test]
fn test_fib_demo() {
    let interpreter = run_captured(FIB, &Config::default());
    assert!(!interpreter.reporter().has_errors());
    assert_eq!(interpreter.output(), ["6765"]);
}

#[test]
fn test_counter_demo_in_both_modes() {
    for slots in [true, false] {
        let mut config = Config::default();
        config.resolver = ResolverOptions { slots };
        let interpreter = run_captured(COUNTER, &config);
        assert_eq!(interpreter.output(), ["1", "2"], "slots = {}", slots);
    }
}

#[test]
fn test_sample_config_matches_defaults() {
    let config = Config::from_toml(SAMPLE_CONFIG).expect("Sample config parses");
    assert_eq!(config, Config::default());
}

#[test]
fn test_call_depth_from_config() {
    let config = Config::from_toml("[interpreter]\nmax_call_depth = 10").expect("valid config");
    let interpreter = run_captured(FIB, &config);

    // fib(20) recurses 20 deep
    assert_eq!(interpreter.reporter().error_count(), 1);
    assert_eq!(interpreter.reporter().errors()[0].to_string(), "Stack overflow.");
    assert_eq!(interpreter.reporter().errors()[0].line(), 3);
}

#[test]
fn test_run_json_reports_runtime_errors() {
    let src = r#"[
        {"Print": {"expr": {"Unary": {"op": "Neg", "line": 7,
            "right": {"Literal": {"value": {"String": "text"}}}}}}}
    ]"#;
    let interpreter = loxwalk::run_json(src, &Config::default()).expect("Program resolves");
    let errors = interpreter.reporter().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "Operand must be a number.");
    assert_eq!(errors[0].line(), 7);
}

#[test]
fn test_run_json_rejects_resolve_errors() {
    let src = r#"[{"Return": {"keyword": {"lexeme": "return", "line": 1}}}]"#;
    let err = loxwalk::run_json(src, &Config::default()).expect_err("Top-level return");
    assert!(
        err.to_string().contains("resolution error"),
        "Unexpected error: {}",
        err
    );
}

#[test]
fn test_run_json_rejects_malformed_program() {
    let err = loxwalk::run_json(r#"[{"Loop": {}}]"#, &Config::default())
        .expect_err("Unknown statement kind");
    assert!(err.to_string().starts_with("Invalid program"), "{}", err);
}

#[test]
fn test_run_keeps_globals() {
    let program = load_json(FIB, &mut NodeIdGen::new()).expect("Invalid program");
    let mut config = Config::default();
    config.interpreter.max_call_depth = 64;
    let interpreter = loxwalk::run(&program[..1], &config).expect("Resolution failed");

    let names = interpreter.globals().borrow().names().join(",");
    assert_eq!(names, "clock,fib");
    assert!(!interpreter.reporter().has_errors());
}
