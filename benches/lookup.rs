//! Variable lookup benchmark
//!
//! A closure whose enclosing function declares 1352 locals is called
//! `cnt * cnt` times. Each call reads and writes one captured variable, so
//! the run is dominated by resolved-variable access. The same program runs
//! with slotted frames and with every scope in named mode.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use loxwalk::ast::{Builder, Stmt};
use loxwalk::interp::Interpreter;
use loxwalk::resolve::{Resolver, ResolverOptions};

const COUNTS: [u32; 2] = [20, 50];

/// ```text
/// fun get_adder() {
///     var this_val = 0;
///     var aa0 = "aa0"; var aa1 = "aa1"; ... var zz1 = "zz1";
///     fun adder() { this_val = this_val + 1; return this_val; }
///     return adder;
/// }
/// var cnt = <cnt>;
/// var adder = get_adder();
/// { var i = 0; while (i < cnt) { var val = 0; var j = 0;
///     while (j < cnt) { val = adder(); j = j + 1; } i = i + 1; } }
/// ```
fn lookup_program(cnt: u32) -> Vec<Stmt> {
    let b = Builder::new();
    let bump = |name: &str| b.expr_stmt(b.assign(name, b.add(b.var(name), b.number(1.0))));

    let mut body = vec![b.var_decl("this_val", Some(b.number(0.0)))];
    for x in 'a'..='z' {
        for y in 'a'..='z' {
            for w in 0..2 {
                let name = format!("{x}{y}{w}");
                body.push(b.var_decl(&name, Some(b.string(&name))));
            }
        }
    }
    body.push(b.function(
        "adder",
        &[],
        vec![bump("this_val"), b.return_stmt(Some(b.var("this_val")))],
    ));
    body.push(b.return_stmt(Some(b.var("adder"))));

    let inner_loop = b.while_stmt(
        b.less(b.var("j"), b.var("cnt")),
        b.block(vec![
            b.expr_stmt(b.assign("val", b.call(b.var("adder"), vec![]))),
            bump("j"),
        ]),
    );
    let outer_loop = b.while_stmt(
        b.less(b.var("i"), b.var("cnt")),
        b.block(vec![
            b.var_decl("val", Some(b.number(0.0))),
            b.var_decl("j", Some(b.number(0.0))),
            inner_loop,
            bump("i"),
        ]),
    );

    vec![
        b.function("get_adder", &[], body),
        b.var_decl("cnt", Some(b.number(cnt as f64))),
        b.var_decl("adder", Some(b.call(b.var("get_adder"), vec![]))),
        b.block(vec![b.var_decl("i", Some(b.number(0.0))), outer_loop]),
    ]
}

fn bench_captured_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("captured_lookup");

    for cnt in COUNTS {
        let program = lookup_program(cnt);
        for (mode, slots) in [("slotted", true), ("named", false)] {
            let tables = Resolver::new(ResolverOptions { slots })
                .resolve(&program)
                .expect("lookup program resolves");

            group.bench_with_input(BenchmarkId::new(mode, cnt), &program, |b, program| {
                b.iter(|| {
                    let mut interpreter = Interpreter::new()
                        .capture_output()
                        .with_resolution(tables.clone());
                    interpreter.interpret(black_box(program));
                    assert!(!interpreter.reporter().has_errors());
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_captured_lookup);
criterion_main!(benches);
