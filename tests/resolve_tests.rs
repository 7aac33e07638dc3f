//! Name resolution tests

use loxwalk::ast::{Builder, Stmt, load_json};
use loxwalk::common::{NodeId, NodeIdGen};
use loxwalk::resolve::{LocalSlot, Resolution, ResolveError, Resolver, ResolverOptions, resolve};
use pretty_assertions::assert_eq;

fn resolve_source(src: &str) -> Result<(Vec<Stmt>, Resolution), String> {
    let program = load_json(src, &mut NodeIdGen::new()).map_err(|e| format!("{:?}", e))?;
    let tables = resolve(&program).map_err(|e| format!("{:?}", e.errors))?;
    Ok((program, tables))
}

fn resolve_errors(program: &[Stmt]) -> Vec<ResolveError> {
    match resolve(program) {
        Ok(_) => panic!("Resolution should have failed"),
        Err(err) => err.errors,
    }
}

fn at(distance: usize, slot: usize) -> Option<LocalSlot> {
    Some(LocalSlot { distance, slot })
}

#[test]
fn test_resolve_json_block() {
    let src = r#"[
        {"Block": {"statements": [
            {"Var": {"name": {"lexeme": "x", "line": 1},
                     "initializer": {"Literal": {"value": {"Number": 42.0}}}}},
            {"Print": {"expr": {"Variable": {"name": {"lexeme": "x", "line": 2}}}}}
        ]}}
    ]"#;
    let (program, tables) = resolve_source(src).expect("Resolution failed");

    // Ids are handed out depth first: block, var, literal, print, variable
    assert_eq!(program[0].id(), NodeId(1));
    assert_eq!(tables.frame_size(NodeId(1)), Some(1));
    assert_eq!(tables.declaration_slot(NodeId(2)), Some(0));
    assert_eq!(tables.local(NodeId(5)), at(0, 0));
}

#[test]
fn test_global_function_is_not_slotted() {
    let b = Builder::new();
    let read = b.var("f");
    let read_id = read.id();
    let fun = b.function("f", &[], vec![]);
    let fun_id = fun.id();
    let program = vec![fun, b.expr_stmt(b.call(read, vec![]))];

    let tables = resolve(&program).expect("Resolution failed");
    assert!(tables.declaration_slot(fun_id).is_none());
    assert!(tables.local(read_id).is_none());
    assert_eq!(tables.frame_size(fun_id), Some(0));
}

#[test]
fn test_local_function_gets_declaration_slot() {
    let b = Builder::new();
    let fun = b.function("helper", &[], vec![]);
    let fun_id = fun.id();
    let call = b.var("helper");
    let call_id = call.id();
    let program = vec![b.block(vec![
        b.var_decl("before", None),
        fun,
        b.expr_stmt(b.call(call, vec![])),
    ])];

    let tables = resolve(&program).expect("Resolution failed");
    assert_eq!(tables.declaration_slot(fun_id), Some(1));
    assert_eq!(tables.local(call_id), at(0, 1));
    assert_eq!(tables.frame_size(program[0].id()), Some(2));
}

#[test]
fn test_closure_capture_crosses_function_scope() {
    let b = Builder::new();
    let read = b.var("x");
    let read_id = read.id();
    let write = b.assign("x", b.number(2.0));
    let write_id = write.id();
    let program = vec![b.block(vec![
        b.var_decl("x", Some(b.number(1.0))),
        b.function(
            "f",
            &["unused"],
            vec![b.block(vec![b.print(read), b.expr_stmt(write)])],
        ),
    ])];

    let tables = resolve(&program).expect("Resolution failed");
    // inner block → function scope → outer block
    assert_eq!(tables.local(read_id), at(2, 0));
    assert_eq!(tables.local(write_id), at(2, 0));
}

#[test]
fn test_recursive_local_function_sees_itself() {
    let b = Builder::new();
    let self_ref = b.var("again");
    let self_id = self_ref.id();
    let program = vec![b.block(vec![b.function(
        "again",
        &[],
        vec![b.expr_stmt(b.call(self_ref, vec![]))],
    )])];

    let tables = resolve(&program).expect("Resolution failed");
    assert_eq!(tables.local(self_id), at(1, 0));
}

#[test]
fn test_shadowing() {
    let b = Builder::new();
    let inner_read = b.var("a");
    let outer_read = b.var("a");
    let (inner_id, outer_id) = (inner_read.id(), outer_read.id());
    let program = vec![b.block(vec![
        b.var_decl("a", Some(b.number(1.0))),
        b.var_decl("b", Some(b.number(2.0))),
        b.block(vec![
            b.var_decl("b", None),
            b.var_decl("a", None),
            b.print(inner_read),
        ]),
        b.print(outer_read),
    ])];

    let tables = resolve(&program).expect("Resolution failed");
    assert_eq!(tables.local(inner_id), at(0, 1));
    assert_eq!(tables.local(outer_id), at(0, 0));
}

#[test]
fn test_global_initializer_may_read_global() {
    let b = Builder::new();
    let program = vec![
        b.var_decl("a", Some(b.number(1.0))),
        b.var_decl("a", Some(b.var("a"))),
    ];
    assert!(resolve(&program).is_ok(), "Globals may be redeclared");
}

#[test]
fn test_local_read_in_own_initializer() {
    let b = Builder::new();
    b.at_line(4);
    let program = vec![b.block(vec![b.var_decl("a", Some(b.add(b.var("a"), b.number(1.0))))])];

    let errors = resolve_errors(&program);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ResolveError::ReadInOwnInitializer { name } if name.lexeme == "a"));
    assert_eq!(errors[0].line(), 4);
}

#[test]
fn test_duplicate_parameter() {
    let b = Builder::new();
    let program = vec![b.function("f", &["x", "x"], vec![])];

    let errors = resolve_errors(&program);
    assert_eq!(
        errors[0].to_string(),
        "Already a variable with this name in this scope."
    );
}

#[test]
fn test_return_inside_function_is_allowed() {
    let b = Builder::new();
    let program = vec![b.function(
        "f",
        &[],
        vec![b.block(vec![b.return_stmt(Some(b.nil()))])],
    )];
    assert!(resolve(&program).is_ok());
}

#[test]
fn test_top_level_return_inside_block() {
    let b = Builder::new();
    let program = vec![b.block(vec![b.return_stmt(None)])];

    let errors = resolve_errors(&program);
    assert!(matches!(errors[0], ResolveError::TopLevelReturn { .. }));
    assert_eq!(errors[0].token().lexeme, "return");
}

#[test]
fn test_named_mode_keeps_distances() {
    let b = Builder::new();
    let read = b.var("x");
    let read_id = read.id();
    let program = vec![b.block(vec![
        b.var_decl("x", None),
        b.function("f", &[], vec![b.print(read)]),
    ])];

    let tables = Resolver::new(ResolverOptions { slots: false })
        .resolve(&program)
        .expect("Resolution failed");
    assert_eq!(tables.local(read_id), at(1, 0));
    assert!(tables.frame_sizes().is_empty());
    assert!(tables.declarations().is_empty());
}

#[test]
fn test_extend_merges_tables() {
    let first = Builder::new();
    let a = vec![first.block(vec![first.var_decl("x", None)])];
    let second = Builder::starting_at(first.next_id());
    let b = vec![second.block(vec![second.var_decl("y", None), second.var_decl("z", None)])];

    let mut tables = resolve(&a).expect("Resolution failed");
    tables.extend(resolve(&b).expect("Resolution failed"));

    assert_eq!(tables.frame_size(a[0].id()), Some(1));
    assert_eq!(tables.frame_size(b[0].id()), Some(2));
    assert_eq!(tables.declarations().len(), 3);
}
