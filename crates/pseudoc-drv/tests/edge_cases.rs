//! Edge cases from `spec.md` §9's open questions and §7's runtime
//! error taxonomy, exercised through the `pseudoc_drv` facade.

use pseudoc_drv::{compile, run};

#[test]
fn constant_with_leading_minus_negates_a_literal() {
    let program = compile("CONSTANT Floor = -5\nOUTPUT Floor\n", true).unwrap();
    assert!(program.ir_text().contains("-5"));
}

#[test]
fn for_with_step_zero_is_accepted_and_hits_the_step_limit() {
    let outcome = run(
        "DECLARE I : INTEGER\nFOR I <- 1 TO 1 STEP 0\n  OUTPUT I\nNEXT I\n",
        true,
        Vec::new(),
        Vec::new(),
    );
    let err = outcome.unwrap_err();
    assert_eq!(err.diagnostic.stage, "RuntimeError");
}

#[test]
fn function_return_type_is_not_checked_against_returns_clause() {
    let program = compile(
        "FUNCTION BadReturn() RETURNS INTEGER\n  RETURN \"not an integer\"\nENDFUNCTION\n\
         DECLARE X : STRING\nX <- BadReturn()\nOUTPUT X\n",
        true,
    );
    assert!(program.is_ok(), "spec.md §9 leaves RETURN's type unchecked against RETURNS");
}

#[test]
fn division_by_zero_is_a_runtime_error_not_a_panic() {
    let err = run("DECLARE X : INTEGER\nX <- 10 / 0\n", true, Vec::new(), Vec::new()).unwrap_err();
    assert_eq!(err.diagnostic.stage, "RuntimeError");
    assert!(err.diagnostic.message.contains("division"));
}

#[test]
fn reading_past_end_of_file_is_a_runtime_error() {
    let err = run(
        "DECLARE Line : STRING\n\
         OPENFILE \"Empty.txt\" FOR READ\n\
         READFILE \"Empty.txt\", Line\n",
        true,
        Vec::new(),
        Vec::new(),
    )
    .unwrap_err();
    assert_eq!(err.diagnostic.stage, "RuntimeError");
}

#[test]
fn writing_to_a_file_opened_for_read_is_a_runtime_error() {
    let err = run(
        "OPENFILE \"Log.txt\" FOR READ\nWRITEFILE \"Log.txt\", \"oops\"\n",
        true,
        Vec::new(),
        vec![("Log.txt".to_string(), vec!["existing".to_string()])],
    )
    .unwrap_err();
    assert_eq!(err.diagnostic.stage, "RuntimeError");
}

#[test]
fn array_bounds_declared_a_to_b_reject_out_of_range_indices() {
    let err = run(
        "DECLARE Nums : ARRAY[1:3] OF INTEGER\nDECLARE X : INTEGER\nX <- Nums[0]\n",
        true,
        Vec::new(),
        Vec::new(),
    )
    .unwrap_err();
    assert_eq!(err.diagnostic.stage, "RuntimeError");
}

#[test]
fn duplicate_declaration_in_the_same_scope_is_a_type_error() {
    let err = compile("DECLARE X : INTEGER\nDECLARE X : REAL\n", true).unwrap_err();
    assert_eq!(err.diagnostic.stage, "TypeError");
}

#[test]
fn unknown_character_is_a_lex_error() {
    let err = compile("DECLARE X : INTEGER\nX <- 1 @ 2\n", true).unwrap_err();
    assert_eq!(err.diagnostic.stage, "LexError");
}

#[test]
fn unterminated_construct_is_a_parse_error() {
    let err = compile("IF TRUE THEN\nOUTPUT 1\n", true).unwrap_err();
    assert_eq!(err.diagnostic.stage, "ParseError");
}
