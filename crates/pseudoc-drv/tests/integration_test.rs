use pseudoc_drv::{compile, run};

#[test]
fn arithmetic_example_outputs_fourteen() {
    let outcome = run("DECLARE X : INTEGER\nX <- 2 + 3 * 4\nOUTPUT X\n", true, Vec::new(), Vec::new())
        .expect("well-typed program should run");
    assert_eq!(outcome.output, ["14"]);
}

#[test]
fn compile_is_pure_and_produces_ir_without_executing_anything() {
    let program = compile(
        "DECLARE X : INTEGER\nOPENFILE \"Ledger.txt\" FOR WRITE\nX <- 1\nWRITEFILE \"Ledger.txt\", NUM_TO_STR(X)\n",
        true,
    )
    .expect("well-typed program should compile");
    assert!(program.ir_text().contains("OPENFILE"));
    assert!(program.ir_text().contains("WRITEFILE"));
}

#[test]
fn byref_swap_example_matches_spec_scenario_two() {
    let outcome = run(
        "PROCEDURE Swap(BYREF A : INTEGER, BYREF B : INTEGER)\n\
           DECLARE Tmp : INTEGER\n\
           Tmp <- A\n\
           A <- B\n\
           B <- Tmp\n\
         ENDPROCEDURE\n\
         DECLARE A : INTEGER\n\
         DECLARE B : INTEGER\n\
         A <- 10\n\
         B <- 20\n\
         OUTPUT \"A=\" & NUM_TO_STR(A) & \" B=\" & NUM_TO_STR(B)\n\
         CALL Swap(A, B)\n\
         OUTPUT \"A=\" & NUM_TO_STR(A) & \" B=\" & NUM_TO_STR(B)\n",
        true,
        Vec::new(),
        Vec::new(),
    )
    .expect("byref example should run");
    assert_eq!(outcome.output, ["A=10 B=20", "A=20 B=10"]);
}

#[test]
fn use_before_assignment_is_rejected_before_execution_reaches_the_vm() {
    let err = run("DECLARE X : INTEGER\nOUTPUT X\n", true, Vec::new(), Vec::new()).unwrap_err();
    assert_eq!(err.diagnostic.stage, "TypeError");
}
