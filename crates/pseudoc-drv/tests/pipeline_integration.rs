//! End-to-end tests exercising the whole `source -> tokens -> AST ->
//! IR -> IR' -> execution` pipeline through `pseudoc_drv::run`,
//! matching `spec.md` §8's concrete scenarios.

use pseudoc_drv::run;

fn run_ok(src: &str, inputs: &[&str]) -> Vec<String> {
    let inputs = inputs.iter().map(|s| s.to_string()).collect();
    run(src, true, inputs, Vec::new()).expect("program should run to completion").output
}

#[test]
fn bubble_sort_sorts_ascending() {
    let output = run_ok(
        "DECLARE Nums : ARRAY[1:6] OF INTEGER\n\
         DECLARE I : INTEGER\n\
         DECLARE J : INTEGER\n\
         DECLARE Tmp : INTEGER\n\
         FOR I <- 1 TO 6\n\
           INPUT Nums[I]\n\
         NEXT I\n\
         FOR I <- 1 TO 5\n\
           FOR J <- 1 TO 6 - I\n\
             IF Nums[J] > Nums[J + 1] THEN\n\
               Tmp <- Nums[J]\n\
               Nums[J] <- Nums[J + 1]\n\
               Nums[J + 1] <- Tmp\n\
             ENDIF\n\
           NEXT J\n\
         NEXT I\n\
         FOR I <- 1 TO 6\n\
           OUTPUT Nums[I]\n\
         NEXT I\n",
        &["5", "2", "9", "1", "7", "3"],
    );
    assert_eq!(output, ["1", "2", "3", "5", "7", "9"]);
}

#[test]
fn for_loop_with_negative_step_counts_down_to_one() {
    let output = run_ok(
        "DECLARE I : INTEGER\nFOR I <- 5 TO 1 STEP -1\n  OUTPUT I\nNEXT I\n",
        &[],
    );
    assert_eq!(output, ["5", "4", "3", "2", "1"]);
}

#[test]
fn case_multi_value_branch_picks_weekend_for_seven() {
    let output = run_ok(
        "DECLARE D : INTEGER\n\
         D <- 7\n\
         CASE OF D\n\
           1, 2, 3, 4, 5: OUTPUT \"Weekday\"\n\
           6, 7: OUTPUT \"Weekend\"\n\
           OTHERWISE: OUTPUT \"Other\"\n\
         ENDCASE\n",
        &[],
    );
    assert_eq!(output, ["Weekend"]);
}

#[test]
fn case_multi_value_branch_falls_to_otherwise_for_zero() {
    let output = run_ok(
        "DECLARE D : INTEGER\n\
         D <- 0\n\
         CASE OF D\n\
           1, 2, 3, 4, 5: OUTPUT \"Weekday\"\n\
           6, 7: OUTPUT \"Weekend\"\n\
           OTHERWISE: OUTPUT \"Other\"\n\
         ENDCASE\n",
        &[],
    );
    assert_eq!(output, ["Other"]);
}

#[test]
fn file_handling_example_round_trips_five_lines() {
    let outcome = run(
        "DECLARE I : INTEGER\n\
         DECLARE Line : STRING\n\
         OPENFILE \"data.txt\" FOR WRITE\n\
         FOR I <- 1 TO 5\n\
           WRITEFILE \"data.txt\", \"Line \" & NUM_TO_STR(I)\n\
         NEXT I\n\
         CLOSEFILE \"data.txt\"\n\
         OPENFILE \"data.txt\" FOR READ\n\
         WHILE NOT EOF(\"data.txt\") DO\n\
           READFILE \"data.txt\", Line\n\
           OUTPUT \"Read: \" & Line\n\
         ENDWHILE\n\
         CLOSEFILE \"data.txt\"\n",
        true,
        Vec::new(),
        Vec::new(),
    )
    .expect("file handling example should run");
    assert_eq!(
        outcome.output,
        ["Read: Line 1", "Read: Line 2", "Read: Line 3", "Read: Line 4", "Read: Line 5"]
    );
    assert_eq!(
        outcome.files.get("data.txt").unwrap().lines,
        vec!["Line 1", "Line 2", "Line 3", "Line 4", "Line 5"]
    );
}

#[test]
fn optimiser_soundness_holds_across_the_bubble_sort_example() {
    let src = "DECLARE Nums : ARRAY[1:4] OF INTEGER\n\
               DECLARE I : INTEGER\n\
               DECLARE J : INTEGER\n\
               DECLARE Tmp : INTEGER\n\
               FOR I <- 1 TO 4\n\
                 INPUT Nums[I]\n\
               NEXT I\n\
               FOR I <- 1 TO 3\n\
                 FOR J <- 1 TO 4 - I\n\
                   IF Nums[J] > Nums[J + 1] THEN\n\
                     Tmp <- Nums[J]\n\
                     Nums[J] <- Nums[J + 1]\n\
                     Nums[J + 1] <- Tmp\n\
                   ENDIF\n\
                 NEXT J\n\
               NEXT I\n\
               FOR I <- 1 TO 4\n\
                 OUTPUT Nums[I]\n\
               NEXT I\n";
    let inputs = vec!["4".to_string(), "1".to_string(), "3".to_string(), "2".to_string()];
    let optimised = run(src, true, inputs.clone(), Vec::new()).unwrap();
    let unoptimised = run(src, false, inputs, Vec::new()).unwrap();
    assert_eq!(optimised.output, unoptimised.output);
    assert_eq!(optimised.globals, unoptimised.globals);
}

#[test]
fn scope_integrity_keeps_procedure_locals_out_of_globals() {
    let outcome = run(
        "PROCEDURE Greet()\n\
           DECLARE Message : STRING\n\
           Message <- \"hi\"\n\
           OUTPUT Message\n\
         ENDPROCEDURE\n\
         CALL Greet()\n",
        true,
        Vec::new(),
        Vec::new(),
    )
    .unwrap();
    assert_eq!(outcome.output, ["hi"]);
    assert!(!outcome.globals.contains_key("Message"));
}
