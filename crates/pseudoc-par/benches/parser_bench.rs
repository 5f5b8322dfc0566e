//! Parser throughput benchmarks.
//! Run with: `cargo bench --package pseudoc-par`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pseudoc_lex::Lexer;
use pseudoc_par::Parser;
use pseudoc_util::{Handler, Interner};

fn parse_stmt_count(source: &str) -> usize {
    let mut interner = Interner::new();
    let mut handler = Handler::new();
    let tokens = Lexer::new(source, &mut interner, &mut handler).tokenize();
    Parser::new(tokens, &interner, &mut handler).parse().map(|p| p.len()).unwrap_or(0)
}

fn bench_parser_declarations(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_declarations");
    let source = "DECLARE X : INTEGER\nDECLARE Name : STRING\nX <- 42\nOUTPUT X";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("declare_and_assign", |b| b.iter(|| parse_stmt_count(black_box(source))));
    group.finish();
}

fn bench_parser_bubble_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_bubble_sort");
    let source = r#"
        DECLARE Nums : ARRAY[1:6] OF INTEGER
        DECLARE I, J, Temp : INTEGER
        FOR I <- 1 TO 5
            FOR J <- 1 TO 6 - I
                IF Nums[J] > Nums[J + 1] THEN
                    Temp <- Nums[J]
                    Nums[J] <- Nums[J + 1]
                    Nums[J + 1] <- Temp
                ENDIF
            NEXT J
        NEXT I
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("nested_for_loops", |b| b.iter(|| parse_stmt_count(black_box(source))));
    group.finish();
}

fn bench_parser_procedure_and_case(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_procedure_and_case");
    let source = r#"
        PROCEDURE DescribeDay(BYVAL D : INTEGER)
            CASE OF D
                1: OUTPUT "Monday"
                6, 7: OUTPUT "Weekend"
                OTHERWISE: OUTPUT "Weekday"
            ENDCASE
        ENDPROCEDURE
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("procedure_with_case", |b| b.iter(|| parse_stmt_count(black_box(source))));
    group.finish();
}

fn bench_parser_expression_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_expression_chains");
    let source = "X <- 1 + 2 * 3 - 4 / 2 + 5 MOD 2 DIV 1 ^ 2 AND TRUE OR NOT FALSE";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("precedence_ladder", |b| b.iter(|| parse_stmt_count(black_box(source))));
    group.finish();
}

criterion_group!(
    benches,
    bench_parser_declarations,
    bench_parser_bubble_sort,
    bench_parser_procedure_and_case,
    bench_parser_expression_chains
);
criterion_main!(benches);
