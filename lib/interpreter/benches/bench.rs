use criterion::{criterion_group, criterion_main, Criterion};
use interpreter::Interpreter;

const ARITHMETIC_LOOP: &str = "
var i = 0;
var sum = 0;
while (i < 1000) {
    sum = sum + i * 2 - i / 2;
    i = i + 1;
}
";

const CALL_LOOP: &str = "
var total = 0;
fun add(n) {
    total = total + n;
}
for (var i = 0; i < 500; i = i + 1) {
    add(i);
}
";

fn run(source: &'static str) {
    let mut output: Vec<u8> = Vec::new();
    Interpreter::new().run_source(source, &mut output).unwrap();
}

fn bench_interpreter(c: &mut Criterion) {
    c.bench_function("arithmetic_loop", |b| b.iter(|| run(ARITHMETIC_LOOP)));
    c.bench_function("call_loop", |b| b.iter(|| run(CALL_LOOP)));
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
