mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use minipy::console::{CapturedOutput, ScriptedInput};
use minipy::interpreter::Interpreter;

fn bench_interpreter(c: &mut Criterion) {
    for (label, path) in common::workloads() {
        let program = common::load_program(&path);

        c.bench_function(&format!("interpreter_total_{label}"), |b| {
            let interpreter = Interpreter::new();
            b.iter(|| {
                let mut output = CapturedOutput::new();
                let outcome = interpreter
                    .prepare(black_box(&program))
                    .run(&mut output, &mut ScriptedInput::empty())
                    .expect("run");
                black_box((output, outcome));
            })
        });
    }
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
