#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use minipy::ast::Program;
use minipy::compile;
use minipy::fixtures::bench_workloads;

pub fn workloads() -> Vec<(String, PathBuf)> {
    bench_workloads(Path::new("tests/programs"))
        .unwrap_or_else(|err| panic!("load bench workloads: {err:#}"))
}

pub fn load_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

pub fn load_program(path: &Path) -> Program {
    let source = load_source(path);
    compile(&source).unwrap_or_else(|err| panic!("compile {}: {err}", path.display()))
}
