use anyhow::{Context, Result, ensure};
use std::path::Path;

use minipy::checker::check_definitions;
use minipy::compile;
use minipy::console::{CapturedOutput, ScriptedInput};
use minipy::fixtures::{Case, CaseClass, load_cases, normalize_output};
use minipy::interpreter::{EvalConfig, Interpreter};

fn expected_error(case: &Case) -> Result<String> {
    let file = case
        .spec
        .expected
        .error_contains_file
        .as_deref()
        .with_context(|| format!("Missing error_contains_file in {}", case.name))?;
    Ok(case.read_text(file)?.trim().to_string())
}

fn run_case(case: &Case) -> Result<()> {
    let source = case.source()?;
    let compiled = compile(&source);

    if case.spec.class == CaseClass::FrontendError {
        let expected = expected_error(case)?;
        ensure!(
            compiled.is_err(),
            "Expected frontend error in {}, but compilation succeeded",
            case.name
        );
        let error = compiled.expect_err("compile result checked as err");
        let actual = error.to_string();
        ensure!(
            actual.contains(&expected),
            "Expected frontend error containing '{expected}' in {}, got '{actual}'",
            case.name
        );
        if let Some(line) = case.spec.expected.error_line {
            ensure!(
                error.line() == line,
                "Expected frontend error on line {line} in {}, got line {}",
                case.name,
                error.line()
            );
        }
        return Ok(());
    }

    let program = compiled.with_context(|| format!("Compiling {}", case.name))?;
    let findings = check_definitions(&program);
    ensure!(
        findings.len() == case.spec.expected.definition_warnings,
        "Case {} expected {} definition warnings, got {:?}",
        case.name,
        case.spec.expected.definition_warnings,
        findings
    );

    let config = case
        .spec
        .max_call_depth
        .map(|max_call_depth| EvalConfig { max_call_depth })
        .unwrap_or_default();
    let mut output = CapturedOutput::new();
    let mut input = ScriptedInput::new(case.spec.stdin.iter().cloned());
    let result = Interpreter::with_config(config)
        .prepare(&program)
        .run(&mut output, &mut input);

    match case.spec.class {
        CaseClass::RuntimeSuccess => {
            let outcome = result.with_context(|| format!("Running {}", case.name))?;
            let stdout_file = case
                .spec
                .expected
                .stdout_file
                .as_deref()
                .with_context(|| format!("Missing stdout_file in {}", case.name))?;
            let expected = case.read_text(stdout_file)?;
            assert_eq!(
                normalize_output(&output.text()),
                normalize_output(&expected),
                "Output mismatch for {}",
                case.name
            );
            ensure!(
                outcome.warnings.len() == case.spec.expected.warnings,
                "Case {} expected {} runtime warnings, got {:?}",
                case.name,
                case.spec.expected.warnings,
                outcome.warnings
            );
        }
        CaseClass::RuntimeError => {
            let expected = expected_error(case)?;
            ensure!(
                result.is_err(),
                "Expected runtime error in {}, but the run succeeded",
                case.name
            );
            let error = result.expect_err("result checked as err");
            let actual = error.to_string();
            ensure!(
                actual.contains(&expected),
                "Expected runtime error containing '{expected}' in {}, got '{actual}'",
                case.name
            );
            if let Some(line) = case.spec.expected.error_line {
                ensure!(
                    error.line() == Some(line),
                    "Expected runtime error on line {line} in {}, got {:?}",
                    case.name,
                    error.line()
                );
            }
        }
        CaseClass::FrontendError => unreachable!("handled before evaluation"),
    }
    Ok(())
}

#[test]
fn runs_fixture_programs() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;
    for case in &cases {
        if case.spec.bench.enabled {
            ensure!(
                !case.spec.bench.tags.is_empty(),
                "Case {} has bench enabled but no tags",
                case.name
            );
        }
        run_case(case)?;
    }
    Ok(())
}
