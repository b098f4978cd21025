use monoforge_core::error::Error;
use monoforge_core::project::{Language, Project};
use monoforge_core::run_many::{delegated_command, RunManyComposer, RunManyOptions};
use tempfile::TempDir;

fn composer() -> RunManyComposer {
    RunManyComposer::new(".", vec!["npx".to_string(), "nx".to_string()], None)
}

#[test]
fn test_compose_is_pure_and_forced() {
    let options = RunManyOptions::new("test")
        .with_projects(["A", "B"])
        .forced(true);
    let composer = composer();

    let first = composer.compose_run_many_command(&options);
    let second = composer.compose_run_many_command(&options);
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            "run-many",
            "--target=test",
            "--output-style=stream",
            "--skip-nx-cache",
            "--nx-bail",
            "--projects=A,B",
        ]
    );
}

#[test]
fn test_compose_defaults_to_all_projects() {
    let tokens = composer().compose_run_many_command(&RunManyOptions::new("build"));
    assert_eq!(tokens[1], "--target=build");
    assert!(!tokens.iter().any(|t| t.starts_with("--projects")));
    assert!(!tokens.iter().any(|t| t.starts_with("--parallel")));
    assert!(!tokens.iter().any(|t| t == "--skip-nx-cache"));
}

#[test]
fn test_compose_full_option_order() {
    let mut options = RunManyOptions::new("package")
        .with_configuration("production")
        .with_parallel(4)
        .with_projects(["api"])
        .with_extra_args(["--watch", "a b"]);
    options.runner = Some("ci".to_string());
    options.ignore_cycles = true;
    options.no_bail = true;
    options.exclude = vec!["docs".to_string()];
    options.verbose = true;
    options.output_style = Some("static".to_string());

    let tokens = composer().compose_run_many_command(&options);
    assert_eq!(
        tokens,
        vec![
            "run-many",
            "--target=package",
            "--output-style=static",
            "--configuration=production",
            "--runner=ci",
            "--parallel=4",
            "--nx-ignore-cycles",
            "--projects=api",
            "--exclude=docs",
            "--verbose",
            "--",
            "--watch",
            "a b",
        ]
    );
}

#[test]
fn test_workspace_default_parallel() {
    let composer = RunManyComposer::new(".", vec!["nx".to_string()], Some(2));
    let tokens = composer.compose_run_many_command(&RunManyOptions::new("build"));
    assert!(tokens.contains(&"--parallel=2".to_string()));

    let tokens = composer.compose_run_many_command(&RunManyOptions::new("build").with_parallel(8));
    assert!(tokens.contains(&"--parallel=8".to_string()));
    assert!(!tokens.contains(&"--parallel=2".to_string()));
}

#[test]
fn test_command_line_quotes_tokens() {
    let options = RunManyOptions::new("test").with_extra_args(["it's"]);
    let line = composer().command_line(&options);
    assert!(line.starts_with("npx nx run-many --target=test"));
    assert!(line.ends_with(r"-- 'it'\''s'"));
}

#[test]
fn test_add_run_many_task() {
    let composer = composer();
    let mut project = Project::new("monorepo", Language::TypeScript, ".");
    let options = RunManyOptions::new("lint").with_parallel(3);

    let task = composer
        .add_run_many_task(&mut project, "lint:all", &options)
        .unwrap();
    assert_eq!(task.steps().len(), 1);
    assert_eq!(
        delegated_command(task),
        Some("npx nx run-many --target=lint --output-style=stream --parallel=3 --nx-bail")
    );

    let result = composer.add_run_many_task(&mut project, "lint:all", &options);
    assert!(matches!(result, Err(Error::TaskExists { .. })));
}

#[test]
fn test_exec_success_returns_output() {
    let temp_dir = TempDir::new().unwrap();
    let composer = RunManyComposer::new(
        temp_dir.path(),
        vec!["echo".to_string()],
        None,
    );
    let output = composer
        .exec_run_many_command(&RunManyOptions::new("build"))
        .unwrap();
    assert!(output.contains("run-many --target=build"));
}

#[test]
fn test_exec_failure_reports_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let composer = RunManyComposer::new(
        temp_dir.path(),
        ["sh", "-c", "exit 3", "sh"].map(String::from).to_vec(),
        None,
    );
    let result = composer.exec_run_many_command(&RunManyOptions::new("test"));
    match result {
        Err(Error::BatchRunFailure { exit_code, target }) => {
            assert_eq!(exit_code, 3);
            assert_eq!(target, "test");
        }
        other => panic!("expected batch run failure, got {:?}", other.map(|_| ())),
    }
}
