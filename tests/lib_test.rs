//! Library integration tests.

use recipe_runner::RecipeError;

#[test]
fn error_types_are_public() {
    let err = RecipeError::DuplicateStepId { id: "build".into() };
    assert!(err.to_string().contains("build"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> recipe_runner::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use recipe_runner::cli::{Cli, Commands};

    let cli = Cli::parse_from(["recipe-runner", "run", "recipe.yaml", "--json", "-c", "n=3"]);

    if let Commands::Run(args) = cli.command {
        assert!(args.json);
        assert_eq!(args.context, vec![("n".to_string(), serde_json::json!(3))]);
    } else {
        panic!("Expected Run command");
    }
}

#[test]
fn load_recipe_from_disk() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("r.yaml");
    std::fs::write(&path, "name: disk\nsteps:\n  - id: a\n    prompt: hi\n").unwrap();

    let recipe = recipe_runner::recipe::load_recipe(&path).unwrap();

    assert_eq!(recipe.name, "disk");
    assert_eq!(recipe.steps[0].step_type, recipe_runner::recipe::StepType::Agent);
}
