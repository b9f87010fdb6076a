//! Recipe definitions, parsing, and validation.
//!
//! - Data types in [`model`]
//! - YAML parsing and step type inference in [`parser`]
//! - Advisory warnings in [`validator`]
//! - File loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use recipe_runner::recipe::{parse_recipe, validate_yaml, StepType};
//!
//! let yaml = "name: demo\nsteps:\n  - id: greet\n    command: echo hi\n    output: greeting\n";
//! let recipe = parse_recipe(yaml).unwrap();
//! assert_eq!(recipe.steps[0].step_type, StepType::Bash);
//! assert!(validate_yaml(yaml).unwrap().is_empty());
//! ```

pub mod loader;
pub mod model;
pub mod parser;
pub mod validator;

pub use loader::{load_recipe, read_recipe_file};
pub use model::{Recipe, Step, StepType, DEFAULT_TIMEOUT_SECS, DEFAULT_VERSION};
pub use parser::{infer_step_type, parse_recipe, recipe_from_value, RECIPE_FIELDS, STEP_FIELDS};
pub use validator::{validate_document, validate_yaml, ValidationWarning};
