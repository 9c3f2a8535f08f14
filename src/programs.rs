//! Embedded example machines, each with a suggested input.

use crate::loader::DefinitionLoader;
use crate::model::MachineModel;
use crate::types::TuringMachineError;
use tracing::warn;

/// (name, suggested input, definition text)
const EXAMPLE_TEXTS: [(&str, &str, &str); 4] = [
    ("Simple", "a", include_str!("../demos/simple.yaml")),
    ("Even a's", "aaaa", include_str!("../demos/even-as.yaml")),
    (
        "Binary increment",
        "1011",
        include_str!("../demos/binary-increment.yaml"),
    ),
    ("a^n b^n", "aabb", include_str!("../demos/anbn.yaml")),
];

lazy_static::lazy_static! {
    /// Every embedded example that parsed successfully, in declaration order.
    pub static ref EXAMPLES: Vec<Example> = load_examples();
}

/// A named example definition.
#[derive(Debug, Clone)]
pub struct Example {
    pub name: &'static str,
    pub input: &'static str,
    pub text: &'static str,
    pub model: MachineModel,
}

fn load_examples() -> Vec<Example> {
    EXAMPLE_TEXTS
        .iter()
        .filter_map(
            |&(name, input, text)| match DefinitionLoader::load_str(text) {
                Ok(model) => Some(Example {
                    name,
                    input,
                    text,
                    model,
                }),
                Err(e) => {
                    warn!(example = name, error = %e, "failed to parse embedded example");
                    None
                }
            },
        )
        .collect()
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available examples
    pub fn count() -> usize {
        EXAMPLES.len()
    }

    /// Get an example by its index
    pub fn get_by_index(index: usize) -> Result<&'static Example, TuringMachineError> {
        EXAMPLES.get(index).ok_or_else(|| {
            TuringMachineError::ValidationError(format!("Example index {} out of range", index))
        })
    }

    /// Get an example by its name, ignoring case
    pub fn get_by_name(name: &str) -> Result<&'static Example, TuringMachineError> {
        EXAMPLES
            .iter()
            .find(|example| example.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Example '{}' not found", name))
            })
    }

    /// List all example names
    pub fn names() -> Vec<&'static str> {
        EXAMPLES.iter().map(|example| example.name).collect()
    }

    /// Search for examples whose name contains `query`, ignoring case
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        EXAMPLES
            .iter()
            .enumerate()
            .filter(|(_, example)| example.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }
}
