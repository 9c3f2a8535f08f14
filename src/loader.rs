//! This module provides the `DefinitionLoader` struct, responsible for loading machine
//! definitions from files, directories and strings.

use crate::analyzer::analyze;
use crate::model::MachineModel;
use crate::parser::parse;
use crate::types::TuringMachineError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File extensions recognized by [`DefinitionLoader::load_directory`].
pub const DEFINITION_EXTENSIONS: [&str; 4] = ["yaml", "yml", "tm", "json"];

/// `DefinitionLoader` is a utility struct for loading machine definitions.
/// JSON files are read with `serde_json`; everything else goes through the notation parser.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a single definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineModel)` if the file is read, parsed and validated.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError)` or `JsonError` for syntax errors.
    /// * `Err(TuringMachineError::Definition)` if the definition is invalid.
    pub fn load_file(path: &Path) -> Result<MachineModel, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let raw = if is_json(path) {
            parse_json(&content)?
        } else {
            parse(&content)?
        };

        let model = Self::load_value(&raw)?;
        info!(
            path = %path.display(),
            transitions = model.transitions().len(),
            "loaded machine definition"
        );

        Ok(model)
    }

    /// Loads a definition written in the machine notation.
    pub fn load_str(content: &str) -> Result<MachineModel, TuringMachineError> {
        Self::load_value(&parse(content)?)
    }

    /// Loads a definition written as JSON.
    pub fn load_json(content: &str) -> Result<MachineModel, TuringMachineError> {
        Self::load_value(&parse_json(content)?)
    }

    /// Validates an already deserialized definition and logs any analyzer findings.
    pub fn load_value(raw: &Value) -> Result<MachineModel, TuringMachineError> {
        let model = MachineModel::from_value(raw)?;

        for diagnostic in analyze(&model) {
            warn!(%diagnostic, "suspicious machine definition");
        }

        Ok(model)
    }

    /// Loads every definition file in `directory`.
    ///
    /// Subdirectories and files without a recognized extension are skipped. Each element of
    /// the result is either the path and its model, or the error for that file.
    pub fn load_directory(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, MachineModel), TuringMachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                if path.is_dir() || !has_definition_extension(&path) {
                    return None;
                }

                Some(Self::load_file(&path).map(|model| (path, model)))
            })
            .collect();

        // `read_dir` order is platform dependent
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        results
    }
}

fn parse_json(content: &str) -> Result<Value, TuringMachineError> {
    serde_json::from_str(content).map_err(|e| TuringMachineError::JsonError(e.to_string()))
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn has_definition_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DEFINITION_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DefinitionError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "start: q0\naccept: [yes]\ntransitions:\n  - from: q0\n    read: a\n    to: yes\n    write: a\n    move: S\n";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "machine.yaml", VALID);

        let model = DefinitionLoader::load_file(&path).unwrap();
        assert_eq!(model.start(), "q0");
        assert!(model.is_accepting("yes"));
        assert_eq!(model.transitions().len(), 1);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "machine.json",
            r#"{"start": "q0", "transitions": [{"from": "q0", "read": "a", "to": "q1", "write": "b", "move": "R"}]}"#,
        );

        let model = DefinitionLoader::load_file(&path).unwrap();
        assert_eq!(model.transitions()[0].write, "b");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "broken.yaml", "This is not a definition");

        assert!(matches!(
            DefinitionLoader::load_file(&path),
            Err(TuringMachineError::ParseError(_))
        ));

        let path = write_file(dir.path(), "broken.json", "{ start: ");
        assert!(matches!(
            DefinitionLoader::load_file(&path),
            Err(TuringMachineError::JsonError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = DefinitionLoader::load_file(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(TuringMachineError::FileError(_))));
    }

    #[test]
    fn test_load_str_reports_definition_errors() {
        let result = DefinitionLoader::load_str("accept: [yes]\ntransitions: []");
        assert_eq!(
            result,
            Err(TuringMachineError::Definition(DefinitionError::MissingStart))
        );
    }

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a_valid.yaml", VALID);
        write_file(dir.path(), "b_valid.json", r#"{"start": "s", "transitions": []}"#);
        write_file(dir.path(), "c_invalid.tm", "start: q0\n");
        write_file(dir.path(), "ignored.txt", "This file should be ignored");
        fs::create_dir(dir.path().join("nested.yaml")).unwrap();

        let results = DefinitionLoader::load_directory(dir.path());
        assert_eq!(results.len(), 3);

        let loaded: Vec<_> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|(path, _)| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(loaded, vec!["a_valid.yaml", "b_valid.json"]);
        assert!(results[2].is_err());
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = tempdir().unwrap();
        let results = DefinitionLoader::load_directory(&dir.path().join("nope"));

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(TuringMachineError::FileError(_))));
    }
}
