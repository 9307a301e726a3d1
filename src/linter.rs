//! Schema linting - static analysis of portable schema files.
//!
//! Checks schema files for:
//! - JSON syntax errors
//! - `$ref` pointers that cannot be expanded
//! - shapes the backward compiler rejects (unions, arrays, recursion)

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::backward::{build_schema, BuildOptions};
use crate::error::BridgeError;
use crate::loader::{load_schema, navigate_fragment};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/items")
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(code: &str, file: &Path, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            file: file.to_path_buf(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        for diagnostic in &file_result.diagnostics {
            match diagnostic.severity {
                Severity::Error => total_errors += 1,
                Severity::Warning => total_warnings += 1,
            }
        }
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let display = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let schema = match load_schema(file) {
        Ok(s) => s,
        Err(e) => {
            return FileResult {
                file: display,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic::error("E001", file, "/", format!("syntax error: {}", e))],
            };
        }
    };

    let mut diagnostics = Vec::new();
    check_refs(&schema, file, "", &schema, &mut diagnostics);

    // Shape checks need a fully expandable document.
    if diagnostics.is_empty() {
        if let Err(err) = build_schema(&schema, &BuildOptions::default()) {
            diagnostics.push(build_diagnostic(&err, file));
        }
    }

    if schema.get("title").is_none() && schema.get("$ref").is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: "W002".to_string(),
            file: file.to_path_buf(),
            path: "/".to_string(),
            message: "root schema missing title; the model will use a default name".to_string(),
        });
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: display,
        status,
        diagnostics,
    }
}

/// Recursively check $ref values in a schema.
fn check_refs(value: &Value, file: &Path, path: &str, root: &Value, diagnostics: &mut Vec<Diagnostic>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_val)) = map.get("$ref") {
                if !ref_val.starts_with('#') {
                    diagnostics.push(Diagnostic::error(
                        "E003",
                        file,
                        path,
                        format!("external reference cannot be expanded: {}", ref_val),
                    ));
                } else if navigate_fragment(root, ref_val).is_err() {
                    diagnostics.push(Diagnostic::error(
                        "E003",
                        file,
                        path,
                        format!("anchor not found: {}", ref_val),
                    ));
                }
            }

            for (key, val) in map {
                let child_path = format!("{}/{}", path, key);
                check_refs(val, file, &child_path, root, diagnostics);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                check_refs(item, file, &child_path, root, diagnostics);
            }
        }
        _ => {}
    }
}

fn build_diagnostic(err: &BridgeError, file: &Path) -> Diagnostic {
    let code = match err {
        BridgeError::UnresolvedReference { .. } => "E003",
        BridgeError::UnsupportedUnionShape { .. } => "E006",
        BridgeError::UnsupportedArrayElement { .. } => "E007",
        BridgeError::UnsupportedRecursion { .. } => "E008",
        _ => "E009",
    };
    let path = match err.path().map(|p| p.trim_start_matches('#')) {
        Some("") | None => "/",
        Some(p) => p,
    };
    Diagnostic::error(code, file, path, err.to_string())
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn lint_str(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    fn codes(result: &FileResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn lint_valid_schema() {
        let result = lint_str(
            r##"{
                "title": "Invoice",
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "customer": { "$ref": "#/$defs/Customer" }
                },
                "$defs": {
                    "Customer": { "type": "object", "properties": { "name": { "type": "string" } } }
                }
            }"##,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_str("{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(codes(&result), vec!["E001"]);
    }

    #[test]
    fn lint_broken_internal_ref() {
        let result = lint_str(
            r##"{
                "title": "T",
                "type": "object",
                "properties": { "data": { "$ref": "#/$defs/missing" } }
            }"##,
        );
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E003");
        assert_eq!(result.diagnostics[0].path, "/properties/data");
    }

    #[test]
    fn lint_external_ref() {
        let result = lint_str(
            r#"{
                "title": "T",
                "properties": { "data": { "$ref": "types.json#/$defs/thing" } }
            }"#,
        );
        assert!(codes(&result).contains(&"E003"));
    }

    #[test]
    fn lint_unsupported_union() {
        let result = lint_str(
            r#"{
                "title": "T",
                "type": "object",
                "properties": {
                    "v": { "anyOf": [{ "type": "string" }, { "type": "integer" }] }
                }
            }"#,
        );
        assert_eq!(codes(&result), vec!["E006"]);
        assert_eq!(result.diagnostics[0].path, "/properties/v");
    }

    #[test]
    fn lint_scalar_array() {
        let result = lint_str(
            r#"{
                "title": "T",
                "type": "object",
                "properties": { "tags": { "type": "array", "items": { "type": "string" } } }
            }"#,
        );
        assert_eq!(codes(&result), vec!["E007"]);
    }

    #[test]
    fn lint_recursion_without_object_boundary() {
        let result = lint_str(
            r##"{
                "title": "T",
                "type": "object",
                "properties": { "nested": { "$ref": "#/$defs/List" } },
                "$defs": { "List": { "type": "array", "items": { "$ref": "#/$defs/List" } } }
            }"##,
        );
        assert_eq!(codes(&result), vec!["E008"]);
    }

    #[test]
    fn lint_missing_title_warning() {
        let result = lint_str(r#"{ "type": "object", "properties": {} }"#);
        assert_eq!(result.status, FileStatus::Warning);
        assert_eq!(codes(&result), vec!["W002"]);
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("valid.json"),
            r#"{"title": "Valid", "type": "object"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.json");
        std::fs::write(&file_path, r#"{"type": "object"}"#).unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
