use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::{ModelFormat, ProgramLoader};
use crate::analysis::constant_propagation::ConstantPropagation;
use crate::error::{Result, ScanError};
use crate::ir::body::{Body, Invocation};
use crate::ir::{CallSiteId, MethodId, Program, ProgramBuilder};

/// Suffix of program-model files discovered in directories.
pub const MODEL_SUFFIX: &str = ".program.json";

/// Serialized program model, one file per compilation unit or module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassFile {
    pub name: String,
    #[serde(default)]
    pub source_file: Option<PathBuf>,
    #[serde(default)]
    pub methods: Vec<MethodFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodFile {
    pub name: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "default_concrete")]
    pub concrete: bool,
    /// Absent when the body could not be extracted.
    #[serde(default)]
    pub body: Option<Body>,
}

fn default_concrete() -> bool {
    true
}

/// Loads `*.program.json` models, from a single file or a directory tree.
pub struct JsonModelLoader;

impl ProgramLoader for JsonModelLoader {
    fn format(&self) -> ModelFormat {
        ModelFormat::Json
    }

    fn detect(&self, path: &Path) -> bool {
        if path.is_file() {
            return path.extension().is_some_and(|e| e == "json");
        }
        path.is_dir() && !model_files(path).is_empty()
    }

    fn load(&self, path: &Path) -> Result<Program> {
        if path.is_file() {
            let file = read_model(path)?;
            let name = file
                .name
                .clone()
                .unwrap_or_else(|| display_name(path));
            return lower(&name, vec![(path.display().to_string(), file)]);
        }

        let mut files = Vec::new();
        for entry in model_files(path) {
            match read_model(&entry) {
                Ok(file) => files.push((entry.display().to_string(), file)),
                Err(e) => {
                    tracing::warn!(
                        file = %entry.display(),
                        error = %e,
                        "unreadable program model, skipping"
                    );
                }
            }
        }
        if files.is_empty() {
            return Err(ScanError::NoProgram(path.display().to_string()));
        }
        lower(&display_name(path), files)
    }
}

/// Every model file below `root`, sorted by path.
fn model_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(MODEL_SUFFIX))
        .map(|e| e.into_path())
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| {
            let n = n.to_string_lossy();
            n.strip_suffix(MODEL_SUFFIX).unwrap_or(&*n).to_string()
        })
        .unwrap_or_else(|| "unknown".into())
}

fn read_model(path: &Path) -> Result<ProgramFile> {
    let content = std::fs::read_to_string(path)?;
    parse(&content, &path.display().to_string())
}

/// Parse one model document.
pub fn parse(content: &str, source_name: &str) -> Result<ProgramFile> {
    serde_json::from_str(content).map_err(|e| ScanError::Program {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

/// Build a `Program` from parsed model files.
///
/// Declares every class and method first so calls can target methods from
/// any file, then lowers each body with constant propagation and records
/// call-graph edges in method order, then call-site order.
pub fn lower(name: &str, files: Vec<(String, ProgramFile)>) -> Result<Program> {
    let mut builder = ProgramBuilder::new(name);
    let mut bodies: Vec<(MethodId, String, Body)> = Vec::new();

    for (source_name, file) in files {
        for class in file.classes {
            builder.class(&class.name, class.source_file.clone());
            for method in class.methods {
                let has_body = method.body.is_some();
                let id = builder.add_method(
                    &class.name,
                    &method.name,
                    method.signature,
                    method.parameters,
                    method.concrete,
                    has_body.then(Vec::new),
                );
                if let Some(body) = method.body {
                    bodies.push((id, source_name.clone(), body));
                }
            }
        }
    }

    let mut by_name: HashMap<String, Vec<(MethodId, usize)>> = HashMap::new();
    for m in builder.methods() {
        by_name
            .entry(m.qualified_name.clone())
            .or_default()
            .push((m.id, m.parameters.len()));
    }

    for (method, source_name, body) in &bodies {
        validate_body(body, source_name, *method)?;
        let facts = ConstantPropagation::analyze(body);
        for (stmt, invocation) in body.invocations() {
            let args = invocation
                .args
                .iter()
                .map(|op| facts.lower(stmt, op))
                .collect();
            let site = builder.call(
                *method,
                &invocation.declaring_type,
                &invocation.method,
                args,
                invocation.line,
            );
            for callee in resolve_callees(invocation, &by_name) {
                builder.edge(site, callee);
            }
            warn_unknown_callees(invocation, &by_name, site);
        }
    }

    Ok(builder.build())
}

fn validate_body(body: &Body, source_name: &str, method: MethodId) -> Result<()> {
    let Some(successors) = &body.successors else {
        return Ok(());
    };
    let n = body.statements.len();
    let fail = |message: String| ScanError::Program {
        source_name: source_name.to_string(),
        message: format!("method #{}: {message}", method.0),
    };
    if successors.len() != n {
        return Err(fail(format!(
            "{} successor lists for {} statements",
            successors.len(),
            n
        )));
    }
    if let Some(bad) = successors.iter().flatten().find(|&&s| s >= n) {
        return Err(fail(format!("successor index {bad} out of range")));
    }
    Ok(())
}

/// In-program dispatch targets of an invocation.
///
/// Explicit `callees` are trusted as given (narrowed by arity when a name is
/// overloaded); otherwise the invocation binds statically to the declared
/// method.
fn resolve_callees(
    invocation: &Invocation,
    by_name: &HashMap<String, Vec<(MethodId, usize)>>,
) -> Vec<MethodId> {
    let arity = invocation.args.len();
    let pick = |name: &str| -> Vec<MethodId> {
        let Some(candidates) = by_name.get(name) else {
            return Vec::new();
        };
        let exact: Vec<MethodId> = candidates
            .iter()
            .filter(|(_, n)| *n == arity)
            .map(|(id, _)| *id)
            .collect();
        if exact.is_empty() && candidates.len() == 1 {
            vec![candidates[0].0]
        } else {
            exact
        }
    };

    match &invocation.callees {
        Some(names) => names.iter().flat_map(|n| pick(n)).collect(),
        None => pick(&format!(
            "{}.{}",
            invocation.declaring_type, invocation.method
        )),
    }
}

fn warn_unknown_callees(
    invocation: &Invocation,
    by_name: &HashMap<String, Vec<(MethodId, usize)>>,
    site: CallSiteId,
) {
    let Some(names) = &invocation.callees else {
        return;
    };
    for name in names.iter().filter(|n| !by_name.contains_key(n.as_str())) {
        tracing::warn!(
            callee = %name,
            method = site.method.0,
            call_site = site.index,
            "callee not in program model, edge dropped"
        );
    }
}
