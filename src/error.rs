use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Program model error in {source_name}: {message}")]
    Program {
        source_name: String,
        message: String,
    },

    #[error("No program model found at: {0}")]
    NoProgram(String),

    #[error("Rule error ({rule}): {message}")]
    Rule { rule: String, message: String },

    #[error("Unsupported rule file format: {0}")]
    RuleFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
