//! Configuration types for the evaluator and top-level sessions

use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PiretConfig {
    pub evaluator: EvaluatorConfig,
    pub session: SessionConfig,
}

/// Evaluator limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Maximum nesting depth of evaluation and calls before `RecursionLimit`
    /// is raised. The default fits a 2 MiB thread stack in debug builds.
    pub max_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig { max_depth: 256 }
    }
}

/// How a `Session` sets up its namespaces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Namespace top-level forms start in
    pub default_namespace: String,
    /// Namespace the native builtins are installed into
    pub builtin_namespace: String,
    /// Install the builtins and refer them from the default namespace
    pub refer_builtins: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_namespace: "user".to_string(),
            builtin_namespace: crate::runtime::stdlib::BUILTIN_NAMESPACE.to_string(),
            refer_builtins: true,
        }
    }
}
