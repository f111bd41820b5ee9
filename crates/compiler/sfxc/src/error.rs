use sfxir::module::ParamModifier;
use thiserror::Error;

use crate::backend::BackendError;

/// A failure that aborts compilation.
///
/// Every variant carries a stable code (see [CompileError::code]) that is part of its message.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("DFX0001: module `{module}` includes `{include}`, which does not exist")]
    MissingInclude { module: String, include: String },
    #[error("DFX0002: module `{module}` references undeclared textures: {}", .textures.join(", "))]
    UnresolvedTextures {
        module: String,
        textures: Vec<String>,
    },
    #[error("SC0001: effect `{effect}` in module `{module}` uses unknown vertex program `{entry_point}`")]
    MissingVertexProgram {
        module: String,
        effect: String,
        entry_point: String,
    },
    #[error("SC0002: effect `{effect}` in module `{module}` uses unknown pixel program `{entry_point}`")]
    MissingPixelProgram {
        module: String,
        effect: String,
        entry_point: String,
    },
    #[error("SC0003: effect `{effect}` in module `{module}` uses unknown input layout `{layout}`")]
    MissingInputLayout {
        module: String,
        effect: String,
        layout: String,
    },
    #[error("SC0004: effect `{effect}` in module `{module}` uses unknown output layout `{layout}`")]
    MissingOutputLayout {
        module: String,
        effect: String,
        layout: String,
    },
    #[error("SC0005: template type `{declared}` of `{function}` has no implementation in module `{module}`")]
    IncompleteTemplateType {
        module: String,
        function: String,
        declared: String,
    },
    #[error("SC0006: effect `{effect}` in module `{module}` derives from unknown template `{template}`")]
    MissingTemplate {
        module: String,
        effect: String,
        template: String,
    },
    #[error("SC0007: effect `{effect}` is bound twice for template `{template}` and variant {variant} (module `{module}`)")]
    DuplicateEffect {
        module: String,
        effect: String,
        template: String,
        variant: String,
    },
    #[error("SC0008: argument {argument} of call to `{function}` at line {line} in module `{module}` must be passed as {expected:?}, found {found:?}")]
    ArgumentModifierMismatch {
        module: String,
        function: String,
        line: u32,
        argument: usize,
        expected: ParamModifier,
        found: ParamModifier,
    },
    #[error("SC0010: effect `{effect}` in module `{module}` derives from template `{template}`, which has no implementation")]
    UnimplementedTemplate {
        module: String,
        effect: String,
        template: String,
    },
    #[error("SC0011: template chain of effect `{effect}` in module `{module}` loops back to `{template}`")]
    TemplateCycle {
        module: String,
        effect: String,
        template: String,
    },
    #[error("BE0002: failed to allocate input `{input}` of module `{module}`: {source}")]
    Allocation {
        module: String,
        input: String,
        #[source]
        source: BackendError,
    },
    #[error("BE0001: failed to compile program `{program}`: {source}")]
    Backend {
        program: String,
        #[source]
        source: BackendError,
    },
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::MissingInclude { .. } => "DFX0001",
            CompileError::UnresolvedTextures { .. } => "DFX0002",
            CompileError::MissingVertexProgram { .. } => "SC0001",
            CompileError::MissingPixelProgram { .. } => "SC0002",
            CompileError::MissingInputLayout { .. } => "SC0003",
            CompileError::MissingOutputLayout { .. } => "SC0004",
            CompileError::IncompleteTemplateType { .. } => "SC0005",
            CompileError::MissingTemplate { .. } => "SC0006",
            CompileError::DuplicateEffect { .. } => "SC0007",
            CompileError::ArgumentModifierMismatch { .. } => "SC0008",
            CompileError::UnimplementedTemplate { .. } => "SC0010",
            CompileError::TemplateCycle { .. } => "SC0011",
            CompileError::Backend { .. } => "BE0001",
            CompileError::Allocation { .. } => "BE0002",
        }
    }

    /// The module in which the error was detected, if it originates from one.
    pub fn module(&self) -> Option<&str> {
        match self {
            CompileError::MissingInclude { module, .. }
            | CompileError::UnresolvedTextures { module, .. }
            | CompileError::MissingVertexProgram { module, .. }
            | CompileError::MissingPixelProgram { module, .. }
            | CompileError::MissingInputLayout { module, .. }
            | CompileError::MissingOutputLayout { module, .. }
            | CompileError::IncompleteTemplateType { module, .. }
            | CompileError::MissingTemplate { module, .. }
            | CompileError::DuplicateEffect { module, .. }
            | CompileError::ArgumentModifierMismatch { module, .. }
            | CompileError::UnimplementedTemplate { module, .. }
            | CompileError::TemplateCycle { module, .. }
            | CompileError::Allocation { module, .. } => Some(module),
            CompileError::Backend { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_starts_with_code() {
        let err = CompileError::UnresolvedTextures {
            module: "Main".to_string(),
            textures: vec!["Albedo".to_string(), "Normals".to_string()],
        };

        assert_eq!(err.code(), "DFX0002");
        assert_eq!(
            err.to_string(),
            "DFX0002: module `Main` references undeclared textures: Albedo, Normals"
        );
        assert_eq!(err.module(), Some("Main"));
    }
}
