use chroma_common::ShaderStage;
use thiserror::Error;

/// Errors raised by the native compiler itself (not by the shader code)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    #[error("Shader compiler unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to create {stage} shader object")]
    CreateFailed { stage: ShaderStage },
}

/// Capability to compile one shader stage.
///
/// Implementations wrap the platform call (`glCompileShader` and
/// friends) and return the driver's info log verbatim. An empty log
/// means the stage compiled cleanly.
pub trait ShaderCompiler {
    fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<String, CompilerError>;
}

impl<C: ShaderCompiler + ?Sized> ShaderCompiler for Box<C> {
    fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<String, CompilerError> {
        (**self).compile(stage, source)
    }
}
