//! # Chroma Shader
//!
//! The compile side of the diagnostic pipeline.
//!
//! The engine prepends one `uniform` declaration per known uniform before
//! handing a stage to the driver. [`CompileInterceptor`] sits between the
//! renderer and the native compiler, measures how many lines were injected,
//! and forwards position-corrected diagnostics to a [`DiagnosticsSink`].
//!
//! ```rust,ignore
//! let mut interceptor = CompileInterceptor::new(gl_compiler, DiagnosticsStore::new());
//! interceptor.set_visible_source(ShaderStage::Fragment, editor_text);
//! let diagnostics = interceptor.compile_stage(ShaderStage::Fragment, &uniforms)?;
//! ```

mod compiler;
mod interceptor;
mod preamble;
mod uniforms;

pub use compiler::{CompilerError, ShaderCompiler};
pub use interceptor::{CompileInterceptor, InterceptError};
pub use preamble::{build_full_source, build_preamble};
pub use uniforms::{
    TextureChannel, Uniform, UniformError, UniformTable, UniformValue, USER_TEXTURE_UNIFORM,
};

pub use chroma_common::ShaderStage;
pub use chroma_diagnostics::{CompileDiagnostic, DiagnosticsSink, DiagnosticsStore};
