use crate::compiler::{CompilerError, ShaderCompiler};
use crate::preamble::build_full_source;
use crate::uniforms::UniformTable;
use chroma_common::{line_count, ShaderStage, StageError, StageMap};
use chroma_diagnostics::{CompileDiagnostic, DiagnosticMapper, DiagnosticsSink};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterceptError {
    #[error("Cannot route diagnostics: {0}")]
    Stage(#[from] StageError),

    #[error("Compiler error: {0}")]
    Compiler(#[from] CompilerError),
}

/// Wraps a [`ShaderCompiler`] and reports mapped diagnostics per stage.
///
/// The interceptor owns the visible source of each stage as shown in the
/// editor; the renderer only ever hands it the full source.
pub struct CompileInterceptor<C, S> {
    compiler: C,
    sink: S,
    mapper: DiagnosticMapper,
    visible: StageMap<String>,
}

impl<C, S> CompileInterceptor<C, S>
where
    C: ShaderCompiler,
    S: DiagnosticsSink,
{
    pub fn new(compiler: C, sink: S) -> Self {
        Self::with_mapper(compiler, sink, DiagnosticMapper::default())
    }

    pub fn with_mapper(compiler: C, sink: S, mapper: DiagnosticMapper) -> Self {
        Self {
            compiler,
            sink,
            mapper,
            visible: StageMap::default(),
        }
    }

    /// Record what the editor currently shows for `stage`
    pub fn set_visible_source(&mut self, stage: ShaderStage, source: impl Into<String>) {
        self.visible.set(stage, source.into());
    }

    pub fn visible_source(&self, stage: ShaderStage) -> &str {
        self.visible.get(stage)
    }

    /// Lines injected ahead of the visible source, never negative
    pub fn line_offset(&self, full_source: &str, stage: ShaderStage) -> usize {
        let full = line_count(full_source);
        let visible = line_count(self.visible.get(stage));
        if full < visible {
            warn!(%stage, full, visible, "Full source is shorter than visible source");
        }
        full.saturating_sub(visible)
    }

    /// Compile `full_source` natively and publish its diagnostics.
    ///
    /// The returned list is also sent to the sink; an empty list clears the
    /// stage in the editor. Only a failing compiler call is an error.
    #[instrument(level = "debug", skip(self, full_source))]
    pub fn on_native_compile(
        &mut self,
        full_source: &str,
        stage: ShaderStage,
    ) -> Result<Vec<CompileDiagnostic>, CompilerError> {
        let log = self.compiler.compile(stage, full_source)?;
        let line_offset = self.line_offset(full_source, stage);

        let diagnostics = self
            .mapper
            .map(&log, line_offset, self.visible.get(stage), stage);

        debug!(line_offset, count = diagnostics.len(), "Publishing diagnostics");
        self.sink.publish(stage, &diagnostics);
        Ok(diagnostics)
    }

    /// Same as [`Self::on_native_compile`] for callers that only hold the
    /// native GL shader type.
    pub fn on_native_compile_gl(
        &mut self,
        full_source: &str,
        gl_shader_type: u32,
    ) -> Result<Vec<CompileDiagnostic>, InterceptError> {
        let stage = ShaderStage::from_gl_enum(gl_shader_type)?;
        Ok(self.on_native_compile(full_source, stage)?)
    }

    /// Prepend the uniform declarations to the visible source and compile.
    pub fn compile_stage(
        &mut self,
        stage: ShaderStage,
        uniforms: &UniformTable,
    ) -> Result<Vec<CompileDiagnostic>, CompilerError> {
        let full = build_full_source(uniforms, self.visible.get(stage));
        self.on_native_compile(&full, stage)
    }

    /// Compile both stages, vertex first
    pub fn compile_all(
        &mut self,
        uniforms: &UniformTable,
    ) -> Result<StageMap<Vec<CompileDiagnostic>>, CompilerError> {
        let vertex = self.compile_stage(ShaderStage::Vertex, uniforms)?;
        let fragment = self.compile_stage(ShaderStage::Fragment, uniforms)?;
        Ok(StageMap::new(vertex, fragment))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn compiler_mut(&mut self) -> &mut C {
        &mut self.compiler
    }

    pub fn into_parts(self) -> (C, S) {
        (self.compiler, self.sink)
    }
}
