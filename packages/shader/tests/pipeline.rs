//! End-to-end: editor text → preamble → fake driver → editor diagnostics

use chroma_shader::{
    CompileInterceptor, CompilerError, DiagnosticsStore, ShaderCompiler, ShaderStage,
    UniformTable, UniformValue,
};

/// Flags every identifier starting with `missing_` the way ANGLE would
struct FakeDriver;

impl ShaderCompiler for FakeDriver {
    fn compile(&mut self, _stage: ShaderStage, source: &str) -> Result<String, CompilerError> {
        let mut log = String::new();
        for (idx, line) in source.split('\n').enumerate() {
            if let Some(pos) = line.find("missing_") {
                let ident: String = line[pos..]
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                log.push_str(&format!(
                    "ERROR: 0:{}: '{}' : undeclared identifier\n",
                    idx + 1,
                    ident
                ));
            }
        }
        log.push('\0');
        Ok(log)
    }
}

const FRAGMENT: &str = "precision mediump float;\n\
void main() {\n\
    vec2 uv = gl_FragCoord.xy / u_screenResolution;\n\
    gl_FragColor = vec4(uv, missing_blue, 1.0);\n\
}\n";

#[test]
fn test_errors_land_on_visible_lines() {
    let mut uniforms = UniformTable::new();
    uniforms.set_user("u_strength", UniformValue::Float(0.5)).unwrap();

    let mut interceptor = CompileInterceptor::new(FakeDriver, DiagnosticsStore::new());
    interceptor.set_visible_source(ShaderStage::Fragment, FRAGMENT);
    interceptor.set_visible_source(ShaderStage::Vertex, "void main() {\n  gl_Position = vec4(0.0);\n}");

    let all = interceptor.compile_all(&uniforms).unwrap();

    assert!(all.vertex.is_empty());
    assert_eq!(all.fragment.len(), 1);

    let diag = &all.fragment[0];
    assert_eq!(diag.line, 4);
    assert_eq!(diag.message, "ERROR: 0:4: 'missing_blue' : undeclared identifier");

    let range = diag.buffer_range(FRAGMENT);
    assert_eq!(&FRAGMENT[range], "missing_blue");

    let store = interceptor.sink();
    assert!(store.get(ShaderStage::Vertex).is_empty());
    assert_eq!(store.get(ShaderStage::Fragment), all.fragment.as_slice());
}

#[test]
fn test_fixing_the_error_clears_diagnostics() {
    let uniforms = UniformTable::new();
    let mut interceptor = CompileInterceptor::new(FakeDriver, DiagnosticsStore::new());

    interceptor.set_visible_source(ShaderStage::Fragment, FRAGMENT);
    interceptor.compile_stage(ShaderStage::Fragment, &uniforms).unwrap();
    assert!(interceptor.sink().has_errors());

    interceptor.set_visible_source(ShaderStage::Fragment, FRAGMENT.replace("missing_blue", "0.5"));
    let diags = interceptor.compile_stage(ShaderStage::Fragment, &uniforms).unwrap();

    assert!(diags.is_empty());
    assert!(!interceptor.sink().has_errors());
}
