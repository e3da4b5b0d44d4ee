use crate::uniforms::UniformTable;
use std::fmt::Write;

/// One `uniform <type> <name>;` line per declared uniform, sorted by name.
pub fn build_preamble(uniforms: &UniformTable) -> String {
    let mut preamble = String::new();
    for (name, ty) in uniforms.declarations() {
        let _ = writeln!(preamble, "uniform {} {};", ty, name);
    }
    preamble
}

/// Source submitted to the driver: preamble followed by the user's code.
pub fn build_full_source(uniforms: &UniformTable, visible_source: &str) -> String {
    let mut full = build_preamble(uniforms);
    full.push_str(visible_source);
    full
}
