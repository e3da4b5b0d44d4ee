use crate::diagnostic::CompileDiagnostic;
use chroma_common::{ShaderStage, StageMap};

/// Receiver of per-stage diagnostics (typically an editor widget).
///
/// An empty slice means "clear this stage", not "nothing happened".
pub trait DiagnosticsSink {
    fn publish(&mut self, stage: ShaderStage, diagnostics: &[CompileDiagnostic]);
}

impl<F> DiagnosticsSink for F
where
    F: FnMut(ShaderStage, &[CompileDiagnostic]),
{
    fn publish(&mut self, stage: ShaderStage, diagnostics: &[CompileDiagnostic]) {
        self(stage, diagnostics)
    }
}

/// Holds the one live diagnostic set per stage
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsStore {
    sets: StageMap<Vec<CompileDiagnostic>>,
    revisions: StageMap<u64>,
}

impl DiagnosticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stage: ShaderStage) -> &[CompileDiagnostic] {
        self.sets.get(stage)
    }

    /// Number of times `stage` has been published to
    pub fn revision(&self, stage: ShaderStage) -> u64 {
        *self.revisions.get(stage)
    }

    pub fn has_errors(&self) -> bool {
        self.sets.iter().any(|(_, set)| !set.is_empty())
    }
}

impl DiagnosticsSink for DiagnosticsStore {
    fn publish(&mut self, stage: ShaderStage, diagnostics: &[CompileDiagnostic]) {
        self.sets.set(stage, diagnostics.to_vec());
        *self.revisions.get_mut(stage) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_replaces_previous_set() {
        let mut store = DiagnosticsStore::new();
        let first = vec![
            CompileDiagnostic::error(ShaderStage::Vertex, 1, "a"),
            CompileDiagnostic::error(ShaderStage::Vertex, 2, "b"),
        ];
        store.publish(ShaderStage::Vertex, &first);
        store.publish(
            ShaderStage::Vertex,
            &[CompileDiagnostic::error(ShaderStage::Vertex, 5, "c")],
        );

        assert_eq!(store.get(ShaderStage::Vertex).len(), 1);
        assert_eq!(store.get(ShaderStage::Vertex)[0].message, "c");
        assert_eq!(store.revision(ShaderStage::Vertex), 2);
    }

    #[test]
    fn test_empty_publish_clears_stage_only() {
        let mut store = DiagnosticsStore::new();
        store.publish(
            ShaderStage::Vertex,
            &[CompileDiagnostic::error(ShaderStage::Vertex, 1, "v")],
        );
        store.publish(
            ShaderStage::Fragment,
            &[CompileDiagnostic::error(ShaderStage::Fragment, 1, "f")],
        );

        store.publish(ShaderStage::Fragment, &[]);

        assert!(store.get(ShaderStage::Fragment).is_empty());
        assert_eq!(store.get(ShaderStage::Vertex).len(), 1);
        assert!(store.has_errors());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |stage: ShaderStage, diags: &[CompileDiagnostic]| {
                seen.push((stage, diags.len()));
            };
            sink.publish(ShaderStage::Fragment, &[]);
        }
        assert_eq!(seen, vec![(ShaderStage::Fragment, 0)]);
    }
}
