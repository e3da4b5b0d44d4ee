use chroma_common::ShaderStage;
use chroma_markdown::image_reference;
use chroma_project::{
    DirectoryStorage, FilePicker, MemoryStorage, PickedFile, Project, ProjectError, ProjectResult,
    Section, SharedProject,
};
use chroma_shader::TextureChannel;
use tempfile::tempdir;
use tokio::sync::oneshot;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\ntexture";

fn edited_project() -> Project {
    let mut project = Project::new();
    project.load_default().unwrap();
    project.set_name("Tides").unwrap();
    project
        .set_shader(ShaderStage::Fragment, "void main() { gl_FragColor = vec4(0.0); }")
        .unwrap();
    project
        .set_texture(TextureChannel::Channel1, PNG.to_vec(), "image/png", None)
        .unwrap();
    let (id, _) = project
        .attach_image(PNG.to_vec(), "image/png", Some("shot.png".into()))
        .unwrap();
    project
        .set_section(0, Section::new("Shot", format!("![shot]({})", image_reference(&id))))
        .unwrap();
    project
}

#[tokio::test]
async fn save_then_load_restores_project() {
    let source = edited_project();
    let mut storage = MemoryStorage::new();
    let outcome = source.save("Tides", &mut storage).await.unwrap();
    assert_eq!(outcome.path.to_str(), Some("Tides.chroma"));
    assert!(outcome.report.excluded.is_empty());

    let mut target = Project::new();
    storage.select("Tides.chroma");
    let report = target.load(&mut storage).await.unwrap();
    assert!(report.missing.is_empty());
    assert!(!report.legacy);

    assert_eq!(target.get().unwrap(), source.get().unwrap());
    assert!(target
        .texture_handle(TextureChannel::Channel1)
        .unwrap()
        .is_some());
    let display = target.section_display(0).unwrap();
    assert!(display.unresolved.is_empty());
    assert!(display.html.contains("blob:chroma/"));
}

#[tokio::test]
async fn cancelled_load_keeps_current_project() {
    let mut project = edited_project();
    let before = project.get().unwrap().clone();
    let handle = project
        .texture_handle(TextureChannel::Channel1)
        .unwrap()
        .cloned()
        .unwrap();

    let mut storage = MemoryStorage::new();
    let err = project.load(&mut storage).await.unwrap_err();
    assert!(err.is_cancelled());

    assert_eq!(project.get().unwrap(), &before);
    assert!(project
        .assets()
        .unwrap()
        .resolve_by_handle(handle.as_str())
        .is_ok());
}

#[tokio::test]
async fn failed_load_keeps_current_project() {
    let mut project = edited_project();
    let before = project.get().unwrap().clone();

    let err = project
        .load_bytes("broken.chroma", b"PK\x03\x04 not really".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ProjectError::InvalidManifest { .. }));

    let err = project
        .load_bytes("notes.txt", b"hello".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ProjectError::UnknownFormat { .. }));

    assert_eq!(project.get().unwrap(), &before);
}

#[tokio::test]
async fn reload_revokes_previous_handles() {
    let mut project = edited_project();
    let old = project
        .texture_handle(TextureChannel::Channel1)
        .unwrap()
        .cloned()
        .unwrap();

    let mut storage = MemoryStorage::new();
    project.save("again", &mut storage).await.unwrap();
    storage.select("again.chroma");
    project.load(&mut storage).await.unwrap();

    let assets = project.assets().unwrap();
    assert!(assets.resolve_by_handle(old.as_str()).is_err());
    let new = project
        .texture_handle(TextureChannel::Channel1)
        .unwrap()
        .unwrap();
    assert_ne!(new, &old);
}

#[tokio::test]
async fn legacy_json_is_accepted() {
    let mut project = Project::new();
    let json = br#"{
        "ProjectName": "Old",
        "Shaders": { "Vertex": "v", "Fragment": "f" },
        "Section": { "Title": "T", "Content": "C" }
    }"#;
    let report = project.load_bytes("old.json", json.to_vec()).await.unwrap();
    assert!(report.legacy);
    assert_eq!(project.name().unwrap(), "Old");
    assert_eq!(project.shader(ShaderStage::Vertex).unwrap(), "v");
}

#[tokio::test]
async fn save_requires_loaded_project() {
    let project = Project::new();
    let mut storage = MemoryStorage::new();
    let err = project.save("x", &mut storage).await.unwrap_err();
    assert!(matches!(err, ProjectError::NotLoaded));
    assert_eq!(storage.names().count(), 0);
}

#[tokio::test]
async fn directory_storage_round_trip() {
    let dir = tempdir().unwrap();
    let mut storage = DirectoryStorage::new(dir.path());

    let source = edited_project();
    let outcome = source.save("disk", &mut storage).await.unwrap();
    assert!(outcome.path.exists());

    let mut target = Project::new();
    storage.select("disk.chroma");
    target.load(&mut storage).await.unwrap();
    assert_eq!(target.get().unwrap(), source.get().unwrap());
}

/// Picker that blocks until released, to hold the project lock
struct GatedPicker {
    entered: Option<oneshot::Sender<()>>,
    release: Option<oneshot::Receiver<()>>,
    file: Option<PickedFile>,
}

impl FilePicker for GatedPicker {
    async fn pick(&mut self) -> ProjectResult<Option<PickedFile>> {
        if let Some(entered) = self.entered.take() {
            let _ = entered.send(());
        }
        if let Some(release) = self.release.take() {
            let _ = release.await;
        }
        Ok(self.file.take())
    }
}

#[tokio::test]
async fn concurrent_operations_are_rejected_or_queued() {
    let mut bytes_source = MemoryStorage::new();
    edited_project()
        .save("gated", &mut bytes_source)
        .await
        .unwrap();
    let bytes = bytes_source.get("gated.chroma").unwrap().to_vec();

    let mut initial = Project::new();
    initial.load_default().unwrap();
    let shared = SharedProject::new(initial);

    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    let mut picker = GatedPicker {
        entered: Some(entered_tx),
        release: Some(release_rx),
        file: Some(PickedFile::new("gated.chroma", bytes)),
    };

    let loader = shared.clone();
    let load = tokio::spawn(async move { loader.load(&mut picker).await });
    entered_rx.await.unwrap();

    let mut storage = MemoryStorage::new();
    let err = shared.try_save("during", &mut storage).await.unwrap_err();
    assert!(matches!(err, ProjectError::Busy));
    let mut idle = MemoryStorage::new();
    let err = shared.try_load(&mut idle).await.unwrap_err();
    assert!(matches!(err, ProjectError::Busy));

    release_tx.send(()).unwrap();

    // Queued save runs once the load has finished
    let outcome = shared.save("after", &mut storage).await.unwrap();
    assert_eq!(outcome.path.to_str(), Some("after.chroma"));
    load.await.unwrap().unwrap();

    assert_eq!(shared.lock().await.name().unwrap(), "Tides");
}
