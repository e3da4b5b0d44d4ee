use chroma_assets::AssetTable;
use chroma_common::ShaderStage;
use chroma_markdown::{image_reference, storage_references};
use chroma_project::{
    decode, encode, read_archive, Geometry, ProjectDocument, Section, FORMAT_VERSION,
};
use chroma_shader::{TextureChannel, UniformValue};
use std::io::{Cursor, Read, Write};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfirst";
const JPEG: &[u8] = b"\xFF\xD8\xFFsecond";

fn sample() -> (ProjectDocument, AssetTable) {
    let mut assets = AssetTable::new();
    let (logo, _) = assets.add(PNG.to_vec(), "image/png", Some("logo.png".into()));
    let (noise, _) = assets.add(JPEG.to_vec(), "image/jpeg", None);

    let mut doc = ProjectDocument::new(
        "Ocean",
        "void main() { gl_Position = vec4(0.0); }",
        "void main() { gl_FragColor = vec4(1.0); }",
    )
    .with_section(Section::new(
        "Intro",
        format!("# Ocean\n\n![logo]({})", image_reference(&logo)),
    ))
    .with_section(Section::new("Plain", "No images here."));
    doc.textures.set(TextureChannel::Channel0, noise.to_string());
    doc.uniforms.insert("u_depth".into(), UniformValue::Vec2([0.25, 4.0]));
    doc.scene.background = [0.1, 0.2, 0.3];
    doc.scene.geometry = Geometry::Box {
        width: 0.2,
        height: 0.7,
        depth: 0.2,
    };

    (doc, assets)
}

#[test]
fn round_trip_preserves_document_and_references() {
    let (doc, assets) = sample();
    let (bytes, report) = encode(&doc, &assets).unwrap();
    assert!(report.excluded.is_empty());
    assert!(report.unresolved.is_empty());
    assert_eq!(report.written.len(), 2);

    let (back, back_assets) = decode(&bytes).unwrap();
    assert_eq!(back, doc);
    assert_eq!(back.shader(ShaderStage::Vertex), doc.shader(ShaderStage::Vertex));

    for id in storage_references(&back.sections[0].content) {
        assert_eq!(back_assets.get(&id).unwrap(), assets.get(&id).unwrap());
        assert!(back_assets.handle_of(&id).is_ok());
    }
    let texture = back.textures.get(TextureChannel::Channel0).unwrap();
    let texture_id = chroma_assets::AssetId::parse(texture).unwrap();
    assert_eq!(back_assets.get(&texture_id).unwrap(), JPEG);
    assert_eq!(back_assets.record(&texture_id).unwrap().mime, "image/jpeg");
}

#[test]
fn repeated_round_trips_are_stable() {
    let (doc, assets) = sample();
    let (bytes, _) = encode(&doc, &assets).unwrap();
    let (once, once_assets) = decode(&bytes).unwrap();
    let (bytes, _) = encode(&once, &once_assets).unwrap();
    let (twice, _) = decode(&bytes).unwrap();
    assert_eq!(twice, doc);
}

#[test]
fn encode_does_not_modify_inputs() {
    let (doc, assets) = sample();
    let before = doc.clone();
    let generation = assets.generation();
    encode(&doc, &assets).unwrap();
    assert_eq!(doc, before);
    assert_eq!(assets.generation(), generation);
    assert_eq!(assets.len(), 2);
}

#[test]
fn manifest_uses_archive_paths() {
    let (doc, assets) = sample();
    let (bytes, report) = encode(&doc, &assets).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
    let mut json = String::new();
    archive
        .by_name("manifest.json")
        .unwrap()
        .read_to_string(&mut json)
        .unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(manifest["formatVersion"], FORMAT_VERSION);
    assert!(manifest["savedAt"].is_string());
    let texture_path = manifest["document"]["textures"]["iChannel0"].as_str().unwrap();
    assert!(texture_path.starts_with("textures/") && texture_path.ends_with(".jpg"));
    let intro = manifest["document"]["sections"][0]["content"].as_str().unwrap();
    assert!(intro.contains("](images/"));
    assert!(!intro.contains("image:"));

    let paths: Vec<&str> = manifest["assets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, report.written);
    for path in paths {
        assert!(archive.by_name(path).is_ok());
    }
}

#[test]
fn unknown_id_is_reported_without_aborting() {
    let (mut doc, mut assets) = sample();
    let (orphan, _) = assets.add(vec![1, 2, 3], "image/png", None);
    let ghost = chroma_assets::AssetId::generate();
    doc.sections
        .push(Section::new("Ghost", format!("![g]({})", image_reference(&ghost))));
    doc.textures.set(TextureChannel::Channel2, ghost.to_string());

    let (bytes, report) = encode(&doc, &assets).unwrap();
    assert_eq!(report.excluded, vec![orphan]);
    assert_eq!(report.unresolved.len(), 2);
    assert_eq!(report.written.len(), 2);

    let (back, back_assets) = decode(&bytes).unwrap();
    assert_eq!(back_assets.len(), 2);
    assert_eq!(back.textures.get(TextureChannel::Channel2), None);
    assert_eq!(back.sections[2].content, format!("![g]({})", image_reference(&ghost)));
}

#[test]
fn missing_entry_degrades_to_absent_asset() {
    let (doc, assets) = sample();
    let (bytes, report) = encode(&doc, &assets).unwrap();

    // Rebuild the container without the texture payload
    let mut source = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
    let texture_path = report
        .written
        .iter()
        .find(|p| p.starts_with("textures/"))
        .unwrap()
        .clone();
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..source.len() {
        let mut entry = source.by_index(i).unwrap();
        if entry.name() == texture_path {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        writer
            .start_file(name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(&data).unwrap();
    }
    let stripped = writer.finish().unwrap().into_inner();

    let contents = read_archive(&stripped).unwrap();
    assert_eq!(contents.report.missing, vec![texture_path]);
    assert_eq!(contents.records.len(), 1);
    assert_eq!(contents.document.textures.get(TextureChannel::Channel0), None);
    assert_eq!(contents.document.sections, doc.sections);
}

#[test]
fn referenced_entries_load_without_manifest_listing() {
    let (doc, assets) = sample();
    let (bytes, report) = encode(&doc, &assets).unwrap();

    let mut source = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
    let mut json = String::new();
    source
        .by_name("manifest.json")
        .unwrap()
        .read_to_string(&mut json)
        .unwrap();
    let mut manifest: serde_json::Value = serde_json::from_str(&json).unwrap();

    // Drop the asset list and bind a second channel to the image entry
    let image_path = report
        .written
        .iter()
        .find(|p| p.starts_with("images/"))
        .unwrap()
        .clone();
    manifest["assets"] = serde_json::json!([]);
    manifest["document"]["textures"]["iChannel3"] = serde_json::json!(image_path);
    let logo = storage_references(&doc.sections[0].content).remove(0);
    manifest["document"]["textures"]["iChannel2"] =
        serde_json::json!(format!("textures/{}.png", logo));

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("manifest.json", zip::write::FileOptions::default())
        .unwrap();
    writer
        .write_all(serde_json::to_string(&manifest).unwrap().as_bytes())
        .unwrap();
    for path in &report.written {
        let mut data = Vec::new();
        source.by_name(path).unwrap().read_to_end(&mut data).unwrap();
        writer
            .start_file(path.as_str(), zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(&data).unwrap();
    }
    let rebuilt = writer.finish().unwrap().into_inner();

    let contents = read_archive(&rebuilt).unwrap();
    assert!(contents.report.missing.is_empty());
    assert_eq!(contents.records.len(), 2);
    assert_eq!(contents.document.sections, doc.sections);
    assert_eq!(
        contents.document.textures.get(TextureChannel::Channel0),
        doc.textures.get(TextureChannel::Channel0)
    );

    assert_eq!(
        contents.document.textures.get(TextureChannel::Channel3),
        Some(logo.as_str())
    );
    // same id under the other prefix resolves to the loaded payload
    assert_eq!(
        contents.document.textures.get(TextureChannel::Channel2),
        Some(logo.as_str())
    );
    let record = contents.records.iter().find(|r| r.id == logo).unwrap();
    assert_eq!(record.mime, "image/png");
    assert_eq!(&*record.payload, PNG);
}
