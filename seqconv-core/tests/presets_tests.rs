// seqconv-core/tests/presets_tests.rs

use seqconv_core::presets::{PresetSettings, PresetStore};
use seqconv_core::request::{ConversionMode, ConversionRequest, VideoCodec, VideoSettings};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_request_round_trips_through_store() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = PresetStore::new(dir.path().join("presets.json"));

    let request = ConversionRequest::sequence_to_video("/renders/shot010", "/tmp/shot010.mp4")
        .with_video(VideoSettings {
            codec: VideoCodec::H265,
            quality: 20,
            frame_rate: 25,
            ..VideoSettings::default()
        });
    store.save("shot010", &PresetSettings::from(&request))?;

    let loaded = store.get("shot010")?;
    assert_eq!(loaded.to_request(ConversionMode::SequenceToVideo), request);
    Ok(())
}

#[test]
fn test_document_is_flat_camel_case_object() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("presets.json");
    let store = PresetStore::new(&path);
    store.save("default", &PresetSettings::default())?;

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let entry = &raw["default"];
    assert_eq!(entry["videoFormat"], "MP4");
    assert_eq!(entry["videoCodec"], "H.264");
    assert_eq!(entry["imageFormat"], "PNG");
    assert_eq!(entry["frameRate"], 24);
    assert_eq!(entry["endFrame"], 100);
    assert_eq!(entry["extractAllFrames"], true);
    assert_eq!(entry["customCommand"], "");
    Ok(())
}

#[test]
fn test_save_overwrites_existing_entry() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = PresetStore::new(dir.path().join("presets.json"));

    store.save("web", &PresetSettings::default())?;
    store.save(
        "web",
        &PresetSettings {
            width: 640,
            height: 360,
            ..PresetSettings::default()
        },
    )?;

    let all = store.load();
    assert_eq!(all.len(), 1);
    assert_eq!(all["web"].width, 640);
    Ok(())
}

#[test]
fn test_reads_document_written_by_hand() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("presets.json");
    fs::write(
        &path,
        r#"{
            "proxy": {
                "inputPath": "/seq",
                "outputPath": "/out.webm",
                "videoFormat": "WebM",
                "videoCodec": "VP9",
                "quality": 33,
                "customCommand": ""
            }
        }"#,
    )?;

    let request = PresetStore::new(&path)
        .get("proxy")?
        .to_request(ConversionMode::SequenceToVideo);
    assert_eq!(request.video.codec, VideoCodec::Vp9);
    assert_eq!(request.video.quality, 33);
    assert_eq!(request.video.width, 1920);
    assert_eq!(request.custom_command(), None);
    Ok(())
}
