//! Test fixtures for layouts, settings and bundle archives.

use psgcp_core::config::models::{CoreSettings, StorageLayout};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Entry point name the default settings expect inside a bundle.
#[allow(dead_code)]
pub const ENTRY_POINT: &str = "PixelStreamingUnrealEditorPluginProcessor.exe";

/// A scratch saved directory and the layout rooted at it.
///
/// Returns the TempDir, which must be kept alive for the test duration.
#[allow(dead_code)]
pub fn temp_layout() -> (TempDir, StorageLayout) {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let layout = StorageLayout::new(temp.path().join("Saved"));
    (temp, layout)
}

/// Settings pointing downloads at `base_url` with short delays.
#[allow(dead_code)]
pub fn test_settings(base_url: &str) -> CoreSettings {
    CoreSettings {
        download_url_template: format!(
            "{base_url}/{{{{BUCKET_NAME}}}}/releases/ps_unreal_plugin_processor.zip"
        ),
        exit_status_delay_ms: 20,
        tick_interval_ms: 5,
        http_timeout_secs: 10,
        ..CoreSettings::default()
    }
}

/// Request path the fetch pipeline uses for `bucket`.
#[allow(dead_code)]
pub fn bundle_path(bucket: &str) -> String {
    format!("/{bucket}/releases/ps_unreal_plugin_processor.zip")
}

/// Build a zip archive in memory from `(name, contents)` pairs.
#[allow(dead_code)]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    for (name, contents) in entries {
        writer
            .start_file(*name, options)
            .expect("Failed to start zip entry");
        writer.write_all(contents).expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip archive")
        .into_inner()
}

/// A bundle containing the entry point and a data file.
#[allow(dead_code)]
pub fn helper_bundle() -> Vec<u8> {
    zip_bytes(&[
        (ENTRY_POINT, b"MZ helper"),
        ("data/config.json", b"{\"port\": 8888}"),
    ])
}

/// Create a build output tree under `root`.
#[allow(dead_code)]
pub fn create_build_output(root: &Path) {
    std::fs::create_dir_all(root.join("Engine/Binaries")).expect("Failed to create dirs");
    std::fs::write(root.join("Game.exe"), b"game").expect("Failed to write file");
    std::fs::write(root.join("Engine/Binaries/core.dll"), b"dll").expect("Failed to write file");
    std::fs::create_dir_all(root.join("Saved/Logs")).expect("Failed to create dirs");
}
