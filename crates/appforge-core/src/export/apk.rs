//! App package export
//!
//! Packages the generated document as a WebView wrapper project: the web
//! assets plus a package manifest describing the app, zipped for handoff
//! to a native build pipeline. No compilation or signing happens here;
//! the archive is the honest deliverable.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::ExportArtifact;

const BUILD_NOTES: &str = r#"AppForge package
================

This archive is a WebView wrapper project:

  package.json       app metadata consumed by the wrapper build
  assets/index.html  the complete app (self-contained, works offline)

Point any WebView shell (Android WebView, Capacitor, Tauri mobile) at
assets/index.html to produce an installable binary.
"#;

/// Build the wrapper project archive; returns the zip artifact
pub fn build_package(name: &str, html: &str, out_dir: &Path) -> Result<ExportArtifact> {
    fs::create_dir_all(out_dir)?;

    let slug = super::slugify(name);
    let filename = format!("{slug}-package.zip");
    let path = out_dir.join(&filename);

    let manifest = serde_json::json!({
        "name": name,
        "id": format!("io.appforge.{}", slug.replace('-', "")),
        "version": "1.0.0",
        "entry": "assets/index.html",
        "orientation": "portrait",
    });

    let file = File::create(&path)?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("package.json", options)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    zip.start_file("assets/index.html", options)?;
    zip.write_all(html.as_bytes())?;

    zip.start_file("README.txt", options)?;
    zip.write_all(BUILD_NOTES.as_bytes())?;

    zip.finish()?;

    let size_bytes = fs::metadata(&path)?.len();
    Ok(ExportArtifact {
        filename,
        size_bytes,
        path,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_package_contains_manifest_and_assets() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let artifact = build_package("Tip Calculator", "<html></html>", temp_dir.path())
            .expect("Failed to build package");
        assert_eq!(artifact.filename, "tip-calculator-package.zip");

        let file = File::open(&artifact.path).expect("Failed to open zip");
        let mut archive = zip::ZipArchive::new(file).expect("Failed to read zip");

        let mut manifest = String::new();
        archive
            .by_name("package.json")
            .expect("package.json missing")
            .read_to_string(&mut manifest)
            .expect("Failed to read manifest");
        assert!(manifest.contains("io.appforge.tipcalculator"));

        let mut index = String::new();
        archive
            .by_name("assets/index.html")
            .expect("assets missing")
            .read_to_string(&mut index)
            .expect("Failed to read assets");
        assert_eq!(index, "<html></html>");
    }
}
