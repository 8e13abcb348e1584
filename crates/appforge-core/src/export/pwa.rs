//! PWA bundle export
//!
//! Packages the generated document as an installable web app: the
//! document itself, a web manifest, and a precache-on-install service
//! worker, zipped ready to unpack onto any static host.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::ExportArtifact;

/// Cache-first service worker that precaches the app shell
const SERVICE_WORKER_JS: &str = r#"const CACHE = 'app-shell-v1';
const ASSETS = ['./', './index.html', './manifest.webmanifest'];

self.addEventListener('install', (event) => {
  event.waitUntil(caches.open(CACHE).then((cache) => cache.addAll(ASSETS)));
});

self.addEventListener('activate', (event) => {
  event.waitUntil(
    caches.keys().then((keys) =>
      Promise.all(keys.filter((k) => k !== CACHE).map((k) => caches.delete(k)))
    )
  );
});

self.addEventListener('fetch', (event) => {
  event.respondWith(
    caches.match(event.request).then((hit) => hit || fetch(event.request))
  );
});
"#;

/// Build the installable bundle; returns the zip artifact
pub fn build_pwa(name: &str, html: &str, out_dir: &Path) -> Result<ExportArtifact> {
    fs::create_dir_all(out_dir)?;

    let slug = super::slugify(name);
    let filename = format!("{slug}-pwa.zip");
    let path = out_dir.join(&filename);

    let manifest = serde_json::json!({
        "name": name,
        "short_name": name,
        "start_url": "./index.html",
        "display": "standalone",
        "background_color": "#1a1a2e",
        "theme_color": "#1a1a2e",
    });

    // The document needs the service worker registered to install offline
    let index = inject_sw_registration(html);

    let file = File::create(&path)?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("index.html", options)?;
    zip.write_all(index.as_bytes())?;

    zip.start_file("manifest.webmanifest", options)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    zip.start_file("sw.js", options)?;
    zip.write_all(SERVICE_WORKER_JS.as_bytes())?;

    zip.finish()?;

    let size_bytes = fs::metadata(&path)?.len();
    Ok(ExportArtifact {
        filename,
        size_bytes,
        path,
    })
}

/// Add the manifest link and service-worker registration to the document
fn inject_sw_registration(html: &str) -> String {
    let snippet = concat!(
        "<link rel=\"manifest\" href=\"manifest.webmanifest\">\n",
        "<script>\n",
        "if ('serviceWorker' in navigator) {\n",
        "  navigator.serviceWorker.register('sw.js');\n",
        "}\n",
        "</script>\n"
    );

    // Prefer slotting into <head>; fall back to prepending
    if let Some(idx) = html.find("</head>") {
        let mut out = String::with_capacity(html.len() + snippet.len());
        out.push_str(&html[..idx]);
        out.push_str(snippet);
        out.push_str(&html[idx..]);
        out
    } else {
        format!("{snippet}{html}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_bundle_contains_app_manifest_and_worker() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let html = "<html><head><title>x</title></head><body></body></html>";

        let artifact =
            build_pwa("My App", html, temp_dir.path()).expect("Failed to build bundle");
        assert_eq!(artifact.filename, "my-app-pwa.zip");
        assert!(artifact.size_bytes > 0);

        let file = File::open(&artifact.path).expect("Failed to open zip");
        let mut archive = zip::ZipArchive::new(file).expect("Failed to read zip");

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("bad entry").name().to_string())
            .collect();
        assert!(names.contains(&"index.html".to_string()));
        assert!(names.contains(&"manifest.webmanifest".to_string()));
        assert!(names.contains(&"sw.js".to_string()));

        let mut index = String::new();
        archive
            .by_name("index.html")
            .expect("index.html missing")
            .read_to_string(&mut index)
            .expect("Failed to read index");
        assert!(index.contains("serviceWorker"), "registration must be injected");
        assert!(index.contains("manifest.webmanifest"));
    }

    #[test]
    fn test_injection_without_head_still_registers() {
        let out = inject_sw_registration("<html><body></body></html>");
        assert!(out.contains("serviceWorker"));
    }
}
