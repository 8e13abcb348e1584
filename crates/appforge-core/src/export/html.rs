//! Standalone HTML export

use std::fs;
use std::path::Path;

use anyhow::Result;

use super::ExportArtifact;

/// Write the generated document as a single .html file
pub fn write_html(name: &str, html: &str, out_dir: &Path) -> Result<ExportArtifact> {
    fs::create_dir_all(out_dir)?;

    let filename = format!("{}.html", super::slugify(name));
    let path = out_dir.join(&filename);
    fs::write(&path, html)?;

    Ok(ExportArtifact {
        filename,
        size_bytes: html.len() as u64,
        path,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_writes_document_to_slugged_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let artifact = write_html("Tip Calculator!", "<html></html>", temp_dir.path())
            .expect("Failed to write export");

        assert_eq!(artifact.filename, "tip-calculator.html");
        assert_eq!(artifact.size_bytes, 13);
        let written = std::fs::read_to_string(&artifact.path).expect("Failed to read back");
        assert_eq!(written, "<html></html>");
    }
}
