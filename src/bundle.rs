use anyhow::{anyhow, Context};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SEATING_ENTRY: &str = "exam_seating.pdf";
pub const SIGNATURE_ENTRY: &str = "signature_sheet.pdf";
pub const BUNDLE_NAME: &str = "exam_documents.zip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// ZIP with the two documents under their fixed entry names.
pub fn pack_documents(seating_pdf: &[u8], signature_pdf: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (entry, data) in [(SEATING_ENTRY, seating_pdf), (SIGNATURE_ENTRY, signature_pdf)] {
        zip.start_file(entry, opts)
            .with_context(|| format!("failed to start {} entry", entry))?;
        zip.write_all(data)
            .with_context(|| format!("failed to write {} entry", entry))?;
    }

    let cursor = zip.finish().context("failed to finalize zip bundle")?;
    Ok(cursor.into_inner())
}

/// Resolves the destination: an existing directory gets `default_name` appended.
pub fn resolve_out_path(out_path: &Path, default_name: &str) -> PathBuf {
    if out_path.is_dir() {
        out_path.join(default_name)
    } else {
        out_path.to_path_buf()
    }
}

/// Writes through a sibling temp file so a failed export never leaves a partial artifact.
pub fn write_artifact(out_path: &Path, bytes: &[u8]) -> anyhow::Result<ArtifactSummary> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let file_name = out_path
        .file_name()
        .ok_or_else(|| anyhow!("output path has no file name: {}", out_path.to_string_lossy()))?;

    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".writing");
    let tmp_path = out_path.with_file_name(tmp_name);

    {
        let mut out = File::create(&tmp_path).with_context(|| {
            format!("failed to create output file {}", tmp_path.to_string_lossy())
        })?;
        out.write_all(bytes)
            .with_context(|| format!("failed to write {}", tmp_path.to_string_lossy()))?;
        out.flush().context("failed to flush output file")?;
    }
    if out_path.exists() {
        std::fs::remove_file(out_path).with_context(|| {
            format!("failed to replace existing file {}", out_path.to_string_lossy())
        })?;
    }
    std::fs::rename(&tmp_path, out_path).with_context(|| {
        format!("failed to move output into {}", out_path.to_string_lossy())
    })?;

    Ok(ArtifactSummary {
        path: out_path.to_path_buf(),
        bytes: bytes.len(),
        sha256: sha256_hex(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn bundle_has_exactly_the_two_entries() {
        let bytes = pack_documents(b"%PDF-seating", b"%PDF-signature").expect("pack");
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
        assert_eq!(archive.len(), 2);
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec![SEATING_ENTRY, SIGNATURE_ENTRY]);

        let mut body = String::new();
        archive
            .by_name(SIGNATURE_ENTRY)
            .expect("signature entry")
            .read_to_string(&mut body)
            .expect("read entry");
        assert_eq!(body, "%PDF-signature");
    }

    #[test]
    fn write_artifact_replaces_and_hashes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = resolve_out_path(dir.path(), BUNDLE_NAME);
        assert_eq!(target, dir.path().join(BUNDLE_NAME));

        write_artifact(&target, b"old").expect("first write");
        let summary = write_artifact(&target, b"abc").expect("second write");
        assert_eq!(std::fs::read(&target).expect("read back"), b"abc");
        assert_eq!(summary.bytes, 3);
        assert_eq!(
            summary.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(!dir.path().join(format!("{}.writing", BUNDLE_NAME)).exists());
    }
}
