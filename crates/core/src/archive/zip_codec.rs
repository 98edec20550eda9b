//! ZIP implementation of [`ArchiveCodec`].

use super::{ArchiveCodec, ArchiveError};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entries at or above this size need the ZIP64 extension.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Deflate-compressed ZIP archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec;

impl ArchiveCodec for ZipCodec {
    fn extract_all(
        &self,
        archive_path: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ArchiveError> {
        debug!(?archive_path, ?dest, "extracting ZIP archive");

        std::fs::create_dir_all(dest).map_err(ArchiveError::io(dest))?;

        let file = File::open(archive_path).map_err(ArchiveError::io(archive_path))?;
        let mut archive = ZipArchive::new(file).map_err(ArchiveError::zip(archive_path))?;

        for index in 0..archive.len() {
            if cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }

            let mut entry = archive
                .by_index(index)
                .map_err(ArchiveError::zip(archive_path))?;

            let out_path = match entry.enclosed_name() {
                Some(relative) => dest.join(relative),
                None => {
                    warn!(name = entry.name(), "skipping entry with unsafe path");
                    continue;
                }
            };

            if entry.is_dir() {
                std::fs::create_dir_all(&out_path).map_err(ArchiveError::io(&out_path))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
            }

            let mut outfile = File::create(&out_path).map_err(ArchiveError::io(&out_path))?;
            std::io::copy(&mut entry, &mut outfile).map_err(ArchiveError::io(&out_path))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                        .map_err(ArchiveError::io(&out_path))?;
                }
            }
        }

        Ok(())
    }

    fn compress_dir(
        &self,
        source: &Path,
        archive_path: &Path,
        exclude: &[&Path],
        cancel: &CancellationToken,
    ) -> Result<(), ArchiveError> {
        debug!(?source, ?archive_path, ?exclude, "compressing directory");

        let file = File::create(archive_path).map_err(ArchiveError::io(archive_path))?;
        let mut writer = ZipWriter::new(file);
        let base_options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // Compare canonical paths so the output is found whichever way it was named
        let root = source.canonicalize().map_err(ArchiveError::io(source))?;
        let mut skipped: Vec<PathBuf> = vec![canonical_or_self(archive_path)];
        skipped.extend(exclude.iter().map(|path| canonical_or_self(path)));

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !skipped.iter().any(|skip| skip == entry.path()));

        for entry in walker {
            if cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }

            let entry = entry.map_err(|source_err| ArchiveError::Walk {
                path: source.to_path_buf(),
                source: source_err,
            })?;
            let path = entry.path();
            let name = entry_name(&root, path)?;
            let metadata = entry.metadata().map_err(|source_err| ArchiveError::Walk {
                path: path.to_path_buf(),
                source: source_err,
            })?;

            let mut options = base_options;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                options = options.unix_permissions(metadata.permissions().mode());
            }

            if metadata.is_dir() {
                writer
                    .add_directory(name, options)
                    .map_err(ArchiveError::zip(archive_path))?;
                continue;
            }

            options = options.large_file(metadata.len() >= LARGE_FILE_THRESHOLD);
            writer
                .start_file(name, options)
                .map_err(ArchiveError::zip(archive_path))?;
            let mut input = File::open(path).map_err(ArchiveError::io(path))?;
            std::io::copy(&mut input, &mut writer).map_err(ArchiveError::io(path))?;
        }

        writer.finish().map_err(ArchiveError::zip(archive_path))?;
        Ok(())
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Archive entry name of `path`: relative to `root`, `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::UnsafePath(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => return Err(ArchiveError::UnsafePath(path.to_path_buf())),
            },
            _ => return Err(ArchiveError::UnsafePath(path.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_tree(root: &Path) {
        std::fs::create_dir_all(root.join("Engine/Binaries")).unwrap();
        std::fs::create_dir_all(root.join("Empty")).unwrap();
        std::fs::write(root.join("Game.exe"), b"MZ fake binary").unwrap();
        std::fs::write(root.join("Engine/Binaries/lib.dll"), b"library bytes").unwrap();
    }

    #[test]
    fn test_compress_then_extract_preserves_tree() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("build");
        write_tree(&source);

        let archive = dir.path().join("out.zip");
        let dest = dir.path().join("restored");
        let cancel = CancellationToken::new();

        ZipCodec.compress_dir(&source, &archive, &[], &cancel).unwrap();
        ZipCodec.extract_all(&archive, &dest, &cancel).unwrap();

        assert_eq!(std::fs::read(dest.join("Game.exe")).unwrap(), b"MZ fake binary");
        assert_eq!(
            std::fs::read(dest.join("Engine/Binaries/lib.dll")).unwrap(),
            b"library bytes"
        );
        assert!(dest.join("Empty").is_dir());
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip").unwrap();

        let result = ZipCodec.extract_all(
            &archive,
            &dir.path().join("out"),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(ArchiveError::Zip { .. })));
    }

    #[test]
    fn test_extract_skips_entries_escaping_destination() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        let mut writer = ZipWriter::new(File::create(&archive).unwrap());
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("../escape.txt", options).unwrap();
        writer.write_all(b"nope").unwrap();
        writer.start_file("inside.txt", options).unwrap();
        writer.write_all(b"ok").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("dest");
        ZipCodec
            .extract_all(&archive, &dest, &CancellationToken::new())
            .unwrap();

        assert!(dest.join("inside.txt").is_file());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_cancelled_compression_stops() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("build");
        write_tree(&source);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = ZipCodec.compress_dir(&source, &dir.path().join("out.zip"), &[], &cancel);
        assert!(matches!(result, Err(ArchiveError::Cancelled)));
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_restores_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let source = dir.path().join("bundle");
        std::fs::create_dir_all(&source).unwrap();
        let tool = source.join("tool.sh");
        std::fs::write(&tool, b"#!/bin/sh\necho hi\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let archive = dir.path().join("bundle.zip");
        let dest = dir.path().join("out");
        let cancel = CancellationToken::new();
        ZipCodec.compress_dir(&source, &archive, &[], &cancel).unwrap();
        ZipCodec.extract_all(&archive, &dest, &cancel).unwrap();

        let mode = std::fs::metadata(dest.join("tool.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let root = Path::new("/build");
        let name = entry_name(root, &root.join("a").join("b.txt")).unwrap();
        assert_eq!(name, "a/b.txt");
    }

    #[test]
    fn test_compress_skips_archive_and_excluded_dirs_inside_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("project");
        write_tree(&source);
        let saved = source.join("Saved");
        std::fs::create_dir_all(&saved).unwrap();
        std::fs::write(saved.join("LastPSGCProjectInfo.json"), b"{}").unwrap();

        let archive = saved.join("out.zip");
        let cancel = CancellationToken::new();
        ZipCodec
            .compress_dir(&source, &archive, &[saved.as_path()], &cancel)
            .unwrap();

        let reader = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<&str> = reader.file_names().collect();
        assert!(names.contains(&"Game.exe"));
        assert!(names.iter().all(|name| !name.starts_with("Saved")), "{names:?}");
    }

    #[test]
    fn test_compress_skips_archive_given_as_relative_path() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("project");
        write_tree(&source);

        let cwd = std::env::current_dir().unwrap();
        let relative_archive = pathdiff(&source.join("out.zip"), &cwd);
        let cancel = CancellationToken::new();
        ZipCodec
            .compress_dir(&source, &relative_archive, &[], &cancel)
            .unwrap();

        let reader = ZipArchive::new(File::open(source.join("out.zip")).unwrap()).unwrap();
        assert!(reader.file_names().all(|name| name != "out.zip"));
    }

    /// `target` relative to `base`, using `..` components.
    fn pathdiff(target: &Path, base: &Path) -> PathBuf {
        let target: Vec<_> = target.components().collect();
        let base: Vec<_> = base.components().collect();
        let common = target.iter().zip(&base).take_while(|(a, b)| a == b).count();
        let mut relative = PathBuf::new();
        for _ in common..base.len() {
            relative.push("..");
        }
        for component in &target[common..] {
            relative.push(component.as_os_str());
        }
        relative
    }
}
