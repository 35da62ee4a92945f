//! Run archive packaging
//!
//! Zips a run directory into a single archive. Entries are stored under the
//! run directory's own name. The archive is written to a `.part` file and
//! renamed into place once complete.

use super::traits::{OutputError, OutputResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Packages `run_dir` into the zip file at `archive_path`
///
/// # Arguments
///
/// * `run_dir` - Directory holding category directories and the summary
/// * `archive_path` - Destination archive, replaced if it exists
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the finished archive
/// * `Err(OutputError)` - The archive could not be built; no partial archive is left behind
pub fn package_run(run_dir: &Path, archive_path: &Path) -> OutputResult<PathBuf> {
    if !run_dir.is_dir() {
        return Err(OutputError::Write(format!(
            "run directory {} does not exist",
            run_dir.display()
        )));
    }

    let root = run_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());

    let mut files = Vec::new();
    collect_files(run_dir, &mut files)?;
    files.sort();

    let partial = archive_path.with_extension("zip.part");
    let result = write_archive(run_dir, &root, &files, &partial)
        .and_then(|()| fs::rename(&partial, archive_path).map_err(OutputError::from));
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    tracing::info!(
        "Packaged {} file(s) into {}",
        files.len(),
        archive_path.display()
    );
    Ok(archive_path.to_path_buf())
}

fn write_archive(run_dir: &Path, root: &str, files: &[PathBuf], dest: &Path) -> OutputResult<()> {
    let mut zip = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let relative = path
            .strip_prefix(run_dir)
            .map_err(|e| OutputError::Write(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .fold(root.to_string(), |acc, part| format!("{}/{}", acc, part));

        zip.start_file(name, options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

/// Collects regular files below `dir`, skipping unfinished `.part` files
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.extension().map_or(true, |ext| ext != "part") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[test]
    fn test_packages_nested_files() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().join("run_20240101_120000");
        fs::create_dir_all(run.join("relays").join("G2R").join("images")).unwrap();
        fs::write(run.join("summary.xlsx"), b"summary").unwrap();
        fs::write(run.join("relays").join("G2R").join("images").join("A.webp"), b"img").unwrap();
        fs::write(run.join("relays").join("stale.webp.part"), b"x").unwrap();

        let archive = dir.path().join("run_20240101_120000.zip");
        let path = package_run(&run, &archive).unwrap();
        assert_eq!(path, archive);

        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);

        let mut body = String::new();
        zip.by_name("run_20240101_120000/summary.xlsx")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "summary");
        assert!(zip
            .by_name("run_20240101_120000/relays/G2R/images/A.webp")
            .is_ok());
    }

    #[test]
    fn test_missing_run_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("out.zip");
        let result = package_run(&dir.path().join("nope"), &archive);
        assert!(matches!(result, Err(OutputError::Write(_))));
        assert!(!archive.exists());
    }
}
