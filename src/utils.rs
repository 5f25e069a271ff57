use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use failure::{format_err, ResultExt};
use zip::ZipArchive;

use crate::errors::*;

pub type ExampleId = String;
pub type FeatureName = String;

/// Extracts the archive in `dest_path` and returns the path of its top level directory
#[allow(deprecated)]
pub fn extract_zip_archive<R: io::Read + io::Seek>(
    zip_reader: R,
    dest_path: &Path,
) -> Result<PathBuf> {
    let mut archive = ZipArchive::new(zip_reader)
        .with_context(|_| "Could not read dai classifier zip data")?;
    if archive.len() == 0 {
        return Err(format_err!("Dai classifier archive is empty"));
    }
    for file_index in 0..archive.len() {
        let mut file = archive.by_index(file_index)?;
        let outpath = dest_path.join(file.sanitized_name());

        if file.name().ends_with('/') || file.name().ends_with('\\') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)
                .with_context(|_| format!("Could not create file {:?}", outpath))?;
            io::copy(&mut file, &mut outfile)?;
        }
    }
    let first_archive_file = archive.by_index(0)?.sanitized_name();
    let root_dir = first_archive_file
        .components()
        .find(|component| matches!(component, Component::Normal(_)))
        .ok_or_else(|| format_err!("Dai classifier archive is incorrect"))?
        .as_os_str()
        .to_owned();
    Ok(dest_path.join(root_dir))
}
