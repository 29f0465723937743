//! Monthly grid source files and the seam through which they are decoded.

use crate::error::FogVerifyError;
use crate::prediction::fields::GridFields;
use crate::types::period::Month;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Boxed error returned by a [`GridLoader`] implementation.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// One grid file holding the fields of a single month.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridSourceFile {
    pub period: Month,
    pub path: PathBuf,
}

impl GridSourceFile {
    /// Recognises `{month}-{year}.<ext>` file names. Any extension is accepted.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?;
        let stem = path.file_stem()?.to_str()?;
        Month::from_file_stem(stem).map(|period| Self {
            period,
            path: path.to_path_buf(),
        })
    }
}

/// Decodes a grid source file into fields. File formats such as NetCDF live behind this
/// trait; loaders are called from blocking worker threads.
pub trait GridLoader: Send + Sync {
    fn load(&self, source: &GridSourceFile) -> Result<GridFields, LoadError>;
}

/// Lists the grid sources in `dir`, sorted by month.
///
/// Files that do not follow the `{month}-{year}.<ext>` pattern are ignored. An empty
/// result is a configuration error.
pub fn discover_grid_sources(dir: &Path) -> Result<Vec<GridSourceFile>, FogVerifyError> {
    let entries =
        fs::read_dir(dir).map_err(|e| FogVerifyError::SourceDirRead(dir.to_path_buf(), e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| FogVerifyError::SourceDirRead(dir.to_path_buf(), e))?
            .path();
        if !path.is_file() {
            continue;
        }
        match GridSourceFile::from_path(&path) {
            Some(source) => sources.push(source),
            None => debug!("Ignoring {:?}, not a '{{month}}-{{year}}' grid file", path),
        }
    }

    if sources.is_empty() {
        return Err(FogVerifyError::NoGridSources(dir.to_path_buf()));
    }
    sources.sort();
    info!("Found {} grid source files in {:?}", sources.len(), dir);
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_path() {
        let source = GridSourceFile::from_path(Path::new("/data/grids/March-2019.nc")).unwrap();
        assert_eq!(source.period, Month::new(3, 2019));
        assert!(GridSourceFile::from_path(Path::new("oct-2020.grib")).is_some());
        assert!(GridSourceFile::from_path(Path::new("March-2019")).is_none());
        assert!(GridSourceFile::from_path(Path::new("stations.csv")).is_none());
    }

    #[test]
    fn test_discover_sorts_and_filters() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        for name in ["February-2019.nc", "January-2019.nc", "Dec-2018.nc", "notes.txt"] {
            fs::write(dir.path().join(name), b"")?;
        }
        fs::create_dir(dir.path().join("March-2019.nc"))?;

        let sources = discover_grid_sources(dir.path())?;
        let periods: Vec<Month> = sources.iter().map(|s| s.period).collect();
        assert_eq!(
            periods,
            vec![Month::new(12, 2018), Month::new(1, 2019), Month::new(2, 2019)]
        );
        Ok(())
    }

    #[test]
    fn test_no_sources_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("readme.md"), b"")?;
        let err = discover_grid_sources(dir.path()).unwrap_err();
        assert!(matches!(err, FogVerifyError::NoGridSources(_)));
        Ok(())
    }
}
