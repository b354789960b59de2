//! Annotated-catalogue output: `corejet.xml` plus rendered views, in a
//! directory that is wiped and recreated on every run.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use corejet_error::Result;
use corejet_model::Catalogue;
use tracing::{debug, info};

use crate::html::ReportRenderer;

pub const COREJET_DIR_NAME: &str = "corejet";
pub const COREJET_FILE_NAME: &str = "corejet.xml";

/// Remove `dir` with everything in it, then create it empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!(path = %dir.display(), "removing previous output");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write the annotated catalogue and every renderer's view into `dir`.
///
/// Returns all files written, catalogue first.
pub fn write_corejet_output(
    catalogue: &Catalogue,
    dir: &Path,
    file_name: &str,
    renderers: &[Box<dyn ReportRenderer>],
) -> Result<Vec<PathBuf>> {
    recreate_dir(dir)?;

    let path = dir.join(file_name);
    catalogue.write(BufWriter::new(File::create(&path)?))?;
    info!(
        path = %path.display(),
        scenarios = catalogue.scenario_count(),
        "annotated catalogue written"
    );

    let mut written = vec![path];
    for renderer in renderers {
        written.extend(renderer.render(catalogue, dir)?);
    }
    Ok(written)
}
