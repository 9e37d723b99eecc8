use std::path::Path;

use gfsbak_core::config::minimal_config_template;
use gfsbak_core::error::{GfsbakError, Result};

/// Write the starter config. Refuses to overwrite an existing file.
pub(crate) fn run(dest: Option<&str>) -> Result<()> {
    let dest = Path::new(dest.unwrap_or("gfsbak.yaml"));
    if dest.exists() {
        return Err(GfsbakError::Config(format!(
            "'{}' already exists, not overwriting",
            dest.display()
        )));
    }
    std::fs::write(dest, minimal_config_template())?;
    eprintln!("Wrote starter config to '{}'", dest.display());
    Ok(())
}
