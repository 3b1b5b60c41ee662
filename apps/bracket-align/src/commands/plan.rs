use anyhow::Result;
use bracket_align::preview_directory;
use bracket_config::LoadedConfig;
use std::path::Path;

pub fn execute(dir: &Path, loaded: LoadedConfig) -> Result<()> {
    super::print_warnings(&loaded);

    let mut console = std::io::stdout().lock();
    preview_directory(dir, &loaded.config, &mut console)?;
    Ok(())
}
