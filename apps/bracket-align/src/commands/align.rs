use anyhow::Result;
use bracket_align::{RunOutcome, align_directory};
use bracket_config::LoadedConfig;
use std::path::Path;
use tracing::info;

pub async fn execute(dir: &Path, loaded: LoadedConfig) -> Result<()> {
    super::print_warnings(&loaded);

    let mut console = std::io::stdout().lock();
    let outcome = align_directory(dir, &loaded.config, &mut console).await?;

    match outcome {
        RunOutcome::NoCandidates => info!("No bracket images in {}", dir.display()),
        RunOutcome::NotEnoughImages { found } => {
            info!("Only {} bracket image in {}", found, dir.display());
        }
        RunOutcome::Completed { steps, elapsed } => {
            info!("Aligned {} images in {:.2?}", steps, elapsed);
        }
    }
    Ok(())
}
