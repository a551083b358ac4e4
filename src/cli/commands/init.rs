use anyhow::{bail, Result};

use crate::cli::{GlobalArgs, InitArgs};
use crate::config::Config;

pub fn execute_init(global: &GlobalArgs, args: InitArgs) -> Result<()> {
    let path = &global.config;

    // Check if config already exists
    if path.exists() && !args.force {
        bail!("{} already exists. Use --force to overwrite.", path.display());
    }

    let config = Config {
        samples_path: args.samples,
        session_path: global.session.clone(),
        ..Config::default()
    }
    .with_overrides(global.api_url.clone(), None)?;

    config.save_to(path)?;

    eprintln!("Created {}", path.display());
    eprintln!("  api_url: {}", config.api_url);
    if let Some(ref samples) = config.samples_path {
        eprintln!("  samples_path: {}", samples.display());
    }
    eprintln!();
    eprintln!("Next: vitals2coach login <email>");

    Ok(())
}
