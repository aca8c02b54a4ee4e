//! Configuration view and init commands (`sitepress config`).

use anyhow::{Result, bail};

use super::super::ConfigCommands;

pub fn cmd_config(root: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use sitepress::site_config::{CONFIG_FILE, SiteConfig, SiteToml};

    let config_path = root.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Site Configuration");
            println!("==================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE, root.display());
                println!("Using default configuration.");
            }
            println!();

            let config = SiteConfig::new(root.to_path_buf())?;
            print!("{}", toml::to_string_pretty(&config.toml)?);
            println!();

            println!("Effective values (with env overrides):");
            println!("  host = \"{}\"", config.host());
            println!("  port = {}", config.port());
            println!("  data file = {}", config.data_file().display());
            println!("  main template = {}", config.main_template().display());
            println!();
        }
        Some(ConfigCommands::Init { force }) => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists. Use --force to overwrite it.",
                    config_path.display()
                );
            }
            SiteToml::default().save(&config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
    }

    Ok(())
}
