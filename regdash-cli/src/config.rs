use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regdash_core::DashConfig;

const TEMPLATE: &str = include_str!("../../.regdash-config.template.toml");

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default config file
    Init(InitArgs),
    /// Show config file path
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Load and check the configuration
    Validate,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Validate => run_validate(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = DashConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(&config_path, TEMPLATE)
        .context(format!("Failed to write config file: {:?}", config_path))?;

    println!("✅ Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Point api.base_url at your backend");
    println!("  3. Run: regdash config validate");

    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", DashConfig::config_path().display());
    Ok(())
}

fn run_show() -> Result<()> {
    let config = DashConfig::load().context("Failed to load config")?;
    let toml_str =
        toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);
    Ok(())
}

fn run_validate() -> Result<()> {
    println!("🔍 Validating configuration...");

    let path = DashConfig::config_path();
    if !path.exists() {
        println!("   ⚠ No config file at {}, using defaults", path.display());
    }

    let config = DashConfig::load().context("Failed to load config")?;
    println!("   ✓ Config loaded successfully");
    println!("   Backend: {}", config.api.base_url);

    config.validate().context("Configuration invalid")?;

    if config.api.insecure {
        println!("\n⚠️  api.insecure is on: TLS certificates are not checked");
    }

    println!("\n✅ Configuration valid!");
    Ok(())
}
