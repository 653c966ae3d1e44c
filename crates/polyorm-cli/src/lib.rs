mod cli;
mod config;
mod generate;
mod write;

use polyorm::DialectKind;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Ddl(args) => generate::run(args),
        cli::Command::Init(args) => init(args),
        cli::Command::Dialects => {
            for kind in DialectKind::ALL {
                let dialect = kind.create(None);
                println!("{:<10} {}", kind.name(), dialect.rules().name);
            }
            Ok(())
        }
    }
}

fn init(args: cli::InitArgs) -> anyhow::Result<()> {
    if args.config.exists() {
        anyhow::bail!("{} already exists", args.config.display());
    }
    let dir = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let schema = dir.join("models.toml");

    std::fs::write(&args.config, config::STARTER_CONFIG)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", args.config.display()))?;
    println!("wrote {}", args.config.display());

    if !schema.exists() {
        std::fs::write(&schema, config::STARTER_SCHEMA)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", schema.display()))?;
        println!("wrote {}", schema.display());
    }
    Ok(())
}
