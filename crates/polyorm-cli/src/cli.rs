use polyorm::DialectKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Ddl,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Ddl(DdlArgs),
    Init(InitArgs),
    Dialects,
}

#[derive(Debug, Clone)]
pub struct DdlArgs {
    pub config: PathBuf,
    /// Render only this dialect to stdout instead of writing target files.
    pub dialect: Option<DialectKind>,
    /// Schema file overriding `schema` from the config.
    pub schema: Option<PathBuf>,
    pub dry_run: bool,
    pub check: bool,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "ddl" => parse_ddl(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        "dialects" => Ok(Command::Dialects),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<&'a str> {
    it.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

fn parse_ddl<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("polyorm.toml");
    let mut dialect: Option<DialectKind> = None;
    let mut schema: Option<PathBuf> = None;
    let mut dry_run = false;
    let mut check = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Ddl)),
            "--config" => config = PathBuf::from(value(token, &mut it)?),
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--dialect" => dialect = Some(value(token, &mut it)?.parse()?),
            _ if token.starts_with("--dialect=") => {
                dialect = Some(token.trim_start_matches("--dialect=").parse()?);
            }
            "--schema" => schema = Some(PathBuf::from(value(token, &mut it)?)),
            _ if token.starts_with("--schema=") => {
                schema = Some(PathBuf::from(token.trim_start_matches("--schema=")));
            }
            "--dry-run" => dry_run = true,
            "--check" => check = true,
            other => anyhow::bail!("unknown argument for `ddl`: {other}"),
        }
    }

    if dry_run && check {
        anyhow::bail!("--dry-run and --check cannot be combined");
    }
    if dialect.is_some() && (dry_run || check) {
        anyhow::bail!("--dialect prints to stdout; --dry-run and --check apply to targets only");
    }

    Ok(Command::Ddl(DdlArgs {
        config,
        dialect,
        schema,
        dry_run,
        check,
    }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("polyorm.toml");
    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            "--config" => config = PathBuf::from(value(token, &mut it)?),
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            other => anyhow::bail!("unknown argument for `init`: {other}"),
        }
    }
    Ok(Command::Init(InitArgs { config }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
polyorm - DDL scripts from model schema files

USAGE:
  polyorm <COMMAND> [OPTIONS]

COMMANDS:
  ddl           Write CREATE scripts for every configured target
  init          Write a starter polyorm.toml and schema file
  dialects      List supported dialects

Run `polyorm <command> --help` for more."
            );
        }
        HelpTopic::Ddl => {
            println!(
                "\
USAGE:
  polyorm ddl [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: polyorm.toml)
  --schema <FILE>       Schema file (overrides `schema` from config)
  --dialect <KIND>      Print one dialect's script to stdout
  --dry-run             Print files that would change
  --check               Exit non-zero if output would change
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  polyorm init [OPTIONS]

OPTIONS:
  --config <FILE>       Output config path (default: polyorm.toml)
  -h, --help            Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        std::iter::once("polyorm")
            .chain(tokens.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parse_ddl_defaults() {
        let Command::Ddl(ddl) = parse_args(&args(&["ddl"])).unwrap() else {
            panic!("expected ddl");
        };
        assert_eq!(ddl.config, PathBuf::from("polyorm.toml"));
        assert!(ddl.dialect.is_none());
        assert!(!ddl.dry_run && !ddl.check);
    }

    #[test]
    fn parse_ddl_with_dialect() {
        let cmd = parse_args(&args(&[
            "ddl",
            "--config=db/polyorm.toml",
            "--dialect",
            "mssql",
            "--schema",
            "models.json",
        ]))
        .unwrap();
        let Command::Ddl(ddl) = cmd else {
            panic!("expected ddl");
        };
        assert_eq!(ddl.config, PathBuf::from("db/polyorm.toml"));
        assert_eq!(ddl.dialect, Some(DialectKind::SqlServer));
        assert_eq!(ddl.schema, Some(PathBuf::from("models.json")));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(parse_args(&args(&["ddl", "--dialect", "oracle"])).is_err());
        assert!(parse_args(&args(&["ddl", "--dry-run", "--check"])).is_err());
        assert!(parse_args(&args(&["ddl", "--config"])).is_err());
        assert!(parse_args(&args(&["migrate"])).is_err());
    }

    #[test]
    fn parse_help() {
        assert!(matches!(
            parse_args(&args(&[])).unwrap(),
            Command::Help(HelpTopic::Root)
        ));
        assert!(matches!(
            parse_args(&args(&["ddl", "--help"])).unwrap(),
            Command::Help(HelpTopic::Ddl)
        ));
        assert!(matches!(
            parse_args(&args(&["dialects"])).unwrap(),
            Command::Dialects
        ));
    }
}
