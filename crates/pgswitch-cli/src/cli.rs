use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Tables,
    Sql,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help(HelpTopic),
    Tables(TablesArgs),
    Sql(SqlArgs),
    Copy(CopyArgs),
}

pub const DEFAULT_CONFIG: &str = "pgswitch.toml";

/// Options shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonArgs {
    /// Set only by `--config`. A named file must exist.
    pub config: Option<PathBuf>,
    pub source: Option<String>,
    pub schema: Option<String>,
    pub verbose: bool,
}

impl CommonArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablesArgs {
    pub common: CommonArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlArgs {
    pub common: CommonArgs,
    pub table: Option<String>,
    pub upsert: bool,
    pub quoted_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyArgs {
    pub common: CommonArgs,
    pub target: Option<String>,
    pub upsert: bool,
    pub quoted_key: bool,
    pub dry_run: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "tables" => parse_tables(it.map(|s| s.as_str())),
        "sql" => parse_sql(it.map(|s| s.as_str())),
        "copy" => parse_copy(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Consume `token` if it is a shared option. Returns `Ok(false)` for anything else.
fn parse_common<'a>(
    common: &mut CommonArgs,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<bool> {
    match token {
        "-v" | "--verbose" => common.verbose = true,
        "--config" => common.config = Some(PathBuf::from(require_value(token, it)?)),
        _ if token.starts_with("--config=") => {
            common.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
        }
        "--source" => common.source = Some(require_value(token, it)?.to_string()),
        _ if token.starts_with("--source=") => {
            common.source = Some(token.trim_start_matches("--source=").to_string());
        }
        "--schema" => common.schema = Some(require_value(token, it)?.to_string()),
        _ if token.starts_with("--schema=") => {
            common.schema = Some(token.trim_start_matches("--schema=").to_string());
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn require_value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<&'a str> {
    let Some(v) = it.next() else {
        anyhow::bail!("{flag} requires a value");
    };
    Ok(v)
}

fn parse_tables<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut common = CommonArgs::default();

    while let Some(token) = it.next() {
        if token == "-h" || token == "--help" {
            return Ok(Command::Help(HelpTopic::Tables));
        }
        if !parse_common(&mut common, token, &mut it)? {
            anyhow::bail!("unknown argument: {token}");
        }
    }

    Ok(Command::Tables(TablesArgs { common }))
}

fn parse_sql<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut common = CommonArgs::default();
    let mut table: Option<String> = None;
    let mut upsert = false;
    let mut quoted_key = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Sql)),
            "--table" => table = Some(require_value(token, &mut it)?.to_string()),
            _ if token.starts_with("--table=") => {
                table = Some(token.trim_start_matches("--table=").to_string());
            }
            "--upsert" => upsert = true,
            "--quoted-key" => quoted_key = true,
            _ => {
                if !parse_common(&mut common, token, &mut it)? {
                    anyhow::bail!("unknown argument: {token}");
                }
            }
        }
    }

    Ok(Command::Sql(SqlArgs {
        common,
        table,
        upsert,
        quoted_key,
    }))
}

fn parse_copy<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut common = CommonArgs::default();
    let mut target: Option<String> = None;
    let mut upsert = false;
    let mut quoted_key = false;
    let mut dry_run = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Copy)),
            "--target" => target = Some(require_value(token, &mut it)?.to_string()),
            _ if token.starts_with("--target=") => {
                target = Some(token.trim_start_matches("--target=").to_string());
            }
            "--upsert" => upsert = true,
            "--quoted-key" => quoted_key = true,
            "--dry-run" => dry_run = true,
            _ => {
                if !parse_common(&mut common, token, &mut it)? {
                    anyhow::bail!("unknown argument: {token}");
                }
            }
        }
    }

    Ok(Command::Copy(CopyArgs {
        common,
        target,
        upsert,
        quoted_key,
        dry_run,
    }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pgswitch - inspect and copy Postgres tables as bulk JSON row sets

USAGE:
  pgswitch <COMMAND> [OPTIONS]

COMMANDS:
  tables        List tables in foreign-key order
  sql           Print the generated row statements
  copy          Copy every row from source to target

Run `pgswitch <command> --help` for more."
            );
        }
        HelpTopic::Tables => {
            println!(
                "\
USAGE:
  pgswitch tables [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgswitch.toml)
  --source <URL>        Override source.url from config
  --schema <NAME>       Override source.schema from config
  -v, --verbose         Log SQL at debug level
  -h, --help            Print help"
            );
        }
        HelpTopic::Sql => {
            println!(
                "\
USAGE:
  pgswitch sql [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgswitch.toml)
  --source <URL>        Override source.url from config
  --schema <NAME>       Override source.schema from config
  --table <NAME>        Only print statements for this table
  --upsert              Add the on conflict clause to inserts
  --quoted-key          Quote the key column in key positions
  -v, --verbose         Log SQL at debug level
  -h, --help            Print help"
            );
        }
        HelpTopic::Copy => {
            println!(
                "\
USAGE:
  pgswitch copy [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgswitch.toml)
  --source <URL>        Override source.url from config
  --schema <NAME>       Override source.schema from config
  --target <URL>        Override target.url from config
  --upsert              Update rows that already exist in the target
  --quoted-key          Quote the key column in key positions
  --dry-run             Print the copy order without writing
  -v, --verbose         Log SQL at debug level
  -h, --help            Print help"
            );
        }
    }
}
