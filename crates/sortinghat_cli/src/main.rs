//! `sortinghat` command-line tool.
//!
//! # Responsibility
//! - Parse arguments, resolve configuration and start logging.
//! - Open the registry and dispatch to the core commands.
//!
//! # Exit codes
//! - `0` success, `1` command failure, `2` configuration or bootstrap failure.

use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use sortinghat_core::db::open_db;
use sortinghat_core::{
    flush_logging, init_logging, Add, AddIdentityRequest, CommandStatus, Enroll, Orgs, OrgsAction, PeriodArgs,
    Remove, RemoveTarget, Show, SortingHatConfig, Withdraw,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_BOOTSTRAP_FAILURE: u8 = 2;

/// Identity registry for contributors across data sources.
#[derive(Parser, Debug)]
#[command(name = "sortinghat", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Registry database file (overrides config and environment).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a unique identity, or every unique identity.
    Show {
        /// Unique identity to show.
        uuid: Option<String>,
    },

    /// Add an identity to the registry.
    Add {
        #[arg(long)]
        source: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Attach to this existing unique identity.
        #[arg(long)]
        uuid: Option<String>,
    },

    /// Remove a unique identity, or an identity with --identity.
    Rm {
        id: String,
        #[arg(long)]
        identity: bool,
    },

    /// List, add or delete organizations.
    Orgs {
        /// Add the named organization.
        #[arg(short, long, requires = "name", conflicts_with = "delete")]
        add: bool,
        /// Delete the named organization and its enrollments.
        #[arg(long, requires = "name")]
        delete: bool,
        /// Organization name, or a filter term when listing.
        name: Option<String>,
    },

    /// Enroll a unique identity in an organization.
    Enroll {
        uuid: String,
        organization: String,
        /// Period start (YYYY-MM-DD[ HH:MM:SS]).
        #[arg(long)]
        from: Option<String>,
        /// Period end (YYYY-MM-DD[ HH:MM:SS]).
        #[arg(long)]
        to: Option<String>,
    },

    /// Withdraw a unique identity from an organization.
    Withdraw {
        uuid: String,
        organization: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
}

fn main() -> ExitCode {
    let code = run_cli(Cli::parse());
    flush_logging();
    code
}

fn run_cli(cli: Cli) -> ExitCode {
    let config = match resolve_config(&cli, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(message) => return bootstrap_failure(&message),
    };

    if let Err(err) = init_logging(&config.logging.level, config.logging.dir.as_deref()) {
        return bootstrap_failure(&err.to_string());
    }

    let conn = match open_db(&config.database.path) {
        Ok(conn) => conn,
        Err(err) => {
            return bootstrap_failure(&format!(
                "cannot open registry `{}`: {err}",
                config.database.path.display()
            ))
        }
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let status = run(cli.command, &conn, &mut out, &mut err);
    info!(
        "event=cli_exit module=cli status={} code={}",
        if status == CommandStatus::Success { "ok" } else { "error" },
        status.exit_code()
    );
    ExitCode::from(status.exit_code())
}

fn run(
    command: Commands,
    conn: &Connection,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> CommandStatus {
    match command {
        Commands::Show { uuid } => Show::new(conn).run(uuid.as_deref(), out, err),
        Commands::Add {
            source,
            email,
            name,
            username,
            uuid,
        } => {
            let request = AddIdentityRequest {
                source,
                email,
                name,
                username,
                uuid,
            };
            Add::new(conn).run(&request, out, err)
        }
        Commands::Rm { id, identity } => {
            let target = if identity {
                RemoveTarget::Identity
            } else {
                RemoveTarget::UniqueIdentity
            };
            Remove::new(conn).run(&id, target, out, err)
        }
        Commands::Orgs { add, delete, name } => {
            Orgs::new(conn).run(orgs_action(add, delete, name.as_deref()), out, err)
        }
        Commands::Enroll {
            uuid,
            organization,
            from,
            to,
        } => Enroll::new(conn).run(
            PeriodArgs {
                uuid: &uuid,
                organization: &organization,
                from: from.as_deref(),
                to: to.as_deref(),
            },
            out,
            err,
        ),
        Commands::Withdraw {
            uuid,
            organization,
            from,
            to,
        } => Withdraw::new(conn).run(
            PeriodArgs {
                uuid: &uuid,
                organization: &organization,
                from: from.as_deref(),
                to: to.as_deref(),
            },
            out,
            err,
        ),
    }
}

fn orgs_action(add: bool, delete: bool, name: Option<&str>) -> OrgsAction<'_> {
    match (add, delete, name) {
        (true, _, Some(name)) => OrgsAction::Add(name),
        (_, true, Some(name)) => OrgsAction::Delete(name),
        (_, _, term) => OrgsAction::List(term),
    }
}

/// Defaults, then config file, then environment (read through `env`), then
/// flags.
fn resolve_config(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SortingHatConfig, String> {
    let mut config = match &cli.config {
        Some(path) => SortingHatConfig::load_from_file(path).map_err(|err| err.to_string())?,
        None => SortingHatConfig::default(),
    };
    config.apply_env_from(env);

    if let Some(database) = &cli.database {
        config.database.path = database.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn bootstrap_failure(message: &str) -> ExitCode {
    eprintln!("Error: {message}");
    ExitCode::from(EXIT_BOOTSTRAP_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::{orgs_action, resolve_config, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use sortinghat_core::OrgsAction;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sortinghat").chain(args.iter().copied())).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| vars.get(key).cloned()
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_apply_without_file_env_or_flags() {
        let config = resolve_config(&parse(&["show"]), env_of(&[])).unwrap();
        assert_eq!(config.database.path, PathBuf::from("sortinghat.db"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.dir, None);
    }

    #[test]
    fn environment_overrides_file_and_flags_override_environment() {
        let file = config_file(
            "[database]\npath = \"/srv/file.db\"\n\n[logging]\nlevel = \"error\"\n",
        );
        let path = file.path().to_str().unwrap();

        let from_file = resolve_config(&parse(&["-c", path, "show"]), env_of(&[])).unwrap();
        assert_eq!(from_file.database.path, PathBuf::from("/srv/file.db"));
        assert_eq!(from_file.logging.level, "error");

        let env = [
            ("SORTINGHAT_DATABASE", "/srv/env.db"),
            ("SORTINGHAT_LOG_LEVEL", "info"),
        ];
        let from_env = resolve_config(&parse(&["-c", path, "show"]), env_of(&env)).unwrap();
        assert_eq!(from_env.database.path, PathBuf::from("/srv/env.db"));
        assert_eq!(from_env.logging.level, "info");

        let from_flags = resolve_config(
            &parse(&["-c", path, "-d", "/srv/flag.db", "--log-level", "debug", "show"]),
            env_of(&env),
        )
        .unwrap();
        assert_eq!(from_flags.database.path, PathBuf::from("/srv/flag.db"));
        assert_eq!(from_flags.logging.level, "debug");
    }

    #[test]
    fn invalid_settings_are_reported() {
        let err = resolve_config(&parse(&["--log-level", "loud", "show"]), env_of(&[]))
            .unwrap_err();
        assert!(err.contains("unsupported log level"));

        let err = resolve_config(
            &parse(&["show"]),
            env_of(&[("SORTINGHAT_LOG_DIR", "relative/logs")]),
        )
        .unwrap_err();
        assert!(err.contains("absolute"));

        let err = resolve_config(&parse(&["-c", "/nonexistent/sortinghat.toml", "show"]), env_of(&[]))
            .unwrap_err();
        assert!(err.contains("cannot read config file"));
    }

    #[test]
    fn orgs_flags_select_the_action() {
        assert_eq!(orgs_action(false, false, None), OrgsAction::List(None));
        assert_eq!(orgs_action(false, false, Some("Bit")), OrgsAction::List(Some("Bit")));
        assert_eq!(orgs_action(true, false, Some("Example")), OrgsAction::Add("Example"));
        assert_eq!(
            orgs_action(false, true, Some("Example")),
            OrgsAction::Delete("Example")
        );
    }

    #[test]
    fn orgs_add_and_delete_flags_parse_with_a_name() {
        let cli = parse(&["orgs", "--add", "Example"]);
        assert!(matches!(
            cli.command,
            Commands::Orgs { add: true, delete: false, name: Some(ref name) } if name == "Example"
        ));

        let cli = parse(&["orgs", "--delete", "Example"]);
        assert!(matches!(
            cli.command,
            Commands::Orgs { add: false, delete: true, .. }
        ));

        assert!(Cli::try_parse_from(["sortinghat", "orgs", "--add"]).is_err());
        assert!(Cli::try_parse_from(["sortinghat", "orgs", "-a", "--delete", "Example"]).is_err());
    }
}
