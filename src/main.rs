use clap::Parser;
use spellpal::{
    config::{Config, ConfigStore, FileConfigStore},
    dispatcher::{narrate_report, Dispatcher},
    host::Console,
    runtime::{Runner, StdinTurnSource},
    session::{PronunciationMode, Session},
    ProfileStore, SqliteProfileStore,
};
use std::{error::Error, io, path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// spelling practice you talk to: add words, take a test, mark it, see what needs work
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A turn-based spelling practice assistant. Each input line is one turn: \
                  either a JSON event like {\"type\":\"AddWords\",\"slots\":{\"words\":\"cat dog\"}} \
                  or the shorthand `AddWords words=cat dog`."
)]
pub struct Cli {
    /// profile to practise with
    #[clap(short = 'u', long = "user")]
    user_id: Option<String>,

    /// path to the profile database
    #[clap(long = "db")]
    database_path: Option<PathBuf>,

    /// path to the config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// read answers back letter by letter instead of phonetically
    #[clap(short = 'l', long)]
    letters: bool,

    /// seconds without input before the session closes
    #[clap(long = "idle-secs")]
    idle_timeout_secs: Option<u64>,

    /// print responses as JSON lines
    #[clap(long)]
    json: bool,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// print the word report for the user and exit
    #[clap(short = 'r', long)]
    report: bool,
}

impl Cli {
    /// Layers command-line overrides on top of the loaded config.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(ref user_id) = self.user_id {
            cfg.user_id = user_id.clone();
        }
        if let Some(ref path) = self.database_path {
            cfg.database_path = Some(path.clone());
        }
        if self.letters {
            cfg.pronunciation = PronunciationMode::Letters;
        }
        if let Some(secs) = self.idle_timeout_secs {
            cfg.idle_timeout_secs = secs;
        }
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let config = cli.apply(config_store.load());
    init_tracing(&config.log_filter);

    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "config saved");
    }

    let db_path = config.resolved_database_path();
    let store = SqliteProfileStore::open(&db_path, config.user_id.clone())?;
    info!(db = %db_path.display(), user = %config.user_id, "profile store opened");

    if cli.report {
        match store.load()? {
            Some(profile) => {
                let session = Session::hydrate(&profile, config.pronunciation);
                println!("{}", narrate_report(profile.user_name.as_deref(), &session));
            }
            None => println!("No profile found for {}.", config.user_id),
        }
        return Ok(());
    }

    let dispatcher = Dispatcher::new(store).with_pronunciation(config.pronunciation);
    let mut console = Console::new(dispatcher, io::stdout(), cli.json);
    let runner = Runner::new(
        StdinTurnSource::new(),
        Duration::from_secs(config.idle_timeout_secs.max(1)),
    );
    console.run(&runner)?;

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["spellpal"]);
        assert_eq!(cli.user_id, None);
        assert_eq!(cli.database_path, None);
        assert!(!cli.letters);
        assert!(!cli.json);
        assert!(!cli.report);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "spellpal",
            "-u",
            "ada",
            "--db",
            "/tmp/p.db",
            "--letters",
            "--idle-secs",
            "45",
            "--json",
        ]);
        assert_eq!(cli.user_id.as_deref(), Some("ada"));
        assert_eq!(cli.database_path, Some(PathBuf::from("/tmp/p.db")));
        assert!(cli.letters);
        assert_eq!(cli.idle_timeout_secs, Some(45));
        assert!(cli.json);
    }

    #[test]
    fn test_apply_overrides_config() {
        let cli = Cli::parse_from(["spellpal", "-u", "ada", "-l", "--idle-secs", "10"]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.user_id, "ada");
        assert_eq!(cfg.pronunciation, PronunciationMode::Letters);
        assert_eq!(cfg.idle_timeout_secs, 10);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn test_apply_keeps_config_without_flags() {
        let cli = Cli::parse_from(["spellpal"]);
        let loaded = Config {
            user_id: "household".into(),
            pronunciation: PronunciationMode::Letters,
            ..Config::default()
        };
        assert_eq!(cli.apply(loaded.clone()), loaded);
    }
}
