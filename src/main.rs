// Scorecast sync runner.
//
// Admin entry point for pulling upstream fixtures into a group's gameweek.
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open the object store
// 4. Build the fixture source and game engine
// 5. Run the sync and report the outcome

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use scorecast::engine::GameEngine;
use scorecast::store::SqliteStore;
use scorecast::sync::FootballDataClient;
use scorecast::{config, store::ObjectStore, sync::FixtureSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Scorecast sync starting up");

    let args: Vec<String> = std::env::args().collect();
    let (group_id, actor, gameweek) = match args.as_slice() {
        [_, group, actor] => (group.clone(), actor.clone(), None),
        [_, group, actor, gw] => {
            let gw: u32 = gw
                .parse()
                .with_context(|| format!("invalid gameweek number `{gw}`"))?;
            (group.clone(), actor.clone(), Some(gw))
        }
        _ => {
            eprintln!("usage: scorecast <group-id> <admin-user> [gameweek]");
            std::process::exit(2);
        }
    };

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: competition={}, season={}",
        config.api.competition, config.game.season
    );

    // 3. Open the object store
    let store: Arc<dyn ObjectStore> =
        Arc::new(SqliteStore::open(&config.db_path).context("failed to open object store")?);
    info!("Object store opened at {}", config.db_path);

    // 4. Build the fixture source and game engine
    let source: Arc<dyn FixtureSource> = Arc::new(FootballDataClient::with_base_url(
        config.api.base_url.clone(),
        config.api.token.clone(),
    ));
    let engine = GameEngine::from_config(store, source, &config.game);

    // Default to the group's current gameweek when none was given.
    let gameweek = match gameweek {
        Some(gw) => gw,
        None => engine.get_group(&group_id, &actor)?.current_gameweek,
    };

    // 5. Run the sync and report the outcome
    info!(group = %group_id, actor = %actor, gameweek, "running sync");
    let summary = engine
        .sync_gameweek(
            &group_id,
            &actor,
            &config.api.competition,
            &config.game.season,
            gameweek,
        )
        .await
        .context("sync failed")?;

    match summary {
        Some(summary) => {
            println!(
                "gameweek {gameweek} synced: {} matched, {} added, {} retained, {} dropped",
                summary.matched, summary.added, summary.retained, summary.dropped
            );
        }
        None => {
            println!("gameweek {gameweek}: upstream reported no matches; nothing changed");
        }
    }

    info!("Scorecast sync finished");
    Ok(())
}

/// Initialize tracing to log to a file, keeping stdout free for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("scorecast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scorecast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
