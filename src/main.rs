use std::time::Duration;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spore_words::{
    command::{Command, HELP},
    config::Config,
    dictionary::{Dictionary, PendingDictionary},
    game::{
        session::{GameSession, Progress, SelectionOutcome, TurnSummary},
        Scheduler, TokioScheduler,
    },
    models::GridEvent,
    store::{record_best, FileStore, KeyValueStore, BEST_SCORE_KEY, BEST_WORD_KEY},
    utils::WeightedLetterSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spore_words=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting spore words...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Load dictionary before the first board so the playable-words pass can run
    let dictionary = PendingDictionary::new();
    dictionary.fulfil(Dictionary::load_or_empty(&config.game.dictionary_path).await);

    let mut store = FileStore::open(&config.game.state_path).await?;
    if let (Some(score), Some(word)) = (store.get(BEST_SCORE_KEY), store.get(BEST_WORD_KEY)) {
        println!("Best so far: {} ({} points)", word, score);
    }

    let seed = config.game.rng_seed.unwrap_or_else(rand::random);
    tracing::info!("Using seed {}", seed);

    // Forward grid events to the terminal
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<GridEvent>();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            render_event(&event);
        }
    });

    let mut session = GameSession::new(
        &config.session_config(),
        config.params.clone(),
        dictionary,
        Box::new(WeightedLetterSource::new(StdRng::seed_from_u64(seed))),
        StdRng::seed_from_u64(seed.wrapping_add(1)),
        event_tx,
    )?;

    // Read stdin on its own task so input keeps arriving during cascades
    let (input_tx, mut input_rx) = mpsc::channel::<String>(100);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if input_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let scheduler = TokioScheduler;
    println!("{}", HELP);
    println!("{}", session.grid());

    loop {
        if session.is_busy() {
            match session.advance() {
                Progress::Exploded { .. } => {
                    pause_ignoring_input(&scheduler, session.cascade_delay(), &mut input_rx).await;
                }
                Progress::Settled(summary) => {
                    report_turn(&summary, &mut store).await;
                    println!("{}", session.grid());
                }
                _ => {}
            }
            continue;
        }

        let Some(line) = input_rx.recv().await else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Path(path) => match session.submit_path(&path) {
                SelectionOutcome::TooShort => println!("Words need at least 3 tiles"),
                SelectionOutcome::Ignored => println!("Start on a tile inside the board"),
                SelectionOutcome::Rejected { .. } | SelectionOutcome::Accepted { .. } => {}
            },
            Command::Show => println!("{}", session.grid()),
            Command::Hint(length) => {
                let words = session.hints(length);
                if words.is_empty() {
                    println!("No {}-letter words in a straight line", length);
                } else {
                    println!("{}", words.into_iter().collect::<Vec<_>>().join(" "));
                }
            }
            Command::ShowParams => println!("{}", serde_json::to_string_pretty(session.params())?),
            Command::SetParams(params) => match session.set_parameters(params) {
                Ok(()) => println!("Parameters updated"),
                Err(e) => println!("{}", e),
            },
            Command::Stats => {
                let stats = session.stats();
                println!(
                    "{} words, {} points",
                    stats.words_played, stats.total_score
                );
                if let Some((word, points)) = &stats.best_word {
                    println!("Best this session: {} ({} points)", word, points);
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    store.save().await?;
    tracing::info!("Goodbye");
    Ok(())
}

/// Wait out the pause between explosions. Lines typed meanwhile are dropped
/// and never shorten the pause.
async fn pause_ignoring_input(
    scheduler: &dyn Scheduler,
    delay: Duration,
    input: &mut mpsc::Receiver<String>,
) {
    let mut pause = scheduler.after(delay);
    let mut input_open = true;
    loop {
        tokio::select! {
            _ = &mut pause => return,
            line = input.recv(), if input_open => match line {
                Some(line) => tracing::info!("Board is busy, ignoring '{}'", line.trim()),
                None => input_open = false,
            },
        }
    }
}

async fn report_turn(summary: &TurnSummary, store: &mut FileStore) {
    let points = summary.score + summary.bonus.total();
    println!(
        "{}: {} points + {} bonus ({} tiles, {} chained)",
        summary.word,
        summary.score,
        summary.bonus.total(),
        summary.cascade.tiles_exploded,
        summary.cascade.cascade_count
    );
    if record_best(store, &summary.word, points) {
        println!("New best word!");
        if let Err(e) = store.save().await {
            tracing::error!("Failed to save best score: {}", e);
        }
    }
}

fn render_event(event: &GridEvent) {
    match event {
        GridEvent::WordAccepted { word, score } => println!("+ {} ({} points)", word, score),
        GridEvent::WordRejected { word } => println!("x {} is not a word", word),
        GridEvent::CascadeComplete {
            tiles_exploded,
            cascade_count,
        } => println!(
            "* cascade complete: {} tiles, {} chained",
            tiles_exploded, cascade_count
        ),
        GridEvent::GridReset => println!("! board regenerated"),
        other => match serde_json::to_string(other) {
            Ok(json) => tracing::debug!("{}", json),
            Err(e) => tracing::error!("Failed to serialize event: {}", e),
        },
    }
}
