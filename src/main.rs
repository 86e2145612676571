use anyhow::Context;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tune_queue::config;
use tune_queue::{
    NullBackend, PlaybackBackend, PlayerController, QueueEngine, RepeatMode, SnapshotStore,
    TrackId, Transport,
};

#[derive(Debug, Default)]
struct CliArgs {
    state: Option<PathBuf>,
    fresh: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

type Player = PlayerController<NullBackend>;

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let settings = config::load_settings()?;
    init_logging(&settings.log_filter);

    let snapshot_path = match args.state {
        Some(path) => path,
        None => settings.snapshot_path()?,
    };

    let mut engine = QueueEngine::new();
    engine.set_repeat_mode(settings.default_repeat_mode);
    let mut player = PlayerController::new(engine, NullBackend::new())
        .with_store(SnapshotStore::new(snapshot_path))
        .with_shuffle_on_load(settings.shuffle_on_load);

    if !args.fresh && player.resume() {
        println!("Resumed saved queue");
        println!("{}", status_line(&player));
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read command")?;
        match run_command(&mut player, &line) {
            Ok(Flow::Continue) => println!("{}", status_line(&player)),
            Ok(Flow::Quit) => break,
            Err(err) => println!("error: {err:#}"),
        }
    }

    player.persist()?;
    Ok(())
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--state" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--state requires a file path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--state cannot be empty");
                }
                out.state = Some(PathBuf::from(value.trim()));
            }
            "--fresh" => out.fresh = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("tune-queue");
    println!("  --state <path>    Snapshot file to resume from and save to");
    println!("  --fresh           Start with an empty queue");
    println!();
    println!("Reads commands from stdin:");
    println!("  {COMMANDS}");
}

const COMMANDS: &str = "load <id>... | next | prev | jump <index> | shuffle | \
    repeat [none|one|all] | finished | stop | status | save | forget | quit";

fn run_command(player: &mut Player, raw: &str) -> anyhow::Result<Flow> {
    let input = raw.trim();
    let mut split = input.splitn(2, char::is_whitespace);
    let command = split.next().unwrap_or_default();
    let rest = split.next().unwrap_or("").trim();

    match command {
        "" | "status" => {}
        "help" => println!("{COMMANDS}"),
        "load" => {
            let ids = rest
                .split_whitespace()
                .map(|raw| {
                    raw.parse::<i64>()
                        .map(TrackId)
                        .with_context(|| format!("invalid track id {raw}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            player.load_queue(ids)?;
        }
        "next" => report_move(player.handle(Transport::Next)?, "End of queue"),
        "prev" => report_move(player.handle(Transport::Previous)?, "Start of queue"),
        "jump" => {
            let index = rest
                .parse::<i64>()
                .with_context(|| format!("Usage: jump <index>, got {rest:?}"))?;
            player.handle(Transport::JumpTo(index))?;
        }
        "shuffle" => {
            player.handle(Transport::ToggleShuffle)?;
        }
        "repeat" if rest.is_empty() => {
            player.handle(Transport::CycleRepeat)?;
        }
        "repeat" => {
            let Some(mode) = RepeatMode::parse(rest) else {
                anyhow::bail!("Usage: repeat [none|one|all]");
            };
            player.handle(Transport::SetRepeat(mode))?;
        }
        "finished" => {
            if player.track_finished()?.is_none() {
                println!("Reached end of queue");
            }
        }
        "stop" => {
            player.handle(Transport::Stop)?;
        }
        "save" => {
            player.persist()?;
            println!("Queue saved");
        }
        "forget" => {
            if let Some(store) = player.store() {
                store.clear()?;
            }
            player.engine_mut().clear();
            player.handle(Transport::Stop)?;
        }
        "quit" | "exit" => return Ok(Flow::Quit),
        other => anyhow::bail!("unknown command {other}, try help"),
    }

    Ok(Flow::Continue)
}

fn report_move(track: Option<TrackId>, exhausted: &str) {
    if track.is_none() {
        println!("{exhausted}");
    }
}

fn status_line(player: &Player) -> String {
    let state = player.transport_state();
    let engine = player.engine();
    let position = match (state.current, engine.current_index()) {
        (Some(track), Some(index)) => format!("track {track} ({}/{})", index + 1, engine.len()),
        _ => String::from("queue empty"),
    };
    let playing = match player.backend().now_playing() {
        Some(track) => format!("playing {track}"),
        None => String::from("stopped"),
    };

    format!(
        "{position} | {playing} | repeat {} | shuffle {} | next {} | prev {}",
        state.repeat_mode.label(),
        if state.shuffled { "on" } else { "off" },
        if state.can_next { "yes" } else { "no" },
        if state.can_previous { "yes" } else { "no" },
    )
}
