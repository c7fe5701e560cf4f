//! Anatomy Sim - Entry Point
//!
//! Loads a species schema, builds a body from it and throws seeded strikes
//! at it, printing what each one did.

use std::path::PathBuf;

use anatomy_engine::anatomy::PartCatalog;
use anatomy_engine::body::{Body, HeldItem};
use anatomy_engine::combat::{strike_from, Damage, DamageType, HitOptions};
use anatomy_engine::core::config::StaticConfigStore;
use anatomy_engine::core::error::Result;
use anatomy_engine::core::types::{Alignment, Orientation};
use anatomy_engine::effects::{aftermath, Notification};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Throw strikes at a body and report the damage
#[derive(Parser, Debug)]
#[command(name = "anatomy-sim")]
#[command(about = "Resolve seeded strikes against a species body")]
struct Args {
    /// Species schema file
    #[arg(long, default_value = "data/species/humanoid.toml")]
    species: PathBuf,

    /// Optional TOML file with a [static] table of tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of strikes
    #[arg(long, short = 'n', default_value_t = 10)]
    strikes: u32,

    /// Damage type of every strike
    #[arg(long, default_value = "Slashing")]
    damage_type: DamageType,

    /// Damage per strike
    #[arg(long, default_value_t = 12.0)]
    amount: f64,

    /// Strike from: left, right, center or irrelevant
    #[arg(long, default_value = "irrelevant")]
    from: String,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct StrikeReport {
    strike: u32,
    surface: String,
    struck: String,
    ordinary: f64,
    bone: f64,
    notifications: Vec<Notification>,
}

fn parse_alignment(value: &str) -> Alignment {
    match value.to_ascii_lowercase().as_str() {
        "left" => Alignment::Left,
        "right" => Alignment::Right,
        "center" | "centre" => Alignment::Center,
        _ => Alignment::Irrelevant,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anatomy_engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let config = match &args.config {
        Some(path) => StaticConfigStore::load_file(path)?,
        None => StaticConfigStore::new(),
    };

    let catalog = PartCatalog::new();
    let schema = catalog.load_file(&args.species)?;
    tracing::info!("Running {} strikes against {} (seed {})", args.strikes, schema.name, seed);

    let mut body = Body::new(schema.clone());
    body.in_combat = true;
    for hand in schema.externals().filter(|n| n.as_external().is_some_and(|e| e.wielding)) {
        body.hold(hand.id(), HeldItem::new(format!("{} dagger", hand.name()), true));
    }

    let alignment = parse_alignment(&args.from);
    let mut reports = Vec::new();
    for strike in 1..=args.strikes {
        let damage = Damage::new(args.amount, args.damage_type);
        let (hit, outcome) = match strike_from(
            &mut body,
            alignment,
            Orientation::Irrelevant,
            damage,
            HitOptions::default(),
            &config,
            &mut rng,
        ) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Strike {} failed: {}", strike, e);
                break;
            }
        };
        let notifications = aftermath(&mut body, &outcome, &config)?;

        let name = |id| schema.node(id).map_or("?", |n| n.name()).to_string();
        reports.push(StrikeReport {
            strike,
            surface: name(hit.surface),
            struck: name(hit.node),
            ordinary: outcome.split.ordinary,
            bone: outcome.split.bone,
            notifications,
        });
    }

    if args.format == "json" {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize report: {}", e),
        }
        return Ok(());
    }

    for report in &reports {
        println!(
            "#{:>3} {} -> {} (ordinary {:.1}, bone {:.1})",
            report.strike, report.surface, report.struck, report.ordinary, report.bone
        );
        for notification in &report.notifications {
            println!("       {}", notification.describe(&schema));
        }
    }
    println!(
        "\n{} wounds, {} broken bones, {} items dropped, position {:?}",
        body.wounds().len(),
        body.broken_bones().count(),
        body.dropped.len(),
        body.position
    );
    Ok(())
}
