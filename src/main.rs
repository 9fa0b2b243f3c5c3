use std::path::PathBuf;
use std::process;

use chordgen::{
    save_progression, ExportOptions, PitchPolicy, Progression, ProgressionBuilder, StyleMap,
};
use clap::Parser;
use log::{error, info};

#[derive(Parser)]
#[command(name = "chordgen")]
#[command(about = "Generate a voice-led chord progression and export it as MIDI")]
struct Cli {
    /// Tonic of the key (C, F#, Eb, ...)
    #[arg(long, default_value = "C")]
    tonic: String,

    /// "major" or "minor"
    #[arg(long, default_value = "major")]
    mode: String,

    /// Style template name
    #[arg(long, default_value = "pop")]
    style: String,

    /// Total number of chords
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..=64))]
    chords: u16,

    /// Beats each chord is held for
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=16))]
    beats: u32,

    /// Tempo in BPM
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u16).range(20..=300))]
    tempo: u16,

    /// Lowest octave chord roots may start in
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=8))]
    octave: u8,

    /// Style map file (.json, .yaml or .yml); built-in styles when omitted
    #[arg(long)]
    styles: Option<PathBuf>,

    /// Output MIDI file
    #[arg(long, short, default_value = "progression.mid")]
    out: PathBuf,

    /// Keep every chord in root position
    #[arg(long)]
    no_smart_voicing: bool,

    /// Fold pitches above 127 down by octaves instead of failing
    #[arg(long)]
    clamp_pitches: bool,

    /// Print the realized progression as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the available style names and exit
    #[arg(long)]
    list_styles: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let styles = match &cli.styles {
        Some(path) => match StyleMap::load(path) {
            Ok(styles) => styles,
            Err(e) => {
                error!("Error loading styles: {}", e);
                process::exit(1);
            }
        },
        None => StyleMap::fallback(),
    };

    if cli.list_styles {
        for name in styles.names() {
            println!("{}", name);
        }
        return;
    }

    let policy = if cli.clamp_pitches {
        PitchPolicy::Clamp
    } else {
        PitchPolicy::Strict
    };

    let progression = match ProgressionBuilder::new(&styles)
        .floor_octave(cli.octave)
        .pitch_policy(policy)
        .smart_voicing(!cli.no_smart_voicing)
        .build(&cli.tonic, &cli.mode, &cli.style, usize::from(cli.chords))
    {
        Ok(progression) => progression,
        Err(e) => {
            error!("Generation error: {}", e);
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&progression) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Error serializing progression: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_progression(&progression);
    }

    let options = ExportOptions {
        beats_per_chord: cli.beats,
        ..ExportOptions::default()
    };
    if let Err(e) = save_progression(&progression, &cli.out, &options, f64::from(cli.tempo)) {
        error!("Export error: {}", e);
        process::exit(1);
    }
}

fn print_progression(progression: &Progression) {
    info!("{} ({} chords)", progression.key, progression.len());
    let labels = progression.labels();
    for (i, (chord, (figure, symbol))) in progression.chords.iter().zip(labels).enumerate() {
        let pitches: Vec<String> = chord.pitches.iter().map(|p| p.to_string()).collect();
        println!(
            "{:>3}  {:<6} {:<7} inv {}  [{}]",
            i + 1,
            figure,
            symbol,
            chord.inversion(),
            pitches.join(" ")
        );
    }
}
