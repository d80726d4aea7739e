mod aggregation;
mod apple_music;
mod selection;

use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use log::LevelFilter;

use crate::apple_music::custom_types::AlbumKey;
use crate::selection::{Combine, Criterion, ThresholdPolicy};

#[derive(Parser)]
#[command(
    version,
    author,
    about,
    long_about = None,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    candidates: CandidatesArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// The shell to generate the completions for
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

#[derive(Args)]
struct CandidatesArgs {
    /// Path to the iTunes/Apple Music library XML file (File > Library > Export Library...)
    ///
    /// A file literally named `completions` has to be given as `./completions`.
    #[arg(required = true)]
    library_xml_file_path: Option<PathBuf>,

    /// Select albums whose average star rating is below this value
    #[arg(long, value_name = "STARS")]
    max_average_rating: Option<f64>,

    /// Select albums with no track rated above this many stars
    #[arg(long, value_name = "STARS")]
    max_rating: Option<f64>,

    /// Select albums whose average play count per track is below this value
    #[arg(long, value_name = "PLAYS")]
    max_average_plays: Option<f64>,

    /// Select albums played at most this many times in total
    #[arg(long, value_name = "PLAYS")]
    max_total_plays: Option<u64>,

    /// Only select albums with at least this fraction (0-1) of tracks rated
    #[arg(long, value_name = "FRACTION")]
    min_rated_fraction: Option<f64>,

    /// Whether all or any of the criteria have to match
    #[arg(long = "match", value_enum, default_value_t)]
    combine: Combine,

    /// Let albums without any rated track match the rating criteria
    #[arg(long)]
    include_unrated: bool,

    /// How tracks are grouped into albums
    #[arg(long, value_enum, default_value_t)]
    group_by: AlbumKey,

    /// Log more details to stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl CandidatesArgs {
    fn policy(&self) -> Result<ThresholdPolicy> {
        let mut criteria = Vec::new();
        if let Some(stars) = self.max_average_rating {
            ensure!(stars.is_finite(), "invalid maximum average rating");
            criteria.push(Criterion::AverageRatingBelow(stars));
        }
        if let Some(stars) = self.max_rating {
            ensure!(stars.is_finite(), "invalid maximum rating");
            criteria.push(Criterion::MaxRatingAtMost(stars));
        }
        if let Some(plays) = self.max_average_plays {
            ensure!(plays.is_finite(), "invalid maximum average play count");
            criteria.push(Criterion::AveragePlayCountBelow(plays));
        }
        if let Some(plays) = self.max_total_plays {
            criteria.push(Criterion::TotalPlayCountAtMost(plays));
        }
        if let Some(fraction) = self.min_rated_fraction {
            ensure!(
                (0.0..=1.0).contains(&fraction),
                "minimum rated fraction must be between 0 and 1",
            );
            criteria.push(Criterion::RatedFractionAtLeast(fraction));
        }
        ensure!(
            !criteria.is_empty(),
            "no removal criteria given, pass at least one threshold (see --help)",
        );
        Ok(ThresholdPolicy {
            criteria,
            combine: self.combine,
            unrated_matches: self.include_unrated,
        })
    }
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn format_stars(stars: Option<f64>) -> String {
    stars.map_or_else(|| "-".to_owned(), |stars| format!("{stars:.2}"))
}

fn find_candidates<W: Write>(args: &CandidatesArgs, path: &Path, output: W) -> Result<()> {
    let policy = args.policy()?;
    log::debug!("Using {policy:?}");

    let tracks = apple_music::load_library(path, args.group_by)?;
    let albums = aggregation::aggregate_albums(&tracks);
    let candidates = selection::select_candidates(&albums, &policy);
    log::info!(
        "{} of {} albums are removal candidates",
        candidates.len(),
        albums.len(),
    );
    for album in &candidates {
        log::info!(
            "{}: {} tracks, {:.0}% rated, average rating {}, max rating {}, {} plays, {:.0}MB, {} min",
            album.album_id,
            album.track_count,
            album.rated_fraction() * 100.0,
            format_stars(album.average_rating),
            format_stars(album.max_rating),
            album.total_play_count,
            album.total_size_bytes as f64 / (1024.0 * 1024.0),
            album.total_time_ms / 60_000,
        );
    }

    selection::write_report(output, &candidates)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            shell.generate(&mut Cli::command(), &mut io::stdout());
        }
        None => {
            init_logger(cli.candidates.verbose);
            let path = cli
                .candidates
                .library_xml_file_path
                .as_deref()
                .context("missing library XML file path")?;
            find_candidates(&cli.candidates, path, BufWriter::new(io::stdout().lock()))?;
        }
    }
    Ok(())
}
