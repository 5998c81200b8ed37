// Copyright (c) 2023 Mike Tsao. All rights reserved.

// Command-line arguments for rowsync-cli. This file is include!()d by both the
// binary and build.rs, which renders the man page from it, so it can't depend
// on anything but std and clap.

#[derive(clap::Parser, Debug, Default)]
#[command(name = "rowsync-cli", author, about, long_about = None)]
struct Args {
    /// Hostname of the sync editor to connect to
    host: Option<String>,

    /// Port the sync editor listens on
    #[clap(short = 'p', long, value_parser, default_value_t = 1338)]
    port: u16,

    /// Play back this track file instead of connecting to an editor
    #[clap(short = 'f', long, value_parser, conflicts_with = "host")]
    file: Option<std::path::PathBuf>,

    /// Session settings file (JSON5)
    #[clap(short = 'c', long, value_parser)]
    config: Option<std::path::PathBuf>,

    /// Name of a track to follow. Can be given more than once.
    #[clap(short = 't', long = "track", value_parser)]
    tracks: Vec<String>,

    /// Override the configured beats per minute
    #[clap(long, value_parser)]
    bpm: Option<u32>,

    /// Override the configured rows per beat
    #[clap(long, value_parser)]
    rows_per_beat: Option<u32>,

    /// Where to write tracks when the editor asks to save
    #[clap(short = 's', long, value_parser)]
    save_to: Option<std::path::PathBuf>,

    /// Don't print track values
    #[clap(short = 'q', long, value_parser)]
    quiet: bool,

    /// Enable debug logging
    #[clap(short = 'd', long, value_parser)]
    debug: bool,

    /// Print version and exit
    #[clap(short = 'v', long, value_parser)]
    version: bool,
}
