// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The CLI (command-line interface) tool follows a sync editor, or plays back
//! a track file, and prints track values as rows go by.

use anyhow::anyhow;
use clap::Parser;
use log::{error, info, warn};
use rowsync::{
    app_version, Paths, Session, SessionEvent, SessionSettings, SyncError, TcpTransport,
    TrackFile, TrackId, Transport,
};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

include!("../cli_args.rs");

fn load_settings(args: &Args) -> anyhow::Result<SessionSettings> {
    let mut settings = if let Some(path) = &args.config {
        SessionSettings::new_from_json5_file(path)?
    } else {
        let path = Paths::settings_file();
        if path.exists() {
            SessionSettings::new_from_json5_file(&path)?
        } else {
            SessionSettings::default()
        }
    };
    if let Some(bpm) = args.bpm {
        settings.bpm = bpm;
    }
    if let Some(rows_per_beat) = args.rows_per_beat {
        settings.rows_per_beat = rows_per_beat;
    }
    settings.validate()?;
    Ok(settings)
}

fn print_values<T: Transport>(session: &Session<T>, followed: &[(String, TrackId)]) {
    let mut line = format!("row {:>6}", session.row());
    for (name, id) in followed {
        match session.value(*id) {
            Ok(value) => line.push_str(&format!("  {name}={value:.4}")),
            Err(e) => line.push_str(&format!("  {name}=<{e}>")),
        }
    }
    println!("{line}");
}

fn run<T: Transport>(
    mut session: Session<T>,
    track_names: &[String],
    save_to: PathBuf,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut followed = Vec::default();
    for name in track_names {
        followed.push((name.clone(), session.get_or_create(name)?));
    }
    if followed.is_empty() && !quiet {
        warn!("no --track given, so there's nothing to print");
    }

    let start_instant = Instant::now();
    let mut prev_ms = 0.0;
    loop {
        let now_ms = start_instant.elapsed().as_secs_f64() * 1000.0;
        let elapsed_ms = now_ms - prev_ms;
        prev_ms = now_ms;

        let mut should_print = match session.tick(elapsed_ms) {
            Ok(new_row) => new_row,
            Err(e) => {
                // The session has already logged any frame it rejected.
                let is_data_error = e
                    .downcast_ref::<SyncError>()
                    .map_or(false, SyncError::is_data_contract_violation);
                if !is_data_error {
                    warn!("lost the editor ({e:#}); carrying on offline");
                    session.detach();
                }
                false
            }
        };

        let events: Vec<SessionEvent> = session.drain_events().collect();
        for event in events {
            match event {
                SessionEvent::SaveRequested => {
                    if let Err(e) = TrackFile::save(session.tracks(), &save_to) {
                        error!("{e:#}");
                    }
                }
                SessionEvent::RowSet(_) => should_print = true,
                SessionEvent::PauseChanged(paused) => {
                    info!("{}", if paused { "paused" } else { "playing" })
                }
                _ => {}
            }
        }

        if should_print && !quiet && !followed.is_empty() {
            print_values(&session, &followed);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.version {
        println!("rowsync-cli {}", app_version());
        return Ok(());
    }

    let mut builder = env_logger::Builder::from_default_env();
    if args.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let settings = load_settings(&args)?;
    let params = settings.params()?;
    let save_to = args.save_to.clone().unwrap_or_else(Paths::tracks_file);

    if let Some(path) = &args.file {
        let tracks = TrackFile::load(path, settings.limits())?;
        // Without --track, follow every track in the file.
        let names = if args.tracks.is_empty() {
            tracks.iter().map(|t| t.name().to_string()).collect()
        } else {
            args.tracks.clone()
        };
        let mut session = Session::<TcpTransport>::new_offline(params, tracks);
        session.set_paused(false)?;
        run(session, &names, save_to, args.quiet)
    } else if let Some(host) = &args.host {
        let transport = TcpTransport::connect(host, args.port)?;
        run(
            Session::new_with(params, transport),
            &args.tracks,
            save_to,
            args.quiet,
        )
    } else {
        Err(anyhow!(
            "nothing to do: give a host to connect to, or --file to play back"
        ))
    }
}
