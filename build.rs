// Copyright (c) 2023 Mike Tsao. All rights reserved.

use clap::CommandFactory;
use std::path::PathBuf;

include!("src/cli_args.rs");

// https://unix.stackexchange.com/questions/3586/what-do-the-numbers-in-a-man-page-mean
// Picking category 1 as a "user command"
fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli_args.rs");
    let out_dir =
        PathBuf::from(std::env::var_os("OUT_DIR").ok_or(std::io::ErrorKind::NotFound)?);
    let man = clap_mangen::Man::new(Args::command());
    let mut buffer: Vec<u8> = Default::default();
    man.render(&mut buffer)?;
    std::fs::write(out_dir.join("rowsync-cli.1"), buffer)?;
    Ok(())
}
