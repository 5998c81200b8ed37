// Copyright (c) 2023 Mike Tsao. All rights reserved.

use app_dirs2::{AppDataType, AppInfo};
use std::path::PathBuf;

const APP_INFO: AppInfo = AppInfo {
    name: "rowsync",
    author: "Mike Tsao <mike@sowbug.com>",
};

/// Paths contains path-building utilities.
pub struct Paths {}
impl Paths {
    /// The name of the settings file in the per-user config directory.
    pub const SETTINGS_FILE: &'static str = "settings.json5";
    /// The name of the track file in the per-user data directory.
    pub const TRACKS_FILE: &'static str = "tracks.txt";

    // See https://docs.rs/app_dirs2/latest/app_dirs2/ for platform-specific
    // example paths. Falls back to the current directory if the platform has
    // no such directory or it can't be created.
    fn app_root(data_type: AppDataType) -> PathBuf {
        app_dirs2::get_app_root(data_type, &APP_INFO)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default())
    }

    /// Returns the path of the user's session settings file.
    pub fn settings_file() -> PathBuf {
        Self::app_root(AppDataType::UserConfig).join(Self::SETTINGS_FILE)
    }

    /// Returns the default place to save tracks when the editor asks.
    pub fn tracks_file() -> PathBuf {
        Self::app_root(AppDataType::UserData).join(Self::TRACKS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_files_have_the_right_names() {
        assert!(Paths::settings_file().ends_with(Paths::SETTINGS_FILE));
        assert!(Paths::tracks_file().ends_with(Paths::TRACKS_FILE));
    }
}
