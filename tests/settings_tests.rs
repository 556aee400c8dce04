use std::fs;

use serial_test::serial;
use snipview::settings::{self, Settings};
use snipview::theme::ThemeId;
use tempfile::TempDir;

#[test]
#[serial]
fn loads_settings_file_into_global() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "theme: Catppuccin Mocha\nexport:\n  filename: shot.png\n  directory: /tmp/shots\n",
    )
    .unwrap();

    settings::set_settings(Settings::default());
    settings::load_settings_from_path(&path);

    let loaded = settings::get_settings();
    assert_eq!(settings::get_theme(), ThemeId::CatppuccinMocha);
    assert_eq!(loaded.export.filename, "shot.png");
    assert_eq!(loaded.export_options().filename, "shot.png");

    settings::set_settings(Settings::default());
}

#[test]
#[serial]
fn broken_file_keeps_current_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "theme: [unclosed").unwrap();

    let mut current = Settings::default();
    current.export.footer = "kept".to_string();
    settings::set_settings(current.clone());

    settings::load_settings_from_path(&path);

    assert_eq!(settings::get_settings(), current);
    settings::set_settings(Settings::default());
}

#[test]
#[serial]
fn saved_defaults_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    settings::save_settings_to_file(&Settings::default(), &path);
    settings::set_settings(Settings {
        theme: "Catppuccin Mocha".to_string(),
        ..Settings::default()
    });
    settings::load_settings_from_path(&path);

    assert_eq!(settings::get_settings(), Settings::default());
}
