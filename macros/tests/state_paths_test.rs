//! Tests for #[derive(StatePaths)]

use composable_store_core::prelude::*;
use composable_store_macros::StatePaths;

#[derive(StatePaths, Debug, Clone, Default, PartialEq)]
struct Settings {
    volume: u8,
    muted: bool,
}

#[derive(StatePaths, Debug, Clone, Default, PartialEq)]
struct AppState {
    settings: Settings,
    profile: Option<String>,
    #[state_path(skip)]
    cache: Vec<u8>,
}

#[test]
fn test_field_path_reads_and_writes() {
    let mut state = AppState::default();
    AppState::settings_path().modify(&mut state, |settings| settings.volume = 7);

    assert_eq!(state.settings.volume, 7);
    assert_eq!(AppState::settings_path().get(&state).map(|s| s.volume), Some(7));
    assert!(state.cache.is_empty());
}

#[test]
fn test_paths_compose() {
    let muted = AppState::settings_path().appending(Settings::muted_path());
    let mut state = AppState::default();

    muted.modify(&mut state, |muted| *muted = true);
    assert!(state.settings.muted);
}

#[test]
fn test_optional_fields_compose_with_some() {
    let name = AppState::profile_path().appending(StatePath::some());
    let mut state = AppState::default();

    assert_eq!(name.get(&state), None);
    state.profile = Some("ada".into());
    name.modify(&mut state, |name| name.push_str("!"));
    assert_eq!(state.profile.as_deref(), Some("ada!"));
}
