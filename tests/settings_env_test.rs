use pagerat::settings::Settings;
use serial_test::serial;

fn with_editor_env<T>(visual: Option<&str>, editor: Option<&str>, f: impl FnOnce() -> T) -> T {
    // Environment variables are process-wide; callers are serialized.
    unsafe {
        match visual {
            Some(v) => std::env::set_var("VISUAL", v),
            None => std::env::remove_var("VISUAL"),
        }
        match editor {
            Some(v) => std::env::set_var("EDITOR", v),
            None => std::env::remove_var("EDITOR"),
        }
    }
    f()
}

#[test]
#[serial]
fn visual_wins_over_editor_and_settings() {
    let settings = Settings::parse("editor: nano\n").unwrap();
    let command = with_editor_env(Some("code --wait"), Some("vi"), || settings.editor_command());
    assert_eq!(command, "code --wait");
}

#[test]
#[serial]
fn configured_editor_used_when_environment_is_empty() {
    let settings = Settings::parse("editor: nano\n").unwrap();
    let command = with_editor_env(None, None, || settings.editor_command());
    assert_eq!(command, "nano");
}

#[test]
#[serial]
fn falls_back_to_vim() {
    let command = with_editor_env(None, Some(""), || Settings::default().editor_command());
    assert_eq!(command, "vim");
}
