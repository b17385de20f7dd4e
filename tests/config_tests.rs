// Integration tests for configuration loading

use anyhow::Result;
use interview_room::config::Config;
use interview_room::session::SessionConfig;
use interview_room::speech::Voice;
use std::io::Write;
use std::time::Duration;

fn write_config(contents: &str) -> Result<(tempfile::TempDir, String)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("interview-room.toml");
    let mut file = std::fs::File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    let path = path.to_string_lossy().into_owned();
    Ok((dir, path))
}

#[test]
fn test_minimal_config_uses_defaults() -> Result<()> {
    let (_dir, path) = write_config(
        r#"
[service]
name = "interview-room"

[service.http]
bind = "127.0.0.1"
port = 9000

[backend]
base_url = "http://backend.local:8000"
"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.service.http.port, 9000);
    assert_eq!(config.backend.base_url, "http://backend.local:8000");

    assert_eq!(config.session.difficulty, 5);
    assert!(config.session.voice.is_none());
    assert_eq!(config.audio.sample_rate, 16000);
    assert_eq!(config.video.sampling_interval(), Duration::from_secs(1));
    assert_eq!(config.video.ring_capacity, 10);
    assert_eq!(config.analysis.interval(), Duration::from_secs(5));
    assert_eq!(config.analysis.batch_size, 5);
    assert_eq!(config.analysis.alert_display(), Duration::from_secs(5));
    Ok(())
}

#[test]
fn test_session_section_feeds_session_config() -> Result<()> {
    let (_dir, path) = write_config(
        r#"
[service]
name = "interview-room"

[service.http]
bind = "0.0.0.0"
port = 8765

[backend]
base_url = "http://127.0.0.1:8000"

[session]
scenario = "product_manager"
language = "en-US"
difficulty = 9
voice = "diana"

[video]
max_dimension = 480
"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.video.max_dimension, 480);
    assert_eq!(config.video.jpeg_quality, 60, "unset keys keep their defaults");

    let session = SessionConfig::from_config(&config);
    assert_eq!(session.scenario, "product_manager");
    assert_eq!(session.language, "en-US");
    assert_eq!(session.difficulty.level(), 9);
    assert_eq!(session.voice, Voice::Diana);
    assert!(session.session_id.starts_with("interview-"));
    Ok(())
}

#[test]
fn test_missing_backend_section_is_an_error() -> Result<()> {
    let (_dir, path) = write_config(
        r#"
[service]
name = "interview-room"

[service.http]
bind = "127.0.0.1"
port = 8765
"#,
    )?;

    assert!(Config::load(&path).is_err());
    Ok(())
}

#[test]
fn test_shipped_config_loads() -> Result<()> {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/interview-room"))?;
    assert_eq!(config.service.name, "interview-room");
    assert_eq!(config.analysis.batch_size, 5);
    Ok(())
}
