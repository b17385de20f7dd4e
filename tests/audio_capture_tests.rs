// Integration tests for microphone capture
//
// These tests verify that captured blocks reach the utterance in arrival
// order, that queued blocks are flushed before stop() returns, and that
// double start/stop calls are rejected or ignored.

mod common;

use anyhow::Result;
use common::{BrokenBackend, ScriptedBackend};
use interview_room::audio::{
    AudioBackend, AudioBackendConfig, AudioCaptureEncoder, FileBackend, WAV_HEADER_LEN,
};
use interview_room::error::SessionError;
use interview_room::session::{SessionConfig, SessionHandle, SessionState};
use std::time::Duration;

fn session() -> SessionHandle {
    SessionHandle::new(SessionState::new(SessionConfig::default(), 10))
}

#[tokio::test]
async fn test_blocks_arrive_in_order() -> Result<()> {
    let blocks: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32 / 10.0; 100 + i]).collect();
    let expected: Vec<f32> = blocks.concat();

    let state = session();
    let mut capture = AudioCaptureEncoder::new(state.clone(), Box::new(ScriptedBackend::new(blocks)), 16000);

    capture.start().await?;
    assert!(capture.is_recording());
    assert!(state.read(|s| s.is_recording));

    let utterance = capture.stop().await?.expect("recording was active");
    assert_eq!(utterance.len(), 100 + 101 + 102 + 103 + 104);
    assert_eq!(utterance.samples, expected);
    assert!(!state.read(|s| s.is_recording));
    assert!(state.read(|s| s.audio_chunks.is_empty()), "buffer is cleared after hand-off");

    Ok(())
}

#[tokio::test]
async fn test_three_blocks_encode_to_expected_size() -> Result<()> {
    let blocks = vec![vec![0.2; 4096]; 3];
    let mut capture = AudioCaptureEncoder::new(session(), Box::new(ScriptedBackend::new(blocks)), 16000);

    capture.start().await?;
    let wav = capture.stop().await?.expect("recording was active").into_wav()?;

    assert_eq!(wav.len(), WAV_HEADER_LEN + 3 * 4096 * 2);
    Ok(())
}

#[tokio::test]
async fn test_double_start_is_invalid_state() -> Result<()> {
    let mut capture = AudioCaptureEncoder::new(session(), Box::new(ScriptedBackend::new(vec![vec![0.0; 8]])), 16000);

    capture.start().await?;
    let err = capture.start().await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidState(_)), "got {err:?}");

    // The first recording is unaffected.
    let utterance = capture.stop().await?.expect("recording was active");
    assert_eq!(utterance.len(), 8);
    Ok(())
}

#[tokio::test]
async fn test_stop_while_idle_returns_nothing() -> Result<()> {
    let mut capture = AudioCaptureEncoder::new(session(), Box::new(ScriptedBackend::new(vec![])), 16000);

    assert!(capture.stop().await?.is_none());

    capture.start().await?;
    assert!(capture.stop().await?.is_some());
    assert!(capture.stop().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unavailable_microphone_is_device_error() {
    let state = session();
    let mut capture = AudioCaptureEncoder::new(state.clone(), Box::new(BrokenBackend), 16000);

    let err = capture.start().await.unwrap_err();
    assert!(matches!(err, SessionError::Device(_)), "got {err:?}");
    assert!(err.remediation().is_some());
    assert!(!capture.is_recording());
    assert!(!state.read(|s| s.is_recording));
}

#[tokio::test]
async fn test_each_recording_starts_from_an_empty_buffer() -> Result<()> {
    let mut capture = AudioCaptureEncoder::new(session(), Box::new(ScriptedBackend::new(vec![vec![0.5; 64]])), 16000);

    capture.start().await?;
    let first = capture.stop().await?.expect("recording was active");
    capture.start().await?;
    let second = capture.stop().await?.expect("recording was active");

    assert_eq!(first.len(), 64);
    assert_eq!(second.len(), 64);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_file_backend_replays_in_blocks() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("answer.wav");
    let samples: Vec<f32> = (0..10_000).map(|i| ((i % 200) as f32 / 200.0) - 0.5).collect();
    std::fs::write(&path, interview_room::encode_wav(&samples, 16000)?)?;

    let config = AudioBackendConfig {
        sample_rate: 16000,
        block_size: 4096,
    };
    let mut backend = FileBackend::new(vec![path], config)?;
    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());

    let mut sizes = Vec::new();
    while let Some(frame) = rx.recv().await {
        sizes.push(frame.samples.len());
    }
    assert_eq!(sizes, vec![4096, 4096, 10_000 - 8192]);

    backend.stop().await?;
    assert!(!backend.is_capturing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_file_backend_stop_ends_the_stream() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("long.wav");
    std::fs::write(&path, interview_room::encode_wav(&vec![0.1; 16000 * 10], 16000)?)?;

    let mut backend = FileBackend::new(vec![path], AudioBackendConfig::default())?;
    let mut rx = backend.start().await?;

    assert!(rx.recv().await.is_some());
    tokio::time::sleep(Duration::from_millis(300)).await;
    backend.stop().await?;

    let mut remaining = 0;
    while rx.recv().await.is_some() {
        remaining += 1;
    }
    assert!(remaining < 39, "replay kept going after stop ({remaining} blocks)");
    Ok(())
}

#[test]
fn test_missing_answer_file_is_device_error() {
    let result = FileBackend::new(vec!["/nonexistent/answer.wav".into()], AudioBackendConfig::default());
    assert!(matches!(result, Err(SessionError::Device(_))));
    assert!(matches!(
        FileBackend::new(vec![], AudioBackendConfig::default()),
        Err(SessionError::Device(_))
    ));
}
