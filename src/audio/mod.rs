pub mod backend;
pub mod capture;
pub mod decode;
pub mod file;
pub mod playback;
pub mod wav;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use capture::AudioCaptureEncoder;
pub use decode::{decode_audio, DecodedAudio};
pub use file::{AudioFile, FileBackend};
pub use playback::{AudioSink, FileSink, PlaybackOutcome};
pub use wav::{encode_wav, float_to_pcm16, Utterance, WAV_HEADER_LEN};
