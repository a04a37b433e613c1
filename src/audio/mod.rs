pub mod artifact;
pub mod backend;
pub mod replay;

pub use artifact::{AudioArtifact, ARTIFACT_FILE_NAME, WAV_MEDIA_TYPE};
pub use backend::{AudioCaptureDevice, AudioFrame, CaptureConfig};
pub use replay::{DeviceProbe, ReplayDevice};
