//! Which audio engine stream answers a periodicity query.
//!
//! The engine period is read through `IAudioClient3` on the endpoint. Host
//! and keyword-detector connectors ask in the endpoint's own direction.
//! Offload connectors ask as an offloaded render stream. A loopback tap is
//! the capture side of a render endpoint and cannot negotiate its period,
//! so it runs at the engine's default period.

use pin_resource_core::{ConnectorCategory, DataFlow, DirectoryError, Periodicity, ProcessingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStream {
    /// A shared-mode stream in the endpoint's own direction.
    Shared { offload: bool, raw: bool },
    /// The capture side of a render endpoint.
    Loopback,
}

impl EngineStream {
    pub fn plan(
        endpoint_flow: DataFlow,
        category: ConnectorCategory,
        mode: ProcessingMode,
        requested_flow: DataFlow,
    ) -> Result<Self, DirectoryError> {
        let raw = mode == ProcessingMode::RAW;
        match (category, endpoint_flow, requested_flow) {
            (ConnectorCategory::Loopback, DataFlow::Render, DataFlow::Capture) => Ok(Self::Loopback),
            (ConnectorCategory::Loopback, _, _) => Err(DirectoryError::NotSupported(format!(
                "loopback {:?} stream on a {:?} endpoint",
                requested_flow, endpoint_flow
            ))),
            (ConnectorCategory::Offload, DataFlow::Render, DataFlow::Render) => Ok(Self::Shared { offload: true, raw }),
            (ConnectorCategory::Offload, _, _) => Err(DirectoryError::NotSupported(format!(
                "offload {:?} stream on a {:?} endpoint",
                requested_flow, endpoint_flow
            ))),
            (_, endpoint, requested) if endpoint == requested => Ok(Self::Shared { offload: false, raw }),
            (category, _, _) => Err(DirectoryError::NotSupported(format!(
                "{} {:?} stream on a {:?} endpoint",
                category, requested_flow, endpoint_flow
            ))),
        }
    }
}

/// A loopback tap runs at the engine's default period only.
pub fn fixed_envelope(default_frames: u32) -> Periodicity {
    Periodicity {
        default_frames,
        fundamental_frames: default_frames,
        min_frames: default_frames,
        max_frames: default_frames,
        max_frames_extended: default_frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_is_capture_on_render() {
        let stream = EngineStream::plan(
            DataFlow::Render,
            ConnectorCategory::Loopback,
            ProcessingMode::NULL,
            DataFlow::Capture,
        );
        assert_eq!(stream, Ok(EngineStream::Loopback));
    }

    #[test]
    fn loopback_in_render_direction_is_not_supported() {
        let err = EngineStream::plan(
            DataFlow::Render,
            ConnectorCategory::Loopback,
            ProcessingMode::NULL,
            DataFlow::Render,
        )
        .unwrap_err();
        assert!(err.is_not_supported());
    }

    #[test]
    fn offload_asks_as_offloaded_render() {
        let stream = EngineStream::plan(
            DataFlow::Render,
            ConnectorCategory::Offload,
            ProcessingMode::RAW,
            DataFlow::Render,
        );
        assert_eq!(stream, Ok(EngineStream::Shared { offload: true, raw: true }));

        let capture = EngineStream::plan(
            DataFlow::Capture,
            ConnectorCategory::Offload,
            ProcessingMode::DEFAULT,
            DataFlow::Capture,
        );
        assert!(capture.unwrap_err().is_not_supported());
    }

    #[test]
    fn host_follows_endpoint_direction() {
        let stream = EngineStream::plan(
            DataFlow::Capture,
            ConnectorCategory::HostProcess,
            ProcessingMode::DEFAULT,
            DataFlow::Capture,
        );
        assert_eq!(stream, Ok(EngineStream::Shared { offload: false, raw: false }));

        let crossed = EngineStream::plan(
            DataFlow::Capture,
            ConnectorCategory::KeywordDetector,
            ProcessingMode::SPEECH,
            DataFlow::Render,
        );
        assert!(crossed.unwrap_err().is_not_supported());
    }

    #[test]
    fn fixed_envelope_is_valid() {
        let envelope = fixed_envelope(480);
        assert!(envelope.validate().is_ok());
        assert_eq!(envelope.max_frames_extended, 480);
    }
}
