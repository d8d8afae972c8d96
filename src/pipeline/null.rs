//! No-op pipeline for builds without broadcast support
//!
//! Used when the `gst` feature is compiled out: stations run their full
//! state machine against a pipeline that accepts every command and never
//! emits a notification, so the control surface can be exercised on machines
//! without GStreamer installed.

use crate::error::Result;
use crate::pipeline::{
    BroadcastSpec, Pipeline, PipelineEvent, PipelineFactory, PipelineHandle, PipelineState,
};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

pub struct NullPipelineFactory;

impl PipelineFactory for NullPipelineFactory {
    fn create(&self, spec: &BroadcastSpec) -> Result<PipelineHandle> {
        debug!("Creating null pipeline for '{}' ({})", spec.station_name, spec.mount);
        let (tx, events) = mpsc::channel(1);
        Ok(PipelineHandle {
            pipeline: Box::new(NullPipeline { _events: tx }),
            events,
        })
    }
}

struct NullPipeline {
    // Held so the notification channel stays open for the pipeline's lifetime
    _events: mpsc::Sender<PipelineEvent>,
}

impl Pipeline for NullPipeline {
    fn set_source(&mut self, path: &Path) -> Result<()> {
        debug!("Null pipeline: source {}", path.display());
        Ok(())
    }

    fn set_state(&mut self, state: PipelineState) -> Result<()> {
        debug!("Null pipeline: state {:?}", state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IcecastConfig;

    #[tokio::test]
    async fn accepts_commands_and_stays_silent() {
        let factory = NullPipelineFactory;
        let spec = BroadcastSpec {
            station_name: "test".to_string(),
            mount: "/test".to_string(),
            icecast: IcecastConfig {
                server: "localhost".to_string(),
                port: 8000,
                username: "source".to_string(),
                password: "pw".to_string(),
            },
        };

        let mut handle = factory.create(&spec).unwrap();
        handle.pipeline.set_source(Path::new("/tmp/a.mp3")).unwrap();
        handle.pipeline.set_state(PipelineState::Playing).unwrap();
        assert!(handle.events.try_recv().is_err());
    }
}
