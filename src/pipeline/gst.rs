//! GStreamer-backed Icecast broadcast pipeline
//!
//! Element chain per station:
//! `filesrc ! decodebin ! audioconvert ! audioresample ! volume !
//! lamemp3enc ! shout2send`, with decodebin's audio pad linked dynamically
//! once the first buffer reveals the stream type. Bus EOS and error messages
//! are forwarded into the station's notification channel by a dedicated
//! watcher thread.

use crate::error::{Error, Result};
use crate::pipeline::{
    BroadcastSpec, Pipeline, PipelineEvent, PipelineFactory, PipelineHandle, PipelineState,
};
use gstreamer::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const MP3_BITRATE: i32 = 128;
const MP3_QUALITY: f32 = 2.0;

/// Builds GStreamer broadcast pipelines for registered stations
pub struct GstPipelineFactory;

impl GstPipelineFactory {
    /// Initialize GStreamer for the process
    pub fn new() -> Result<Self> {
        gstreamer::init().map_err(|e| Error::Pipeline(format!("GStreamer init failed: {}", e)))?;
        Ok(Self)
    }
}

impl PipelineFactory for GstPipelineFactory {
    fn create(&self, spec: &BroadcastSpec) -> Result<PipelineHandle> {
        let pipeline = GstPipeline::build(spec)?;
        let bus = pipeline
            .pipeline
            .bus()
            .ok_or_else(|| Error::Pipeline("pipeline has no message bus".to_string()))?;
        let events = spawn_bus_watch(bus, Arc::clone(&pipeline.shutdown));
        Ok(PipelineHandle {
            pipeline: Box::new(pipeline),
            events,
        })
    }
}

struct GstPipeline {
    pipeline: gstreamer::Pipeline,
    filesrc: gstreamer::Element,
    shutdown: Arc<AtomicBool>,
}

impl GstPipeline {
    fn build(spec: &BroadcastSpec) -> Result<Self> {
        debug!("Building broadcast pipeline for '{}' ({})", spec.station_name, spec.mount);

        let pipeline = gstreamer::Pipeline::new();

        let filesrc = make_element("filesrc", "file-source")?;
        let decodebin = make_element("decodebin", "decoder")?;
        let audioconvert = make_element("audioconvert", "converter")?;
        let audioresample = make_element("audioresample", "resampler")?;
        let volume = make_element("volume", "volume-control")?;
        let encoder = make_element("lamemp3enc", "mp3-encoder")?;
        let sink = make_element("shout2send", "icecast-sink")?;

        encoder.set_property("bitrate", MP3_BITRATE);
        encoder.set_property("quality", MP3_QUALITY);

        sink.set_property("streamname", spec.station_name.as_str());
        sink.set_property("mount", spec.mount.as_str());
        sink.set_property("ip", spec.icecast.server.as_str());
        sink.set_property("port", spec.icecast.port as i32);
        sink.set_property("username", spec.icecast.username.as_str());
        sink.set_property("password", spec.icecast.password.as_str());

        pipeline
            .add_many([
                &filesrc,
                &decodebin,
                &audioconvert,
                &audioresample,
                &volume,
                &encoder,
                &sink,
            ])
            .map_err(|e| Error::Pipeline(e.to_string()))?;

        filesrc
            .link(&decodebin)
            .map_err(|e| Error::Pipeline(format!("linking filesrc: {}", e)))?;
        gstreamer::Element::link_many([&audioconvert, &audioresample, &volume, &encoder, &sink])
            .map_err(|e| Error::Pipeline(format!("linking encode chain: {}", e)))?;

        let convert_sink = audioconvert
            .static_pad("sink")
            .ok_or_else(|| Error::Pipeline("audioconvert has no sink pad".to_string()))?;
        decodebin.connect_pad_added(move |_, pad| {
            let is_audio = pad
                .current_caps()
                .and_then(|caps| caps.structure(0).map(|s| s.name().starts_with("audio/")))
                .unwrap_or(false);
            if is_audio && !convert_sink.is_linked() {
                if let Err(e) = pad.link(&convert_sink) {
                    warn!("Failed to link decoder pad: {}", e);
                } else {
                    debug!("Linked decoder audio pad to converter");
                }
            }
        });

        Ok(Self {
            pipeline,
            filesrc,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl Pipeline for GstPipeline {
    fn set_source(&mut self, path: &Path) -> Result<()> {
        let location = path
            .to_str()
            .ok_or_else(|| Error::Pipeline(format!("non-UTF8 path: {}", path.display())))?;
        self.filesrc.set_property("location", location);
        Ok(())
    }

    fn set_state(&mut self, state: PipelineState) -> Result<()> {
        let target = match state {
            PipelineState::Ready => gstreamer::State::Ready,
            PipelineState::Playing => gstreamer::State::Playing,
            PipelineState::Paused => gstreamer::State::Paused,
            PipelineState::Null => gstreamer::State::Null,
        };
        self.pipeline
            .set_state(target)
            .map_err(|e| Error::Pipeline(format!("state change to {:?} failed: {}", state, e)))?;
        if state == PipelineState::Null {
            self.shutdown.store(true, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

fn make_element(factory: &str, name: &str) -> Result<gstreamer::Element> {
    gstreamer::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|e| Error::Pipeline(format!("failed to create {} element: {}", factory, e)))
}

/// Forward bus EOS/error messages into the notification channel until the
/// pipeline shuts down or the receiving side goes away.
fn spawn_bus_watch(
    bus: gstreamer::Bus,
    shutdown: Arc<AtomicBool>,
) -> mpsc::Receiver<PipelineEvent> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        use gstreamer::MessageView;

        while !shutdown.load(Ordering::Relaxed) {
            let Some(message) = bus.timed_pop(gstreamer::ClockTime::from_mseconds(500)) else {
                continue;
            };
            let event = match message.view() {
                MessageView::Eos(_) => PipelineEvent::EndOfTrack,
                MessageView::Error(err) => {
                    PipelineEvent::Error(format!("{} ({:?})", err.error(), err.debug()))
                }
                _ => continue,
            };
            if tx.blocking_send(event).is_err() {
                break;
            }
        }
    });
    rx
}
