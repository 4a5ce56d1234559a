use std::sync::Arc;

/// Request lifecycle notifications. Each server instance owns its own sink,
/// injected at construction; there is no process-wide bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    RequestArrived {
        id: u64,
        method: String,
        url: String,
    },
    FileResolved {
        id: u64,
        path: String,
        content_type: String,
    },
    ResponseSent {
        id: u64,
        url: String,
        duration_ms: u64,
    },
}

pub trait EventSink: Send + Sync {
    fn notify(&self, event: Event);
}

pub type SharedSink = Arc<dyn EventSink>;

/// Default sink: forwards everything to the `log` facade.
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, event: Event) {
        match event {
            Event::RequestArrived { id, method, url } => {
                log::info!("#{} {} {} -> [arrived]", id, method, url)
            }
            Event::FileResolved {
                id,
                path,
                content_type,
            } => log::info!("#{} -> [resolved] {} ({})", id, path, content_type),
            Event::ResponseSent {
                id,
                url,
                duration_ms,
            } => log::info!("#{} {} -> [sent in {} ms]", id, url, duration_ms),
        }
    }
}
