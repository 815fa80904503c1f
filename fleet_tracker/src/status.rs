use async_trait::async_trait;
use module_core::{EventKind, Module, ModuleCtx};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Logs the position and the location requests of the tracker.
pub struct StatusLog {
    ctx: ModuleCtx,
}

impl StatusLog {
    pub fn new(ctx: ModuleCtx) -> Self {
        StatusLog { ctx }
    }
}

#[async_trait]
impl Module for StatusLog {
    async fn run(&mut self) -> Result<(), ()> {
        loop {
            match self.ctx.receiver.recv().await {
                Ok(event) => match event.kind {
                    EventKind::QuitEvent => break,
                    EventKind::PositionUpdatedEvent(position) => info!("Position {position}"),
                    EventKind::LocationRequestEvent(outcome) => {
                        info!("Location request {outcome:?}")
                    }
                    _ => {}
                },
                Err(RecvError::Lagged(skipped)) => warn!("Status log skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Status log stopped");
        Ok(())
    }
}
