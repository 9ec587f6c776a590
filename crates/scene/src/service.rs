//! Async shell around the controller.
//!
//! All state mutation happens inside one task that owns the controller;
//! the handle sends commands over an mpsc channel. The loop multiplexes
//! commands with the controller's next timer deadline (animation step or
//! coalesced threshold flush).

use std::time::{Duration, Instant};

use catalog::Selection;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::controller::OverlayController;
use crate::notice::Notice;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug)]
enum Command {
    ApplyFilters(Selection),
    SetYear(usize),
    SetSpeed(Duration),
    ToggleAnimation,
    EditThreshold { dataset: String, min_value: f64 },
    DrainNotices(oneshot::Sender<Vec<Notice>>),
}

/// The service task has shut down (its handle side was still in use).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceClosed;

impl std::fmt::Display for ServiceClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scene service is no longer running")
    }
}

impl std::error::Error for ServiceClosed {}

/// Cloneable command-sending side of a running scene service.
#[derive(Clone)]
pub struct SceneHandle {
    tx: mpsc::Sender<Command>,
}

impl SceneHandle {
    pub async fn apply_filters(&self, selection: Selection) -> Result<(), ServiceClosed> {
        self.send(Command::ApplyFilters(selection)).await
    }

    pub async fn set_year(&self, index: usize) -> Result<(), ServiceClosed> {
        self.send(Command::SetYear(index)).await
    }

    pub async fn set_speed(&self, interval: Duration) -> Result<(), ServiceClosed> {
        self.send(Command::SetSpeed(interval)).await
    }

    pub async fn toggle_animation(&self) -> Result<(), ServiceClosed> {
        self.send(Command::ToggleAnimation).await
    }

    pub async fn edit_threshold(
        &self,
        dataset: impl Into<String>,
        min_value: f64,
    ) -> Result<(), ServiceClosed> {
        self.send(Command::EditThreshold {
            dataset: dataset.into(),
            min_value,
        })
        .await
    }

    /// Takes the accumulated user-visible notices.
    pub async fn drain_notices(&self) -> Result<Vec<Notice>, ServiceClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::DrainNotices(tx)).await?;
        rx.await.map_err(|_| ServiceClosed)
    }

    async fn send(&self, command: Command) -> Result<(), ServiceClosed> {
        self.tx.send(command).await.map_err(|_| ServiceClosed)
    }
}

/// Owns the controller and runs its single logical thread.
pub struct SceneService {
    controller: OverlayController,
    rx: mpsc::Receiver<Command>,
}

/// Pairs a service with its handle. Run the service with
/// [`SceneService::run`]; the loop ends when every handle is dropped.
pub fn scene_channel(controller: OverlayController) -> (SceneHandle, SceneService) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    (SceneHandle { tx }, SceneService { controller, rx })
}

impl SceneService {
    pub async fn run(mut self) {
        loop {
            let deadline = self.controller.poll(Instant::now());
            tokio::select! {
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.dispatch(command).await,
                        None => {
                            debug!("all scene handles dropped, shutting down");
                            break;
                        }
                    }
                }
                _ = sleep_until_opt(deadline) => {}
            }
        }
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::ApplyFilters(selection) => self.controller.apply_filters(selection).await,
            Command::SetYear(index) => self.controller.set_year(index),
            Command::SetSpeed(interval) => self.controller.set_speed(interval, Instant::now()),
            Command::ToggleAnimation => self.controller.toggle_animation(Instant::now()),
            Command::EditThreshold { dataset, min_value } => {
                self.controller.edit_threshold(dataset, min_value, Instant::now());
            }
            Command::DrainNotices(reply) => {
                let _ = reply.send(self.controller.drain_notices());
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none pending.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
