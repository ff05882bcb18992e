//! Session runtime
//!
//! One tokio task per mounted player. The task owns the
//! [`PlayerController`] and `select!`s over:
//!
//! - widget messages delivered by the host frame, and host updates to the
//!   chained item
//! - host input events (each answered with a [`Disposition`])
//! - the [`SyncPoller`] interval
//! - the controller's nearest component deadline
//! - the shutdown signal
//!
//! Nothing is shared, so nothing is locked. After every turn the render
//! model is republished through a `watch` channel.
//!
//! Teardown stops the task, which drops the poller, the receivers and the
//! controller with it. Late deliveries fail with
//! [`Error::SessionClosed`] and the published view stops changing.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use veil_common::config::PlayerConfig;
use veil_common::{Error, Result};

use crate::controller::{ControllerSetup, PlayerController, PlayerIo};
use crate::identity::SessionIdentity;
use crate::input::{Disposition, InputEvent};
use crate::poller::SyncPoller;
use crate::source::{NextSource, SourceRef};
use crate::time::SessionClock;
use crate::view::{Placeholder, PlayerView};

/// Pending host input requests before `input` waits
const INPUT_QUEUE_DEPTH: usize = 64;

/// What the host supplies at mount time
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Source reference (video id or URL)
    pub source: String,
    /// Optional item to chain after this one
    pub next_source: Option<String>,
    pub next_label: Option<String>,
    /// Raw viewer id or email from the profile collaborator
    pub viewer: Option<String>,
    pub config: PlayerConfig,
    /// Fixed watermark RNG seed (tests); random when `None`
    pub seed: Option<u64>,
}

/// Result of mounting a player
pub enum Mount {
    Player(SessionHandle),
    /// Source was unusable; nothing was started
    Unavailable(Placeholder),
}

enum InboundMessage {
    Widget { origin: String, data: Value },
    SetNext(Option<NextSource>),
}

struct InputRequest {
    event: InputEvent,
    reply: oneshot::Sender<Disposition>,
}

/// Validate the config and source, then start the session task
///
/// Must be called inside a tokio runtime. An invalid config or source
/// yields the placeholder; the sink is dropped without a single message
/// posted.
pub fn mount(options: MountOptions, io: PlayerIo) -> Mount {
    if let Err(e) = options.config.validate() {
        warn!("Not mounting player: {}", e);
        return Mount::Unavailable(Placeholder::unavailable(e.to_string()));
    }

    let source = match SourceRef::parse(&options.source) {
        Ok(source) => source,
        Err(e) => {
            warn!("Not mounting player: {}", e);
            return Mount::Unavailable(Placeholder::unavailable(e.to_string()));
        }
    };

    let next = options.next_source.as_deref().and_then(|reference| {
        NextSource::parse(reference, options.next_label.clone().unwrap_or_default())
            .map_err(|e| warn!("Ignoring next source: {}", e))
            .ok()
    });

    let id = Uuid::new_v4();
    let rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sync_period = options.config.timing.sync_interval();
    let clock = SessionClock::start();

    let controller = PlayerController::new(
        ControllerSetup {
            session_id: id.to_string(),
            config: options.config,
            source,
            next,
            identity: SessionIdentity::from_viewer(options.viewer.as_deref()),
            rng,
            now: clock.now(),
        },
        io,
    );

    let (view_tx, view_rx) = watch::channel(controller.view());
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let actor = SessionActor {
        controller,
        clock,
        poller: SyncPoller::new(sync_period),
        inbound_rx,
        input_rx,
        shutdown_rx,
        view_tx,
    };
    let task = tokio::spawn(actor.run().instrument(info_span!("session", %id)));

    Mount::Player(SessionHandle {
        id,
        inbound_tx,
        input_tx,
        shutdown_tx: Some(shutdown_tx),
        view_rx,
        task: Some(task),
    })
}

/// Host-side handle of a mounted player
///
/// Dropping the handle ends the session as well.
pub struct SessionHandle {
    id: Uuid,
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    input_tx: mpsc::Sender<InputRequest>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    view_rx: watch::Receiver<PlayerView>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Forward a message event received by the host frame
    pub fn deliver(&self, origin: impl Into<String>, data: Value) -> Result<()> {
        self.inbound_tx
            .send(InboundMessage::Widget {
                origin: origin.into(),
                data,
            })
            .map_err(|_| Error::SessionClosed)
    }

    /// Replace the item offered after the current one (`None` clears it)
    pub fn set_next(&self, next: Option<NextSource>) -> Result<()> {
        self.inbound_tx
            .send(InboundMessage::SetNext(next))
            .map_err(|_| Error::SessionClosed)
    }

    /// Forward a DOM-derived input event and wait for its disposition
    pub async fn input(&self, event: InputEvent) -> Result<Disposition> {
        let (reply, rx) = oneshot::channel();
        self.input_tx
            .send(InputRequest { event, reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Latest published frame
    pub fn view(&self) -> PlayerView {
        self.view_rx.borrow().clone()
    }

    /// Receiver notified on every frame change
    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view_rx.clone()
    }

    /// Stop the session and wait for the task to finish
    pub async fn teardown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Session task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inbound_tx.is_closed()
    }
}

struct SessionActor {
    controller: PlayerController,
    clock: SessionClock,
    poller: SyncPoller,
    inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
    input_rx: mpsc::Receiver<InputRequest>,
    shutdown_rx: oneshot::Receiver<()>,
    view_tx: watch::Sender<PlayerView>,
}

impl SessionActor {
    async fn run(mut self) {
        info!("Session started (sync every {:?})", self.poller.period());

        loop {
            let deadline = self
                .controller
                .next_deadline()
                .map(|tick| self.clock.instant_at(tick));
            let timer = async move {
                match deadline {
                    Some(at) => time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            // Shutdown outranks queued work; the other branches are polled fairly
            if !matches!(self.shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
                debug!("Shutdown requested");
                break;
            }

            tokio::select! {
                _ = &mut self.shutdown_rx => {
                    debug!("Shutdown requested");
                    break;
                }
                message = self.inbound_rx.recv() => {
                    let Some(message) = message else { break };
                    let now = self.clock.now();
                    match message {
                        InboundMessage::Widget { origin, data } => {
                            self.controller.handle_inbound(&origin, &data, now);
                        }
                        InboundMessage::SetNext(next) => {
                            debug!("Chained item set to {:?}", next.as_ref().map(|n| &n.label));
                            self.controller.set_next(next);
                        }
                    }
                }
                request = self.input_rx.recv() => {
                    let Some(request) = request else { break };
                    let now = self.clock.now();
                    let disposition = self.controller.handle_input(request.event, now);
                    // The caller sees the frame this input produced
                    self.publish();
                    let _ = request.reply.send(disposition);
                }
                _ = self.poller.tick() => {
                    let now = self.clock.now();
                    self.controller.poll_sync(now);
                }
                _ = timer => {
                    let now = self.clock.now();
                    self.controller.on_timer(now);
                }
            }

            self.publish();
        }

        self.controller.teardown();
        info!("Session ended after {} sync polls", self.poller.ticks());
    }

    fn publish(&self) {
        let view = self.controller.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
