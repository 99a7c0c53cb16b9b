//! The session state machine: turns a decoded inbound message sequence into
//! control-channel reactions, dispatch forwarding, and an eventual
//! resume-eligibility verdict.

use std::future::pending;
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, trace, warn};
use relay_model::{DispatchEvent, GatewayMessage, ResumeSessionPacket};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

use crate::completion::{Completion, Outcome, SessionOutcome, SuccessfulStart};
use crate::errors::Error;
use crate::heartbeat::HeartbeatTimer;
use crate::outbound::{drive_outbound, EncodingSink};
use crate::session_state::SessionState;
use crate::settings::{build_identify, GatewaySettings, ResumeData};

/// Handle to a running session. `external` is the channel the application
/// uses to submit its own outbound messages (presence updates, voice state
/// changes, guild member requests); `outcome` and `successful_start` are the
/// two completion futures the reconnect supervisor observes.
pub struct Session {
    pub external: mpsc::UnboundedSender<GatewayMessage>,
    pub outcome: SessionOutcome,
    pub successful_start: SuccessfulStart,
}

/// Spawns a session's two tasks — the outbound fan-in merge and the state
/// machine itself — and returns a handle to it. `inbound` is the decoded
/// message sequence from the frame adapter; `transport_out` is the raw
/// websocket sink; `dispatch` is the downstream sink every inbound message is
/// teed to.
pub fn spawn<In, Out, Dispatch>(
    inbound: In,
    transport_out: Out,
    dispatch: Dispatch,
    settings: GatewaySettings,
    resume: Option<ResumeData>,
) -> Session
where
    In: Stream<Item = Result<GatewayMessage, Error>> + Unpin + Send + 'static,
    Out: Sink<WsMessage, Error = WsError> + Unpin + Send + 'static,
    Dispatch: Sink<GatewayMessage> + Unpin + Send + 'static,
    Dispatch::Error: std::fmt::Debug + Send,
{
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (external_tx, external_rx) = mpsc::unbounded_channel();

    let shard = settings.shard.0;
    let sink = EncodingSink::new(transport_out, settings.log_sent_ws);
    tokio::spawn(async move {
        if let Err(err) = drive_outbound(sink, control_rx, external_rx).await {
            warn!("[Session {shard}] outbound merge ended with an error: {err}");
        }
    });

    let (outcome_completion, outcome_rx) = Completion::new();
    let (start_completion, start_rx) = Completion::new();

    tokio::spawn(run(
        inbound,
        control_tx,
        dispatch,
        settings,
        SessionState::new(resume),
        outcome_completion,
        start_completion,
    ));

    Session {
        external: external_tx,
        outcome: SessionOutcome::new(outcome_rx),
        successful_start: SuccessfulStart::new(start_rx),
    }
}

async fn tick_timer(timer: &mut Option<HeartbeatTimer>) {
    match timer {
        Some(timer) => timer.tick().await,
        None => pending().await,
    }
}

/// Sends a heartbeat if the previous one was acknowledged, otherwise reports
/// the missed ack as a fatal liveness failure. Shared between the timer tick
/// and an inbound `Heartbeat`, which is defined to behave identically.
fn fire_heartbeat(
    state: &mut SessionState,
    control_tx: &mpsc::UnboundedSender<GatewayMessage>,
) -> Result<(), Error> {
    if !state.awaiting_ack {
        return Err(Error::LivenessTimeout);
    }
    let seq = state.resume.as_ref().map(|resume| resume.seq);
    let _ = control_tx.send(GatewayMessage::Heartbeat { seq });
    state.awaiting_ack = false;
    Ok(())
}

/// The outcome of reacting to one inbound message.
enum Reaction {
    Continue,
    Terminate(Outcome),
    Fatal(Error),
}

#[allow(clippy::too_many_arguments)]
fn react(
    msg: &GatewayMessage,
    state: &mut SessionState,
    settings: &GatewaySettings,
    control_tx: &mpsc::UnboundedSender<GatewayMessage>,
    timer: &mut Option<HeartbeatTimer>,
    hello_seen: &mut bool,
    start: &mut Completion<Result<(), Arc<Error>>>,
) -> Reaction {
    let shard = settings.shard.0;
    match msg {
        GatewayMessage::Hello { heartbeat_interval_ms } => {
            *hello_seen = true;
            let outbound = match state.resume.clone() {
                Some(resume) => {
                    debug!("[Session {shard}] resuming session {}", resume.session_id);
                    GatewayMessage::Resume(ResumeSessionPacket {
                        token: resume.token,
                        session_id: resume.session_id,
                        seq: resume.seq,
                    })
                }
                None => {
                    debug!("[Session {shard}] identifying a fresh session");
                    GatewayMessage::Identify(build_identify(settings))
                }
            };
            let _ = control_tx.send(outbound);
            state.awaiting_ack = true;
            *timer = Some(HeartbeatTimer::new(*heartbeat_interval_ms));
            Reaction::Continue
        }
        GatewayMessage::Dispatch { seq, event } => {
            if !*hello_seen {
                return Reaction::Fatal(Error::ProtocolViolation);
            }
            match event {
                DispatchEvent::Ready(ready) => {
                    start.complete(Ok(()));
                    match ready {
                        Some(ready) => {
                            state.resume = Some(ResumeData {
                                token: settings.token.clone(),
                                session_id: ready.session_id.clone(),
                                seq: *seq,
                            });
                        }
                        None => {
                            warn!(
                                "[Session {shard}] ready payload did not carry a usable session id; session will not be resumable"
                            );
                            state.resume = None;
                        }
                    }
                }
                DispatchEvent::Resumed => {
                    start.complete(Ok(()));
                    state.advance_seq(*seq);
                }
                DispatchEvent::Other(_) => {
                    state.advance_seq(*seq);
                }
            }
            Reaction::Continue
        }
        GatewayMessage::Heartbeat { .. } => match fire_heartbeat(state, control_tx) {
            Ok(()) => Reaction::Continue,
            Err(err) => Reaction::Fatal(err),
        },
        GatewayMessage::HeartbeatAck => {
            state.awaiting_ack = true;
            Reaction::Continue
        }
        GatewayMessage::Reconnect => {
            Reaction::Terminate(Outcome { resume: state.resume.clone(), wait: false })
        }
        GatewayMessage::InvalidSession { resumable } => Reaction::Terminate(Outcome {
            resume: if *resumable { state.resume.clone() } else { None },
            wait: true,
        }),
        _ => Reaction::Continue,
    }
}

async fn run<In, Dispatch>(
    mut inbound: In,
    control_tx: mpsc::UnboundedSender<GatewayMessage>,
    mut dispatch: Dispatch,
    settings: GatewaySettings,
    mut state: SessionState,
    mut outcome: Completion<Result<Outcome, Arc<Error>>>,
    mut start: Completion<Result<(), Arc<Error>>>,
) where
    In: Stream<Item = Result<GatewayMessage, Error>> + Unpin,
    Dispatch: Sink<GatewayMessage> + Unpin,
    Dispatch::Error: std::fmt::Debug,
{
    let shard = settings.shard.0;
    let mut timer: Option<HeartbeatTimer> = None;
    let mut hello_seen = false;

    loop {
        tokio::select! {
            biased;
            _ = tick_timer(&mut timer), if timer.is_some() => {
                if let Err(err) = fire_heartbeat(&mut state, &control_tx) {
                    warn!("[Session {shard}] liveness check failed: {err}");
                    let err = Arc::new(err);
                    outcome.complete(Err(err.clone()));
                    start.complete(Err(err));
                    break;
                }
            }
            next = inbound.next() => {
                match next {
                    Some(Ok(msg)) => {
                        let reaction = react(
                            &msg, &mut state, &settings, &control_tx, &mut timer, &mut hello_seen, &mut start,
                        );

                        match reaction {
                            Reaction::Fatal(err) => {
                                warn!("[Session {shard}] fatal: {err}");
                                let err = Arc::new(err);
                                outcome.complete(Err(err.clone()));
                                start.complete(Err(err));
                                break;
                            }
                            Reaction::Continue => {
                                if let Err(err) = dispatch.send(msg).await {
                                    trace!("[Session {shard}] dispatch sink closed ({err:?}); ending session");
                                    outcome.complete(Ok(Outcome { resume: state.resume.clone(), wait: false }));
                                    break;
                                }
                            }
                            Reaction::Terminate(result) => {
                                if let Err(err) = dispatch.send(msg).await {
                                    trace!("[Session {shard}] dispatch sink closed ({err:?}); ending session");
                                    outcome.complete(Ok(Outcome { resume: state.resume.clone(), wait: false }));
                                    break;
                                }
                                outcome.complete(Ok(result));
                                break;
                            }
                        }
                    }
                    Some(Err(err)) => {
                        warn!("[Session {shard}] upstream failure: {err}");
                        let err = Arc::new(err);
                        outcome.complete(Err(err.clone()));
                        start.complete(Err(err));
                        break;
                    }
                    None => {
                        trace!("[Session {shard}] upstream ended gracefully");
                        outcome.complete(Ok(Outcome { resume: state.resume.clone(), wait: false }));
                        break;
                    }
                }
            }
        }
    }

    // Catches any path above that broke out without fully resolving both
    // handles (e.g. a graceful/terminate/downstream-cancel path when
    // successful_start had not yet fired).
    if outcome.is_pending() {
        outcome.complete(Err(Arc::new(Error::AbruptTermination)));
    }
    if start.is_pending() {
        start.complete(Err(Arc::new(Error::AbruptTermination)));
    }
}
