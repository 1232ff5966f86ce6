//! The tick/broadcast loop: the single task that owns the
//! [`Simulation`](game_core::Simulation) and the [`ConnectionRegistry`].
//! Every mutation to either goes through here, which is what lets the
//! rest of the server skip locking entirely.

use crate::command::{ConnId, ServerCommand};
use crate::connection::{ConnRole, ConnectionRegistry};
use crate::translator::{self, ClientMessage};
use game_core::{Phase, Simulation};
use protocol::{AdmissionErrorReply, AdmissionReply, ConversionReply, HOUSEKEEPING_INTERVAL_TICKS, TICK_MILLIS};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::time::Duration;

pub async fn run(mut cmd_rx: mpsc::Receiver<ServerCommand>) {
    let mut sim = Simulation::new();
    let mut registry = ConnectionRegistry::default();
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MILLIS));
    let mut tick_count: u64 = 0;

    loop {
        interval.tick().await;

        while let Ok(cmd) = cmd_rx.try_recv() {
            handle_command(&mut sim, &mut registry, cmd);
        }

        sim.tick();
        broadcast_snapshot(&sim, &mut registry);

        tick_count += 1;
        if tick_count % HOUSEKEEPING_INTERVAL_TICKS == 0 {
            purge_stale_mappings(&sim, &mut registry);
        }
    }
}

fn handle_command(sim: &mut Simulation, registry: &mut ConnectionRegistry, cmd: ServerCommand) {
    match cmd {
        ServerCommand::Connected { id, outbound } => {
            match sim.admit() {
                Ok(outcome) => {
                    let role = if outcome.is_player {
                        ConnRole::Player(outcome.id)
                    } else {
                        ConnRole::Spectator(outcome.id)
                    };
                    let reply = AdmissionReply {
                        join_success: true,
                        player_id: outcome.id,
                        is_spectator: !outcome.is_player,
                        player_name: outcome.name,
                    };
                    send_line(&outbound, &reply);
                    registry.insert(id, outbound, role);
                }
                Err(err) => {
                    // Names are server-generated and pre-checked for
                    // uniqueness, so this should be unreachable in
                    // practice; handled defensively in case that
                    // invariant is ever violated.
                    tracing::warn!(?err, connection = id, "admission rejected");
                    let reply = AdmissionErrorReply::from_error(err, "");
                    send_line(&outbound, &reply);
                }
            }
        }
        ServerCommand::Disconnected { id } => {
            if let Some(handle) = registry.remove(id) {
                match handle.role {
                    ConnRole::Player(pid) => sim.handle_player_disconnect(pid),
                    ConnRole::Spectator(sid) => sim.remove_spectator(sid),
                }
            }
        }
        ServerCommand::Line { id, line } => {
            let Some(role) = registry.role_of(id) else {
                return;
            };
            apply_message(sim, registry, id, role, translator::parse_line(&line));
        }
    }
}

fn apply_message(
    sim: &mut Simulation,
    registry: &mut ConnectionRegistry,
    id: ConnId,
    role: ConnRole,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Ignored => {}
        ClientMessage::Ping => registry.send_to(id, "PONG".to_string()),
        ClientMessage::Move(dir) => {
            if let ConnRole::Player(pid) = role {
                sim.move_player(pid, dir);
            }
        }
        ClientMessage::Bomb => {
            if let ConnRole::Player(pid) = role {
                sim.place_bomb(pid);
            }
        }
        ClientMessage::StartGame => {
            if let ConnRole::Player(pid) = role {
                sim.start_game(pid);
            }
        }
        ClientMessage::PlayAgain => {
            if matches!(role, ConnRole::Player(_)) && sim.state().phase == Phase::Victory {
                sim.return_to_lobby();
            }
        }
        ClientMessage::JoinGame => {
            if let ConnRole::Spectator(sid) = role {
                match sim.convert_spectator_to_player(sid) {
                    Some(new_pid) => {
                        registry.set_role(id, ConnRole::Player(new_pid));
                        let reply = ConversionReply {
                            conversion_success: true,
                            new_player_id: Some(new_pid),
                        };
                        send_line_to(registry, id, &reply);
                    }
                    None => {
                        let reply = ConversionReply {
                            conversion_success: false,
                            new_player_id: None,
                        };
                        send_line_to(registry, id, &reply);
                    }
                }
            }
        }
        ClientMessage::LeaveTemporarily => {
            if let ConnRole::Player(pid) = role {
                if sim.state().phase == Phase::Lobby {
                    sim.handle_player_disconnect(pid);
                    registry.remove(id);
                }
            }
        }
        ClientMessage::Chat(text) => {
            let (sender_id, is_spectator) = match role {
                ConnRole::Player(pid) => (pid as i32, false),
                ConnRole::Spectator(sid) => (sid as i32, true),
            };
            sim.add_chat(sender_id, &text, is_spectator);
        }
    }
}

fn broadcast_snapshot(sim: &Simulation, registry: &mut ConnectionRegistry) {
    let snapshot = sim.snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(line) => registry.broadcast(&line),
        Err(err) => tracing::error!(?err, "failed to serialize snapshot, skipping this tick"),
    }
}

fn purge_stale_mappings(sim: &Simulation, registry: &mut ConnectionRegistry) {
    let live_pids: HashSet<u32> = sim.state().players.keys().copied().collect();
    let stale = registry.stale_player_connections(&live_pids);
    if !stale.is_empty() {
        tracing::debug!(count = stale.len(), "purging stale player connection mappings");
        registry.remove_many(&stale);
    }
}

fn send_line<T: Serialize>(outbound: &mpsc::Sender<String>, value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => {
            let _ = outbound.try_send(line);
        }
        Err(err) => tracing::error!(?err, "failed to serialize reply"),
    }
}

fn send_line_to<T: Serialize>(registry: &mut ConnectionRegistry, id: ConnId, value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => registry.send_to(id, line),
        Err(err) => tracing::error!(?err, "failed to serialize reply"),
    }
}
