//! Whole-match tests: local seats, remote seats over in-memory pipes, and TCP

mod common;

use common::test_players::{
    test_registry, CheatingPlayer, PanickingPlayer, QuitterPlayer, ScriptedPlayer, SleepyPlayer,
};
use common::RecordingSink;
use konane::board::{Move, Position, Side};
use konane::game::{EndReason, MatchOutcome, MatchResult, Player, PlayerAdapter, PlayerRegistry};
use konane::messages::{Opcode, Packet, PacketStream, TurnReply, WireConfig};
use konane::network::{
    run_remote_match, MatchSettings, PeerConnection, PlayerClient, PlayerServer, RemoteMatch, Seat,
    SessionEnd, TurnCoordinator,
};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

fn settings(width: usize, height: usize) -> MatchSettings {
    MatchSettings::new(width, height, 5_000).with_protocol_timeout(Duration::from_secs(2))
}

fn local(side: Side, player: impl Player + 'static) -> Seat<TcpStream> {
    Seat::Local(PlayerAdapter::new(side, Box::new(player)))
}

async fn play_local(
    settings: MatchSettings,
    white: impl Player + 'static,
    black: impl Player + 'static,
) -> (MatchResult, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let coordinator = TurnCoordinator::new(
        settings,
        local(Side::White, white),
        local(Side::Black, black),
        sink.clone(),
    )
    .unwrap();
    let result = coordinator.run().await.into_result().unwrap();
    (result, sink)
}

#[tokio::test]
async fn side_left_without_moves_loses() {
    // 5x1 starts as W B _ _ W; White's only jump captures Black's last token
    let (result, sink) = play_local(settings(5, 1), ScriptedPlayer::new(vec![]), ScriptedPlayer::new(vec![])).await;

    assert_eq!(result.winner, Some(Side::White));
    assert_eq!(result.reason, EndReason::NoLegalMoves);
    assert_eq!(result.move_pairs, 0);
    assert!(sink.contains("(0,0) to (2,0) for WHITE"));
    assert!(sink.contains("BLACK has no legal moves"));
}

#[tokio::test]
async fn forfeit_hands_the_win_to_the_opponent() {
    let (result, _) = play_local(settings(6, 6), QuitterPlayer, ScriptedPlayer::new(vec![])).await;
    assert_eq!(result.winner, Some(Side::Black));
    assert_eq!(result.reason, EndReason::Forfeit);
}

#[tokio::test]
async fn forfeit_comment_on_a_real_move_is_still_a_forfeit() {
    let resign = Move::new(Position::new(2, 3), Position::new(2, 1), Side::Black, "**FORFEIT**");
    let (result, sink) = play_local(
        settings(6, 6),
        ScriptedPlayer::new(vec![]),
        ScriptedPlayer::new(vec![resign]),
    )
    .await;

    assert_eq!(result.winner, Some(Side::White));
    assert_eq!(result.reason, EndReason::Forfeit);
    assert!(!sink.contains("for BLACK with **FORFEIT**"));
}

#[tokio::test]
async fn illegal_move_loses_and_is_explained() {
    let (result, sink) = play_local(settings(6, 6), CheatingPlayer, ScriptedPlayer::new(vec![])).await;

    assert_eq!(result.winner, Some(Side::Black));
    assert!(matches!(result.reason, EndReason::IllegalMove { .. }));
    assert!(sink.contains("Illegal move"));
}

#[tokio::test]
async fn crashing_player_loses_with_an_error() {
    let (result, _) = play_local(settings(6, 6), ScriptedPlayer::new(vec![]), PanickingPlayer).await;
    assert_eq!(result.winner, Some(Side::White));
    assert_eq!(result.reason, EndReason::PlayerError);
    assert_eq!(result.move_pairs, 0);
}

#[tokio::test]
async fn late_move_is_never_applied() {
    let sleepy = SleepyPlayer::new(Duration::from_millis(400));
    let finished = sleepy.finished.clone();
    let settings = MatchSettings::new(6, 6, 100);

    let (result, sink) = play_local(settings, sleepy, ScriptedPlayer::new(vec![])).await;

    assert_eq!(result.winner, Some(Side::Black));
    assert_eq!(result.reason, EndReason::TimeExceeded);
    assert!(result.white_remaining_ms <= 0);
    assert_eq!(result.black_remaining_ms, 100);
    assert!(!sink.lines().iter().any(|line| line.contains("for WHITE")));
    // Joined during release, after the verdict
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn full_game_between_builtin_players_finishes() {
    let registry = test_registry();
    let sink = Arc::new(RecordingSink::new());
    let coordinator = TurnCoordinator::new(
        settings(8, 8),
        Seat::<TcpStream>::Local(PlayerAdapter::new(Side::White, registry.create("greedy").unwrap())),
        Seat::Local(PlayerAdapter::new(Side::Black, registry.create("random").unwrap())),
        sink.clone(),
    )
    .unwrap();

    let result = coordinator.run().await.into_result().unwrap();
    assert!(result.winner.is_some());
    assert_eq!(result.width, 8);
    assert_eq!(result.white, "greedy");
    assert_eq!(result.black, "random");

    let summary = result.to_string();
    assert!(summary.starts_with("8 x 8 Board. 5000 milliseconds."));
    assert!(summary.contains(&format!("wins in {} moves", result.move_pairs)));

    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["white"], "greedy");
    assert!(json["reason"]["kind"].is_string());
}

/// Referee seat wired to a player client running on the other end of an in-memory pipe
fn remote_pair(
    registry: &Arc<PlayerRegistry>,
    side: Side,
    player: &str,
    wire: &WireConfig,
) -> (Seat<DuplexStream>, JoinHandle<SessionEnd>) {
    let (referee_end, client_end) = tokio::io::duplex(4096);
    let mut client = PlayerClient::new(side, Arc::clone(registry));
    let handle = tokio::spawn(async move {
        client
            .run(client_end, WireConfig::for_client())
            .await
            .unwrap()
    });
    let conn = PeerConnection::new(side, referee_end, wire.clone());
    (Seat::remote(player, conn), handle)
}

#[tokio::test]
async fn remote_clients_play_a_full_match() {
    let registry = Arc::new(test_registry());
    let settings = settings(7, 7);
    let wire = WireConfig::for_referee(settings.protocol_timeout);

    let (white, white_client) = remote_pair(&registry, Side::White, "first", &wire);
    let (black, black_client) = remote_pair(&registry, Side::Black, "greedy", &wire);
    let sink = Arc::new(RecordingSink::new());

    let outcome = TurnCoordinator::new(settings, white, black, sink.clone())
        .unwrap()
        .run()
        .await;

    let result = outcome.result().expect("match should finish");
    assert!(result.winner.is_some());
    assert!(sink.contains("Handshake complete"));
    assert!(!sink.contains("Resynchronized"));

    assert_eq!(white_client.await.unwrap(), SessionEnd::Closed);
    assert_eq!(black_client.await.unwrap(), SessionEnd::Closed);
}

#[tokio::test]
async fn remote_client_with_unknown_player_reports_errors() {
    let registry = Arc::new(test_registry());
    let settings = settings(6, 6);
    let wire = WireConfig::for_referee(settings.protocol_timeout);

    let (white, _white_client) = remote_pair(&registry, Side::White, "nobody", &wire);
    let black = Seat::Local(PlayerAdapter::new(Side::Black, Box::new(ScriptedPlayer::new(vec![]))));

    let outcome = TurnCoordinator::new(settings, white, black, Arc::new(RecordingSink::new()))
        .unwrap()
        .run()
        .await;

    let result = outcome.into_result().unwrap();
    assert_eq!(result.winner, Some(Side::Black));
    assert_eq!(result.reason, EndReason::PlayerError);
}

/// Acknowledges the handshake, then never answers a turn
async fn stalling_peer(stream: DuplexStream) {
    let mut packets = PacketStream::new(stream, WireConfig::for_client());
    while let Ok(packet) = packets.recv().await {
        if let Some(ack) = Packet::ack_for(packet.opcode()) {
            if packets.send(&ack).await.is_err() {
                return;
            }
        }
        if packet == Packet::BeginTurn {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }
}

#[tokio::test]
async fn silent_remote_loses_on_protocol_timeout() {
    let settings = settings(6, 6).with_protocol_timeout(Duration::from_millis(150));
    let wire = WireConfig::for_referee(settings.protocol_timeout);
    let (referee_end, peer_end) = tokio::io::duplex(4096);
    tokio::spawn(stalling_peer(peer_end));

    let white = Seat::remote("first", PeerConnection::new(Side::White, referee_end, wire));
    let black = Seat::Local(PlayerAdapter::new(Side::Black, Box::new(ScriptedPlayer::new(vec![]))));

    let outcome = TurnCoordinator::new(settings, white, black, Arc::new(RecordingSink::new()))
        .unwrap()
        .run()
        .await;

    let result = outcome.into_result().unwrap();
    assert_eq!(result.winner, Some(Side::Black));
    assert_eq!(result.reason, EndReason::ProtocolTimeout);
}

type PacketLog = Arc<Mutex<Vec<(Side, Opcode)>>>;

/// Acknowledges what it is told and records it; Move-acks are withheld
/// unless `ack_moves`. Begin-turn is answered with `reply`, or with a
/// hang-up when there is none.
async fn scripted_peer(
    stream: DuplexStream,
    side: Side,
    log: PacketLog,
    reply: Option<TurnReply>,
    ack_moves: bool,
) {
    let mut packets = PacketStream::new(stream, WireConfig::for_client());
    while let Ok(packet) = packets.recv().await {
        log.lock().unwrap().push((side, packet.opcode()));
        let answer = match packet {
            Packet::BeginTurn => match &reply {
                Some(reply) => Some(Packet::BeginTurnAck(reply.clone())),
                None => return,
            },
            Packet::Move(_) if !ack_moves => None,
            other => Packet::ack_for(other.opcode()),
        };
        if let Some(answer) = answer {
            if packets.send(&answer).await.is_err() {
                return;
            }
        }
    }
}

fn scripted_seat(
    side: Side,
    log: &PacketLog,
    reply: Option<TurnReply>,
    ack_moves: bool,
    wire: &WireConfig,
) -> Seat<DuplexStream> {
    let (referee_end, peer_end) = tokio::io::duplex(4096);
    tokio::spawn(scripted_peer(peer_end, side, Arc::clone(log), reply, ack_moves));
    Seat::remote("first", PeerConnection::new(side, referee_end, wire.clone()))
}

#[tokio::test]
async fn handshake_runs_step_by_step_across_both_seats() {
    let settings = settings(6, 6);
    let wire = WireConfig::for_referee(settings.protocol_timeout);
    let log = PacketLog::default();
    let resign = Some(TurnReply::from(&Move::forfeit(Side::White)));

    let white = scripted_seat(Side::White, &log, resign, true, &wire);
    let black = scripted_seat(Side::Black, &log, None, true, &wire);

    let result = TurnCoordinator::new(settings, white, black, Arc::new(RecordingSink::new()))
        .unwrap()
        .run()
        .await
        .into_result()
        .unwrap();
    assert_eq!(result.winner, Some(Side::Black));
    assert_eq!(result.reason, EndReason::Forfeit);

    let log = log.lock().unwrap();
    let expected: Vec<(Side, Opcode)> = [Opcode::Name, Opcode::Time, Opcode::Board, Opcode::BoardSync]
        .into_iter()
        .flat_map(|op| [(Side::White, op), (Side::Black, op)])
        .collect();
    assert_eq!(log[..8], expected[..]);
}

#[tokio::test]
async fn unacknowledged_move_is_followed_by_a_board_sync() {
    let settings = settings(6, 6).with_protocol_timeout(Duration::from_millis(150));
    let wire = WireConfig::for_referee(settings.protocol_timeout);
    let log = PacketLog::default();
    let resign = Some(TurnReply::from(&Move::forfeit(Side::Black)));

    let white = Seat::Local(PlayerAdapter::new(Side::White, Box::new(ScriptedPlayer::new(vec![]))));
    let black = scripted_seat(Side::Black, &log, resign, false, &wire);
    let sink = Arc::new(RecordingSink::new());

    let result = TurnCoordinator::new(settings, white, black, sink.clone())
        .unwrap()
        .run()
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.winner, Some(Side::White));
    assert_eq!(result.reason, EndReason::Forfeit);
    assert!(sink.contains("Resynchronized BLACK board"));

    let seen: Vec<Opcode> = log.lock().unwrap().iter().map(|(_, op)| *op).collect();
    let relayed = seen.iter().position(|op| *op == Opcode::Move).unwrap();
    assert_eq!(seen[relayed + 1], Opcode::BoardSync);
    assert_eq!(seen[relayed + 2], Opcode::BeginTurn);
}

#[tokio::test]
async fn peer_dropping_mid_match_loses_by_disconnect() {
    let settings = settings(6, 6);
    let wire = WireConfig::for_referee(settings.protocol_timeout);
    let log = PacketLog::default();

    let white = scripted_seat(Side::White, &log, None, true, &wire);
    let black = Seat::Local(PlayerAdapter::new(Side::Black, Box::new(ScriptedPlayer::new(vec![]))));
    let sink = Arc::new(RecordingSink::new());

    let outcome = TurnCoordinator::new(settings, white, black, sink.clone())
        .unwrap()
        .run()
        .await;

    let result = outcome.into_result().unwrap();
    assert_eq!(result.winner, Some(Side::Black));
    assert_eq!(result.reason, EndReason::Disconnected);
    assert_eq!(result.move_pairs, 0);
    assert!(sink.contains("WHITE loses"));
}

#[tokio::test]
async fn peer_vanishing_during_handshake_voids_the_match() {
    let settings = settings(6, 6);
    let wire = WireConfig::for_referee(settings.protocol_timeout);
    let (referee_end, peer_end) = tokio::io::duplex(4096);
    drop(peer_end);

    let white = Seat::remote("first", PeerConnection::new(Side::White, referee_end, wire));
    let black = Seat::Local(PlayerAdapter::new(Side::Black, Box::new(ScriptedPlayer::new(vec![]))));
    let sink = Arc::new(RecordingSink::new());

    let outcome = TurnCoordinator::new(settings, white, black, sink.clone())
        .unwrap()
        .run()
        .await;

    assert!(matches!(outcome, MatchOutcome::Aborted { .. }));
    assert_eq!(outcome.winner(), None);
    assert!(sink.contains("Match aborted"));
}

#[tokio::test]
async fn unreachable_clients_abort_the_match() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let remote = RemoteMatch {
        white_addr: addr.clone(),
        white_player: "first".to_string(),
        black_addr: addr,
        black_player: "first".to_string(),
        connect_timeout: Duration::from_millis(500),
    };
    let outcome = run_remote_match(settings(6, 6), remote, Arc::new(RecordingSink::new())).await;
    assert!(matches!(outcome, MatchOutcome::Aborted { .. }));
}

#[tokio::test]
async fn match_over_tcp_between_player_servers() {
    let registry = Arc::new(test_registry());
    let white_server = PlayerServer::bind("127.0.0.1:0", Side::White, Arc::clone(&registry))
        .await
        .unwrap();
    let black_server = PlayerServer::bind("127.0.0.1:0", Side::Black, Arc::clone(&registry))
        .await
        .unwrap();

    let remote = RemoteMatch {
        white_addr: white_server.local_addr().unwrap().to_string(),
        white_player: "random".to_string(),
        black_addr: black_server.local_addr().unwrap().to_string(),
        black_player: "first".to_string(),
        connect_timeout: Duration::from_secs(2),
    };

    let white_session = tokio::spawn(async move { white_server.serve_one().await });
    let black_session = tokio::spawn(async move { black_server.serve_one().await });

    let outcome = run_remote_match(settings(7, 8), remote, Arc::new(RecordingSink::new())).await;
    let result = outcome.into_result().unwrap();
    assert_eq!((result.width, result.height), (7, 8));
    assert!(result.winner.is_some());

    assert_eq!(white_session.await.unwrap().unwrap(), SessionEnd::Closed);
    assert_eq!(black_session.await.unwrap().unwrap(), SessionEnd::Closed);
}
