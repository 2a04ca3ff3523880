//! Tests for the single-writer session task.

use duel_server::{
    ChannelSink, ClientCommand, ConnectionId, Seat, ServerEvent, Session, SessionActor,
    SessionClosed, SessionCommand, SessionError, SessionOptions, Status, spawn_session,
};
use duel_tictactoe::{Mark, Outcome};
use tokio::sync::{mpsc, oneshot};

const P1: ConnectionId = ConnectionId::new(1);
const P2: ConnectionId = ConnectionId::new(2);

fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn sink() -> (Box<ChannelSink>, mpsc::Receiver<ServerEvent>) {
    let (tx, rx) = mpsc::channel(32);
    (Box::new(ChannelSink::new(tx)), rx)
}

#[tokio::test]
async fn test_actor_plays_full_game_in_order() {
    let (handle, task) = spawn_session(Session::new(SessionOptions::default()), 8);
    let (sink1, mut rx1) = sink();
    let (sink2, mut rx2) = sink();

    assert_eq!(handle.join(P1, sink1).await, Ok(Ok(Seat::First)));
    assert_eq!(handle.join(P2, sink2).await, Ok(Ok(Seat::Second)));

    for (who, row, col) in [(P1, 0, 0), (P2, 1, 1), (P1, 0, 1), (P2, 2, 2), (P1, 0, 2)] {
        handle
            .dispatch(who, ClientCommand::Move { row, col })
            .await
            .unwrap();
    }

    // Queued behind every move, so it observes the final state.
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status, Status::Ended);
    assert_eq!(snapshot.winner, Some(Outcome::Won(Mark::X)));

    let kinds: Vec<_> = drain(&mut rx1).iter().map(ServerEvent::kind).collect();
    assert_eq!(
        kinds,
        [
            "notification",
            "gameStarted",
            "playerTurn",
            "playerTurn",
            "playerTurn",
            "playerTurn",
            "gameEnded"
        ]
    );
    let second = drain(&mut rx2);
    assert_eq!(second.last().map(ServerEvent::kind), Some("gameEnded"));

    drop(handle);
    let session = task.await.unwrap();
    assert_eq!(session.status(), Status::Ended);
    assert_eq!(session.seated(), 2);
}

#[tokio::test]
async fn test_disconnect_goes_through_queue() {
    let (handle, task) = spawn_session(Session::new(SessionOptions::default()), 8);
    let (sink1, _rx1) = sink();
    let (sink2, mut rx2) = sink();
    handle.join(P1, sink1).await.unwrap().unwrap();
    handle.join(P2, sink2).await.unwrap().unwrap();
    drain(&mut rx2);

    handle
        .dispatch(P1, ClientCommand::Move { row: 1, col: 1 })
        .await
        .unwrap();
    handle.disconnect(P1).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status, Status::Waiting);
    assert_eq!(snapshot.turn, None);

    let events = drain(&mut rx2);
    let kinds: Vec<_> = events.iter().map(ServerEvent::kind).collect();
    assert_eq!(kinds, ["playerTurn", "notification"]);

    drop(handle);
    let session = task.await.unwrap();
    assert!(session.player(Seat::First).is_none());
    assert_eq!(session.player(Seat::Second).map(|p| p.id()), Some(P2));
}

#[tokio::test]
async fn test_full_session_refuses_join() {
    let (handle, _task) = spawn_session(Session::new(SessionOptions::default()), 8);
    let (sink1, _rx1) = sink();
    let (sink2, _rx2) = sink();
    let (sink3, mut rx3) = sink();
    handle.join(P1, sink1).await.unwrap().unwrap();
    handle.join(P2, sink2).await.unwrap().unwrap();

    let result = handle.join(ConnectionId::new(3), sink3).await;

    assert_eq!(result, Ok(Err(SessionError::Full)));
    assert!(drain(&mut rx3).is_empty());
}

#[tokio::test]
async fn test_join_command_resyncs() {
    let (handle, _task) = spawn_session(Session::new(SessionOptions::default()), 8);
    let (sink1, mut rx1) = sink();
    handle.join(P1, sink1).await.unwrap().unwrap();
    drain(&mut rx1);

    handle.dispatch(P1, ClientCommand::Join).await.unwrap();
    handle.snapshot().await.unwrap();

    let events = drain(&mut rx1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "notification");
    assert_eq!(events[0].snapshot().status, Status::Waiting);
}

#[tokio::test]
async fn test_abandoned_join_frees_seat() {
    let (handle, task) = spawn_session(Session::new(SessionOptions::default()), 8);
    let (sink1, _rx1) = sink();
    let (reply, reply_rx) = oneshot::channel();
    drop(reply_rx);

    handle
        .send(SessionCommand::Joined {
            id: P1,
            sink: sink1,
            reply,
        })
        .await
        .unwrap();

    drop(handle);
    let session = task.await.unwrap();
    assert_eq!(session.seated(), 0);
    assert_eq!(session.status(), Status::Waiting);
}

#[tokio::test]
async fn test_abandoned_duplicate_join_keeps_existing_seat() {
    let (handle, task) = spawn_session(Session::new(SessionOptions::default()), 8);
    let (sink1, _rx1) = sink();
    handle.join(P1, sink1).await.unwrap().unwrap();

    let (again, _rx_again) = sink();
    let (reply, reply_rx) = oneshot::channel();
    drop(reply_rx);
    handle
        .send(SessionCommand::Joined {
            id: P1,
            sink: again,
            reply,
        })
        .await
        .unwrap();

    drop(handle);
    let session = task.await.unwrap();
    assert_eq!(session.seat_of(P1), Some(Seat::First));
    assert_eq!(session.seated(), 1);
}

#[tokio::test]
async fn test_handle_reports_stopped_task() {
    let (actor, handle) = SessionActor::new(Session::new(SessionOptions::default()), 1);
    drop(actor);

    assert_eq!(handle.snapshot().await, Err(SessionClosed));
    assert_eq!(handle.disconnect(P1).await, Err(SessionClosed));
}
