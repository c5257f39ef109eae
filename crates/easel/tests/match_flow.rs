//! End-to-end match flows over in-memory links: a three-peer mesh, a
//! host-relay star, and the rejoin-restores-score scenario.

use std::time::Duration;

use easel::prelude::*;
use tokio::sync::mpsc;

type Events = mpsc::UnboundedReceiver<MatchEvent>;

struct Peer {
    handle: MatchHandle,
    events: Events,
}

fn spawn_peer(
    local: Participant,
    transport: Box<dyn TransportAdapter>,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
) -> Peer {
    let (handle, events) = spawn_match(MatchSetup {
        local,
        transport,
        codec: JsonCodec,
        canvas: Box::new(PixelGrid::new()),
        milestones: Box::new(NoMilestones),
        link_events,
        word_bank: WordBank::default(),
    });
    Peer { handle, events }
}

async fn next_event(events: &mut Events) -> MatchEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for a match event")
        .expect("event stream closed")
}

/// Skips unrelated events (countdown ticks, roster chatter) until `pred`
/// matches.
async fn wait_for(
    events: &mut Events,
    pred: impl Fn(&MatchEvent) -> bool,
) -> MatchEvent {
    loop {
        let event = next_event(events).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Polls until the peer's roster reaches `n` active participants.
async fn wait_roster(handle: &MatchHandle, n: usize) {
    for _ in 0..400 {
        if handle.info().await.unwrap().scoreboard.len() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("roster never reached {n} participants");
}

async fn score_of(handle: &MatchHandle, pid: &str) -> Option<u32> {
    handle
        .info()
        .await
        .ok()?
        .scoreboard
        .into_iter()
        .find(|p| p.persistent_id.0 == pid)
        .map(|p| p.score)
}

async fn wait_score(handle: &MatchHandle, pid: &str, expected: u32) {
    for _ in 0..400 {
        if score_of(handle, pid).await == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "score of {pid} never converged to {expected} (currently {:?})",
        score_of(handle, pid).await
    );
}

fn mid(s: &str) -> MessagingId {
    MessagingId::from(s)
}

/// Fully meshes three peers over in-memory links. Returns the peers and
/// a mesh handle per peer for late link registration.
fn mesh_trio() -> (Vec<Peer>, Vec<DirectMesh>) {
    let names = ["Ada", "Bea", "Cyd"];
    let mut meshes = Vec::new();
    let mut event_rxs = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::unbounded_channel();
        meshes.push(DirectMesh::new(tx));
        event_rxs.push(rx);
    }
    // One link pair per unordered pair of peers.
    for i in 0..3 {
        for j in (i + 1)..3 {
            let (near, far) = MemoryLink::pair();
            meshes[i].add_peer(mid(&format!("m{}", j + 1)), near);
            meshes[j].add_peer(mid(&format!("m{}", i + 1)), far);
        }
    }
    let peers = event_rxs
        .into_iter()
        .enumerate()
        .map(|(i, rx)| {
            spawn_peer(
                Participant::local(
                    format!("m{}", i + 1),
                    format!("p{}", i + 1),
                    names[i],
                ),
                Box::new(meshes[i].clone()),
                rx,
            )
        })
        .collect();
    (peers, meshes)
}

/// Reads the turn's correct word index off a peer's snapshot.
async fn correct_index(handle: &MatchHandle) -> usize {
    let info = handle.info().await.unwrap();
    let word = info.current_word.expect("turn not dealt");
    info.words
        .iter()
        .position(|w| *w == word)
        .expect("secret word not in candidate list")
}

// ---------------------------------------------------------------------------
// Direct mesh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mesh_turn_rotation_and_guess_convergence() {
    let (mut peers, _meshes) = mesh_trio();

    for peer in &peers {
        wait_roster(&peer.handle, 3).await;
    }
    for peer in &peers {
        peer.handle.begin_match().unwrap();
    }

    // Sorted ids [p1, p2, p3], turn 0 — p1 paints, the others guess.
    for (i, peer) in peers.iter_mut().enumerate() {
        let began = wait_for(&mut peer.events, |e| {
            matches!(e, MatchEvent::TurnBegan { .. })
        })
        .await;
        let expected_role =
            if i == 0 { TurnRole::Artist } else { TurnRole::Guessing };
        assert_eq!(
            began,
            MatchEvent::TurnBegan {
                turn_number: 0,
                role: expected_role
            }
        );
    }

    // Every peer received the same turn data.
    let correct = correct_index(&peers[0].handle).await;
    assert_eq!(correct, correct_index(&peers[2].handle).await);

    // p3 guesses right: worth the countdown value at submission, and
    // exactly the carried value lands on every registry.
    peers[2].handle.submit_guess(correct).unwrap();
    let result = wait_for(&mut peers[2].events, |e| {
        matches!(e, MatchEvent::GuessResult { .. })
    })
    .await;
    let MatchEvent::GuessResult {
        guesser,
        correct: was_correct,
        points,
    } = result
    else {
        unreachable!()
    };
    assert_eq!(guesser, PersistentId::from("p3"));
    assert!(was_correct);
    assert!((1..=30).contains(&points));
    wait_score(&peers[0].handle, "p3", points).await;
    wait_score(&peers[1].handle, "p3", points).await;

    // p2 guesses wrong: recorded, nothing awarded, and with every
    // guesser done the artist (only) hears about it.
    let words = peers[1].handle.info().await.unwrap().words;
    let wrong = (correct + 1) % words.len();
    peers[1].handle.submit_guess(wrong).unwrap();
    // p2's stream already holds p3's result; wait for p2's own.
    let result = wait_for(&mut peers[1].events, |e| {
        matches!(
            e,
            MatchEvent::GuessResult { guesser, .. } if guesser.0 == "p2"
        )
    })
    .await;
    assert_eq!(
        result,
        MatchEvent::GuessResult {
            guesser: PersistentId::from("p2"),
            correct: false,
            points: 0,
        }
    );
    wait_for(&mut peers[0].events, |e| {
        matches!(e, MatchEvent::AllGuessed)
    })
    .await;

    // The artist ends the turn; everyone rotates to p2 as artist.
    peers[0].handle.end_turn().unwrap();
    for (i, peer) in peers.iter_mut().enumerate() {
        let began = wait_for(&mut peer.events, |e| {
            matches!(e, MatchEvent::TurnBegan { .. })
        })
        .await;
        let expected_role =
            if i == 1 { TurnRole::Artist } else { TurnRole::Guessing };
        assert_eq!(
            began,
            MatchEvent::TurnBegan {
                turn_number: 1,
                role: expected_role
            }
        );
    }
}

#[tokio::test]
async fn test_mesh_second_guess_sends_nothing() {
    let (mut peers, _meshes) = mesh_trio();
    for peer in &peers {
        wait_roster(&peer.handle, 3).await;
    }
    for peer in &peers {
        peer.handle.begin_match().unwrap();
    }
    for peer in peers.iter_mut() {
        wait_for(&mut peer.events, |e| {
            matches!(e, MatchEvent::TurnBegan { .. })
        })
        .await;
    }
    let correct = correct_index(&peers[0].handle).await;

    let wrong = (correct + 1) % 10;
    peers[2].handle.submit_guess(wrong).unwrap();
    wait_for(&mut peers[2].events, |e| {
        matches!(e, MatchEvent::GuessResult { .. })
    })
    .await;

    // A second local guess is a strict no-op: no envelope, no award,
    // even when it would have been correct.
    peers[2].handle.submit_guess(correct).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(score_of(&peers[0].handle, "p3").await, Some(0));
    assert_eq!(score_of(&peers[2].handle, "p3").await, Some(0));
}

#[tokio::test]
async fn test_stale_turn_start_does_not_regress_turn() {
    // Cross-peer reordering can deliver a slow artist's turn data after
    // a newer turn already began on this peer; applying it would roll
    // the turn number backwards and wipe live guess state.
    let (tx, rx) = mpsc::unbounded_channel();
    let mesh = DirectMesh::new(tx.clone());
    let mut peer = spawn_peer(
        Participant::local("m2", "p2", "Bea"),
        Box::new(mesh),
        rx,
    );

    let codec = JsonCodec;
    let newer = codec
        .encode(&DrawMessage::TurnStart {
            turn_number: 5,
            words: vec!["kite".into(), "moon".into()],
            correct_word_index: 0,
        })
        .unwrap();
    tx.send(LinkEvent::Inbound {
        from: mid("m1"),
        bytes: newer,
    })
    .unwrap();
    let stale = codec
        .encode(&DrawMessage::TurnStart {
            turn_number: 4,
            words: vec!["sun".into(), "boat".into()],
            correct_word_index: 1,
        })
        .unwrap();
    tx.send(LinkEvent::Inbound {
        from: mid("m1"),
        bytes: stale,
    })
    .unwrap();

    wait_for(&mut peer.events, |e| {
        matches!(e, MatchEvent::TurnBegan { turn_number: 5, .. })
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let info = peer.handle.info().await.unwrap();
    assert_eq!(info.turn_number, 5);
    assert_eq!(
        info.words,
        vec!["kite".to_string(), "moon".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Host relay
// ---------------------------------------------------------------------------

/// A host plus two clients in a star. Host persistent id sorts first, so
/// it is the artist for turn 0.
fn relay_trio() -> (Peer, Peer, Peer) {
    let (host_tx, host_rx) = mpsc::unbounded_channel();
    let host_adapter = HostRelay::host(host_tx);

    let (host_end_a, client_end_a) = MemoryLink::pair();
    let (host_end_b, client_end_b) = MemoryLink::pair();
    host_adapter.attach_client(mid("ma"), host_end_a);
    host_adapter.attach_client(mid("mb"), host_end_b);

    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let a_adapter = HostRelay::client(mid("mh"), client_end_a, a_tx);
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    let b_adapter = HostRelay::client(mid("mh"), client_end_b, b_tx);

    let host = spawn_peer(
        Participant::local("mh", "p1", "Host"),
        Box::new(host_adapter),
        host_rx,
    );
    let a = spawn_peer(
        Participant::local("ma", "p2", "Ann"),
        Box::new(a_adapter),
        a_rx,
    );
    let b = spawn_peer(
        Participant::local("mb", "p3", "Bob"),
        Box::new(b_adapter),
        b_rx,
    );
    (host, a, b)
}

#[tokio::test]
async fn test_relay_guess_converges_on_sibling_client() {
    let (host, mut a, mut b) = relay_trio();
    for peer in [&host, &a, &b] {
        wait_roster(&peer.handle, 3).await;
    }
    for peer in [&host, &a, &b] {
        peer.handle.begin_match().unwrap();
    }
    for peer in [&mut a, &mut b] {
        wait_for(&mut peer.events, |e| {
            matches!(e, MatchEvent::TurnBegan { .. })
        })
        .await;
    }

    // Client a's guess reaches client b only through the host's relay.
    let correct = correct_index(&a.handle).await;
    a.handle.submit_guess(correct).unwrap();

    let result = wait_for(&mut b.events, |e| {
        matches!(e, MatchEvent::GuessResult { .. })
    })
    .await;
    let MatchEvent::GuessResult {
        guesser,
        correct: was_correct,
        points,
    } = result
    else {
        unreachable!()
    };
    assert_eq!(guesser, PersistentId::from("p2"));
    assert!(was_correct);
    wait_score(&b.handle, "p2", points).await;
    wait_score(&host.handle, "p2", points).await;
}

#[tokio::test]
async fn test_relay_host_departure_ends_match_for_clients() {
    let (host, mut a, mut b) = relay_trio();
    for peer in [&host, &a, &b] {
        wait_roster(&peer.handle, 3).await;
    }
    for peer in [&host, &a, &b] {
        peer.handle.begin_match().unwrap();
    }

    host.handle.leave().unwrap();

    // Unrecoverable for a relay client: no host, no match.
    for client in [&mut a, &mut b] {
        let ended = wait_for(&mut client.events, |e| {
            matches!(e, MatchEvent::Ended { .. })
        })
        .await;
        assert_eq!(
            ended,
            MatchEvent::Ended {
                reason: EndReason::HostDeparted
            }
        );
    }
}

// ---------------------------------------------------------------------------
// Rejoin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sibling_view_of_self_restores_own_score() {
    // After a rejoin a sibling may still describe us under our previous
    // transport address; same person by persistent id, and its record
    // carries the score our fresh process has forgotten.
    let (tx, rx) = mpsc::unbounded_channel();
    let mesh = DirectMesh::new(tx.clone());
    let peer = spawn_peer(
        Participant::local("m3x", "p3", "Cyd"),
        Box::new(mesh),
        rx,
    );

    let mut remembered = Participant::new("m3", "p3", "Cyd");
    remembered.score = 21;
    let bytes = JsonCodec
        .encode(&DrawMessage::ParticipantChange {
            participant: remembered,
            is_joining: true,
        })
        .unwrap();
    tx.send(LinkEvent::Inbound {
        from: mid("m1"),
        bytes,
    })
    .unwrap();

    wait_score(&peer.handle, "p3", 21).await;
}

#[tokio::test]
async fn test_rejoin_with_fresh_address_restores_score() {
    let (mut peers, meshes) = mesh_trio();
    for peer in &peers {
        wait_roster(&peer.handle, 3).await;
    }
    for peer in &peers {
        peer.handle.begin_match().unwrap();
    }
    for peer in peers.iter_mut() {
        wait_for(&mut peer.events, |e| {
            matches!(e, MatchEvent::TurnBegan { .. })
        })
        .await;
    }

    // p3 earns points, then drops out of the match.
    let correct = correct_index(&peers[0].handle).await;
    peers[2].handle.submit_guess(correct).unwrap();
    let result = wait_for(&mut peers[2].events, |e| {
        matches!(e, MatchEvent::GuessResult { .. })
    })
    .await;
    let MatchEvent::GuessResult { points, .. } = result else {
        unreachable!()
    };
    wait_score(&peers[0].handle, "p3", points).await;
    wait_score(&peers[1].handle, "p3", points).await;

    peers[2].handle.leave().unwrap();
    for peer in peers.iter_mut().take(2) {
        wait_for(&mut peer.events, |e| {
            matches!(e, MatchEvent::ParticipantLeft { .. })
        })
        .await;
    }

    // p3 comes back under a brand-new transport address but the same
    // persistent id, over fresh links.
    let (tx, rx) = mpsc::unbounded_channel();
    let rejoin_mesh = DirectMesh::new(tx);
    let (near1, far1) = MemoryLink::pair();
    let (near2, far2) = MemoryLink::pair();
    rejoin_mesh.add_peer(mid("m1"), near1);
    rejoin_mesh.add_peer(mid("m2"), near2);
    meshes[0].add_peer(mid("m3x"), far1);
    meshes[1].add_peer(mid("m3x"), far2);
    let rejoined = spawn_peer(
        Participant::local("m3x", "p3", "Cyd"),
        Box::new(rejoin_mesh),
        rx,
    );

    let joined = wait_for(&mut peers[0].events, |e| {
        matches!(e, MatchEvent::ParticipantJoined { .. })
    })
    .await;
    assert!(matches!(
        joined,
        MatchEvent::ParticipantJoined { rejoined: true, .. }
    ));

    // The parked record wins: the earned score on the stayers, and the
    // restored score reaches the rejoiner's own fresh registry too.
    wait_score(&peers[0].handle, "p3", points).await;
    wait_score(&peers[1].handle, "p3", points).await;
    wait_score(&rejoined.handle, "p3", points).await;

    // The artist's snapshot drops the rejoiner into the live turn.
    let mut rejoined = rejoined;
    let began = wait_for(&mut rejoined.events, |e| {
        matches!(e, MatchEvent::TurnBegan { .. })
    })
    .await;
    assert_eq!(
        began,
        MatchEvent::TurnBegan {
            turn_number: 0,
            role: TurnRole::Guessing
        }
    );
}
