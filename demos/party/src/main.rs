//! A scripted three-peer party in one process.
//!
//! Wires Ada, Bea and Cyd into a direct mesh over in-memory links, then
//! plays out one turn: Ada (the turn-0 artist) paints, Bea guesses
//! wrong, Cyd guesses right, Ada ends the turn. Run with
//! `RUST_LOG=easel=debug` to watch the engine think.

use std::time::Duration;

use easel::prelude::*;
use tokio::sync::mpsc;

struct Seat {
    name: &'static str,
    handle: MatchHandle,
}

fn seat(
    name: &'static str,
    local: Participant,
    mesh: DirectMesh,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
) -> Seat {
    let (handle, mut events) = spawn_match(MatchSetup {
        local,
        transport: Box::new(mesh),
        codec: JsonCodec,
        canvas: Box::new(PixelGrid::new()),
        milestones: Box::new(NoMilestones),
        link_events,
        word_bank: WordBank::default(),
    });

    // A stand-in for the UI layer: print what it would render.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                MatchEvent::TurnBegan { turn_number, role } => {
                    println!("[{name}] turn {turn_number}: {role:?}");
                }
                MatchEvent::GuessResult {
                    guesser,
                    correct,
                    points,
                } => {
                    let verdict = if correct { "right" } else { "wrong" };
                    println!(
                        "[{name}] {guesser} guessed {verdict} (+{points})"
                    );
                }
                MatchEvent::AllGuessed => {
                    println!("[{name}] everyone has guessed!");
                }
                MatchEvent::ParticipantJoined {
                    participant,
                    rejoined,
                } => {
                    let how =
                        if rejoined { "rejoined" } else { "joined" };
                    println!(
                        "[{name}] {} {how}",
                        participant.display_name
                    );
                }
                MatchEvent::ParticipantLeft { participant } => {
                    println!(
                        "[{name}] {} left",
                        participant.display_name
                    );
                }
                MatchEvent::Ended { reason } => {
                    println!("[{name}] match over: {reason:?}");
                    break;
                }
                MatchEvent::CountdownTick { .. } => {}
            }
        }
    });

    Seat { name, handle }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::main]
async fn main() -> Result<(), EaselError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("easel=info")
                }),
        )
        .init();

    // Three peers, fully meshed.
    let names = ["Ada", "Bea", "Cyd"];
    let mut meshes = Vec::new();
    let mut link_event_rxs = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::unbounded_channel();
        meshes.push(DirectMesh::new(tx));
        link_event_rxs.push(rx);
    }
    for i in 0..3 {
        for j in (i + 1)..3 {
            let (near, far) = MemoryLink::pair();
            meshes[i].add_peer(MessagingId::from(format!("m{j}")), near);
            meshes[j].add_peer(MessagingId::from(format!("m{i}")), far);
        }
    }

    let seats: Vec<Seat> = link_event_rxs
        .into_iter()
        .enumerate()
        .map(|(i, rx)| {
            seat(
                names[i],
                Participant::local(
                    format!("m{i}"),
                    format!("profile-{i}"),
                    names[i],
                ),
                meshes[i].clone(),
                rx,
            )
        })
        .collect();

    settle().await;
    for s in &seats {
        s.handle.begin_match()?;
    }
    settle().await;

    // Ada deals turn 0 (lowest persistent id) and paints a little house.
    let ada = &seats[0];
    let word = ada
        .handle
        .info()
        .await?
        .current_word
        .unwrap_or_default();
    println!("[{}] secret word: {word}", ada.name);
    for (x, y) in [(4, 6), (5, 6), (4, 5), (5, 5), (4, 4)] {
        ada.handle.draw_stroke(x, y, 3)?;
    }
    settle().await;

    // Bea picks the wrong word on purpose; Cyd reads the answer off her
    // own snapshot (every peer knows it — hiding it is the UI's job).
    let info = seats[1].handle.info().await?;
    let answer = info
        .words
        .iter()
        .position(|w| Some(w) == info.current_word.as_ref())
        .unwrap_or(0);
    seats[1].handle.submit_guess((answer + 1) % info.words.len())?;
    settle().await;
    seats[2].handle.submit_guess(answer)?;
    settle().await;

    // Ada wraps up; the artist hat passes to Bea.
    ada.handle.end_turn()?;
    settle().await;

    println!("final scores:");
    for p in seats[0].handle.info().await?.scoreboard {
        println!("  {:>4}  {}", p.score, p.display_name);
    }

    for s in &seats {
        s.handle.leave()?;
    }
    settle().await;
    Ok(())
}
