//! End-to-end tests for the assistant session through the public API.
//!
//! Time is paused, so typing delays resolve instantly once the runtime
//! is idle.
//!
//! Run with:
//!   cargo test --test test_session_flow

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time;

use burstbot::assistant::{Rejected, RuleTable, Sender, Session, SessionSettings};
use burstbot::config;

// ── helpers ──────────────────────────────────────────────────────────────────

const RED: &str = "Red means severe activity.";
const GREEN: &str = "Green means mild activity.";

fn colour_table() -> Arc<RuleTable> {
    Arc::new(
        RuleTable::new(
            [("red", RED), ("green", GREEN)],
            vec!["Could you be more specific?".into(), "Ask me about colours.".into()],
        )
        .expect("valid table"),
    )
}

fn settings(delay_ms: u64) -> SessionSettings {
    SessionSettings {
        typing_delay: Duration::from_millis(delay_ms),
        ..SessionSettings::default()
    }
}

fn mount(seed: u64) -> Session {
    Session::with_rng(colour_table(), settings(1000), StdRng::seed_from_u64(seed))
}

// ── scenario ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn red_question_scenario() {
    let session = mount(1);
    assert_eq!(session.len(), 1);

    session.submit("What does red mean?").unwrap();
    assert_eq!(session.len(), 2);
    assert!(session.is_awaiting_response());

    session.settled().await;

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 3);
    let last = transcript.last().unwrap();
    assert_eq!(last.sender(), Sender::Assistant);
    assert_eq!(last.text(), RED);
    assert!(!session.is_awaiting_response());
}

// ── ordering ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn transcript_alternates_after_seed() {
    let session = mount(9);
    let inputs = ["red", "   ", "green and red", "nothing here", "", "GREEN"];

    for input in inputs {
        let accepted = session.submit(input).is_ok();
        // A second submit while the first is pending never lands.
        if accepted {
            assert_eq!(session.submit("red"), Err(Rejected::AwaitingResponse));
        }
        session.settled().await;
    }

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 1 + 2 * 4);
    assert_eq!(transcript[0].sender(), Sender::Assistant);
    for (i, pair) in transcript[1..].chunks(2).enumerate() {
        assert_eq!(pair[0].sender(), Sender::User, "pair {i}");
        assert_eq!(pair[1].sender(), Sender::Assistant, "pair {i}");
    }

    let replies: Vec<&str> = transcript[1..].chunks(2).map(|p| p[1].text()).collect();
    assert_eq!(replies[0], RED);
    assert_eq!(replies[1], RED, "table order breaks the tie");
    assert!(["Could you be more specific?", "Ask me about colours."].contains(&replies[2]));
    assert_eq!(replies[3], GREEN);

    let ids: Vec<u64> = transcript.iter().map(|m| m.id().get()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn tie_break_follows_declared_order() {
    let table = colour_table();
    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(table.respond("is it red or green", &mut rng), RED);
    }
}

// ── admission ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn blank_submissions_change_nothing() {
    let session = mount(2);
    let rx = session.subscribe();

    assert_eq!(session.submit(""), Err(Rejected::EmptyInput));
    assert_eq!(session.submit("   "), Err(Rejected::EmptyInput));

    assert_eq!(session.len(), 1);
    assert!(!session.is_awaiting_response());
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn prompts_only_before_first_message() {
    let session = mount(3);
    assert_eq!(session.suggested_prompts().len(), 4);

    session.submit("  ").unwrap_err();
    assert_eq!(session.suggested_prompts().len(), 4);

    session.submit("green").unwrap();
    assert!(session.suggested_prompts().is_empty());
    session.settled().await;
    session.submit("red").unwrap();
    session.settled().await;
    assert!(session.suggested_prompts().is_empty());
}

// ── disposal ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn dropping_session_cancels_reply() {
    let session = mount(4);
    session.submit("red").unwrap();
    let rx = session.subscribe();
    drop(session);

    time::sleep(Duration::from_secs(5)).await;
    // The reply task released its handle on the shared state once cancelled.
    assert!(rx.has_changed().is_err());
}

#[tokio::test(start_paused = true)]
async fn dispose_mid_delay_freezes_transcript() {
    let session = mount(5);
    session.submit("green").unwrap();
    time::advance(Duration::from_millis(500)).await;

    session.dispose();
    time::sleep(Duration::from_secs(2)).await;

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].sender(), Sender::User);
    assert_eq!(session.submit("red"), Err(Rejected::Disposed));
}

// ── shipped config ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shipped_config_matches_builtin_assistant() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let cfg = config::load_from(&path, None, Some("20")).expect("shipped config loads");

    let builtin = RuleTable::cloudburst();
    let shipped: Vec<(&str, &str)> =
        cfg.rules.rules().iter().map(|r| (r.keyword(), r.response())).collect();
    let expected: Vec<(&str, &str)> =
        builtin.rules().iter().map(|r| (r.keyword(), r.response())).collect();
    assert_eq!(shipped, expected);
    assert_eq!(cfg.rules.defaults(), builtin.defaults());

    let session = Session::new(cfg.rules.clone(), cfg.session.clone());
    session.submit("Is Sriharikota unsafe right now?").unwrap();
    session.settled().await;
    assert!(session.transcript()[2].text().starts_with("Unsafe zones"));
}
