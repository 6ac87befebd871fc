//! Playback controller state machine against recording doubles

mod common;

use common::{probe, rendered, MockBackend, MockTiming, Shared};
use mozartify_score::playback::{
    EventOutcome, PlayOutcome, PlaybackController, PlaybackEvent, PlaybackState, Tempo,
    Transposition,
};
use mozartify_score::ScoreViewError;
use pretty_assertions::assert_eq;

type Controller = PlaybackController<MockBackend, MockTiming>;

fn controller(probe: &Shared) -> Controller {
    PlaybackController::new(MockBackend { probe: probe.clone() }, 1.0, "https://fonts.test/")
}

fn primed(cycle: u64) -> PlaybackEvent {
    PlaybackEvent::Primed { cycle, result: Ok(()) }
}

/// Play and finish priming
fn start_playing(player: &mut Controller, probe: &Shared) -> u64 {
    let score = rendered(probe, "X:1\nK:C\nCDEF|");
    let PlayOutcome::Priming(cycle) = player.play(Some(&score)).unwrap() else {
        panic!("expected a priming cycle");
    };
    assert_eq!(player.handle_event(primed(cycle), Some(&score)).unwrap(), EventOutcome::Started);
    cycle
}

#[test]
fn test_play_primes_then_plays() {
    let p = probe();
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");
    assert_eq!(player.state(), PlaybackState::Idle);

    assert_eq!(player.play(Some(&score)).unwrap(), PlayOutcome::Priming(1));
    assert_eq!(player.state(), PlaybackState::Priming);
    assert!(player.has_live_synth());
    assert_eq!(p.borrow().live_timings, 0);

    assert_eq!(player.handle_event(primed(1), Some(&score)).unwrap(), EventOutcome::Started);
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(p.borrow().live_timings, 1);
    assert_eq!(
        p.borrow().log,
        vec!["create synth1", "synth1 prepare cycle=1", "timing start", "synth1 start"]
    );
}

#[test]
fn test_play_without_render_does_nothing() {
    let p = probe();
    let mut player = controller(&p);
    assert_eq!(player.play(None).unwrap(), PlayOutcome::NothingToPlay);
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(p.borrow().synths_created, 0);
}

#[test]
fn test_second_play_while_priming_allocates_nothing() {
    let p = probe();
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    player.play(Some(&score)).unwrap();
    assert_eq!(player.play(Some(&score)).unwrap(), PlayOutcome::AlreadyActive(1));
    assert_eq!(player.play(Some(&score)).unwrap(), PlayOutcome::AlreadyActive(1));
    assert_eq!(p.borrow().synths_created, 1);
    assert_eq!(p.borrow().max_live_synths, 1);
}

#[test]
fn test_play_while_playing_is_a_no_op() {
    let p = probe();
    let mut player = controller(&p);
    let cycle = start_playing(&mut player, &p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    assert_eq!(player.play(Some(&score)).unwrap(), PlayOutcome::AlreadyActive(cycle));
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(p.borrow().synths_created, 1);
}

#[test]
fn test_end_without_loop_stops_and_releases() {
    let p = probe();
    let mut player = controller(&p);
    let cycle = start_playing(&mut player, &p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    let outcome = player.handle_event(PlaybackEvent::Ended { cycle }, Some(&score)).unwrap();
    assert_eq!(outcome, EventOutcome::Stopped);
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(!player.has_live_synth());
    assert!(!player.has_live_timing());
    assert_eq!(p.borrow().live_synths, 0);
    assert_eq!(p.borrow().live_timings, 0);
}

#[test]
fn test_loop_restarts_straight_into_priming() {
    let p = probe();
    let mut player = controller(&p);
    player.set_looping(true);
    let cycle = start_playing(&mut player, &p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    let outcome = player.handle_event(PlaybackEvent::Ended { cycle }, Some(&score)).unwrap();
    assert_eq!(outcome, EventOutcome::Restarted(cycle + 1));
    assert_eq!(player.state(), PlaybackState::Priming);

    // The old synthesizer is gone before the new one exists
    let probe = p.borrow();
    assert_eq!(probe.synths_created, 2);
    assert_eq!(probe.max_live_synths, 1);
    assert_eq!(probe.live_synths, 1);
    let stop_old = probe.log.iter().position(|l| l == "synth1 stop").unwrap();
    let create_new = probe.log.iter().position(|l| l == "create synth2").unwrap();
    assert!(stop_old < create_new);
}

#[test]
fn test_loop_cycles_repeat() {
    let p = probe();
    let mut player = controller(&p);
    player.set_looping(true);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");
    let mut cycle = start_playing(&mut player, &p);

    for _ in 0..3 {
        let EventOutcome::Restarted(next) = player
            .handle_event(PlaybackEvent::Ended { cycle }, Some(&score))
            .unwrap()
        else {
            panic!("expected a restart");
        };
        assert_eq!(player.handle_event(primed(next), Some(&score)).unwrap(), EventOutcome::Started);
        cycle = next;
    }
    assert_eq!(p.borrow().synths_created, 4);
    assert_eq!(p.borrow().max_live_synths, 1);
}

#[test]
fn test_stop_and_reset_from_every_state() {
    let p = probe();
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    // Idle stays Idle
    player.stop_and_reset();
    assert_eq!(player.state(), PlaybackState::Idle);

    // Priming
    player.play(Some(&score)).unwrap();
    player.stop_and_reset();
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(!player.has_live_synth() && !player.has_live_timing());

    // Playing
    start_playing(&mut player, &p);
    player.stop_and_reset();
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(!player.has_live_synth() && !player.has_live_timing());

    // Stopped, twice
    player.stop_and_reset();
    player.stop_and_reset();
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(p.borrow().live_synths, 0);
    assert_eq!(p.borrow().live_timings, 0);
}

#[test]
fn test_priming_rejection_lands_in_stopped() {
    let p = probe();
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");
    player.play(Some(&score)).unwrap();

    let failure = PlaybackEvent::Primed { cycle: 1, result: Err("sound font 404".to_string()) };
    let err = player.handle_event(failure, Some(&score)).unwrap_err();
    assert_eq!(err, ScoreViewError::PrimingFailure("sound font 404".to_string()));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(!player.has_live_synth());
    assert_eq!(p.borrow().live_synths, 0);

    // A fresh Play works again
    assert_eq!(player.play(Some(&score)).unwrap(), PlayOutcome::Priming(2));
}

#[test]
fn test_synchronous_prepare_failure_lands_in_stopped() {
    let p = probe();
    p.borrow_mut().fail_prepare = true;
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    let err = player.play(Some(&score)).unwrap_err();
    assert!(matches!(err, ScoreViewError::PrimingFailure(_)));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(p.borrow().live_synths, 0);
}

#[test]
fn test_backend_failure_lands_in_stopped() {
    let p = probe();
    p.borrow_mut().fail_create = true;
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    let err = player.play(Some(&score)).unwrap_err();
    assert_eq!(err, ScoreViewError::PrimingFailure("no audio device".to_string()));
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_start_failure_releases_timing() {
    let p = probe();
    p.borrow_mut().fail_start = true;
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");
    player.play(Some(&score)).unwrap();

    let err = player.handle_event(primed(1), Some(&score)).unwrap_err();
    assert!(matches!(err, ScoreViewError::PlaybackFailure(_)));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(p.borrow().live_timings, 0);
    assert_eq!(p.borrow().live_synths, 0);
}

#[test]
fn test_failure_while_playing_stops() {
    let p = probe();
    let mut player = controller(&p);
    let cycle = start_playing(&mut player, &p);

    let failure = PlaybackEvent::Failed { cycle, message: "device lost".to_string() };
    let err = player.handle_event(failure, None).unwrap_err();
    assert_eq!(err, ScoreViewError::PlaybackFailure("device lost".to_string()));
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_late_priming_result_from_cancelled_cycle_is_ignored() {
    let p = probe();
    let mut player = controller(&p);
    let score = rendered(&p, "X:1\nK:C\nCDEF|");

    player.play(Some(&score)).unwrap();
    player.stop();
    assert_eq!(player.play(Some(&score)).unwrap(), PlayOutcome::Priming(2));

    assert_eq!(player.handle_event(primed(1), Some(&score)).unwrap(), EventOutcome::Ignored);
    assert_eq!(player.state(), PlaybackState::Priming);
    assert_eq!(p.borrow().live_timings, 0);

    assert_eq!(player.handle_event(primed(2), Some(&score)).unwrap(), EventOutcome::Started);
}

#[test]
fn test_late_events_after_stop_are_ignored() {
    let p = probe();
    let mut player = controller(&p);
    let cycle = start_playing(&mut player, &p);
    player.stop();

    assert_eq!(player.handle_event(PlaybackEvent::Ended { cycle }, None).unwrap(), EventOutcome::Ignored);
    let failure = PlaybackEvent::Failed { cycle, message: "late".to_string() };
    assert_eq!(player.handle_event(failure, None).unwrap(), EventOutcome::Ignored);
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_parameter_change_stops_without_resuming() {
    let p = probe();
    let mut player = controller(&p);
    start_playing(&mut player, &p);

    assert!(player.set_tempo(Tempo::new(140)));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(!player.has_live_synth());
    assert_eq!(p.borrow().synths_created, 1);

    start_playing(&mut player, &p);
    assert!(player.set_transposition(Transposition::new(2)));
    assert_eq!(player.state(), PlaybackState::Stopped);

    start_playing(&mut player, &p);
    assert!(player.set_program(40));
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_unchanged_parameter_keeps_playing() {
    let p = probe();
    let mut player = controller(&p);
    start_playing(&mut player, &p);

    assert!(!player.set_tempo(Tempo::DEFAULT));
    assert!(!player.set_looping(false));
    assert_eq!(player.state(), PlaybackState::Playing);
}

#[test]
fn test_new_cycle_uses_current_settings() {
    let p = probe();
    let mut player = controller(&p);
    player.set_tempo(Tempo::new(120));
    player.set_program(24);
    start_playing(&mut player, &p);

    assert_eq!(p.borrow().last_measure_ms, Some(2000.0));
    assert_eq!(p.borrow().last_program, Some(24));
}

#[test]
fn test_teardown_releases_audio_context() {
    let p = probe();
    let mut player = controller(&p);
    start_playing(&mut player, &p);

    player.teardown();
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(p.borrow().released, 1);
    assert_eq!(p.borrow().live_synths, 0);
    assert_eq!(p.borrow().live_timings, 0);
}

#[test]
fn test_drop_releases_handles() {
    let p = probe();
    {
        let mut player = controller(&p);
        start_playing(&mut player, &p);
    }
    assert_eq!(p.borrow().live_synths, 0);
    assert_eq!(p.borrow().live_timings, 0);
}
