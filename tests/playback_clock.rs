use std::{cell::RefCell, rc::Rc, time::Duration};

use barrace::{
    Dataset, FrameIndex, Keyframe, PlaybackController, PlaybackHooks, TickOutcome, TimerId,
    VirtualClock, build_keyframes,
};

const TICK: Duration = Duration::from_millis(250);

fn scenario_keyframes(slices: usize) -> Vec<Keyframe> {
    let obs = Dataset::from_json_str(include_str!("data/products.json"))
        .unwrap()
        .into_observations();
    build_keyframes(&obs, slices).unwrap()
}

#[test]
fn playback_visits_every_frame_then_stops_itself() {
    let keyframes = scenario_keyframes(3);
    let m = keyframes.len();
    assert_eq!(m, 12 + 11 * 2);

    let frames = Rc::new(RefCell::new(Vec::new()));
    let stops = Rc::new(RefCell::new(0));
    let mut clock = VirtualClock::new();
    {
        let mut ctl = PlaybackController::new(keyframes, &mut clock);
        let (f, s) = (frames.clone(), stops.clone());
        ctl.subscribe(
            PlaybackHooks::new()
                .on_frame(move |i| f.borrow_mut().push(i.0))
                .on_stop(move || *s.borrow_mut() += 1),
        );

        ctl.start();
        assert_eq!(ctl.advance(TICK * (m as u32 - 1)), m - 1);
        assert_eq!(ctl.frame_index(), FrameIndex(m - 1));
        assert!(ctl.playing());

        assert_eq!(ctl.advance(TICK), 1);
        assert!(!ctl.playing());
        assert_eq!(ctl.frame_index(), FrameIndex(m - 1));
        assert!(!ctl.has_pending_tick());
    }

    assert_eq!(*frames.borrow(), (1..m).collect::<Vec<_>>());
    assert_eq!(*stops.borrow(), 1);
    assert_eq!(clock.max_pending(), 1);
    assert_eq!(clock.pending(), 0);
}

#[test]
fn run_to_end_fires_once_per_frame() {
    let keyframes = scenario_keyframes(8);
    let m = keyframes.len();
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    ctl.start();
    assert_eq!(ctl.run_to_end(), m);
    assert_eq!(ctl.frame_index(), FrameIndex(m - 1));
    assert!(!ctl.playing());
    assert_eq!(ctl.clock().max_pending(), 1);
    assert_eq!(ctl.clock().scheduled_count(), m as u64);
}

#[test]
fn replay_mid_run_restarts_from_zero_under_a_new_generation() {
    let keyframes = scenario_keyframes(2);
    let m = keyframes.len();
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    ctl.start();
    ctl.advance(TICK * 5);
    assert_eq!(ctl.frame_index(), FrameIndex(5));
    let before = ctl.generation();

    ctl.replay();
    assert_eq!(ctl.frame_index(), FrameIndex::ZERO);
    assert!(ctl.playing());
    assert_eq!(ctl.generation(), before + 1);
    assert_eq!(ctl.clock().pending(), 1);

    // The replacement tick is a full interval away.
    assert_eq!(ctl.advance(TICK - Duration::from_millis(1)), 0);
    assert_eq!(ctl.advance(Duration::from_millis(1)), 1);
    assert_eq!(ctl.frame_index(), FrameIndex(1));

    assert_eq!(ctl.run_to_end(), m - 1);
    assert_eq!(ctl.clock().max_pending(), 1);
}

#[test]
fn replay_after_finish_plays_again() {
    let keyframes = scenario_keyframes(1);
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    ctl.start();
    ctl.run_to_end();
    assert!(!ctl.playing());

    ctl.replay();
    assert!(ctl.playing());
    assert_eq!(ctl.frame_index(), FrameIndex::ZERO);
    assert_eq!(ctl.advance(TICK), 1);
    assert_eq!(ctl.frame_index(), FrameIndex(1));
}

#[test]
fn stop_then_start_resumes_without_double_ticking() {
    let keyframes = scenario_keyframes(4);
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    ctl.start();
    ctl.advance(TICK * 3);
    ctl.stop();
    assert_eq!(ctl.advance(TICK * 10), 0);
    assert_eq!(ctl.frame_index(), FrameIndex(3));

    ctl.start();
    ctl.start();
    assert_eq!(ctl.clock().pending(), 1);
    assert_eq!(ctl.advance(TICK), 1);
    assert_eq!(ctl.frame_index(), FrameIndex(4));
    assert_eq!(ctl.clock().max_pending(), 1);
}

#[test]
fn stale_fire_is_ignored() {
    let keyframes = scenario_keyframes(2);
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    ctl.start();
    assert_eq!(ctl.on_timer(TimerId(u64::MAX)), TickOutcome::Ignored);
    assert_eq!(ctl.frame_index(), FrameIndex::ZERO);
    assert!(ctl.has_pending_tick());
}

#[test]
fn empty_sequence_never_plays() {
    let mut ctl = PlaybackController::new(Vec::<Keyframe>::new(), VirtualClock::new());
    ctl.start();
    ctl.replay();
    assert!(!ctl.playing());
    assert_eq!(ctl.clock().scheduled_count(), 0);
}

#[test]
fn dispose_leaves_no_timer_behind() {
    let keyframes = scenario_keyframes(2);
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    ctl.start();
    ctl.advance(TICK);
    ctl.dispose();
    assert_eq!(ctl.clock().pending(), 0);
    ctl.start();
    ctl.replay();
    assert_eq!(ctl.clock().pending(), 0);
    assert_eq!(ctl.advance(TICK * 4), 0);
    assert_eq!(ctl.frame_index(), FrameIndex(1));
}
