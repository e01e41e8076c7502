use std::collections::BTreeSet;

use barrace::{
    ChartLayout, Dataset, Keyframe, Phase, PlaybackController, ProjectionOptions,
    TransitionTracker, VirtualClock, build_keyframes, project, project_with,
};

fn products(slices: usize) -> Vec<Keyframe> {
    let obs = Dataset::from_json_str(include_str!("data/products.json"))
        .unwrap()
        .into_observations();
    build_keyframes(&obs, slices).unwrap()
}

#[test]
fn every_frame_projects_a_ranked_top_n() {
    let layout = ChartLayout::default();
    let opts = ProjectionOptions::from_layout(&layout, 3);
    for (i, kf) in products(4).iter().enumerate() {
        let p = project_with(kf, &opts);
        assert_eq!(p.rows.len(), 3, "frame {i}");
        for (rank, row) in p.rows.iter().enumerate() {
            assert_eq!(row.rank, rank);
            assert_eq!(row.name, kf.data[rank].name);
        }

        let geoms: Vec<_> = p.rows.iter().map(|r| p.geometry(&r.name).unwrap()).collect();
        assert!((geoms[0].width - layout.x_max()).abs() < 1e-9, "frame {i}");
        assert!(geoms.windows(2).all(|w| w[0].y < w[1].y));
        assert!(geoms.windows(2).all(|w| w[0].width >= w[1].width));
        assert!(geoms.iter().all(|g| g.y >= 0.0 && g.y + g.height <= layout.y_max() + 1e-9));
        assert_eq!(p.domain_max(), kf.data[0].value);
    }
}

#[test]
fn top_n_larger_than_the_entity_count_shows_everyone() {
    let kfs = products(1);
    let p = project(&kfs[0], 50, 600.0, 400.0);
    assert_eq!(p.rows.len(), kfs[0].data.len());
    assert_eq!(p.rank_scale.len(), p.rows.len());
}

#[test]
fn played_frames_feed_the_tracker() {
    let keyframes = products(2);
    let opts = ProjectionOptions::from_layout(&ChartLayout::default(), 3);
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    let mut tracker = TransitionTracker::new();

    ctl.start();
    let mut shown: BTreeSet<String> = BTreeSet::new();
    loop {
        let kf = ctl.current_keyframe().unwrap();
        let p = project_with(kf, &opts);
        let ts = tracker.update(&p, ctl.generation());

        let now: BTreeSet<String> = p.rows.iter().map(|r| r.name.clone()).collect();
        for t in &ts {
            match t.phase {
                Phase::Enter => assert!(!shown.contains(&t.name) && now.contains(&t.name)),
                Phase::Update => assert!(shown.contains(&t.name) && now.contains(&t.name)),
                Phase::Exit => {
                    assert!(shown.contains(&t.name) && !now.contains(&t.name));
                    assert_eq!(t.to.width, 0.0);
                }
            }
        }
        assert_eq!(ts.iter().filter(|t| t.phase != Phase::Exit).count(), now.len());
        shown = now;

        ctl.advance(ctl.interval());
        if !ctl.playing() {
            break;
        }
    }
    assert_eq!(ctl.frame_index().0, ctl.keyframes().len() - 1);
}

#[test]
fn replay_makes_the_tracker_enter_from_scratch() {
    let keyframes = products(2);
    let opts = ProjectionOptions::from_layout(&ChartLayout::default(), 3);
    let mut ctl = PlaybackController::new(keyframes, VirtualClock::new());
    let mut tracker = TransitionTracker::new();

    ctl.start();
    ctl.advance(ctl.interval() * 4);
    let kf = ctl.current_keyframe().unwrap();
    tracker.update(&project_with(kf, &opts), ctl.generation());

    ctl.replay();
    let kf = ctl.current_keyframe().unwrap();
    let ts = tracker.update(&project_with(kf, &opts), ctl.generation());
    assert!(ts.iter().all(|t| t.phase == Phase::Enter));
    assert_eq!(tracker.generation(), Some(ctl.generation()));
}
