use std::collections::BTreeSet;

use barrace::{
    Dataset, Keyframe, Observation, Timestamp, build_keyframes, expected_keyframe_count,
};

fn load(s: &str) -> Vec<Observation> {
    Dataset::from_json_str(s).unwrap().into_observations()
}

fn distinct_dates(obs: &[Observation]) -> usize {
    obs.iter().map(|o| o.date.as_str()).collect::<BTreeSet<_>>().len()
}

fn distinct_names(obs: &[Observation]) -> usize {
    obs.iter().map(|o| o.name.as_str()).collect::<BTreeSet<_>>().len()
}

fn value_of(kf: &Keyframe, name: &str) -> f64 {
    kf.get(name).unwrap().value
}

#[test]
fn two_entity_scenario_produces_three_ranked_frames() {
    let obs = load(include_str!("data/scenario.json"));
    let kfs = build_keyframes(&obs, 2).unwrap();
    assert_eq!(kfs.len(), 3);

    let rows = |kf: &Keyframe| -> Vec<(String, f64)> {
        kf.data.iter().map(|d| (d.name.clone(), d.value)).collect()
    };
    assert_eq!(rows(&kfs[0]), vec![("A".to_owned(), 10.0), ("B".to_owned(), 5.0)]);
    assert_eq!(rows(&kfs[1]), vec![("A".to_owned(), 15.0), ("B".to_owned(), 5.0)]);
    assert_eq!(rows(&kfs[2]), vec![("A".to_owned(), 20.0), ("B".to_owned(), 5.0)]);

    assert_eq!(kfs[0].date, Timestamp::parse("2022-01-01"));
    assert_eq!(kfs[2].date, Timestamp::parse("2022-02-01"));
    let mid = (Timestamp::parse("2022-01-01").as_millis()
        + Timestamp::parse("2022-02-01").as_millis())
        / 2.0;
    assert_eq!(kfs[1].date.as_millis(), mid);
    assert!(kfs[1].synthetic);
    assert!(!kfs[0].synthetic && !kfs[2].synthetic);
}

#[test]
fn frame_count_law_holds_for_every_slice_count() {
    let obs = load(include_str!("data/products.json"));
    let dates = distinct_dates(&obs);
    assert_eq!(dates, 12);
    for k in 1..=10 {
        let kfs = build_keyframes(&obs, k).unwrap();
        assert_eq!(kfs.len(), dates + (dates - 1) * (k - 1), "slice count {k}");
        assert_eq!(kfs.len(), expected_keyframe_count(dates, k));
    }
}

#[test]
fn every_keyframe_is_dense_and_ranked() {
    let obs = load(include_str!("data/products.json"));
    let names = distinct_names(&obs);
    let kfs = build_keyframes(&obs, 8).unwrap();
    for (i, kf) in kfs.iter().enumerate() {
        assert_eq!(kf.data.len(), names, "keyframe {i}");
        assert!(
            kf.data.windows(2).all(|w| w[0].value >= w[1].value),
            "keyframe {i} not ranked"
        );
    }
}

#[test]
fn dates_are_non_decreasing_and_exact_dates_survive() {
    let obs = load(include_str!("data/products.json"));
    let kfs = build_keyframes(&obs, 8).unwrap();
    assert!(kfs.windows(2).all(|w| w[0].date <= w[1].date));

    let exact: Vec<_> = kfs.iter().filter(|k| !k.synthetic).map(|k| k.date).collect();
    let want: Vec<_> = obs
        .iter()
        .map(|o| o.date.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Timestamp::parse)
        .collect();
    assert_eq!(exact, want);
    // Exact keyframes sit every 8 positions.
    assert!(kfs.iter().step_by(8).all(|k| !k.synthetic));
}

#[test]
fn synthetic_values_interpolate_linearly() {
    let obs = vec![
        Observation::new("2022-01-01", "A", 3.0),
        Observation::new("2022-03-01", "A", 43.0),
        Observation::new("2022-01-01", "B", 50.0),
        Observation::new("2022-03-01", "B", 10.0),
    ];
    let k = 5;
    let kfs = build_keyframes(&obs, k).unwrap();
    for s in 0..=k {
        let t = s as f64 / k as f64;
        let kf = &kfs[s];
        assert!((value_of(kf, "A") - (3.0 + 40.0 * t)).abs() < 1e-9);
        assert!((value_of(kf, "B") - (50.0 - 40.0 * t)).abs() < 1e-9);
    }
}

#[test]
fn sparse_entity_interpolates_from_zero() {
    let obs = vec![
        Observation::new("2022-01-01", "A", 10.0),
        Observation::new("2022-02-01", "A", 10.0),
        Observation::new("2022-02-01", "New", 40.0),
    ];
    let kfs = build_keyframes(&obs, 4).unwrap();
    assert_eq!(value_of(&kfs[0], "New"), 0.0);
    assert_eq!(value_of(&kfs[2], "New"), 20.0);
    assert_eq!(kfs[2].data[0].name, "New");
    assert_eq!(kfs[1].data[0].name, "A");
}

#[test]
fn sales_records_flatten_into_keyframes() {
    let obs = load(include_str!("data/sales.json"));
    assert_eq!(obs.len(), 5);
    let kfs = build_keyframes(&obs, 2).unwrap();
    assert_eq!(kfs.len(), 5);
    let first = &kfs[0];
    assert_eq!(first.data.len(), 3);
    assert_eq!(first.data[0].name, "Cafetera");
    assert_eq!(value_of(first, "p-9"), 0.0);
    assert_eq!(value_of(&kfs[2], "Tostadora"), 6.0);
}

#[test]
fn keyframes_serialize_with_iso_dates() {
    let obs = load(include_str!("data/scenario.json"));
    let kfs = build_keyframes(&obs, 2).unwrap();
    let v = serde_json::to_value(&kfs).unwrap();
    assert_eq!(v[0]["date"], "2022-01-01T00:00:00.000Z");
    assert_eq!(v[1]["data"][0]["value"], 15.0);
    assert!(v[0]["data"][0].get("category").is_none());
}
