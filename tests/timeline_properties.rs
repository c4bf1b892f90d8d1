//! Property tests for timeline seeking and animation round-trips.

use std::io::Cursor;

use proptest::prelude::*;

use attractor_anim::{
    animation::{
        ANIMATION_SIGNATURE, AnimationCodec, Chunk, ChunkTag, KeyframeStore, TimelineCursor,
        write_signature,
    },
    curve::{ControlPoint, Spline},
    schema::Thumbnail,
};

/// Store with linear curves and the given durations.
fn store_with(durations: &[f64]) -> KeyframeStore {
    let mut store = KeyframeStore::new();
    for &duration in durations {
        let key = store.append_default();
        store.set_duration(key, duration).unwrap();
        store.set_curve(key, Spline::linear()).unwrap();
    }
    store
}

/// Total length in eighths of a second.
fn eighths(store: &KeyframeStore) -> i64 {
    (store.total_length() * 8.0) as i64
}

// Durations are whole quarters of a second so that all arithmetic below is exact.
prop_compose! {
    fn arb_durations()(quarters in prop::collection::vec(1u32..=16, 1..8)) -> Vec<f64> {
        quarters.into_iter().map(|q| q as f64 * 0.25).collect()
    }
}

#[derive(Debug, Clone)]
struct KeySpec {
    parameters: Vec<u8>,
    thumbnail: Option<Vec<u8>>,
    duration: f64,
    curve: Spline,
}

fn arb_curve() -> impl Strategy<Value = Spline> {
    prop_oneof![
        Just(Spline::smooth()),
        Just(Spline::linear()),
        (0.01f64..0.99, 0.0f64..=1.0).prop_map(|(x, y)| {
            Spline::new(vec![
                ControlPoint::new(0.0, 0.0),
                ControlPoint::new(x, y),
                ControlPoint::new(1.0, 1.0),
            ])
            .unwrap()
        }),
    ]
}

prop_compose! {
    fn arb_keyframe()(
        parameters in prop::collection::vec(any::<u8>(), 0..64),
        thumbnail in prop::option::of(prop::collection::vec(any::<u8>(), 0..128)),
        duration in 0.001f64..100.0,
        curve in arb_curve(),
    ) -> KeySpec {
        KeySpec { parameters, thumbnail, duration, curve }
    }
}

fn build(specs: &[KeySpec]) -> KeyframeStore {
    let mut store = KeyframeStore::new();
    for spec in specs {
        let key = store.append_default();
        store.set_parameters(key, spec.parameters.clone()).unwrap();
        store
            .set_thumbnail(key, spec.thumbnail.clone().map(Thumbnail::new))
            .unwrap();
        store.set_duration(key, spec.duration).unwrap();
        store.set_curve(key, spec.curve.clone()).unwrap();
    }
    store
}

fn assert_same(a: &KeyframeStore, b: &KeyframeStore) -> Result<(), TestCaseError> {
    prop_assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        prop_assert_eq!(x, y);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn total_length_is_sum_of_durations(durations in arb_durations()) {
        let store = store_with(&durations);
        prop_assert_eq!(store.total_length(), durations.iter().sum::<f64>());
    }

    #[test]
    fn seek_inside_animation_is_valid(durations in arb_durations(), frac in 0.0f64..1.0) {
        let store = store_with(&durations);
        let t = (frac * eighths(&store) as f64).floor() / 8.0;

        let cursor = TimelineCursor::at(&store, t);
        prop_assert!(cursor.is_valid());
        prop_assert_eq!(cursor.absolute_time(&store), Some(t));
        let weight = cursor.interpolation_weight(&store).unwrap();
        prop_assert!((0.0..1.0).contains(&weight));
    }

    #[test]
    fn seek_past_end_is_invalid(durations in arb_durations(), extra in 0u32..100) {
        let store = store_with(&durations);
        let t = store.total_length() + extra as f64 * 0.125;
        prop_assert!(!TimelineCursor::at(&store, t).is_valid());
    }

    #[test]
    fn relative_seeks_compose(
        durations in arb_durations(),
        frac in 0.0f64..1.0,
        x in -80i64..80,
        y in -80i64..80,
    ) {
        let store = store_with(&durations);
        let total = eighths(&store);
        let s = (frac * total as f64) as i64;
        prop_assume!((0..total).contains(&(s + x)));

        let mut stepped = TimelineCursor::at(&store, s as f64 / 8.0);
        stepped.seek_relative(&store, x as f64 / 8.0);
        stepped.seek_relative(&store, y as f64 / 8.0);

        let mut direct = TimelineCursor::at(&store, s as f64 / 8.0);
        direct.seek_relative(&store, (x + y) as f64 / 8.0);

        prop_assert_eq!(stepped.is_valid(), direct.is_valid());
        if direct.is_valid() {
            prop_assert_eq!(stepped.position(), direct.position());
            prop_assert_eq!(stepped.local_offset(), direct.local_offset());
        }

        // Relative moves agree with absolute seeks, clamped at the start
        let target = (s + x + y).max(0);
        let absolute = TimelineCursor::at(&store, target as f64 / 8.0);
        prop_assert_eq!(absolute.is_valid(), direct.is_valid());
        if direct.is_valid() {
            prop_assert_eq!(absolute, direct);
        }
    }

    #[test]
    fn smooth_weight_rises_through_keyframe(duration_q in 1u32..=16, steps in 2usize..40) {
        let mut store = KeyframeStore::new();
        let key = store.append_default();
        let duration = duration_q as f64 * 0.25;
        store.set_duration(key, duration).unwrap();
        store.append_default();

        let mut cursor = TimelineCursor::start(&store);
        let mut previous = cursor.interpolation_weight(&store).unwrap();
        prop_assert_eq!(previous, 0.0);

        for _ in 1..steps {
            cursor.seek_relative(&store, duration / steps as f64);
            if cursor.position() != Some(0) {
                break;
            }
            let weight = cursor.interpolation_weight(&store).unwrap();
            prop_assert!(weight >= previous - 1e-12);
            previous = weight;
        }
    }

    #[test]
    fn weight_approaches_one_at_keyframe_end(
        duration_q in 1u32..=16,
        smooth in any::<bool>(),
        scale in 1u32..=1000,
    ) {
        let mut store = KeyframeStore::new();
        let key = store.append_default();
        let duration = duration_q as f64 * 0.25;
        store.set_duration(key, duration).unwrap();
        let curve = if smooth { Spline::smooth() } else { Spline::linear() };
        store.set_curve(key, curve).unwrap();
        store.append_default();

        let epsilon = duration * scale as f64 * 1e-9;
        let cursor = TimelineCursor::at(&store, duration - epsilon);
        prop_assert_eq!(cursor.position(), Some(0));
        let weight = cursor.interpolation_weight(&store).unwrap();
        prop_assert!(weight > 1.0 - 1e-5, "weight {} at {} before the end", weight, epsilon);
        prop_assert!(weight <= 1.0);
    }

    #[test]
    fn save_load_roundtrip(specs in prop::collection::vec(arb_keyframe(), 0..6)) {
        let store = build(&specs);
        let codec = AnimationCodec::default();

        let mut buf = Vec::new();
        codec.save(&store, &mut buf).unwrap();
        let (loaded, report) = codec.load(&mut Cursor::new(buf)).unwrap();

        prop_assert!(report.is_clean());
        assert_same(&store, &loaded)?;
    }

    #[test]
    fn unknown_chunks_do_not_change_keyframes(
        specs in prop::collection::vec(arb_keyframe(), 1..4),
        at in any::<prop::sample::Index>(),
        tag in any::<[u8; 2]>(),
        payload in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let store = build(&specs);
        let codec = AnimationCodec::default();

        let mut buf = Vec::new();
        codec.save(&store, &mut buf).unwrap();

        // Split into chunks and splice in one the codec has never heard of
        let mut reader = Cursor::new(&buf[ANIMATION_SIGNATURE.len()..]);
        let mut chunks = Vec::new();
        while let Some(chunk) = Chunk::read_from(&mut reader, u32::MAX).unwrap() {
            chunks.push(chunk);
        }
        let unknown = ChunkTag::new(&[b'z', b'z', tag[0], tag[1]]);
        chunks.insert(at.index(chunks.len() + 1), Chunk::new(unknown, payload));

        let mut noisy = Vec::new();
        write_signature(&mut noisy, ANIMATION_SIGNATURE).unwrap();
        for chunk in &chunks {
            chunk.write_to(&mut noisy).unwrap();
        }

        let (loaded, report) = codec.load(&mut Cursor::new(noisy)).unwrap();
        prop_assert_eq!(report.unknown, vec![unknown]);
        prop_assert!(report.skipped.is_empty());
        assert_same(&store, &loaded)?;
    }
}
