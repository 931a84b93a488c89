use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use journey_tracker::models::{LocationFix, PermissionState};
use journey_tracker::services::{SamplingProfile, TrackingSession};

/// A long synthetic ride: one fix per 500ms, drifting speed and accuracy so
/// every gate gets exercised.
fn synthetic_track(count: usize) -> Vec<LocationFix> {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let t = i as f64;
            let speed = 1.0 + (t / 50.0).sin().abs() * 25.0;
            LocationFix {
                latitude: 37.4 + t * 0.00003,
                longitude: -122.2 + (t / 200.0).sin() * 0.01,
                horizontal_accuracy: if i % 17 == 0 { 80.0 } else { 8.0 },
                speed,
                timestamp: start + Duration::milliseconds(i as i64 * 500),
            }
        })
        .collect()
}

fn benchmark_ingest(c: &mut Criterion) {
    let track = synthetic_track(20_000);

    let mut group = c.benchmark_group("session_ingest");

    for profile in [SamplingProfile::PRODUCTION, SamplingProfile::DIAGNOSTIC] {
        group.bench_function(profile.name, |b| {
            b.iter(|| {
                let mut session = TrackingSession::new("bench", profile);
                session
                    .start(PermissionState::Authorized, track[0].timestamp)
                    .expect("Failed to start session");
                for fix in &track {
                    let _ = session.ingest(black_box(fix), fix.timestamp);
                }
                session.total_distance_meters()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_ingest);
criterion_main!(benches);
