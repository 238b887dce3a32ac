use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sensor_models::{
    AesaParams, AesaRadar, BeamTransition, DwellCenter, Noise, NoiseCovariance, RadarParams,
    RadarRotatingRangeBearing, RotatingBeam, RotationParams,
};
use tracker_core::types::{SensorId, State};

fn targets(n: usize, t: f64) -> Vec<State> {
    (0..n)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / n as f64;
            let r = 40e3_f64;
            State::from_slice(&[r * angle.cos(), 0.0, r * angle.sin(), 0.0, 5e3, 0.0], t)
        })
        .collect()
}

fn bench_prob_gen(c: &mut Criterion) {
    let mut group = c.benchmark_group("aesa");

    for swerling_on in [false, true] {
        let params = AesaParams {
            mapping: vec![0, 2, 4],
            swerling_on,
            beam_transition: BeamTransition::Rotating(
                // Beam effectively stationary over the benchmark
                RotatingBeam::new(1e-9, DwellCenter::new(0.0, 0.0)).unwrap(),
            ),
            ..AesaParams::default()
        };
        let batch = targets(500, 0.0);
        group.bench_function(format!("prob_gen_500_swerling_{swerling_on}"), |b| {
            let mut radar = AesaRadar::new(SensorId(0), params.clone()).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            b.iter(|| {
                for truth in &batch {
                    black_box(radar.prob_gen(truth, &mut rng).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_rotating(c: &mut Criterion) {
    let params = RadarParams {
        position: vec![0.0, 0.0],
        orientation: [0.0; 3],
        ndim_state: 6,
        mapping: vec![0, 2],
        noise_covar: NoiseCovariance::diagonal(&[1e-4, 25.0]).unwrap(),
    };
    let rotation = RotationParams {
        rpm: 12.0,
        max_range: 60e3,
        fov_angle: 0.5,
        dwell_center: DwellCenter::new(0.0, 0.0),
    };

    c.bench_function("rotating_scan_500", |b| {
        let mut radar = RadarRotatingRangeBearing::new(SensorId(1), &params, &rotation).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut t = 0.0;
        b.iter(|| {
            t += 0.1;
            for truth in targets(500, t) {
                black_box(radar.gen_measurement(&truth, &Noise::Sampled, &mut rng).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_prob_gen, bench_rotating);
criterion_main!(benches);
