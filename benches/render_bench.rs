use criterion::{Criterion, black_box, criterion_group, criterion_main};
use wavestream::*;

fn bench_render_one_second(c: &mut Criterion) {
    c.bench_function("render_one_second", |b| {
        b.iter(|| {
            let source = VoiceSettings::default().source(44_100);
            black_box(render(source, black_box(1.0), 44_100));
        });
    });
}

criterion_group!(benches, bench_render_one_second);
criterion_main!(benches);
