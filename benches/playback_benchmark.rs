use criterion::{black_box, criterion_group, criterion_main, Criterion};
use storyboard::renderer::{Compositor, FrameBuffer};
use storyboard::templates::TemplateSample;
use storyboard::{RecordingStage, TemplateContext, TemplateKind, TimelineEntry, TimelinePlayer};

fn create_test_timeline() -> Vec<TimelineEntry> {
    TemplateKind::ALL
        .iter()
        .filter(|kind| **kind != TemplateKind::ImageDisplay)
        .enumerate()
        .map(|(i, kind)| {
            let mut entry = TemplateSample::generate(*kind, 4.0);
            entry.start_time = i as f64 * 4.0;
            entry.end_time = entry.start_time + 4.0;
            entry
        })
        .collect()
}

fn bench_plan_timeline(c: &mut Criterion) {
    let entries = create_test_timeline();

    c.bench_function("plan_sample_timeline", |b| {
        b.iter(|| {
            let mut stage = RecordingStage::new();
            TimelinePlayer::new(TemplateContext::default())
                .play(black_box(&entries), &mut stage)
                .unwrap();
            stage
        })
    });
}

fn bench_composite_graph(c: &mut Criterion) {
    let object = TemplateKind::GraphPlot
        .construct("y = sin(x) * x", 0.0, &TemplateContext::default())
        .unwrap();
    let mut buffer = FrameBuffer::new(1920, 1080);

    c.bench_function("composite_graph_1080p", |b| {
        b.iter(|| {
            buffer.clear([0, 0, 0, 255]);
            Compositor::draw_object(&mut buffer, black_box(&object), 1.0);
        })
    });
}

criterion_group!(benches, bench_plan_timeline, bench_composite_graph);
criterion_main!(benches);
