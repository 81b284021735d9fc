use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use layerkit_host::{SharedDocument, Size, Viewport};
use layerkit_widgets::{Layer, LayerOptions};

fn bench_adjust(c: &mut Criterion) {
    let doc = SharedDocument::new();
    let dialog = doc.with_mut(|d| {
        d.set_viewport(Viewport::new(1920.0, 1080.0));
        let dialog = d.create_element("div");
        let body = d.body();
        d.append(body, dialog);
        d.set_outer_size(dialog, Size::new(640.0, 480.0));
        dialog
    });
    let layer = Layer::new(doc, dialog, LayerOptions::default());

    c.bench_function("layer_adjust", |b| {
        b.iter(|| black_box(&layer).handle_update());
    });
}

criterion_group!(benches, bench_adjust);
criterion_main!(benches);
