use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use weft_engine::classify::Classifier;
use weft_engine::markup::read;
use weft_engine::{Range, Tree, remove_all_formatting};

fn generate_document(sections: usize) -> String {
    let base = "<h2>Section</h2><p>Some <b>bold</b> and <i>italic <u>nested</u></i> text.</p>\
                <ul><li>one</li><li><em>two</em></li></ul>\
                <table><tbody><tr><td>a</td><td><strong>b</strong></td></tr></tbody></table>";
    base.repeat(sections)
}

fn bench_remove_all_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("strip");
    group.sample_size(10);

    let classifier = Classifier::default();
    let tree = read(&generate_document(200)).unwrap();

    group.bench_function("select_all", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut t: Tree| {
                let range = Range::contents_of(&t, t.root());
                let result = remove_all_formatting(&mut t, &classifier, range);
                std::hint::black_box(result)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("single_paragraph", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut t: Tree| {
                let paragraph = t.elements_by_tag("p")[100];
                let range = Range::contents_of(&t, paragraph);
                let result = remove_all_formatting(&mut t, &classifier, range);
                std::hint::black_box(result)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_remove_all_formatting);
criterion_main!(benches);
