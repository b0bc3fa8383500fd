use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qa_core::{build_index, query, Analyzer, EngineConfig};

const ARTICLE: &str = "The Danube is the second-longest river in Europe, after the Volga. \
It flows through much of Central and Southeastern Europe, from the Black Forest into the Black Sea. \
Historically a long-standing frontier of the Roman Empire, the river passes through or touches the \
borders of ten countries: Germany, Austria, Slovakia, Hungary, Croatia, Serbia, Romania, Bulgaria, \
Moldova and Ukraine. Its drainage basin extends into nine more countries. Vienna's and Budapest's \
bridges are famous; Johann Strauss II wrote \"An der schönen blauen Donau\".";

fn corpus(n: usize) -> Vec<(String, String)> {
    (0..n)
        .map(|i| (format!("Article {i}"), format!("{ARTICLE} Entry number {i} mentions topic{}.", i % 37)))
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = Analyzer::default();
    c.bench_function("analyze_article", |b| b.iter(|| analyzer.analyze(black_box(ARTICLE)).count()));
}

fn bench_build(c: &mut Criterion) {
    let docs = corpus(500);
    let cfg = EngineConfig::default();
    c.bench_function("build_index_500", |b| b.iter(|| build_index(&cfg, docs.iter().map(|(title, body)| (title, body)))));
}

fn bench_query(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let build = build_index(&cfg, corpus(2_000));
    c.bench_function("query_or", |b| b.iter(|| query(&build.index, &cfg, black_box("river europe topic5 vienna"), 10)));
    c.bench_function("query_required", |b| b.iter(|| query(&build.index, &cfg, black_box("+topic5 river +vienna"), 10)));
}

criterion_group!(benches, bench_analyze, bench_build, bench_query);
criterion_main!(benches);
