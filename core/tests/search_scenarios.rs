use qa_core::{build_index, query, Bm25Params, ConfigError, EngineConfig, IndexBuild, QueryError, QueryEvaluator};

fn capitals() -> IndexBuild {
    build_index(
        &EngineConfig::default(),
        vec![
            ("Paris", "paris is the capital of france"),
            ("Berlin", "berlin is the capital of germany"),
        ],
    )
}

#[test]
fn or_query_ranks_best_overlap_first() {
    let build = capitals();
    let titles = query(&build.index, &EngineConfig::default(), "capital france", 10).unwrap();
    assert_eq!(titles, vec!["Paris", "Berlin"]);
}

#[test]
fn required_term_filters_candidates() {
    let build = capitals();
    let titles = query(&build.index, &EngineConfig::default(), "+france capital", 10).unwrap();
    assert_eq!(titles, vec!["Paris"]);
}

#[test]
fn required_filter_beats_optional_overlap() {
    let build = build_index(
        &EngineConfig::default(),
        vec![
            ("Volcano", "lava magma eruption crater ash lava magma"),
            ("Glacier", "ice snow glacier"),
            ("Iceland", "ice glacier volcano lava"),
        ],
    );
    let titles = query(&build.index, &EngineConfig::default(), "lava magma eruption crater +ice", 10).unwrap();
    assert_eq!(titles, vec!["Iceland", "Glacier"]);
}

#[test]
fn single_term_query_finds_every_document_with_the_term() {
    let build = build_index(
        &EngineConfig::default(),
        vec![("A", "orchids grow in forests"), ("B", "deserts"), ("C", "an orchid")],
    );
    let evaluator = QueryEvaluator::new(&build.index, Bm25Params::default()).unwrap();
    let results = evaluator.search("orchid", 10).unwrap();
    let ids: Vec<u32> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&0) && ids.contains(&2));
    assert!(results.iter().all(|r| r.score > 0.0));
}

#[test]
fn ranking_is_reproducible() {
    let docs: Vec<(String, String)> = (0..40)
        .map(|i| (format!("Doc {i}"), "identical text about rivers".to_string()))
        .collect();
    let build = build_index(&EngineConfig::default(), docs);
    let cfg = EngineConfig::default();
    let first = query(&build.index, &cfg, "rivers", 10).unwrap();
    for _ in 0..5 {
        assert_eq!(query(&build.index, &cfg, "rivers", 10).unwrap(), first);
    }
    // equal scores fall back to insertion order
    let expected: Vec<String> = (0..10).map(|i| format!("Doc {i}")).collect();
    assert_eq!(first, expected);
}

#[test]
fn top_k_limits_results() {
    let docs: Vec<(String, String)> = (0..25).map(|i| (format!("T{i}"), format!("common word{i}"))).collect();
    let build = build_index(&EngineConfig::default(), docs);
    assert_eq!(query(&build.index, &EngineConfig::default(), "common", 10).unwrap().len(), 10);
    assert_eq!(query(&build.index, &EngineConfig::default(), "common", 3).unwrap().len(), 3);
}

#[test]
fn empty_corpus_returns_nothing() {
    let build = build_index(&EngineConfig::default(), Vec::<(&str, &str)>::new());
    assert_eq!(build.index.document_count(), 0);
    assert!(query(&build.index, &EngineConfig::default(), "anything at all", 10).unwrap().is_empty());
}

#[test]
fn stopword_only_query_returns_nothing() {
    let build = capitals();
    assert!(query(&build.index, &EngineConfig::default(), "the of a", 10).unwrap().is_empty());
}

#[test]
fn strict_mode_surfaces_query_errors() {
    let build = capitals();
    let strict = EngineConfig { strict_queries: true, ..EngineConfig::default() };
    assert_eq!(query(&build.index, &strict, "the of a", 10), Err(QueryError::EmptyQuery));
    assert!(matches!(query(&build.index, &strict, "capital +", 10), Err(QueryError::Parse(_))));
    assert!(query(&build.index, &EngineConfig::default(), "capital +", 10).unwrap().is_empty());
}

#[test]
fn analyzer_configuration_travels_with_the_index() {
    let cfg = EngineConfig {
        analyzer: qa_core::AnalyzerConfig::without_stopwords(),
        ..EngineConfig::default()
    };
    let build = build_index(&cfg, vec![("The Who", "a band"), ("Queen", "another band")]);
    // "the" and "who" are only searchable because stopwords were disabled at build time.
    let titles = query(&build.index, &EngineConfig::default(), "the who", 10).unwrap();
    assert_eq!(titles, vec!["The Who"]);
}

#[test]
fn out_of_range_length_normalization_is_rejected_and_scores_stay_non_negative() {
    let err = EngineConfig::from_json(r#"{"bm25": {"k1": 1.2, "b": 2.0}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidParam { field: "bm25.b", .. }));

    let long_body: String = (0..200).map(|i| format!("filler{i} ")).collect();
    let build = build_index(&EngineConfig::default(), vec![("Short", "zebra"), ("Long", long_body.as_str())]);
    let cfg = EngineConfig::from_json(r#"{"bm25": {"k1": 1.2, "b": 1.0}}"#).unwrap();
    let evaluator = QueryEvaluator::new(&build.index, cfg.bm25).unwrap();
    let results = evaluator.search("zebra", 10).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].score > 0.0);
}
