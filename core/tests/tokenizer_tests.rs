use docrank_core::tokenizer::tokenize;

#[test]
fn it_normalizes_and_stems() {
    let words = tokenize("Running Runners RUN! The ﬁnal menu.");
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the "ﬁ" ligature before stemming.
    assert!(words.contains(&tokenize("final")[0]));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words.len(), 5);
}

#[test]
fn it_is_case_insensitive() {
    assert_eq!(tokenize("MANCHESTER United"), tokenize("manchester united"));
}
