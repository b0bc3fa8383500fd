//! In-memory inverted index.
//!
//! Lifecycle: `new` -> repeated `add_document` -> `commit` -> read-only queries.
//! Doc ids are assigned in insertion order, so every postings list is sorted
//! by doc id without an explicit sort.

use crate::analyzer::Analyzer;
use crate::error::IndexError;
use rayon::prelude::*;
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

#[derive(Debug, Clone)]
pub struct DocMeta {
    pub title: String,
    /// Number of analyzed terms, title included.
    pub length: u32,
    /// False once a later document with the same title replaced this one.
    pub live: bool,
}

#[derive(Debug)]
pub struct InvertedIndex {
    analyzer: Analyzer,
    dictionary: HashMap<String, TermId>,
    postings: Vec<Vec<Posting>>, // indexed by TermId
    docs: Vec<DocMeta>,          // indexed by DocId
    titles: HashMap<String, DocId>,
    superseded: usize,
    num_docs: u32,
    avg_doc_length: f32,
    committed: bool,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new(Analyzer::default())
    }
}

impl InvertedIndex {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            dictionary: HashMap::new(),
            postings: Vec::new(),
            docs: Vec::new(),
            titles: HashMap::new(),
            superseded: 0,
            num_docs: 0,
            avg_doc_length: 0.0,
            committed: false,
        }
    }

    /// The analyzer used at build time. Queries must be analyzed with it too.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Analyze and index one document. The title is analyzed along with the body.
    pub fn add_document(&mut self, title: &str, body: &str) -> Result<DocId, IndexError> {
        self.check_writable(title)?;
        let text = document_text(title, body);
        let terms: Vec<String> = self.analyzer.analyze(&text).collect();
        self.insert_terms(title, terms)
    }

    /// Index terms that were analyzed elsewhere with this index's analyzer.
    fn add_analyzed(&mut self, title: &str, terms: Vec<String>) -> Result<DocId, IndexError> {
        self.check_writable(title)?;
        self.insert_terms(title, terms)
    }

    fn check_writable(&self, title: &str) -> Result<(), IndexError> {
        if self.committed {
            return Err(IndexError::IndexFrozen);
        }
        if title.trim().is_empty() {
            return Err(IndexError::InvalidDocument { reason: "empty title".into() });
        }
        Ok(())
    }

    fn insert_terms(&mut self, title: &str, terms: Vec<String>) -> Result<DocId, IndexError> {
        let doc_id = DocId::try_from(self.docs.len())
            .map_err(|_| IndexError::InvalidDocument { reason: "document id space exhausted".into() })?;
        let length = u32::try_from(terms.len())
            .map_err(|_| IndexError::InvalidDocument { reason: "document too long".into() })?;

        // Term ids are handed out in first-seen order so rebuilding is reproducible.
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for term in terms {
            let next_id = self.postings.len() as TermId;
            let tid = *self.dictionary.entry(term).or_insert(next_id);
            if tid == next_id {
                self.postings.push(Vec::new());
            }
            *tf_counts.entry(tid).or_insert(0) += 1;
        }
        for (tid, term_frequency) in tf_counts {
            self.postings[tid as usize].push(Posting { doc_id, term_frequency });
        }

        if let Some(previous) = self.titles.insert(title.to_string(), doc_id) {
            self.docs[previous as usize].live = false;
            self.superseded += 1;
            tracing::warn!(title, previous, doc_id, "duplicate title, keeping the later document");
        }
        self.docs.push(DocMeta { title: title.to_string(), length, live: true });
        Ok(doc_id)
    }

    /// Freeze the index and compute corpus statistics. Further calls are no-ops.
    pub fn commit(&mut self) {
        if self.committed {
            return;
        }
        if self.superseded > 0 {
            let docs = &self.docs;
            for list in self.postings.iter_mut() {
                list.retain(|p| docs[p.doc_id as usize].live);
            }
        }
        let (count, total_length) = self
            .docs
            .iter()
            .filter(|d| d.live)
            .fold((0u32, 0u64), |(n, len), d| (n + 1, len + d.length as u64));
        self.num_docs = count;
        self.avg_doc_length = if count == 0 { 0.0 } else { total_length as f32 / count as f32 };
        self.committed = true;
        tracing::info!(
            num_docs = self.num_docs,
            num_terms = self.dictionary.len(),
            superseded = self.superseded,
            avg_doc_length = self.avg_doc_length,
            "index committed"
        );
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub(crate) fn ensure_committed(&self) -> Result<(), IndexError> {
        if self.committed {
            Ok(())
        } else {
            Err(IndexError::NotCommitted)
        }
    }

    /// Postings for an already-analyzed term, in doc id order. Empty if unseen.
    pub fn postings_for(&self, term: &str) -> &[Posting] {
        match self.dictionary.get(term) {
            Some(&tid) => &self.postings[tid as usize],
            None => &[],
        }
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.postings_for(term).len() as u32
    }

    /// Live documents. Before commit this counts documents added so far.
    pub fn document_count(&self) -> u32 {
        if self.committed {
            self.num_docs
        } else {
            (self.docs.len() - self.superseded) as u32
        }
    }

    /// Zero until the index is committed.
    pub fn average_document_length(&self) -> f32 {
        self.avg_doc_length
    }

    pub fn term_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn title_of(&self, doc_id: DocId) -> Option<&str> {
        self.live_doc(doc_id).map(|d| d.title.as_str())
    }

    pub fn document_length(&self, doc_id: DocId) -> Option<u32> {
        self.live_doc(doc_id).map(|d| d.length)
    }

    pub fn doc_id_of(&self, title: &str) -> Option<DocId> {
        self.titles.get(title).copied()
    }

    fn live_doc(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(doc_id as usize).filter(|d| d.live)
    }
}

fn document_text(title: &str, body: &str) -> String {
    format!("{title}\n{body}")
}

/// A document `build_index` could not add.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedDocument {
    /// Zero-based position in the input sequence.
    pub position: usize,
    pub title: String,
    pub error: IndexError,
}

/// A committed index plus the documents that were rejected on the way.
#[derive(Debug)]
pub struct IndexBuild {
    pub index: InvertedIndex,
    pub rejected: Vec<RejectedDocument>,
}

/// Add every document, reporting failures per document, then commit.
pub fn build_index<I, T, B>(analyzer: Analyzer, documents: I) -> IndexBuild
where
    I: IntoIterator<Item = (T, B)>,
    T: AsRef<str>,
    B: AsRef<str>,
{
    let mut index = InvertedIndex::new(analyzer);
    let mut rejected = Vec::new();
    for (position, (title, body)) in documents.into_iter().enumerate() {
        let result = index.add_document(title.as_ref(), body.as_ref());
        record(result, position, title.as_ref(), &mut rejected);
    }
    index.commit();
    IndexBuild { index, rejected }
}

/// Same result as [`build_index`], with analysis spread over the rayon pool.
/// Postings are still inserted by a single writer in input order.
pub fn build_index_parallel<T, B>(analyzer: Analyzer, documents: &[(T, B)]) -> IndexBuild
where
    T: AsRef<str> + Sync,
    B: AsRef<str> + Sync,
{
    let analyzed: Vec<Vec<String>> = documents
        .par_iter()
        .map(|(title, body)| analyzer.analyze_to_vec(&document_text(title.as_ref(), body.as_ref())))
        .collect();

    let mut index = InvertedIndex::new(analyzer);
    let mut rejected = Vec::new();
    for (position, ((title, _), terms)) in documents.iter().zip(analyzed).enumerate() {
        let result = index.add_analyzed(title.as_ref(), terms);
        record(result, position, title.as_ref(), &mut rejected);
    }
    index.commit();
    IndexBuild { index, rejected }
}

fn record(result: Result<DocId, IndexError>, position: usize, title: &str, rejected: &mut Vec<RejectedDocument>) {
    if let Err(error) = result {
        tracing::warn!(position, title, %error, "document rejected");
        rejected.push(RejectedDocument { position, title: title.to_string(), error });
    }
}
