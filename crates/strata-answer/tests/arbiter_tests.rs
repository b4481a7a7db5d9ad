use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use strata_answer::template::inspect_reasoner_output;
use strata_answer::{Arbiter, FallbackReason, PromptConfig, QueryContext, Route};
use strata_core::traits::{Embedder, LanguageModel, VectorIndex};
use strata_core::types::{Chunk, ChunkId, Layer, Neighbor};
use strata_embed::{CachedEmbedder, HashEmbedder};
use strata_vector::{IndexStore, IndexWriter};

const COMPLIANT: &str = "TITUL: Tlak prvního virálu

MAPA - CO SE PRAVDĚPODOBNĚ DĚJE

Mechanismus: Zhuštěný čas
TYPE: Modelový prior
CERTAINTY: střední
SIGNAL: MODERATE
MEDIÁN: Rozhodnutí se dělají rychle.
EXTRÉM: Podpis smlouvy během hodin.
HRANICE POZNÁNÍ: Neznáme podíl odmítnutých nabídek.

Mechanismus: Sociální důkaz
TYPE: Weak inference
CERTAINTY: nízká
SIGNAL: WEAK
MEDIÁN: Publikum očekává pokračování.
EXTRÉM: Odliv po změně formátu.
HRANICE POZNÁNÍ: Chybí longitudinální data.

Mechanismus: Exploatativní aktéři
TYPE: Strong generalization
CERTAINTY: vyšší
SIGNAL: STRONG
MEDIÁN: Nabídky přicházejí hromadně.
EXTRÉM: Ztráta práv k obsahu.
HRANICE POZNÁNÍ: Nevíme, kolik nabídek bylo férových.

CALIBRATION SCORE: 2 - obecné vzorce bez lokálních dat";

struct CountingEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

impl Embedder for CountingEmbedder {
    fn embedder_id(&self) -> &str { "counting" }
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("embedding model crashed");
        }
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Returns the configured rows in order, regardless of the query.
struct StubIndex {
    order: Vec<ChunkId>,
    calls: AtomicUsize,
    fail: bool,
}

impl VectorIndex for StubIndex {
    fn len(&self) -> usize { self.order.len() }
    fn dim(&self) -> usize { 2 }
    fn search(&self, _query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("index file unreadable");
        }
        Ok(self.order.iter().take(k).enumerate().map(|(i, &id)| Neighbor { distance: i as f32 * 0.1, id }).collect())
    }
}

/// Pops one scripted reply per call; `Err` entries simulate transport failures.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<&str, &str>>) -> Self {
        let replies = replies.into_iter().map(|r| r.map(str::to_string).map_err(str::to_string)).collect();
        Self { replies: Mutex::new(replies), prompts: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> usize { self.prompts.lock().unwrap().len() }

    fn prompt(&self, i: usize) -> String { self.prompts.lock().unwrap()[i].clone() }
}

impl LanguageModel for ScriptedBackend {
    fn model_id(&self) -> &str { "scripted" }
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }
}

struct Harness {
    embedder: Arc<CountingEmbedder>,
    index: Arc<StubIndex>,
    backend: Arc<ScriptedBackend>,
    ctx: QueryContext,
}

impl Harness {
    fn new(chunks: Vec<Chunk>, order: Vec<ChunkId>, replies: Vec<Result<&str, &str>>) -> Self {
        Self::with_failures(chunks, order, replies, false, false)
    }

    fn with_failures(
        chunks: Vec<Chunk>,
        order: Vec<ChunkId>,
        replies: Vec<Result<&str, &str>>,
        embed_fails: bool,
        search_fails: bool,
    ) -> Self {
        let embedder = Arc::new(CountingEmbedder { calls: AtomicUsize::new(0), fail: embed_fails });
        let index = Arc::new(StubIndex { order, calls: AtomicUsize::new(0), fail: search_fails });
        let backend = Arc::new(ScriptedBackend::new(replies));
        let ctx = QueryContext {
            embedder: Arc::new(CachedEmbedder::new(embedder.clone(), 16)),
            index: index.clone(),
            chunks: chunks.into(),
            backend: backend.clone(),
        };
        Self { embedder, index, backend, ctx }
    }

    fn embed_calls(&self) -> usize { self.embedder.calls.load(Ordering::SeqCst) }
    fn search_calls(&self) -> usize { self.index.calls.load(Ordering::SeqCst) }
}

fn chunk(layer: Layer, text: &str) -> Chunk {
    Chunk { text: text.into(), source: format!("{layer}/fixture.txt"), layer }
}

fn mixed_corpus() -> Vec<Chunk> {
    vec![
        chunk(Layer::Raw, "Po virálu přišlo sedm nabídek od agentur během tří dnů."),
        chunk(Layer::Synth, "Tvůrci po prvním virálu často zrychlí publikování."),
        chunk(Layer::Meta, "Viditelné příběhy jsou zkreslené přeživšími."),
    ]
}

#[test]
fn blank_input_short_circuits_without_any_calls() {
    let h = Harness::new(mixed_corpus(), vec![0, 1, 2], vec![Ok("should not be used")]);
    let arbiter = Arbiter::default();
    for q in ["", "   ", "\n\t"] {
        let answer = arbiter.answer(&h.ctx, q);
        assert_eq!(answer.text, "Prázdný dotaz.");
        assert_eq!(answer.route, Route::EmptyInput);
    }
    assert_eq!(h.embed_calls(), 0);
    assert_eq!(h.search_calls(), 0);
    assert_eq!(h.backend.calls(), 0);
}

#[test]
fn raw_evidence_is_labeled_in_grounded_prompt() {
    let h = Harness::new(mixed_corpus(), vec![0, 1], vec![Ok("Sedm nabídek během tří dnů.")]);
    let answer = Arbiter::default().answer(&h.ctx, "Jaké události byly po prvním virálu pozorovány?");

    assert_eq!(answer.text, "Sedm nabídek během tří dnů.");
    match &answer.route {
        Route::Grounded { evidence } => {
            let layers: Vec<Layer> = evidence.iter().map(|e| e.chunk.layer).collect();
            assert_eq!(layers, vec![Layer::Synth, Layer::Raw]);
        }
        other => panic!("expected grounded route, got {other:?}"),
    }
    assert_eq!(h.backend.calls(), 1);
    let prompt = h.backend.prompt(0);
    assert!(prompt.contains("[LAYER: raw]\nPo virálu přišlo sedm nabídek od agentur během tří dnů."));
    assert!(!prompt.contains("[LAYER: meta]"));
}

#[test]
fn observation_question_without_allowed_evidence_goes_to_reasoner() {
    let corpus = vec![chunk(Layer::Meta, "Data jsou zkreslená.")];
    let h = Harness::new(corpus, vec![0], vec![Ok(COMPLIANT)]);
    let answer = Arbiter::default().answer(&h.ctx, "Jaké případy byly zaznamenány?");

    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::NoAllowedEvidence });
    assert_eq!(answer.text, COMPLIANT);
    assert_eq!(h.backend.calls(), 1, "grounded generation must be skipped");
    let prompts = PromptConfig::default();
    assert!(h.backend.prompt(0).contains(&prompts.reasoner_wrapper));
    assert!(!h.backend.prompt(0).contains(&prompts.system_rules));
}

#[test]
fn no_local_evidence_yields_template_compliant_reasoner_answer() {
    let corpus = vec![chunk(Layer::Raw, "Nabídka přišla e-mailem.")];
    let h = Harness::new(corpus, vec![0], vec![Ok(COMPLIANT)]);
    let answer = Arbiter::default().answer(&h.ctx, "Proč tvůrci po virálu mění rytmus?");

    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::NoAllowedEvidence });
    assert!(inspect_reasoner_output(&answer.text, &PromptConfig::default()).is_compliant());
    assert_eq!(h.backend.calls(), 1);
}

#[test]
fn empty_index_goes_to_reasoner() {
    let h = Harness::new(vec![], vec![], vec![Ok(COMPLIANT)]);
    let answer = Arbiter::default().answer(&h.ctx, "Co teď?");
    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::NoCandidates });
    assert_eq!(answer.text, COMPLIANT);
}

#[test]
fn refusal_token_overrides_successful_grounded_call() {
    let h = Harness::new(
        mixed_corpus(),
        vec![1],
        vec![Ok("NEDOLOŽENO - odpověď není v datech."), Ok(COMPLIANT)],
    );
    let answer = Arbiter::default().answer(&h.ctx, "Co teď?");

    assert_eq!(answer.text, COMPLIANT);
    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::SelfDeclaredInsufficient });
    assert_eq!(h.backend.calls(), 2);
    assert!(h.backend.prompt(0).contains("KONTEXT:\n[LAYER: synth]"));
}

#[test]
fn empty_grounded_completion_goes_to_reasoner() {
    let h = Harness::new(mixed_corpus(), vec![1], vec![Ok("  \n"), Ok(COMPLIANT)]);
    let answer = Arbiter::default().answer(&h.ctx, "Co teď?");
    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::EmptyCompletion });
    assert_eq!(answer.text, COMPLIANT);
}

#[test]
fn embedding_failure_still_returns_text() {
    let h = Harness::with_failures(mixed_corpus(), vec![1], vec![Ok(COMPLIANT)], true, false);
    let answer = Arbiter::default().answer(&h.ctx, "Co teď?");
    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::RetrievalFailed });
    assert_eq!(answer.text, COMPLIANT);
    assert_eq!(h.search_calls(), 0);
}

#[test]
fn search_failure_still_returns_text() {
    let h = Harness::with_failures(mixed_corpus(), vec![1], vec![Ok(COMPLIANT)], false, true);
    let answer = Arbiter::default().answer(&h.ctx, "Co teď?");
    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::RetrievalFailed });
    assert_eq!(answer.text, COMPLIANT);
}

#[test]
fn grounded_backend_failure_falls_back_to_reasoner() {
    let h = Harness::new(mixed_corpus(), vec![1], vec![Err("503 Service Unavailable"), Ok(COMPLIANT)]);
    let answer = Arbiter::default().answer(&h.ctx, "Co teď?");
    assert_eq!(answer.route, Route::Reasoned { reason: FallbackReason::BackendFailed });
    assert_eq!(answer.text, COMPLIANT);
    assert!(!answer.text.contains("503"));
}

#[test]
fn reasoner_failure_returns_fixed_message() {
    let h = Harness::new(vec![], vec![], vec![Err("connection reset")]);
    let text = Arbiter::default().ask(&h.ctx, "Co teď?");
    assert_eq!(text, "Reasoner dočasně nedostupný.");
    assert_eq!(h.backend.calls(), 1, "no retry");
}

#[test]
fn every_step_failing_at_once_still_returns_text() {
    let h = Harness::with_failures(mixed_corpus(), vec![0], vec![Err("down")], true, true);
    assert_eq!(Arbiter::default().ask(&h.ctx, "Co teď?"), "Reasoner dočasně nedostupný.");
}

#[test]
fn repeated_question_is_embedded_once() {
    let h = Harness::new(mixed_corpus(), vec![1], vec![Ok("a"), Ok("b")]);
    let arbiter = Arbiter::default();
    assert_eq!(arbiter.ask(&h.ctx, "Co teď?"), "a");
    assert_eq!(arbiter.ask(&h.ctx, "Co teď?"), "b");
    assert_eq!(h.embed_calls(), 1);
    assert_eq!(h.search_calls(), 2);
}

#[test]
fn end_to_end_over_a_built_index() {
    let tmp = tempfile::tempdir().unwrap();
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(64));
    IndexWriter::new(embedder.as_ref(), 2).build(&mixed_corpus(), tmp.path()).expect("build");
    let (index, chunks, _manifest) = IndexStore::open(tmp.path()).expect("open").into_parts();

    let backend = Arc::new(ScriptedBackend::new(vec![Ok("Zkreslení přeživšími a rychlejší publikování.")]));
    let ctx = QueryContext {
        embedder: Arc::new(CachedEmbedder::new(embedder, 8)),
        index: Arc::new(index),
        chunks: chunks.into(),
        backend: backend.clone(),
    };
    let answer = Arbiter::default().answer(&ctx, "Proč tvůrci po prvním virálu zrychlí publikování?");

    match &answer.route {
        Route::Grounded { evidence } => {
            let layers: Vec<Layer> = evidence.iter().map(|e| e.chunk.layer).collect();
            assert_eq!(layers, vec![Layer::Meta, Layer::Synth]);
        }
        other => panic!("expected grounded route, got {other:?}"),
    }
    let prompt = backend.prompt(0);
    let meta = prompt.find("[LAYER: meta]").expect("meta label");
    let synth = prompt.find("[LAYER: synth]").expect("synth label");
    assert!(meta < synth);
    assert!(!prompt.contains("[LAYER: raw]"));
}
