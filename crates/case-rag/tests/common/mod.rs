//! Shared fakes and fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use case_rag::config::{RagConfig, VectorStoreConfig};
use case_rag::generation::FALLBACK_ANSWER;
use case_rag::providers::{EmbeddingProvider, LlmProvider, LocalVectorStore};
use case_rag::{CaseEngine, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

const DIMS: usize = 64;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "did", "do", "does", "for", "how", "in", "is", "it", "of",
    "on", "or", "the", "to", "was", "were", "what", "which", "who", "with",
];

/// Lowercase content words of a text
pub fn content_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 2 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Deterministic embedder: hashed bag of content words
pub struct BagOfWordsEmbedder {
    pub calls: Arc<AtomicUsize>,
    model: String,
}

impl BagOfWordsEmbedder {
    pub fn new(model: &str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            model: model.to_string(),
        }
    }
}

fn bucket(word: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIMS as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.0f32; DIMS];
        for word in content_words(text) {
            v[bucket(&word)] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "bag-of-words"
    }
}

/// Generator that quotes the context sentence sharing the most words with the
/// question, or the fallback sentence when nothing overlaps
pub struct ExtractiveGenerator {
    pub calls: Arc<AtomicUsize>,
    pub last_prompt: Arc<parking_lot::Mutex<Option<String>>>,
}

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(parking_lot::Mutex::new(None)),
        }
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    prompt
        .split_once(start)
        .map(|(_, rest)| rest.split_once(end).map_or(rest, |(body, _)| body))
        .unwrap_or("")
}

#[async_trait]
impl LlmProvider for ExtractiveGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = Some(prompt.to_string());

        let question = content_words(section(prompt, "\nQuestion: ", "\n"));
        let context = section(prompt, "\nContext: ", "\n\nDo's:");

        let best = context
            .split(|c: char| c == '\n' || c == '.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|sentence| {
                let words = content_words(sentence);
                let score = question.iter().filter(|q| words.contains(q)).count();
                (score, sentence)
            })
            .max_by_key(|(score, _)| *score);

        Ok(match best {
            Some((score, sentence)) if score > 0 => format!("- {}", sentence),
            _ => FALLBACK_ANSWER.to_string(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "extractive"
    }

    fn model(&self) -> String {
        "extractive-test".to_string()
    }
}

/// Engine over the fakes and a store in a temp dir
pub struct Harness {
    pub engine: CaseEngine,
    pub store: Arc<LocalVectorStore>,
    pub embed_calls: Arc<AtomicUsize>,
    pub generate_calls: Arc<AtomicUsize>,
    pub last_prompt: Arc<parking_lot::Mutex<Option<String>>>,
    pub config: RagConfig,
    pub dir: Arc<TempDir>,
}

impl Harness {
    pub fn new() -> Self {
        Self::in_dir(Arc::new(TempDir::new().unwrap()))
    }

    /// Fresh engine over the same upload and store directories
    pub fn reopen(other: &Harness) -> Self {
        Self::in_dir(other.dir.clone())
    }

    fn in_dir(dir: Arc<TempDir>) -> Self {
        let config = temp_config(&dir);

        let embedder = BagOfWordsEmbedder::new("bag-of-words-v1");
        let generator = ExtractiveGenerator::new();
        let embed_calls = embedder.calls.clone();
        let generate_calls = generator.calls.clone();
        let last_prompt = generator.last_prompt.clone();
        let store = Arc::new(LocalVectorStore::from_config(&config.vector_store).unwrap());

        let engine = CaseEngine::new(&config, Arc::new(embedder), store.clone(), Arc::new(generator));

        Self {
            engine,
            store,
            embed_calls,
            generate_calls,
            last_prompt,
            config,
            dir,
        }
    }
}

/// Engine over the fakes using the directories in `config`
pub fn fake_engine(config: &RagConfig) -> CaseEngine {
    let store = LocalVectorStore::from_config(&config.vector_store).unwrap();
    CaseEngine::new(
        config,
        Arc::new(BagOfWordsEmbedder::new("bag-of-words-v1")),
        Arc::new(store),
        Arc::new(ExtractiveGenerator::new()),
    )
}

/// Config rooted in a temp dir
pub fn temp_config(dir: &TempDir) -> RagConfig {
    let mut config = RagConfig::default();
    config.upload.upload_dir = dir.path().join("CaseUploads");
    config.vector_store = VectorStoreConfig {
        store_dir: dir.path().join("chroma_db"),
        lock_timeout_secs: 2,
    };
    config
}

/// Build a PDF with one text line per entry, one page per slice
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![50.into(), (750 - 20 * i as i64).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Three-page case about Acme's third quarter
pub fn acme_case() -> Vec<u8> {
    pdf_with_pages(&[
        &["Acme Corp is a mid-sized retailer based in Ohio."],
        &["In Q3 2023 revenue grew 12% year over year."],
        &["The board is considering expansion into Canada."],
    ])
}

/// Unrelated case about an airline
pub fn beta_case() -> Vec<u8> {
    pdf_with_pages(&[
        &["Beta Airlines cut fuel costs by 8% in 2022."],
        &["Its pilots union signed a new contract."],
    ])
}
