//! Case engine: load a PDF, build its index, answer questions against it

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{sanitize_filename, PdfLoader, TextChunker, UploadStore};
use crate::providers::{
    EmbeddingProvider, GeminiClient, LlmProvider, LocalVectorStore, OllamaEmbedder,
    VectorStoreProvider,
};
use crate::types::{Answer, Document, IndexHandle, PageRecord, SourceRef};

/// Result of ingesting one upload
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Stored document, with its page count filled in
    pub document: Document,
    /// Pages extracted
    pub pages: usize,
    /// Index built from the document
    pub index: IndexHandle,
}

/// Ties the loader, chunker, embedder, store and model together.
///
/// Every document gets its own collection, so building one index never
/// changes what another document's questions retrieve.
pub struct CaseEngine {
    loader: PdfLoader,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl CaseEngine {
    /// Create an engine over explicit providers
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            loader: PdfLoader::new(),
            chunker: TextChunker::from_config(&config.chunking),
            embedder,
            store,
            llm,
            top_k: config.retrieval.top_k,
        }
    }

    /// Create an engine with Ollama embeddings, the local store and Gemini
    pub fn from_config(config: &RagConfig, api_key: impl Into<String>) -> Result<Self> {
        let embedder = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        let store = Arc::new(LocalVectorStore::from_config(&config.vector_store)?);
        let llm = Arc::new(GeminiClient::new(&config.generation, api_key)?);

        tracing::info!(
            "Engine ready: embeddings={} ({}), generation={} ({}), store={}",
            embedder.name(),
            embedder.model(),
            llm.name(),
            llm.model(),
            store.name()
        );

        Ok(Self::new(config, embedder, store, llm))
    }

    /// Embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Vector store provider
    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Generation provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Chunks retrieved per question
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Load a PDF from disk into page records
    pub async fn load_pdf(&self, path: &Path) -> Result<Vec<PageRecord>> {
        let loader = self.loader.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    /// Chunk, embed and store a document's pages.
    ///
    /// The document's collection is replaced only after every chunk has been
    /// embedded, so a failed build leaves the previous index in place.
    pub async fn build_index(&self, document: &Document, pages: &[PageRecord]) -> Result<IndexHandle> {
        let start = Instant::now();
        let collection = document.collection_name();

        let mut chunks = self.chunker.chunk_pages(document.id, pages);
        if chunks.is_empty() {
            return Err(Error::load(&document.filename, "No extractable text to index"));
        }
        tracing::info!("Created {} chunks from {}", chunks.len(), document.filename);

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let embed_model = self.embedder.model();
        let chunk_count = self
            .store
            .replace_collection(&collection, &embed_model, &chunks)
            .await?;

        tracing::info!(
            "Indexed {} into {} ({} chunks) in {:?}",
            document.filename,
            collection,
            chunk_count,
            start.elapsed()
        );

        Ok(IndexHandle {
            collection,
            document_id: document.id,
            filename: document.filename.clone(),
            chunk_count,
            embed_model,
        })
    }

    /// Reopen the index previously built for a document
    pub async fn open_index(&self, document: &Document) -> Result<IndexHandle> {
        let collection = document.collection_name();
        let chunk_count = self.store.count(&collection).await?;
        if chunk_count == 0 {
            return Err(Error::NotIndexed(format!(
                "{} has not been indexed yet",
                document.filename
            )));
        }

        Ok(IndexHandle {
            collection,
            document_id: document.id,
            filename: document.filename.clone(),
            chunk_count,
            embed_model: self.embedder.model(),
        })
    }

    /// Answer a question from the indexed document.
    ///
    /// A blank question is rejected before any provider is called. The model
    /// output is returned verbatim.
    pub async fn answer(&self, index: &IndexHandle, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let embed_model = self.embedder.model();
        if index.embed_model != embed_model {
            return Err(Error::embedding(format!(
                "{} was indexed with {} but the current embedder is {}; rebuild the index",
                index.filename, index.embed_model, embed_model
            )));
        }

        if self.store.count(&index.collection).await? == 0 {
            return Err(Error::NotIndexed(format!(
                "{} has no stored chunks",
                index.filename
            )));
        }

        let start = Instant::now();
        let query_embedding = self.embedder.embed(question).await?;
        let results = self
            .store
            .search(&index.collection, &embed_model, &query_embedding, self.top_k)
            .await?;
        tracing::debug!("Retrieved {} chunks from {}", results.len(), index.collection);

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_case_prompt(question, &context);
        let text = self.llm.generate(&prompt).await?;

        tracing::info!("Answered question against {} in {:?}", index.collection, start.elapsed());

        Ok(Answer {
            text,
            sources: results
                .iter()
                .map(|r| SourceRef::from_chunk(&r.chunk, r.similarity))
                .collect(),
        })
    }

    /// Load, store and index an uploaded PDF.
    ///
    /// The bytes are parsed before anything is written, so an unreadable
    /// upload leaves neither a file nor a collection behind.
    pub async fn ingest(&self, uploads: &UploadStore, raw_name: &str, data: Vec<u8>) -> Result<IngestReport> {
        let filename = sanitize_filename(raw_name)?;
        let dest = uploads.dir().join(&filename);

        let loader = self.loader.clone();
        let (pages, data) = tokio::task::spawn_blocking(move || {
            loader.load_bytes(&dest, &data).map(|pages| (pages, data))
        })
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        let mut document = uploads.save(&filename, &data)?;
        document.total_pages = Some(pages.len() as u32);

        let index = self.build_index(&document, &pages).await?;

        Ok(IngestReport {
            document,
            pages: pages.len(),
            index,
        })
    }
}
