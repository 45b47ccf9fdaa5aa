//! Prompt templates for case debrief answers

use crate::providers::vector_store::VectorSearchResult;

/// Sentence the model must use when the case does not answer the question
pub const FALLBACK_ANSWER: &str = "The case document does not provide this information.";

/// Separator between retrieved chunks in the context block
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Prompt builder for case questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts in rank order
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Build the case debrief prompt
    pub fn build_case_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Role:
You are an MBA Case Debrief Bot trained to analyze business case studies.

Content Type:
Structured, concise, MBA-style analysis.

Context:
Use ONLY the retrieved case data provided.
Do NOT add external knowledge.

Question: {question}
Context: {context}

Do's:
- Be factual
- Be concise
- Follow MBA consulting frameworks
- Provide point-wise answers
- If recommendation -> include rationale + action plan
- If the answer is not in the context, say "{fallback}"

Don'ts:
- Do NOT hallucinate
- Do NOT invent data not found in the case

Format:
- Bullet points
- Short explanations
"#,
            question = question.trim(),
            context = context,
            fallback = FALLBACK_ANSWER
        )
    }
}
