// Prompt module
// Builds the generation prompt from retrieved documents and the user's question


use crate::dataset::Document;

const CONTEXT_PREFIX: &str = "Context: ";
const QUESTION_PREFIX: &str = "Answer the following question: ";

/// Renders the fixed two-part prompt.
///
/// Only document descriptions are included, one per line, in retrieval order.
/// The query is inserted verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    #[inline]
    pub fn assemble(&self, query: &str, documents: &[Document]) -> String {
        let context = documents
            .iter()
            .map(|d| d.description.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = String::with_capacity(
            CONTEXT_PREFIX.len() + context.len() + 1 + QUESTION_PREFIX.len() + query.len(),
        );
        prompt.push_str(CONTEXT_PREFIX);
        prompt.push_str(&context);
        prompt.push('\n');
        prompt.push_str(QUESTION_PREFIX);
        prompt.push_str(query);
        prompt
    }
}
