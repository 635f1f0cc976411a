//! The chatbot pipeline and interactive CLI loop.
//!
//! [`Chatbot`] wires the document store, optional vector searcher,
//! optional remote generator, and the rule-based answerer into one
//! explicitly constructed service — there is no process-wide instance;
//! callers own the object and pass it where needed.
//!
//! The answer path never returns an error: an empty context resolves to
//! a no-information response, and a failed remote generator degrades to
//! the rule-based formatter.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::warn;

use lorekeeper_core::answer::RuleBasedAnswerer;
use lorekeeper_core::context::{assemble, ContextParams};
use lorekeeper_core::filter::filter_hallucinations;
use lorekeeper_core::models::ConversationTurn;
use lorekeeper_core::store::{DocumentStore, VectorSearcher};

use crate::config::Config;
use crate::db;
use crate::entities::EntityIndex;
use crate::generator::{create_generator, Generator};
use crate::sqlite_store::SqliteStore;

/// Suffix appended to answers produced by the rule-based formatter.
const RULE_BASED_TAG: &str = "(Using rule-based response system - No LLM configured)";

/// An answer plus the context it was derived from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    pub context: String,
}

/// The assembled question-answering service.
pub struct Chatbot {
    store: Arc<dyn DocumentStore>,
    vector: Option<Arc<dyn VectorSearcher>>,
    generator: Option<Box<dyn Generator>>,
    answerer: RuleBasedAnswerer,
    entities: EntityIndex,
    params: ContextParams,
}

impl Chatbot {
    /// Assemble a chatbot over an existing store.
    pub async fn new(config: &Config, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let generator = create_generator(&config.generator)?;
        let entities = EntityIndex::build(store.as_ref()).await?;

        if store.count().await? == 0 {
            warn!("document store is empty; run `lore import` to populate it");
        }

        Ok(Self {
            store,
            vector: None,
            generator,
            answerer: RuleBasedAnswerer::new(),
            entities,
            params: ContextParams {
                max_documents: config.retrieval.max_documents,
                max_chars: config.retrieval.max_context_chars,
                context_chars: config.retrieval.excerpt_context_chars,
            },
        })
    }

    /// Assemble a chatbot over the configured SQLite database.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::new(pool));
        Self::new(config, store).await
    }

    /// Attach a vector-similarity backend, consulted before lexical
    /// search and silently bypassed on failure.
    pub fn with_vector_searcher(mut self, vector: Arc<dyn VectorSearcher>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Replace the rule-based answerer (e.g. to pin the no-info
    /// selection in tests).
    pub fn with_answerer(mut self, answerer: RuleBasedAnswerer) -> Self {
        self.answerer = answerer;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn entities(&self) -> &EntityIndex {
        &self.entities
    }

    /// Recompute the derived entity index, e.g. after an import.
    pub async fn rebuild_entities(&mut self) -> Result<()> {
        self.entities = EntityIndex::build(self.store.as_ref()).await?;
        Ok(())
    }

    /// Provider and model labels for diagnostics, `("None", "None")`
    /// when no remote generator is configured.
    pub fn generator_info(&self) -> (String, String) {
        match &self.generator {
            Some(g) => (g.provider().to_string(), g.model().to_string()),
            None => ("None".to_string(), "None".to_string()),
        }
    }

    /// Answer a question. Infallible by design: every internal failure
    /// resolves to one of the defined fallback answers.
    pub async fn process_question(&self, question: &str) -> Answer {
        let context = assemble(
            self.store.as_ref(),
            self.vector.as_deref(),
            question,
            &self.params,
        )
        .await;

        let response = if context.is_empty() {
            self.answerer.no_info_response()
        } else {
            match &self.generator {
                Some(generator) => match generator.generate(question, &context).await {
                    Ok(raw) => format!(
                        "{}\n\n(Generated using {} {})",
                        filter_hallucinations(&raw, &context),
                        generator.provider(),
                        generator.model()
                    ),
                    Err(err) => {
                        warn!(error = %err, provider = generator.provider(),
                              "remote generator failed, falling back to rule-based answer");
                        self.rule_based_answer(question, &context)
                    }
                },
                None => self.rule_based_answer(question, &context),
            }
        };

        Answer { response, context }
    }

    fn rule_based_answer(&self, question: &str, context: &str) -> String {
        format!("{}\n\n{}", self.answerer.answer(question, context), RULE_BASED_TAG)
    }
}

/// A single caller's conversation: the chatbot plus an append-only
/// history of turns. Owned by the CLI loop; the HTTP server answers
/// statelessly instead.
pub struct ChatSession {
    chatbot: Chatbot,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(chatbot: Chatbot) -> Self {
        Self {
            chatbot,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Answer a question and record the turn.
    pub async fn ask(&mut self, question: &str) -> String {
        let answer = self.chatbot.process_question(question).await;
        self.history
            .push(ConversationTurn::new(question, &answer.response, &answer.context));
        answer.response
    }
}

/// One-shot question from the command line.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let chatbot = Chatbot::from_config(config).await?;
    let answer = chatbot.process_question(question).await;
    println!("{}", answer.response);
    Ok(())
}

/// Interactive chat loop on stdin/stdout.
pub async fn run_chat(config: &Config) -> Result<()> {
    let chatbot = Chatbot::from_config(config).await?;

    let doc_count = chatbot.store().count().await?;
    if doc_count == 0 {
        println!("WARNING: The document store is empty. Run `lore import <path>` first.");
    } else {
        println!("Connected to a store with {doc_count} wiki pages");
    }
    let (provider, model) = chatbot.generator_info();
    if provider != "None" {
        println!("Generator: {provider} model {model}");
    } else {
        println!("No LLM configured. Using rule-based responses.");
    }

    let mut session = ChatSession::new(chatbot);

    println!();
    println!("{}", "=".repeat(60));
    println!("Welcome to the Game of Thrones Chatbot!");
    println!("Ask me anything about Game of Thrones, or type 'exit' to quit.");
    println!("{}", "=".repeat(60));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("\nYou: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            break;
        }

        println!("\nThinking...");
        let response = session.ask(question).await;
        println!("\nChatbot: {response}");
    }

    println!("\nFarewell! The night is dark and full of terrors...");
    Ok(())
}
