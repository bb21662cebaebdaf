use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::chunker::Chunker;
use crate::error::{NllbError, Result};
use crate::language::LanguageTable;
use super::{DecodeOptions, OracleRequest, Tokenizer, TranslationOracle};

/// Separator placed between translated chunks
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Target language token, resolved once and reused for every chunk of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDirective {
    /// Model language identifier, e.g. `rus_Cyrl`
    pub language: String,
    pub token: String,
    pub id: u32,
}

/// Resolve a destination language code to the token the oracle is steered with.
///
/// Short codes go through the language table first. The tokenizer's explicit
/// language mapping wins over a plain vocabulary lookup; a miss, or a hit on
/// the unknown-token sentinel, is fatal.
pub fn resolve_directive(
    tokenizer: &dyn Tokenizer,
    languages: &LanguageTable,
    code: &str,
) -> Result<TargetDirective> {
    let language = languages.resolve(code);

    let id = tokenizer
        .language_token_id(&language)
        .or_else(|| tokenizer.token_to_id(&language));

    let id = match id {
        Some(id) if Some(id) != tokenizer.unk_token_id() => id,
        _ => return Err(NllbError::MissingLanguageToken(language)),
    };

    let token = tokenizer
        .id_to_token(id)
        .ok_or_else(|| NllbError::MissingLanguageToken(language.clone()))?;

    debug!("Resolved target language {} -> {} (id {})", code, token, id);

    Ok(TargetDirective { language, token, id })
}

/// One leg of a translation: the tokenizer framing the source side and the target directive
pub struct Hop<'a> {
    pub tokenizer: &'a dyn Tokenizer,
    pub directive: TargetDirective,
}

/// Feeds chunks through the oracle one at a time, in order
pub struct TranslationDriver<'a> {
    oracle: &'a dyn TranslationOracle,
    chunker: Chunker,
    options: DecodeOptions,
    progress: ProgressBar,
}

impl<'a> TranslationDriver<'a> {
    pub fn new(oracle: &'a dyn TranslationOracle, chunker: Chunker, options: DecodeOptions) -> Self {
        Self {
            oracle,
            chunker,
            options,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report translated chunks on the given progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Translate a single chunk, stripping an echoed directive token
    pub async fn translate_chunk(
        &self,
        chunk: &str,
        tokenizer: &dyn Tokenizer,
        directive: &TargetDirective,
    ) -> Result<String> {
        let source = tokenizer.encode(chunk)?;

        let request = OracleRequest {
            source,
            target_prefix: vec![directive.token.clone()],
            options: self.options,
        };

        let mut hypothesis = self.oracle.translate(request).await?;
        if hypothesis.first() == Some(&directive.token) {
            hypothesis.remove(0);
        }

        let text = tokenizer.decode(&hypothesis)?;
        Ok(text.trim().to_string())
    }

    /// Translate chunks strictly in order; the first failure aborts the whole batch
    pub async fn translate_chunks(
        &self,
        chunks: &[String],
        tokenizer: &dyn Tokenizer,
        directive: &TargetDirective,
    ) -> Result<Vec<String>> {
        self.progress.set_length(chunks.len() as u64);
        self.progress.set_position(0);

        let mut translated = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(
                "Translating chunk {}/{} ({} chars) to {}",
                idx + 1,
                chunks.len(),
                chunk.chars().count(),
                directive.language
            );

            translated.push(self.translate_chunk(chunk, tokenizer, directive).await?);
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        Ok(translated)
    }

    /// Chunk a document, translate every chunk and stitch the result back together
    pub async fn translate_document(
        &self,
        text: &str,
        tokenizer: &dyn Tokenizer,
        directive: &TargetDirective,
    ) -> Result<String> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Ok(String::new());
        }

        info!(
            "Translating {} chunks (max {} chars) to {}",
            chunks.len(),
            self.chunker.max_chars(),
            directive.language
        );

        let translated = self.translate_chunks(&chunks, tokenizer, directive).await?;
        Ok(assemble(&translated))
    }

    /// Run the document through each hop in turn, re-chunking intermediate output
    pub async fn translate_via(&self, text: &str, hops: &[Hop<'_>]) -> Result<String> {
        let mut current = text.to_string();

        for hop in hops {
            current = self
                .translate_document(&current, hop.tokenizer, &hop.directive)
                .await?;
        }

        Ok(current)
    }
}

/// Join translated chunks with blank lines and trim the result
pub fn assemble(translated: &[String]) -> String {
    translated.join(CHUNK_SEPARATOR).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{MockTokenizer, MockTranslationOracle};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Whitespace tokenizer over a fixed language token table
    #[derive(Clone)]
    struct StubTokenizer {
        languages: HashMap<String, u32>,
        vocab: HashMap<String, u32>,
    }

    impl StubTokenizer {
        fn new() -> Self {
            let languages = [("eng_Latn", 10), ("rus_Cyrl", 11), ("heb_Hebr", 12)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            let vocab = [("<unk>", 0), ("deu_Latn", 13)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            Self { languages, vocab }
        }

        fn all_tokens(&self) -> impl Iterator<Item = (&String, &u32)> {
            self.languages.iter().chain(self.vocab.iter())
        }
    }

    impl Tokenizer for StubTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<String>> {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }

        fn decode(&self, tokens: &[String]) -> Result<String> {
            Ok(tokens.join(" "))
        }

        fn language_token_id(&self, language: &str) -> Option<u32> {
            self.languages.get(language).copied()
        }

        fn token_to_id(&self, token: &str) -> Option<u32> {
            self.vocab.get(token).copied()
        }

        fn id_to_token(&self, id: u32) -> Option<String> {
            self.all_tokens()
                .find(|(_, v)| **v == id)
                .map(|(k, _)| k.clone())
        }

        fn unk_token_id(&self) -> Option<u32> {
            Some(0)
        }

        fn for_source(&self, _language: &str) -> Box<dyn Tokenizer> {
            Box::new(self.clone())
        }
    }

    /// Appends `_t` to every word and echoes the forced prefix
    struct SuffixOracle {
        calls: Mutex<Vec<OracleRequest>>,
    }

    impl SuffixOracle {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TranslationOracle for SuffixOracle {
        async fn translate(&self, request: OracleRequest) -> Result<Vec<String>> {
            let mut output = request.target_prefix.clone();
            output.extend(request.source.iter().map(|t| format!("{}_t", t)));
            self.calls.lock().unwrap().push(request);
            Ok(output)
        }
    }

    /// Fails on the n-th call (zero based)
    struct FailingOracle {
        fail_at: usize,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl TranslationOracle for FailingOracle {
        async fn translate(&self, request: OracleRequest) -> Result<Vec<String>> {
            let mut calls = self.calls.lock().unwrap();
            let current = *calls;
            *calls += 1;
            if current == self.fail_at {
                return Err(NllbError::Oracle("device lost".to_string()));
            }
            Ok(request.source)
        }
    }

    fn rus_directive() -> TargetDirective {
        TargetDirective {
            language: "rus_Cyrl".to_string(),
            token: "rus_Cyrl".to_string(),
            id: 11,
        }
    }

    #[test]
    fn test_resolve_directive_through_language_table() {
        let tokenizer = StubTokenizer::new();
        let directive = resolve_directive(&tokenizer, &LanguageTable::new(), "ru").unwrap();
        assert_eq!(directive, rus_directive());
    }

    #[test]
    fn test_resolve_directive_passes_unknown_codes_through() {
        let tokenizer = StubTokenizer::new();
        let directive = resolve_directive(&tokenizer, &LanguageTable::new(), "heb_Hebr").unwrap();
        assert_eq!(directive.id, 12);
    }

    #[test]
    fn test_resolve_directive_falls_back_to_vocabulary() {
        let tokenizer = StubTokenizer::new();
        let directive = resolve_directive(&tokenizer, &LanguageTable::new(), "de").unwrap();
        assert_eq!(directive.token, "deu_Latn");
        assert_eq!(directive.id, 13);
    }

    #[test]
    fn test_resolve_directive_rejects_missing_language() {
        let tokenizer = StubTokenizer::new();
        let err = resolve_directive(&tokenizer, &LanguageTable::new(), "fr").unwrap_err();
        assert!(matches!(err, NllbError::MissingLanguageToken(ref lang) if lang == "fra_Latn"));
    }

    #[test]
    fn test_resolve_directive_rejects_unknown_sentinel() {
        let mut tokenizer = MockTokenizer::new();
        tokenizer.expect_language_token_id().returning(|_| None);
        tokenizer.expect_token_to_id().returning(|_| Some(3));
        tokenizer.expect_unk_token_id().returning(|| Some(3));
        tokenizer.expect_id_to_token().never();

        let err = resolve_directive(&tokenizer, &LanguageTable::new(), "xx").unwrap_err();
        assert!(matches!(err, NllbError::MissingLanguageToken(_)));
    }

    #[tokio::test]
    async fn test_chunks_come_back_in_order() {
        let tokenizer = StubTokenizer::new();
        let oracle = SuffixOracle::new();
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let chunks = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let translated = driver
            .translate_chunks(&chunks, &tokenizer, &rus_directive())
            .await
            .unwrap();

        assert_eq!(translated, vec!["A_t", "B_t", "C_t"]);
        assert_eq!(assemble(&translated), "A_t\n\nB_t\n\nC_t");
    }

    #[tokio::test]
    async fn test_echoed_directive_is_stripped() {
        let tokenizer = StubTokenizer::new();
        let oracle = SuffixOracle::new();
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());
        let directive = rus_directive();

        let output = driver
            .translate_chunk("hello world", &tokenizer, &directive)
            .await
            .unwrap();

        assert_eq!(output, "hello_t world_t");
        assert!(!output.contains(&directive.token));
    }

    #[tokio::test]
    async fn test_request_carries_prefix_and_options() {
        let tokenizer = StubTokenizer::new();
        let oracle = SuffixOracle::new();
        let options = DecodeOptions {
            beam_size: 2,
            max_decoding_length: 512,
        };
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), options);

        driver
            .translate_chunk("one two", &tokenizer, &rus_directive())
            .await
            .unwrap();

        let calls = oracle.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source, vec!["one", "two"]);
        assert_eq!(calls[0].target_prefix, vec!["rus_Cyrl"]);
        assert_eq!(calls[0].options, options);
    }

    #[tokio::test]
    async fn test_hypothesis_without_echo_is_kept_whole() {
        let tokenizer = StubTokenizer::new();
        let mut oracle = MockTranslationOracle::new();
        oracle
            .expect_translate()
            .times(1)
            .returning(|_| Ok(vec!["  privet".to_string(), "mir ".to_string()]));
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let output = driver
            .translate_chunk("hello world", &tokenizer, &rus_directive())
            .await
            .unwrap();

        assert_eq!(output, "privet mir");
    }

    #[tokio::test]
    async fn test_document_paragraphs_are_preserved() {
        let tokenizer = StubTokenizer::new();
        let oracle = SuffixOracle::new();
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let output = driver
            .translate_document(
                "Hello world. This is a test.\n\nSecond paragraph.",
                &tokenizer,
                &rus_directive(),
            )
            .await
            .unwrap();

        assert_eq!(
            output,
            "Hello_t world._t This_t is_t a_t test._t\n\nSecond_t paragraph._t"
        );
        assert_eq!(oracle.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_document_never_calls_oracle() {
        let tokenizer = StubTokenizer::new();
        let mut oracle = MockTranslationOracle::new();
        oracle.expect_translate().never();
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let output = driver
            .translate_document(" \n\n \t ", &tokenizer, &rus_directive())
            .await
            .unwrap();

        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_chunks() {
        let tokenizer = StubTokenizer::new();
        let oracle = FailingOracle {
            fail_at: 1,
            calls: Mutex::new(0),
        };
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let chunks = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = driver
            .translate_chunks(&chunks, &tokenizer, &rus_directive())
            .await
            .unwrap_err();

        assert!(matches!(err, NllbError::Oracle(_)));
        assert_eq!(*oracle.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_encode_failure_skips_oracle() {
        let mut tokenizer = MockTokenizer::new();
        tokenizer
            .expect_encode()
            .returning(|_| Err(NllbError::Tokenize("bad input".to_string())));
        let mut oracle = MockTranslationOracle::new();
        oracle.expect_translate().never();
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let err = driver
            .translate_document("Some text.", &tokenizer, &rus_directive())
            .await
            .unwrap_err();

        assert!(matches!(err, NllbError::Tokenize(_)));
    }

    #[tokio::test]
    async fn test_translate_via_runs_hops_in_order() {
        let tokenizer = StubTokenizer::new();
        let oracle = SuffixOracle::new();
        let driver = TranslationDriver::new(&oracle, Chunker::new(1000), DecodeOptions::default());

        let hops = vec![
            Hop {
                tokenizer: &tokenizer,
                directive: resolve_directive(&tokenizer, &LanguageTable::new(), "en").unwrap(),
            },
            Hop {
                tokenizer: &tokenizer,
                directive: rus_directive(),
            },
        ];

        let output = driver.translate_via("shalom\n\nolam", &hops).await.unwrap();
        assert_eq!(output, "shalom_t_t\n\nolam_t_t");

        let calls = oracle.calls.lock().unwrap();
        let prefixes: Vec<&str> = calls.iter().map(|c| c.target_prefix[0].as_str()).collect();
        assert_eq!(prefixes, vec!["eng_Latn", "eng_Latn", "rus_Cyrl", "rus_Cyrl"]);
    }
}
