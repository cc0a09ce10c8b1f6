//! # edital-core — Preparação de Editais para Treinamento de Modelos de PLN
//!
//! Este crate prepara editais de compras públicas para o treinamento de
//! modelos de linguagem. São dois pipelines independentes:
//!
//! ## Pipeline A — Extração de seções (um documento por vez)
//!
//! 1.  **Termos** ([`terms`]): texto das páginas → sequência de `(termo, página)`.
//! 2.  **Candidatos** ([`candidates`]): termos que parecem numeração (`1.`, `2.3`).
//! 3.  **Validação** ([`validator`]): regras de sequência e a *repescagem*.
//! 4.  **Descrições** ([`description`]): texto entre marcadores consecutivos.
//! 5.  **Agrupamento** ([`grouper`]): hierarquia Seção → Subseção.
//!
//! O orquestrador é o módulo [`extractor`].
//!
//! ## Pipeline B — Conversão das anotações (corpus inteiro)
//!
//! 1.  **JSONL** ([`jsonl`]): carga dos arquivos exportados pela ferramenta de anotação.
//! 2.  **Semelhantes** ([`dedup`]): remoção por índice de Jaccard contra uma base persistida ([`store`]).
//! 3.  **Fatiamento** ([`annotation`]) e **tags BIO** ([`tagger`]).
//! 4.  **CONLL** ([`conll`]) e relatórios ([`stats`]).
//!
//! O orquestrador é o módulo [`pipeline`]; o dataset de sentenças para
//! anotação fica em [`dataset`].
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use edital_core::{extract_edital, tag_sentence, AnnotationSpan};
//! use edital_core::corpus::demo_edital;
//!
//! // Pipeline A
//! let edital = extract_edital(&demo_edital()).unwrap();
//! assert_eq!(edital.sections[0].title, "DO OBJETO");
//!
//! // Conversão de uma sentença anotada
//! let spans = [AnnotationSpan::new(7, 15, "Tempo"), AnnotationSpan::new(0, 3, "Tempo")];
//! let tagged = tag_sentence("14h em 12/09/17 Página 2", &spans, true);
//! assert_eq!(tagged.tokens[0].tag.label(), "B-TEMPO");
//! ```

pub mod annotation;
pub mod candidates;
pub mod config;
pub mod conll;
pub mod corpus;
pub mod dataset;
pub mod dedup;
pub mod description;
pub mod error;
pub mod extractor;
pub mod grouper;
pub mod jsonl;
pub mod pipeline;
pub mod stats;
pub mod store;
pub mod tagger;
pub mod terms;
pub mod tokenizer;
pub mod validator;

pub use annotation::{slice_sentence, AnnotationSpan, Slice};
pub use config::{DatasetConfig, DedupConfig, ExportConfig};
pub use dedup::{DedupScope, DiscardReport, SentenceBase, SentenceDeduplicator};
pub use error::{Error, Result};
pub use extractor::{extract_batch, extract_edital, ExtractedEdital, PagedDocument};
pub use grouper::{Section, Subsection};
pub use jsonl::{AnnotatedLine, AnnotatedRecord};
pub use pipeline::{ConllExport, ExportEvent, ExportSummary};
pub use store::{BaseTask, JsonFileStore, MemoryStore, SentenceBaseStore};
pub use tagger::{tag_sentence, Tag, TaggedSentence, TaggedToken};
pub use tokenizer::Token;
