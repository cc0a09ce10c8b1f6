//! # Remoção de Sentenças Semelhantes
//!
//! Editais repetem cláusulas quase idênticas ("O prazo de entrega é de 10
//! dias" / "O prazo de entrega é de 15 dias"). Para o corpus de treino, uma
//! cópia basta. Cada sentença é comparada, pelo **índice de Jaccard** entre
//! seus conjuntos de tokens normalizados, com uma *base* de sentenças já
//! aceitas:
//!
//! ```text
//! J(A, B) = |A ∩ B| / |A ∪ B|
//! ```
//!
//! Se alguma entrada da base passar do limiar a sentença é descartada; senão
//! ela entra na saída e na base.
//!
//! ## Escopo
//! - [`DedupScope::Global`]: uma única base para todos os documentos, que pode
//!   ser carregada de execuções anteriores e é salva ao final.
//! - [`DedupScope::PerDocument`]: a base recomeça vazia a cada documento.
//!
//! O algoritmo é guloso e depende da ordem: documentos em ordem de nome
//! (`BTreeMap`), sentenças na ordem do documento, e vence a **primeira**
//! entrada da base acima do limiar, não a mais parecida.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::config::DedupConfig;
use crate::error::{Error, Result};
use crate::jsonl::AnnotatedLine;
use crate::store::SentenceBaseStore;

/// Limiar padrão de similaridade.
pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// Conjunto de tokens normalizados de uma sentença.
pub type TokenSet = BTreeSet<String>;

/// Normaliza uma sentença: decomposição NFKD, remoção de tudo que não é
/// ASCII (acentos, cedilhas), minúsculas e divisão por espaços.
///
/// ```
/// use edital_core::dedup::normalize_tokens;
///
/// let tokens = normalize_tokens("Licitação  LICITACAO pública");
/// assert_eq!(tokens.len(), 2);
/// assert!(tokens.contains("licitacao"));
/// ```
pub fn normalize_tokens(text: &str) -> TokenSet {
    let folded: String = text.nfkd().filter(char::is_ascii).collect();
    folded
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Índice de Jaccard entre dois conjuntos. União vazia vale `0.0`.
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Uma sentença aceita na base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceBaseEntry {
    pub origin_document_id: String,
    pub raw_text: String,
    pub normalized_token_set: TokenSet,
}

/// Base de sentenças, em ordem de inserção. Só cresce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentenceBase {
    entries: Vec<SentenceBaseEntry>,
}

impl SentenceBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SentenceBaseEntry] {
        &self.entries
    }

    /// Primeira entrada (em ordem de inserção) com similaridade acima de `threshold`.
    pub fn first_similar(&self, tokens: &TokenSet, threshold: f64) -> Option<(&SentenceBaseEntry, f64)> {
        self.entries.iter().find_map(|entry| {
            let similarity = jaccard(&entry.normalized_token_set, tokens);
            (similarity > threshold).then_some((entry, similarity))
        })
    }

    pub fn push(&mut self, entry: SentenceBaseEntry) {
        self.entries.push(entry);
    }
}

/// Escopo da comparação entre sentenças.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    #[default]
    Global,
    PerDocument,
}

/// Formas de sentença aceitas pelo deduplicador.
///
/// Implementado para `String` (sentença pura, dataset de anotação) e para
/// [`AnnotatedLine`] (linha anotada, conversão para CONLL), em que o texto
/// comparado é o campo `data`.
pub trait DedupItem {
    fn sentence_text(&self) -> &str;
}

impl DedupItem for String {
    fn sentence_text(&self) -> &str {
        self
    }
}

impl DedupItem for AnnotatedLine {
    fn sentence_text(&self) -> &str {
        &self.record.data
    }
}

/// Uma sentença descartada e a entrada da base que a derrubou.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscardedSentence {
    pub sentence: String,
    pub token_set: TokenSet,
    pub similarity: f64,
    pub matched: SentenceBaseEntry,
}

/// Descartes de um documento.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDiscards {
    pub document_id: String,
    /// Total de sentenças recebidas, vazias incluídas.
    pub total: usize,
    pub discarded: Vec<DiscardedSentence>,
}

/// Relatório de uma execução do deduplicador.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscardReport {
    pub documents: Vec<DocumentDiscards>,
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn render_set(set: &TokenSet) -> String {
    let items: Vec<String> = set.iter().map(|t| format!("'{t}'")).collect();
    format!("{{{}}}", items.join(", "))
}

impl DiscardReport {
    pub fn total_sentences(&self) -> usize {
        self.documents.iter().map(|d| d.total).sum()
    }

    pub fn total_discarded(&self) -> usize {
        self.documents.iter().map(|d| d.discarded.len()).sum()
    }

    /// Texto do arquivo `detalhamento_sentencas_descartadas.txt`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for doc in &self.documents {
            let discarded = doc.discarded.len();
            let _ = write!(
                out,
                "# Documento: {} - Qtd. sentenças descartadas/Qtd. sentenças: {}/{} ({:.2}%)\n\n",
                doc.document_id,
                discarded,
                doc.total,
                percent(discarded, doc.total)
            );
            for d in &doc.discarded {
                let _ = writeln!(out, "   Sentença descartada...............: {}", d.sentence);
                let _ = writeln!(out, "   Set sent. descartada..............: {}", render_set(&d.token_set));
                let _ = writeln!(out, "   Índice de Jaccard.................: {}", d.similarity);
                let _ = writeln!(out, "   > Dados da sentença base semelhante");
                let _ = writeln!(out, "                - Nome do documento..: {}", d.matched.origin_document_id);
                let _ = writeln!(out, "                - Sentença base......: {}", d.matched.raw_text);
                let _ = writeln!(
                    out,
                    "                - Set sent. base.....: {}\n",
                    render_set(&d.matched.normalized_token_set)
                );
            }
            out.push_str("\n\n");
        }
        out
    }
}

/// Documentos filtrados e o relatório dos descartes.
#[derive(Debug, Clone)]
pub struct DedupOutcome<T> {
    pub documents: BTreeMap<String, Vec<T>>,
    pub report: DiscardReport,
}

/// Filtro de sentenças semelhantes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceDeduplicator {
    threshold: f64,
    scope: DedupScope,
}

impl SentenceDeduplicator {
    pub fn new(threshold: f64, scope: DedupScope) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidThreshold(threshold));
        }
        Ok(Self { threshold, scope })
    }

    pub fn from_config(config: &DedupConfig) -> Result<Self> {
        Self::new(config.threshold, config.scope)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn scope(&self) -> DedupScope {
        self.scope
    }

    /// Filtra os documentos contra `base`.
    ///
    /// No escopo global `base` é lida e ampliada; no escopo por documento
    /// cada documento usa uma base própria e `base` não é tocada.
    /// Sentenças vazias são removidas sem entrar no relatório.
    pub fn filter<T: DedupItem>(
        &self,
        documents: BTreeMap<String, Vec<T>>,
        base: &mut SentenceBase,
    ) -> DedupOutcome<T> {
        let mut kept_documents = BTreeMap::new();
        let mut report = DiscardReport::default();

        for (document_id, sentences) in documents {
            let mut local = SentenceBase::new();
            let current: &mut SentenceBase = match self.scope {
                DedupScope::Global => &mut *base,
                DedupScope::PerDocument => &mut local,
            };

            let mut discards = DocumentDiscards {
                document_id: document_id.clone(),
                total: sentences.len(),
                discarded: Vec::new(),
            };
            let mut kept = Vec::with_capacity(sentences.len());

            for item in sentences {
                let text = item.sentence_text();
                if text.is_empty() {
                    continue;
                }
                let tokens = normalize_tokens(text);

                match current.first_similar(&tokens, self.threshold) {
                    Some((matched, similarity)) => discards.discarded.push(DiscardedSentence {
                        sentence: text.to_string(),
                        token_set: tokens,
                        similarity,
                        matched: matched.clone(),
                    }),
                    None => {
                        current.push(SentenceBaseEntry {
                            origin_document_id: document_id.clone(),
                            raw_text: text.to_string(),
                            normalized_token_set: tokens,
                        });
                        kept.push(item);
                    }
                }
            }

            info!(
                document = %document_id,
                discarded = discards.discarded.len(),
                total = discards.total,
                "sentenças semelhantes removidas"
            );
            report.documents.push(discards);
            kept_documents.insert(document_id, kept);
        }

        DedupOutcome {
            documents: kept_documents,
            report,
        }
    }

    /// Executa o filtro com a base persistida em `store`.
    ///
    /// No escopo global a base é carregada (exceto ao reprocessar) e salva ao
    /// final. No escopo por documento o `store` não é usado.
    pub fn run<T, S>(
        &self,
        documents: BTreeMap<String, Vec<T>>,
        store: &S,
        reprocess: bool,
    ) -> Result<DedupOutcome<T>>
    where
        T: DedupItem,
        S: SentenceBaseStore + ?Sized,
    {
        let global = self.scope == DedupScope::Global;
        let mut base = if global && !reprocess {
            store.load()?
        } else {
            SentenceBase::new()
        };

        let outcome = self.filter(documents, &mut base);

        let total = outcome.report.total_sentences();
        let discarded = outcome.report.total_discarded();
        info!(
            total,
            kept = total - discarded,
            discarded,
            threshold = self.threshold,
            "resultado da remoção de sentenças semelhantes"
        );

        if global {
            store.save(&base)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn docs(items: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        items
            .iter()
            .map(|(id, sents)| (id.to_string(), sents.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn global() -> SentenceDeduplicator {
        SentenceDeduplicator::new(DEFAULT_THRESHOLD, DedupScope::Global).expect("limiar válido")
    }

    #[test]
    fn test_normalize_folds_accents_and_case() {
        let tokens = normalize_tokens("O Índice de REAJUSTE não foi o maior de 2021");
        let expected: TokenSet = ["o", "indice", "de", "reajuste", "nao", "foi", "maior", "2021"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_jaccard_values() {
        let a = normalize_tokens("a b c d");
        let b = normalize_tokens("a b c e");
        assert!((jaccard(&a, &b) - 3.0 / 5.0).abs() < 1e-12);
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&TokenSet::new(), &TokenSet::new()), 0.0);
    }

    #[test]
    fn test_accented_duplicate_discarded_globally() {
        let outcome = global().filter(
            docs(&[
                ("a.pdf", &["O prazo de entrega é de dez dias úteis"]),
                ("b.pdf", &["o prazo de entrega e de dez dias uteis", "Outra cláusula qualquer"]),
            ]),
            &mut SentenceBase::new(),
        );
        assert_eq!(outcome.documents["a.pdf"].len(), 1);
        assert_eq!(outcome.documents["b.pdf"], vec!["Outra cláusula qualquer".to_string()]);
        assert_eq!(outcome.report.total_discarded(), 1);
        assert_eq!(outcome.report.documents[1].discarded[0].matched.origin_document_id, "a.pdf");
    }

    #[test]
    fn test_per_document_scope_resets_base() {
        let dedup = SentenceDeduplicator::new(DEFAULT_THRESHOLD, DedupScope::PerDocument).expect("limiar");
        let mut base = SentenceBase::new();
        let outcome = dedup.filter(
            docs(&[("a", &["mesma frase aqui", "mesma frase aqui"]), ("b", &["mesma frase aqui"])]),
            &mut base,
        );
        assert_eq!(outcome.documents["a"].len(), 1);
        assert_eq!(outcome.documents["b"].len(), 1);
        assert!(base.is_empty());
    }

    #[test]
    fn test_first_match_wins_not_best_match() {
        let mut base = SentenceBase::new();
        for (doc, text) in [("x", "a b c d e f g h i j k"), ("y", "a b c d e f g h i j")] {
            base.push(SentenceBaseEntry {
                origin_document_id: doc.into(),
                raw_text: text.into(),
                normalized_token_set: normalize_tokens(text),
            });
        }
        // similaridade 10/11 com "x" e 1.0 com "y": vence "x", que vem antes
        let outcome = global().filter(docs(&[("z", &["a b c d e f g h i j"])]), &mut base);
        let discarded = &outcome.report.documents[0].discarded[0];
        assert_eq!(discarded.matched.origin_document_id, "x");
        assert!((discarded.similarity - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_sentence_dropped_silently() {
        let outcome = global().filter(docs(&[("a", &["", "algo"])]), &mut SentenceBase::new());
        assert_eq!(outcome.documents["a"], vec!["algo".to_string()]);
        assert_eq!(outcome.report.documents[0].total, 2);
        assert_eq!(outcome.report.total_discarded(), 0);
    }

    #[test]
    fn test_second_run_with_persisted_base_discards_everything() {
        let store = MemoryStore::default();
        let input = docs(&[
            ("a", &["primeira sentença do edital", "segunda sentença bem diferente"]),
            ("b", &["terceira cláusula sobre prazos"]),
        ]);

        let first = global().run(input.clone(), &store, false).expect("primeira execução");
        assert_eq!(first.report.total_discarded(), 0);

        let second = global().run(input, &store, false).expect("segunda execução");
        assert_eq!(second.report.total_discarded(), 3);
        assert!(second.documents.values().all(Vec::is_empty));
    }

    #[test]
    fn test_reprocess_ignores_persisted_base() {
        let store = MemoryStore::default();
        let input = docs(&[("a", &["uma sentença qualquer"])]);
        global().run(input.clone(), &store, false).expect("primeira");
        let again = global().run(input, &store, true).expect("reprocesso");
        assert_eq!(again.report.total_discarded(), 0);
    }

    #[test]
    fn test_annotated_lines_compare_data_field() {
        let lines: Vec<AnnotatedLine> = crate::jsonl::parse_jsonl(&crate::corpus::demo_jsonl()).lines;
        let mut twice = lines.clone();
        twice.extend(lines);
        let mut input = BTreeMap::new();
        input.insert("concatenado.jsonl".to_string(), twice);

        let outcome = global().filter(input, &mut SentenceBase::new());
        assert_eq!(outcome.documents["concatenado.jsonl"].len(), 4);
        assert_eq!(outcome.report.total_discarded(), 4);
    }

    #[test]
    fn test_render_report() {
        let outcome = global().filter(docs(&[("doc.pdf", &["Ação X", "acao x"])]), &mut SentenceBase::new());
        let text = outcome.report.render();
        assert!(text.starts_with("# Documento: doc.pdf - Qtd. sentenças descartadas/Qtd. sentenças: 1/2 (50.00%)"));
        assert!(text.contains("Sentença descartada...............: acao x"));
        assert!(text.contains("{'acao', 'x'}"));
        assert!(text.contains("Sentença base......: Ação X"));
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(SentenceDeduplicator::new(f64::NAN, DedupScope::Global).is_err());
        assert!(SentenceDeduplicator::new(-0.5, DedupScope::Global).is_err());
    }

    proptest! {
        #[test]
        fn prop_jaccard_symmetric(a in "[a-zà-ú ]{0,40}", b in "[a-zà-ú ]{0,40}") {
            let (sa, sb) = (normalize_tokens(&a), normalize_tokens(&b));
            prop_assert_eq!(jaccard(&sa, &sb), jaccard(&sb, &sa));
            let j = jaccard(&sa, &sb);
            prop_assert!((0.0..=1.0).contains(&j));
        }

        #[test]
        fn prop_kept_sentences_pairwise_below_threshold(
            sentences in prop::collection::vec("[abc]{1,2}( [abc]{1,2}){0,3}", 0..15)
        ) {
            let mut input = BTreeMap::new();
            input.insert("d".to_string(), sentences);
            let outcome = global().filter(input, &mut SentenceBase::new());
            let kept: Vec<TokenSet> = outcome.documents["d"].iter().map(|s| normalize_tokens(s)).collect();
            for i in 0..kept.len() {
                for j in 0..i {
                    prop_assert!(jaccard(&kept[i], &kept[j]) <= DEFAULT_THRESHOLD);
                }
            }
        }
    }
}
