//! # Pipeline de Conversão — JSONL Anotado → CONLL, com Eventos Observáveis
//!
//! Coordena a conversão dos arquivos exportados pela ferramenta de anotação
//! e emite eventos em cada passo via um canal Rust (`mpsc`), permitindo que
//! o servidor WebSocket transmita o progresso em tempo real para o cliente.
//!
//! ## Passos
//! 1. (opcional) Concatenação de `admin.jsonl` + `unknown.jsonl`.
//! 2. Descoberta e carga dos arquivos.
//! 3. (opcional) Remoção de sentenças semelhantes.
//! 4. Fatiamento + tags BIO de cada sentença.
//! 5. Arquivos CONLL, estatísticas, inventário de entidades e parâmetros.
//!
//! Um arquivo ruim não interrompe a conversão: ele vira um evento
//! [`ExportEvent::DocumentFailed`] e fica fora da contagem de processados.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::conll::{write_conll, ConllFile};
use crate::dedup::{DedupScope, SentenceDeduplicator};
use crate::error::{Error, Result};
use crate::jsonl::{concatenate_exports, discover_files, load_jsonl, AnnotatedLine, ADMIN_FILE, CONCATENATED_FILE};
use crate::stats::{
    CorpusStatistics, EntityInventory, KeyedSentence, RunManifest, DISCARD_REPORT_FILE, EXAMPLES_BY_TAG_FILE,
    MANIFEST_FILE, STATISTICS_FILE, TOKENS_BY_FILE_FILE,
};
use crate::store::{write_atomic, BaseTask, JsonFileStore, SentenceBaseStore};
use crate::tagger::{tag_sentence, TaggedSentence};

/// Eventos emitidos durante a conversão.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ExportEvent {
    /// **Início**: pasta de origem e nome dos arquivos procurados.
    Started {
        source_dir: PathBuf,
        search_key: String,
    },
    /// Arquivos `concatenado.jsonl` gerados.
    FilesConcatenated { files: Vec<PathBuf> },
    /// Um arquivo anotado foi lido.
    FileLoaded {
        file: String,
        records: usize,
        skipped: usize,
    },
    /// Resultado da remoção de sentenças semelhantes.
    SentencesDeduplicated { total: usize, discarded: usize },
    /// Sentenças de um arquivo convertidas para BIO.
    FileProcessed { file: String, sentences: usize },
    /// Um arquivo não pôde ser usado; os demais seguem.
    DocumentFailed { file: String, reason: String },
    /// Arquivos CONLL gravados.
    ConllWritten { files: Vec<ConllFile> },
    /// Estatísticas do corpus convertido.
    StatisticsComputed { statistics: CorpusStatistics },
    /// **Conclusão**: resumo da execução.
    Done { summary: ExportSummary },
    /// **Falha**: erro que abortou a execução.
    Error { message: String },
}

/// Resumo de uma conversão.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSummary {
    pub files_found: usize,
    pub files_processed: usize,
    pub sentences: usize,
    pub discarded: usize,
    pub conll_files: Vec<ConllFile>,
    pub statistics: Option<CorpusStatistics>,
    /// Label → quantidade de entidades.
    pub label_totals: BTreeMap<String, usize>,
    pub processing_ms: u64,
}

impl ExportSummary {
    pub fn files_failed(&self) -> usize {
        self.files_found - self.files_processed
    }
}

/// Conversão dos arquivos anotados para CONLL.
///
/// # Modos de Uso
/// - **Sync**: [`ConllExport::run`] para scripts e chamadas diretas.
/// - **Streaming**: [`ConllExport::run_streaming`] para UIs reativas (via WebSocket).
pub struct ConllExport {
    config: ExportConfig,
    store: Box<dyn SentenceBaseStore>,
}

impl ConllExport {
    /// Usa a base de sentenças em `config.base_dir`.
    pub fn new(config: ExportConfig) -> Self {
        let store = JsonFileStore::new(&config.base_dir, BaseTask::Conll);
        Self::with_store(config, store)
    }

    pub fn with_store(config: ExportConfig, store: impl SentenceBaseStore + 'static) -> Self {
        Self {
            config,
            store: Box::new(store),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Executa a conversão e devolve o resumo.
    pub fn run(&self) -> Result<ExportSummary> {
        let (tx, _rx) = mpsc::channel();
        self.execute(&tx)
    }

    /// Executa a conversão enviando eventos de progresso pelo canal `tx`.
    ///
    /// O último evento é sempre `Done` ou `Error`.
    pub fn run_streaming(&self, tx: mpsc::Sender<ExportEvent>) {
        match self.execute(&tx) {
            Ok(summary) => {
                let _ = tx.send(ExportEvent::Done { summary });
            }
            Err(err) => {
                warn!("conversão abortada: {err}");
                let _ = tx.send(ExportEvent::Error {
                    message: err.to_string(),
                });
            }
        }
    }

    fn execute(&self, tx: &mpsc::Sender<ExportEvent>) -> Result<ExportSummary> {
        let start = std::time::Instant::now();
        let config = &self.config;
        config.validate()?;
        let source = config.source_dir.as_path();

        // === Passo 1: concatenação (opcional) ===
        let search_key = if config.concatenate { CONCATENATED_FILE } else { ADMIN_FILE };
        let _ = tx.send(ExportEvent::Started {
            source_dir: source.to_path_buf(),
            search_key: search_key.to_string(),
        });
        if config.concatenate {
            let files = concatenate_exports(source)?;
            let _ = tx.send(ExportEvent::FilesConcatenated { files });
        }

        // === Passo 2: carga ===
        let paths = discover_files(source, search_key)?;
        if paths.is_empty() {
            return Err(Error::NoAnnotatedFiles {
                key: search_key.to_string(),
                dir: source.to_path_buf(),
            });
        }

        let mut summary = ExportSummary {
            files_found: paths.len(),
            ..ExportSummary::default()
        };
        let mut documents: BTreeMap<String, Vec<AnnotatedLine>> = BTreeMap::new();
        for path in &paths {
            let file = path.display().to_string();
            match load_jsonl(path) {
                Ok(loaded) => {
                    let _ = tx.send(ExportEvent::FileLoaded {
                        file: file.clone(),
                        records: loaded.lines.len(),
                        skipped: loaded.skipped,
                    });
                    documents.insert(file, loaded.lines);
                }
                Err(err) => fail(tx, file, err.to_string()),
            }
        }

        // === Passo 3: sentenças semelhantes ===
        if config.dedup.enabled {
            let dedup = SentenceDeduplicator::from_config(&config.dedup)?;
            let outcome = dedup.run(documents, self.store.as_ref(), config.dedup.reprocess)?;

            summary.discarded = outcome.report.total_discarded();
            let _ = tx.send(ExportEvent::SentencesDeduplicated {
                total: outcome.report.total_sentences(),
                discarded: summary.discarded,
            });
            if outcome.report.total_sentences() > 0 {
                write_atomic(&source.join(DISCARD_REPORT_FILE), outcome.report.render().as_bytes())?;
            }
            documents = outcome.documents;
        }

        // === Passo 4: fatiamento + BIO ===
        let mut sentences: Vec<TaggedSentence> = Vec::new();
        let mut inventory = EntityInventory::new();
        for (file, lines) in documents {
            if lines.is_empty() {
                fail(tx, file, "nenhuma sentença anotada válida".to_string());
                continue;
            }

            let keyed: Vec<KeyedSentence> = lines
                .iter()
                .map(|line| KeyedSentence {
                    key: line.key(),
                    sentence: tag_sentence(&line.record.data, &line.record.label, config.uppercase_labels),
                })
                .collect();

            let _ = tx.send(ExportEvent::FileProcessed {
                file: file.clone(),
                sentences: keyed.len(),
            });
            sentences.extend(keyed.iter().map(|k| k.sentence.clone()));
            inventory.add_file(file, keyed);
            summary.files_processed += 1;
        }
        summary.sentences = sentences.len();

        // === Passo 5: arquivos de saída ===
        if summary.files_processed > 0 {
            summary.conll_files = write_conll(&sentences, source, config.test_fraction)?;
            let _ = tx.send(ExportEvent::ConllWritten {
                files: summary.conll_files.clone(),
            });

            match CorpusStatistics::compute(summary.files_processed, &sentences) {
                Ok(statistics) => {
                    write_atomic(&source.join(STATISTICS_FILE), statistics.render().as_bytes())?;
                    let _ = tx.send(ExportEvent::StatisticsComputed { statistics });
                    summary.statistics = Some(statistics);
                }
                Err(err) => warn!("{err}"),
            }

            write_atomic(&source.join(TOKENS_BY_FILE_FILE), inventory.render_tokens_by_file().as_bytes())?;
            write_atomic(
                &source.join(EXAMPLES_BY_TAG_FILE),
                inventory.render_examples_by_label().as_bytes(),
            )?;
            summary.label_totals = inventory.label_totals();

            write_atomic(&source.join(MANIFEST_FILE), self.manifest(source).render().as_bytes())?;
        }

        if summary.files_failed() > 0 {
            warn!(
                found = summary.files_found,
                processed = summary.files_processed,
                failed = summary.files_failed(),
                "nem todos os arquivos encontrados foram processados"
            );
        }

        summary.processing_ms = start.elapsed().as_millis() as u64;
        info!(
            sentences = summary.sentences,
            files = summary.files_processed,
            ms = summary.processing_ms,
            "conversão para CONLL concluída"
        );
        Ok(summary)
    }

    fn manifest(&self, source: &Path) -> RunManifest {
        let config = &self.config;
        RunManifest::new("Parâmetros utilizados para geração dos arquivos CONLL")
            .entry("Pasta destino", format!("'{}'", source.display()))
            .entry("Retirar sentenças semelhantes", config.dedup.enabled)
            .entry("Escopo global de sentenças", config.dedup.scope == DedupScope::Global)
            .entry("Limiar para definição de sentenças similares", config.dedup.threshold)
            .entry("Tamanho do dataset de teste", config.test_fraction)
            .entry("Concatenar arquivos", config.concatenate)
            .entry("Labels em maiúsculas", config.uppercase_labels)
    }
}

fn fail(tx: &mpsc::Sender<ExportEvent>, file: String, reason: String) {
    warn!(file = %file, "arquivo não processado: {reason}");
    let _ = tx.send(ExportEvent::DocumentFailed { file, reason });
}
