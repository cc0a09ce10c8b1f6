//! # Dataset de Sentenças para Anotação
//!
//! Recebe as sentenças de cada edital (já segmentadas por um divisor de
//! sentenças externo) e grava os arquivos texto que serão carregados na
//! ferramenta de anotação, uma sentença por linha.
//!
//! Duas organizações de saída:
//! - um `<documento>.txt` por edital;
//! - uma pasta por edital com arquivos `<nome>_<n>.txt` de no máximo
//!   `max_sentences_per_file` sentenças, o que deixa cada lote de anotação
//!   pequeno.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DatasetConfig;
use crate::dedup::{DedupScope, SentenceDeduplicator};
use crate::error::{Error, Result};
use crate::stats::{RunManifest, DISCARD_REPORT_FILE, MANIFEST_FILE};
use crate::store::{write_atomic, BaseTask, JsonFileStore, SentenceBaseStore};
use crate::tokenizer::tokenize;

/// Prefixo da pasta de um edital que ficou sem nenhuma sentença.
pub const EMPTY_DOCUMENT_PREFIX: &str = "DOCUMENTO_SEM_SENTENÇAS_ÚNICAS_";

/// Resultado da construção do dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub documents: usize,
    pub sentences: usize,
    pub discarded: usize,
    pub files: Vec<PathBuf>,
}

/// `0001_pregao_12.pdf` → `0001_pregao_12`
fn document_stem(document_id: &str) -> &str {
    document_id.split('.').next().unwrap_or(document_id)
}

/// `0001_pregao_12` → `pregao_12` (remove o prefixo numérico único)
fn file_base_name(stem: &str) -> &str {
    stem.split_once('_').map_or("", |(_, rest)| rest)
}

fn render_lines(sentences: &[String]) -> String {
    sentences.iter().map(|s| format!("{s}\n")).collect()
}

/// Construtor do dataset de sentenças.
pub struct SentenceDataset {
    config: DatasetConfig,
    store: Box<dyn SentenceBaseStore>,
}

impl SentenceDataset {
    /// Usa a base de sentenças em `config.base_dir`.
    pub fn new(config: DatasetConfig) -> Self {
        let store = JsonFileStore::new(&config.base_dir, BaseTask::Ner);
        Self::with_store(config, store)
    }

    pub fn with_store(config: DatasetConfig, store: impl SentenceBaseStore + 'static) -> Self {
        Self {
            config,
            store: Box::new(store),
        }
    }

    /// Mantém só as sentenças com pelo menos `min_sentence_tokens` tokens,
    /// normalizando os espaços.
    pub fn filter_short(&self, documents: BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
        let min = self.config.min_sentence_tokens;
        documents
            .into_iter()
            .map(|(id, sentences)| {
                let kept = sentences
                    .iter()
                    .map(|s| tokenize(s).into_iter().map(|t| t.text).collect::<Vec<_>>())
                    .filter(|tokens| !tokens.is_empty() && tokens.len() >= min)
                    .map(|tokens| tokens.join(" "))
                    .collect();
                (id, kept)
            })
            .collect()
    }

    /// Filtra, remove semelhantes (se configurado) e grava os arquivos.
    pub fn build(&self, documents: BTreeMap<String, Vec<String>>) -> Result<DatasetSummary> {
        let config = &self.config;
        config.validate()?;

        let mut summary = DatasetSummary {
            documents: documents.len(),
            ..DatasetSummary::default()
        };
        let document_ids: Vec<String> = documents.keys().cloned().collect();
        let mut documents = self.filter_short(documents);

        if config.dedup.enabled {
            let dedup = SentenceDeduplicator::from_config(&config.dedup)?;
            let outcome = dedup.run(documents, self.store.as_ref(), config.dedup.reprocess)?;
            if outcome.report.total_sentences() > 0 {
                write_atomic(
                    &config.output_dir.join(DISCARD_REPORT_FILE),
                    outcome.report.render().as_bytes(),
                )?;
            }
            summary.discarded = outcome.report.total_discarded();
            documents = outcome.documents;
        }

        for (document_id, sentences) in &documents {
            summary.sentences += sentences.len();
            if config.organize_in_folders {
                summary.files.extend(self.write_folder(document_id, sentences)?);
            } else {
                let path = config.output_dir.join(format!("{}.txt", document_stem(document_id)));
                write_atomic(&path, render_lines(sentences).as_bytes())?;
                summary.files.push(path);
            }
        }

        write_atomic(
            &config.output_dir.join(MANIFEST_FILE),
            self.manifest(&document_ids).render().as_bytes(),
        )?;

        info!(
            documents = summary.documents,
            sentences = summary.sentences,
            discarded = summary.discarded,
            output = %config.output_dir.display(),
            "dataset de sentenças gerado"
        );
        Ok(summary)
    }

    fn write_folder(&self, document_id: &str, sentences: &[String]) -> Result<Vec<PathBuf>> {
        let stem = document_stem(document_id);
        let name = file_base_name(stem);
        let folder = if sentences.is_empty() {
            self.config.output_dir.join(format!("{EMPTY_DOCUMENT_PREFIX}{stem}"))
        } else {
            self.config.output_dir.join(stem)
        };
        std::fs::create_dir_all(&folder).map_err(|e| Error::io(&folder, e))?;

        let mut files = Vec::new();
        for (i, chunk) in sentences.chunks(self.config.sentences_per_file()).enumerate() {
            let path = folder.join(format!("{name}_{}.txt", i + 1));
            write_atomic(&path, render_lines(chunk).as_bytes())?;
            files.push(path);
        }
        Ok(files)
    }

    fn manifest(&self, document_ids: &[String]) -> RunManifest {
        let config = &self.config;
        let per_file = if config.organize_in_folders {
            config.sentences_per_file().to_string()
        } else {
            "n/a".to_string()
        };
        let (scope, threshold) = if config.dedup.enabled {
            (
                (config.dedup.scope == DedupScope::Global).to_string(),
                config.dedup.threshold.to_string(),
            )
        } else {
            ("n/a".to_string(), "n/a".to_string())
        };

        RunManifest::new("Parâmetros utilizados para construção dos datasets")
            .entry("Pasta destino", config.output_dir.display())
            .entry("Código de processamento", "ner")
            .entry("Tamanho mínimo de sentença", config.min_sentence_tokens)
            .entry("Quantidade de documentos", document_ids.len())
            .entry("Quantidade máxima de sentenças por arquivo", per_file)
            .entry("Reprocessado", config.dedup.reprocess)
            .entry("Organizar em pastas", config.organize_in_folders)
            .entry("Retirar sentenças semelhantes", config.dedup.enabled)
            .entry("Escopo global de sentenças", scope)
            .entry("Limiar para definição de sentenças similares", threshold)
            .entry("Documentos", format!("{document_ids:?}"))
    }
}
