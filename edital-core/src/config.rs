//! # Parâmetros de Execução
//!
//! Structs de configuração das rotinas em lote. Todas são serializáveis e têm
//! valores padrão, de modo que um JSON parcial (ex: `{"test_fraction": 0.3}`)
//! já é uma configuração completa.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dedup::{DedupScope, DEFAULT_THRESHOLD};
use crate::error::{Error, Result};

/// Remoção de sentenças semelhantes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub enabled: bool,
    pub scope: DedupScope,
    /// Acima deste índice de Jaccard a sentença é descartada.
    pub threshold: f64,
    /// Ignora a base persistida e começa com uma base vazia.
    pub reprocess: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scope: DedupScope::Global,
            threshold: DEFAULT_THRESHOLD,
            reprocess: false,
        }
    }
}

impl DedupConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Conversão dos arquivos anotados (JSONL) para CONLL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pasta com os arquivos anotados; recebe também os arquivos gerados.
    pub source_dir: PathBuf,
    /// Pasta da base de sentenças persistida.
    pub base_dir: PathBuf,
    pub dedup: DedupConfig,
    /// Fração das sentenças reservada para teste + validação; `0` gera um único arquivo.
    pub test_fraction: f64,
    /// Funde `admin.jsonl` e `unknown.jsonl` antes de converter.
    pub concatenate: bool,
    /// Converte os labels para maiúsculas (`Tempo` → `B-TEMPO`).
    pub uppercase_labels: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            base_dir: PathBuf::from("."),
            // a conversão sempre reprocessa: a base anterior descartaria tudo
            dedup: DedupConfig {
                reprocess: true,
                ..DedupConfig::default()
            },
            test_fraction: 0.0,
            concatenate: false,
            uppercase_labels: true,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<()> {
        self.dedup.validate()?;
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(Error::InvalidTestFraction(self.test_fraction));
        }
        Ok(())
    }
}

/// Construção do dataset de sentenças para anotação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub output_dir: PathBuf,
    pub base_dir: PathBuf,
    pub dedup: DedupConfig,
    /// Sentenças com menos tokens que isso são descartadas.
    pub min_sentence_tokens: usize,
    /// Máximo de sentenças por arquivo quando organizado em pastas (mínimo efetivo: 5).
    pub max_sentences_per_file: usize,
    /// Uma pasta por documento em vez de um arquivo por documento.
    pub organize_in_folders: bool,
}

/// Piso de sentenças por arquivo na organização em pastas.
pub const MIN_SENTENCES_PER_FILE: usize = 5;

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            base_dir: PathBuf::from("."),
            dedup: DedupConfig::default(),
            min_sentence_tokens: 1,
            max_sentences_per_file: MIN_SENTENCES_PER_FILE,
            organize_in_folders: false,
        }
    }
}

impl DatasetConfig {
    pub fn validate(&self) -> Result<()> {
        self.dedup.validate()
    }

    pub fn sentences_per_file(&self) -> usize {
        self.max_sentences_per_file.max(MIN_SENTENCES_PER_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"test_fraction": 0.3, "dedup": {"enabled": true}}"#).expect("json válido");
        assert_eq!(config.test_fraction, 0.3);
        assert!(config.dedup.enabled);
        assert_eq!(config.dedup.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.dedup.scope, DedupScope::Global);
        assert!(config.uppercase_labels);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_export_default_reprocesses() {
        assert!(ExportConfig::default().dedup.reprocess);
        assert!(!DatasetConfig::default().dedup.reprocess);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        for r in [1.0, 1.5, -0.1] {
            let config = ExportConfig {
                test_fraction: r,
                ..ExportConfig::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidTestFraction(_))));
        }
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config = DedupConfig {
            threshold: 1.2,
            ..DedupConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidThreshold(_))));
    }

    #[test]
    fn test_sentences_per_file_floor() {
        let config = DatasetConfig {
            max_sentences_per_file: 2,
            ..DatasetConfig::default()
        };
        assert_eq!(config.sentences_per_file(), 5);
    }
}
