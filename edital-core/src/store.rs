//! # Persistência da Base de Sentenças
//!
//! A base de sentenças sobrevive entre execuções para que um novo lote de
//! documentos seja comparado com tudo o que já foi aceito antes. Cada tarefa
//! usa seu próprio arquivo (ver [`BaseTask`]).
//!
//! Toda escrita de arquivo do crate passa por [`write_atomic`]: o conteúdo vai
//! para um arquivo temporário na mesma pasta, que então substitui o destino.
//! Uma execução interrompida nunca deixa um arquivo pela metade.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::dedup::SentenceBase;
use crate::error::{Error, Result};

/// Grava `contents` em `path` de forma atômica.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// Origem e destino da base de sentenças.
pub trait SentenceBaseStore: Send + Sync {
    /// Base persistida; ausência de base não é erro.
    fn load(&self) -> Result<SentenceBase>;
    fn save(&self, base: &SentenceBase) -> Result<()>;
}

impl<T: SentenceBaseStore + ?Sized> SentenceBaseStore for Arc<T> {
    fn load(&self) -> Result<SentenceBase> {
        (**self).load()
    }

    fn save(&self, base: &SentenceBase) -> Result<()> {
        (**self).save(base)
    }
}

/// Tarefa dona da base (bases separadas por tarefa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseTask {
    /// Dataset de sentenças para anotação.
    Ner,
    /// Conversão de arquivos anotados para CONLL.
    Conll,
}

impl BaseTask {
    pub fn file_name(&self) -> &'static str {
        match self {
            BaseTask::Ner => "sentence_base_ner.json",
            BaseTask::Conll => "sentence_base_conll.json",
        }
    }
}

/// Base gravada como JSON num arquivo.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Arquivo padrão da tarefa dentro de `dir`.
    pub fn new(dir: impl AsRef<Path>, task: BaseTask) -> Self {
        Self {
            path: dir.as_ref().join(task.file_name()),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SentenceBaseStore for JsonFileStore {
    fn load(&self) -> Result<SentenceBase> {
        if !self.path.exists() {
            warn!(file = %self.path.display(), "base de sentenças não encontrada; usando base vazia");
            return Ok(SentenceBase::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let base: SentenceBase = serde_json::from_str(&content)?;
        debug!(file = %self.path.display(), entries = base.len(), "base de sentenças carregada");
        Ok(base)
    }

    fn save(&self, base: &SentenceBase) -> Result<()> {
        let bytes = serde_json::to_vec(base)?;
        write_atomic(&self.path, &bytes)?;
        debug!(file = %self.path.display(), entries = base.len(), "base de sentenças salva");
        Ok(())
    }
}

/// Base mantida em memória, compartilhável entre threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    base: Mutex<SentenceBase>,
}

impl MemoryStore {
    pub fn new(base: SentenceBase) -> Self {
        Self {
            base: Mutex::new(base),
        }
    }

    pub fn len(&self) -> usize {
        self.base.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SentenceBaseStore for MemoryStore {
    fn load(&self) -> Result<SentenceBase> {
        Ok(self.base.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, base: &SentenceBase) -> Result<()> {
        *self.base.lock().unwrap_or_else(PoisonError::into_inner) = base.clone();
        Ok(())
    }
}
