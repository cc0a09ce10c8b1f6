//! # Erros do edital-core
//!
//! Um único tipo de erro para toda a biblioteca. Operações em lote (vários
//! documentos) nunca abortam por causa de um documento ruim: o erro daquele
//! documento é devolvido ou reportado individualmente.

use std::path::PathBuf;

use thiserror::Error;

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Falha de E/S em um caminho específico.
    #[error("erro de E/S em '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON inválido (base de sentenças, requisições).
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    /// Linha JSONL mal formada ou sem as chaves `id`, `data` e `label`.
    #[error("linha {line} mal formada: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Fração de teste fora do intervalo [0, 1).
    #[error("tamanho do dataset de teste inválido: {0} (esperado 0 <= r < 1)")]
    InvalidTestFraction(f64),

    /// A divisão treino/teste/validação deixaria alguma parte vazia.
    #[error("não foi possível dividir {sentences} sentenças com fração de teste {test_fraction}")]
    DegenerateSplit { sentences: usize, test_fraction: f64 },

    /// Limiar de similaridade fora de [0, 1].
    #[error("limiar de similaridade inválido: {0}")]
    InvalidThreshold(f64),

    /// Documento sem nenhuma página de texto.
    #[error("o documento '{0}' não possui páginas")]
    EmptyDocument(String),

    /// Nenhum arquivo anotado encontrado para a chave de busca.
    #[error("nenhum arquivo '{key}' encontrado em '{dir}'")]
    NoAnnotatedFiles { key: String, dir: PathBuf },

    /// Estatísticas pedidas para um corpus sem tokens.
    #[error("não há tokens para gerar estatísticas")]
    NoTokens,
}

impl Error {
    /// Envolve um `std::io::Error` com o caminho que o causou.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
