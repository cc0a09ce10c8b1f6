//! # Arquivos JSONL Exportados pela Ferramenta de Anotação
//!
//! Cada linha é um objeto `{"id": int, "data": string, "label": [[início, fim, label], ...]}`.
//! A ferramenta grava um arquivo por usuário anotador (`admin.jsonl`,
//! `unknown.jsonl`); quando os dois existem numa mesma pasta eles podem ser
//! fundidos, ordenados pelo `id`, em `concatenado.jsonl`.
//!
//! Linhas mal formadas não derrubam a carga: são registradas com `warn!`,
//! contadas e descartadas.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotation::AnnotationSpan;
use crate::error::{Error, Result};
use crate::store::write_atomic;

/// Arquivo do primeiro anotador.
pub const ADMIN_FILE: &str = "admin.jsonl";
/// Arquivo do segundo anotador.
pub const UNKNOWN_FILE: &str = "unknown.jsonl";
/// Resultado da concatenação de [`ADMIN_FILE`] e [`UNKNOWN_FILE`].
pub const CONCATENATED_FILE: &str = "concatenado.jsonl";

/// Uma sentença anotada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub id: i64,
    pub data: String,
    pub label: Vec<AnnotationSpan>,
}

/// Registro junto com a linha (1-based) de onde foi lido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedLine {
    pub line_number: usize,
    pub record: AnnotatedRecord,
}

impl AnnotatedLine {
    /// Chave usada nos relatórios: `Linha: 3; ID: 78`.
    pub fn key(&self) -> String {
        format!("Linha: {}; ID: {}", self.line_number, self.record.id)
    }
}

/// Conteúdo de um arquivo JSONL carregado.
#[derive(Debug, Clone, Default)]
pub struct LoadedFile {
    pub lines: Vec<AnnotatedLine>,
    /// Linhas não vazias que não puderam ser interpretadas.
    pub skipped: usize,
}

/// Interpreta o texto de um arquivo JSONL.
pub fn parse_jsonl(content: &str) -> LoadedFile {
    let mut loaded = LoadedFile::default();

    for (index, raw) in content.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;
        match serde_json::from_str::<AnnotatedRecord>(raw) {
            Ok(record) => loaded.lines.push(AnnotatedLine {
                line_number,
                record,
            }),
            Err(err) => {
                let err = Error::MalformedRecord {
                    line: line_number,
                    reason: err.to_string(),
                };
                warn!("{err}");
                loaded.skipped += 1;
            }
        }
    }

    loaded
}

/// Lê e interpreta um arquivo JSONL.
pub fn load_jsonl(path: &Path) -> Result<LoadedFile> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let loaded = parse_jsonl(&content);
    debug!(
        file = %path.display(),
        records = loaded.lines.len(),
        skipped = loaded.skipped,
        "arquivo JSONL carregado"
    );
    Ok(loaded)
}

fn record_id(raw: &str, line: usize) -> Result<i64> {
    #[derive(Deserialize)]
    struct IdOnly {
        id: i64,
    }

    serde_json::from_str::<IdOnly>(raw)
        .map(|r| r.id)
        .map_err(|e| Error::MalformedRecord {
            line,
            reason: e.to_string(),
        })
}

/// Junta as linhas de dois arquivos e as ordena pelo `id` numérico.
///
/// As linhas são mantidas como texto cru; só o `id` é interpretado.
pub fn merge_by_id(first: &str, second: &str) -> Result<Vec<String>> {
    let mut keyed = Vec::new();
    for content in [first, second] {
        for (index, raw) in content.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            keyed.push((record_id(raw, index + 1)?, raw.to_string()));
        }
    }
    keyed.sort_by_key(|(id, _)| *id);
    Ok(keyed.into_iter().map(|(_, raw)| raw).collect())
}

/// Lista recursivamente as pastas a partir de `dir` (inclusive), ordenadas.
fn walk_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![dir.to_path_buf()];
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() {
            dirs.extend(walk_dirs(&path)?);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Encontra recursivamente os arquivos chamados `file_name`, em ordem de caminho.
pub fn discover_files(dir: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = walk_dirs(dir)?
        .into_iter()
        .map(|d| d.join(file_name))
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Gera `concatenado.jsonl` em toda pasta que tenha `admin.jsonl` e/ou
/// `unknown.jsonl`. Devolve os arquivos escritos.
///
/// Pastas cujos arquivos não podem ser lidos ou interpretados são puladas.
pub fn concatenate_exports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for folder in walk_dirs(dir)? {
        let admin = folder.join(ADMIN_FILE);
        let unknown = folder.join(UNKNOWN_FILE);

        let lines = match (admin.is_file(), unknown.is_file()) {
            (true, true) => {
                let merged = fs::read_to_string(&admin)
                    .map_err(|e| Error::io(&admin, e))
                    .and_then(|a| {
                        let u = fs::read_to_string(&unknown).map_err(|e| Error::io(&unknown, e))?;
                        merge_by_id(&a, &u)
                    });
                match merged {
                    Ok(lines) => lines,
                    Err(err) => {
                        warn!(folder = %folder.display(), "concatenação ignorada: {err}");
                        continue;
                    }
                }
            }
            (true, false) | (false, true) => {
                let single = if admin.is_file() { &admin } else { &unknown };
                match fs::read_to_string(single) {
                    Ok(content) => content.lines().map(str::to_string).collect(),
                    Err(err) => {
                        warn!(file = %single.display(), "leitura ignorada: {err}");
                        continue;
                    }
                }
            }
            (false, false) => continue,
        };

        if lines.is_empty() {
            continue;
        }

        let target = folder.join(CONCATENATED_FILE);
        let mut content = lines.join("\n");
        content.push('\n');
        write_atomic(&target, content.as_bytes())?;
        info!(file = %target.display(), lines = lines.len(), "arquivo concatenado");
        written.push(target);
    }

    Ok(written)
}
