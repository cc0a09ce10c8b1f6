//! # Relatórios da Conversão
//!
//! Arquivos texto gerados junto com os datasets:
//!
//! | Arquivo                               | Conteúdo                                   |
//! |---------------------------------------|--------------------------------------------|
//! | `estatisticas.txt`                    | contagens e médias do corpus               |
//! | `tokens_anotados_por_arquivo.txt`     | tokens anotados, por arquivo, label e linha|
//! | `exemplos_de_entidades_por_tag.txt`   | entidades distintas de cada label          |
//! | `parametros_utilizados.txt`           | parâmetros da execução                     |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tagger::{collect_entities, Tag, TaggedSentence};

pub const STATISTICS_FILE: &str = "estatisticas.txt";
pub const TOKENS_BY_FILE_FILE: &str = "tokens_anotados_por_arquivo.txt";
pub const EXAMPLES_BY_TAG_FILE: &str = "exemplos_de_entidades_por_tag.txt";
pub const MANIFEST_FILE: &str = "parametros_utilizados.txt";
pub const DISCARD_REPORT_FILE: &str = "detalhamento_sentencas_descartadas.txt";

/// Contagens do corpus convertido.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub files_processed: usize,
    pub sentences: usize,
    pub tokens: usize,
    /// Tokens com tag `B-`, ou seja, entidades.
    pub entities: usize,
}

fn ratio(a: usize, b: usize) -> f64 {
    if b == 0 {
        0.0
    } else {
        a as f64 / b as f64
    }
}

impl CorpusStatistics {
    /// Calcula as estatísticas. Um corpus sem tokens é erro.
    pub fn compute(files_processed: usize, sentences: &[TaggedSentence]) -> Result<Self> {
        let tokens: usize = sentences.iter().map(TaggedSentence::len).sum();
        if tokens == 0 {
            return Err(Error::NoTokens);
        }
        Ok(Self {
            files_processed,
            sentences: sentences.len(),
            tokens,
            entities: sentences.iter().map(TaggedSentence::entity_count).sum(),
        })
    }

    pub fn sentences_per_file(&self) -> f64 {
        ratio(self.sentences, self.files_processed)
    }

    pub fn tokens_per_file(&self) -> f64 {
        ratio(self.tokens, self.files_processed)
    }

    pub fn tokens_per_sentence(&self) -> f64 {
        ratio(self.tokens, self.sentences)
    }

    pub fn entities_per_file(&self) -> f64 {
        ratio(self.entities, self.files_processed)
    }

    pub fn entities_per_sentence(&self) -> f64 {
        ratio(self.entities, self.sentences)
    }

    /// Percentual de tokens que iniciam entidades.
    pub fn entity_token_percent(&self) -> f64 {
        ratio(self.entities, self.tokens) * 100.0
    }

    pub fn render(&self) -> String {
        let mut out = String::from("=> Estatísticas do processo de conversão dos arquivos anotados\n\n");
        let rows = [
            ("Quantidade de arquivos processados..................", self.files_processed.to_string()),
            ("Quantidade de sentenças.............................", self.sentences.to_string()),
            ("Total de tokens.....................................", self.tokens.to_string()),
            ("Quantidade de entidades (exceto tag 'O')............", self.entities.to_string()),
            ("Média de sentenças por arquivo......................", format!("{:.2}", self.sentences_per_file())),
            ("Média de tokens por arquivo.........................", format!("{:.2}", self.tokens_per_file())),
            ("Média de tokens por sentença........................", format!("{:.2}", self.tokens_per_sentence())),
            ("Média de entidades (exceto tag 'O') por arquivo.....", format!("{:.2}", self.entities_per_file())),
            ("Média de entidades (exceto tag 'O') por sentença....", format!("{:.2}", self.entities_per_sentence())),
            ("% de tokens que são entidades (exceto tag 'O')......", format!("{:.2}%", self.entity_token_percent())),
        ];
        for (name, value) in rows {
            let _ = writeln!(out, "\t{name}: {value}");
        }
        out
    }
}

/// Sentença anotada identificada pela linha de origem (`Linha: 3; ID: 78`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedSentence {
    pub key: String,
    pub sentence: TaggedSentence,
}

/// Inventário das entidades anotadas, por arquivo e por label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityInventory {
    /// Arquivo → sentenças, na ordem de processamento.
    files: Vec<(String, Vec<KeyedSentence>)>,
}

impl EntityInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: impl Into<String>, sentences: Vec<KeyedSentence>) {
        self.files.push((file.into(), sentences));
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Quantidade de entidades (tags `B-`) de cada label.
    pub fn label_totals(&self) -> BTreeMap<String, usize> {
        let mut totals = BTreeMap::new();
        for token in self.all_sentences().flat_map(|s| s.tokens.iter()) {
            if let Tag::Begin(label) = &token.tag {
                *totals.entry(label.clone()).or_insert(0) += 1;
            }
        }
        totals
    }

    /// Formas distintas das entidades de cada label, ordenadas.
    pub fn examples_by_label(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut examples: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for sentence in self.all_sentences() {
            for entity in collect_entities(&sentence.tokens) {
                examples.entry(entity.label).or_default().insert(entity.text);
            }
        }
        examples
    }

    fn all_sentences(&self) -> impl Iterator<Item = &TaggedSentence> {
        self.files
            .iter()
            .flat_map(|(_, sentences)| sentences.iter().map(|k| &k.sentence))
    }

    /// Texto de `tokens_anotados_por_arquivo.txt`.
    pub fn render_tokens_by_file(&self) -> String {
        let mut out = String::new();
        for (file, sentences) in &self.files {
            let _ = write!(out, "# Arquivo: {file}");

            // label → tokens anotados com a linha de origem
            let mut by_label: BTreeMap<&str, Vec<(&str, &str, bool)>> = BTreeMap::new();
            for keyed in sentences {
                for token in &keyed.sentence.tokens {
                    if let Some(label) = token.tag.entity() {
                        by_label.entry(label).or_default().push((
                            keyed.key.as_str(),
                            token.text.as_str(),
                            token.tag.is_begin(),
                        ));
                    }
                }
            }

            for (label, tokens) in by_label {
                let _ = write!(out, "\n\n - Tag {label}:\n");
                for (key, text, begin) in tokens {
                    if begin {
                        let _ = write!(out, "\n   {key} -> {text}");
                    } else {
                        let _ = write!(out, " {text}");
                    }
                }
            }
            out.push_str("\n\n");
        }
        out
    }

    /// Texto de `exemplos_de_entidades_por_tag.txt`.
    pub fn render_examples_by_label(&self) -> String {
        let mut out = String::new();
        for (label, examples) in self.examples_by_label() {
            let _ = write!(out, "- Label {label}:\n\n");
            for example in examples {
                let _ = writeln!(out, "{example}");
            }
            out.push_str("\n\n");
        }
        out
    }
}

/// Parâmetros de uma execução, gravados ao lado dos arquivos gerados.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub title: String,
    pub entries: Vec<(String, String)>,
}

impl RunManifest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.entries.push((name.into(), value.to_string()));
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("# {}:\n\n", self.title);
        for (name, value) in &self.entries {
            let _ = writeln!(out, "{name}: {value}");
        }
        out
    }
}
