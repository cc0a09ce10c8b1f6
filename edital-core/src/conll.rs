//! # Emissão no Formato CONLL
//!
//! Um token por linha (`texto tag`), linha em branco entre sentenças:
//!
//! ```text
//! 14h B-TEMPO
//! em O
//! 12/09/17 B-TEMPO
//!
//! O O
//! prazo O
//! ```
//!
//! Com fração de teste `r > 0` as sentenças são divididas, **sem
//! embaralhar**, em treino (`1 - r`) e um restante que é dividido ao meio
//! entre teste e validação.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::store::write_atomic;
use crate::tagger::TaggedSentence;

pub const SINGLE_FILE: &str = "dataset_ner.conll";
pub const TRAIN_FILE: &str = "dataset_ner_train.conll";
pub const TEST_FILE: &str = "dataset_ner_test.conll";
pub const VALIDATION_FILE: &str = "dataset_ner_val.conll";

// folga para que 0.3 * 100 não vire 31 por erro de ponto flutuante
const SPLIT_EPSILON: f64 = 1e-9;

/// Quantidades de sentenças de cada parte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSizes {
    pub train: usize,
    pub test: usize,
    pub validation: usize,
}

/// Divide `total` em uma parte inicial e uma final com `fraction` do total
/// (arredondada para cima). Nenhuma das duas pode ficar vazia.
fn holdout(total: usize, fraction: f64) -> Option<(usize, usize)> {
    let tail = ((fraction * total as f64) - SPLIT_EPSILON).ceil().max(0.0) as usize;
    let head = total.checked_sub(tail)?;
    (head > 0 && tail > 0).then_some((head, tail))
}

/// Calcula o tamanho de treino, teste e validação.
pub fn split_sizes(total: usize, test_fraction: f64) -> Result<SplitSizes> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(Error::InvalidTestFraction(test_fraction));
    }
    let degenerate = || Error::DegenerateSplit {
        sentences: total,
        test_fraction,
    };

    let (train, rest) = holdout(total, test_fraction).ok_or_else(degenerate)?;
    let (test, validation) = holdout(rest, 0.5).ok_or_else(degenerate)?;
    Ok(SplitSizes {
        train,
        test,
        validation,
    })
}

/// Um arquivo a ser gerado e as sentenças que ele recebe.
#[derive(Debug, Clone, Copy)]
pub struct DatasetPart<'a> {
    pub file_name: &'static str,
    pub sentences: &'a [TaggedSentence],
}

/// Separa as sentenças nos arquivos de saída, preservando a ordem.
///
/// `test_fraction == 0` gera uma única parte; `0 < r < 1` gera treino,
/// teste e validação. Qualquer outro valor, ou uma divisão que deixaria
/// alguma parte vazia, é erro.
pub fn split_dataset(sentences: &[TaggedSentence], test_fraction: f64) -> Result<Vec<DatasetPart<'_>>> {
    if test_fraction == 0.0 {
        return Ok(vec![DatasetPart {
            file_name: SINGLE_FILE,
            sentences,
        }]);
    }

    let sizes = split_sizes(sentences.len(), test_fraction)?;
    let (train, rest) = sentences.split_at(sizes.train);
    let (test, validation) = rest.split_at(sizes.test);

    Ok(vec![
        DatasetPart {
            file_name: TRAIN_FILE,
            sentences: train,
        },
        DatasetPart {
            file_name: TEST_FILE,
            sentences: test,
        },
        DatasetPart {
            file_name: VALIDATION_FILE,
            sentences: validation,
        },
    ])
}

/// Texto CONLL das sentenças.
pub fn render_conll(sentences: &[TaggedSentence]) -> String {
    let mut out = String::new();
    for sentence in sentences {
        for token in &sentence.tokens {
            let _ = writeln!(out, "{} {}", token.text, token.tag);
        }
        out.push('\n');
    }
    out
}

/// Arquivo CONLL gravado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConllFile {
    pub path: PathBuf,
    pub sentences: usize,
}

/// Grava os arquivos CONLL em `dir`.
///
/// A divisão é calculada antes de qualquer escrita: se ela falhar nenhum
/// arquivo é tocado.
pub fn write_conll(sentences: &[TaggedSentence], dir: &Path, test_fraction: f64) -> Result<Vec<ConllFile>> {
    let parts = split_dataset(sentences, test_fraction)?;

    let mut written = Vec::with_capacity(parts.len());
    for part in parts {
        let path = dir.join(part.file_name);
        write_atomic(&path, render_conll(part.sentences).as_bytes())?;
        info!(file = %path.display(), sentences = part.sentences.len(), "arquivo CONLL gerado");
        written.push(ConllFile {
            path,
            sentences: part.sentences.len(),
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::{Tag, TaggedToken};

    fn sentence(id: usize) -> TaggedSentence {
        TaggedSentence {
            tokens: vec![
                TaggedToken {
                    text: format!("s{id}"),
                    tag: Tag::Begin("ID".into()),
                },
                TaggedToken {
                    text: "fim".into(),
                    tag: Tag::Outside,
                },
            ],
        }
    }

    fn corpus(n: usize) -> Vec<TaggedSentence> {
        (0..n).map(sentence).collect()
    }

    #[test]
    fn test_split_100_at_030() {
        let sentences = corpus(100);
        let parts = split_dataset(&sentences, 0.3).expect("divisão válida");
        let sizes: Vec<usize> = parts.iter().map(|p| p.sentences.len()).collect();
        assert_eq!(sizes, vec![70, 15, 15]);

        // ordem original preservada
        assert_eq!(parts[0].sentences[0], sentence(0));
        assert_eq!(parts[1].sentences[0], sentence(70));
        assert_eq!(parts[2].sentences[0], sentence(85));
        assert_eq!(parts[2].sentences[14], sentence(99));
    }

    #[test]
    fn test_odd_holdout_gives_extra_to_validation() {
        let sizes = split_sizes(10, 0.25).expect("divisão válida");
        assert_eq!(sizes, SplitSizes { train: 7, test: 1, validation: 2 });
    }

    #[test]
    fn test_zero_fraction_single_file() {
        let sentences = corpus(3);
        let parts = split_dataset(&sentences, 0.0).expect("sem divisão");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].file_name, SINGLE_FILE);
    }

    #[test]
    fn test_invalid_fractions() {
        let sentences = corpus(10);
        for r in [1.0, -0.2, 2.0, f64::NAN] {
            assert!(matches!(split_dataset(&sentences, r), Err(Error::InvalidTestFraction(_))));
        }
    }

    #[test]
    fn test_too_few_sentences() {
        let sentences = corpus(2);
        assert!(matches!(
            split_dataset(&sentences, 0.3),
            Err(Error::DegenerateSplit { sentences: 2, .. })
        ));
        assert!(split_dataset(&[], 0.5).is_err());
    }

    #[test]
    fn test_render_layout() {
        let text = render_conll(&corpus(2));
        assert_eq!(text, "s0 B-ID\nfim O\n\ns1 B-ID\nfim O\n\n");
    }

    #[test]
    fn test_write_three_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = write_conll(&corpus(20), dir.path(), 0.2).expect("gravação");
        let names: Vec<String> = files
            .iter()
            .filter_map(|f| f.path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec![TRAIN_FILE, TEST_FILE, VALIDATION_FILE]);
        assert_eq!(files.iter().map(|f| f.sentences).sum::<usize>(), 20);

        let val = std::fs::read_to_string(dir.path().join(VALIDATION_FILE)).expect("read");
        assert_eq!(val.matches("\n\n").count(), files[2].sentences);
    }

    #[test]
    fn test_failed_split_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(write_conll(&corpus(1), dir.path(), 0.5).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).expect("ls").count(), 0);
    }
}
