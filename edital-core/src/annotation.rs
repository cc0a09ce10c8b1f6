//! # Fatiamento de Sentenças Anotadas
//!
//! A ferramenta de anotação exporta, para cada sentença, uma lista de spans
//! `[início, fim, label]` em offsets de **caractere** (meio-abertos). A lista
//! pode vir fora de ordem:
//!
//! ```text
//! {"id": 78, "data": "14h em 12/09/17 Página 2", "label": [[7, 15, "Tempo"], [0, 3, "Tempo"]]}
//! ```
//!
//! ## Algoritmo
//! 1. Fronteiras: `0`, depois início e fim de cada span, ordenados; por último o fim da sentença.
//! 2. Labels indexados pelo par literal `(início, fim)` dos spans **originais**, de modo
//!    que a ordenação das fronteiras não embaralha a associação span → label.
//! 3. Cada par consecutivo de fronteiras `(lo, hi)` gera uma fatia `sentença[lo..hi]`,
//!    com o label do par (se houver) ou fora de entidade. Fatias vazias são descartadas.
//!
//! Spans de largura zero (`[n, n, label]`) produzem fatias vazias e portanto
//! somem da saída.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Um span anotado: `[start, end)` em offsets de caractere e seu label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct AnnotationSpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl AnnotationSpan {
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}

impl From<(usize, usize, String)> for AnnotationSpan {
    fn from((start, end, label): (usize, usize, String)) -> Self {
        Self { start, end, label }
    }
}

impl From<AnnotationSpan> for (usize, usize, String) {
    fn from(span: AnnotationSpan) -> Self {
        (span.start, span.end, span.label)
    }
}

/// Uma fatia da sentença e o label que ela recebeu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice<'a> {
    pub text: &'a str,
    /// `None` quando a fatia está fora de qualquer entidade.
    pub label: Option<&'a str>,
}

/// Converte offsets de caractere em offsets de byte, com o fim do texto como limite.
struct CharOffsets {
    bytes: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bytes.push(text.len());
        Self { bytes }
    }

    fn char_len(&self) -> usize {
        self.bytes.len() - 1
    }

    fn byte(&self, char_offset: usize) -> usize {
        self.bytes[char_offset.min(self.char_len())]
    }
}

/// Fatia a sentença pelos spans anotados.
///
/// A concatenação dos textos das fatias, na ordem devolvida, reproduz a
/// sentença original quando os spans não se sobrepõem.
pub fn slice_sentence<'a>(sentence: &'a str, spans: &'a [AnnotationSpan]) -> Vec<Slice<'a>> {
    let offsets = CharOffsets::new(sentence);

    // Em pares repetidos vale o último label, como num dicionário
    let labels: HashMap<(usize, usize), &str> = spans
        .iter()
        .map(|s| ((s.start, s.end), s.label.as_str()))
        .collect();

    let mut boundaries: Vec<usize> = Vec::with_capacity(spans.len() * 2 + 2);
    boundaries.push(0);
    for span in spans {
        boundaries.push(span.start);
        boundaries.push(span.end);
    }
    boundaries.sort_unstable();

    let mut slices = Vec::new();
    let mut push = |lo: usize, hi: Option<usize>| {
        let start = offsets.byte(lo);
        let end = hi.map_or(sentence.len(), |hi| offsets.byte(hi));
        if start >= end {
            return;
        }
        let label = hi.and_then(|hi| labels.get(&(lo, hi)).copied());
        slices.push(Slice {
            text: &sentence[start..end],
            label,
        });
    };

    for pair in boundaries.windows(2) {
        push(pair[0], Some(pair[1]));
    }
    // sentinela: da última fronteira até o fim da sentença
    if let Some(&last) = boundaries.last() {
        push(last, None);
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spans(items: &[(usize, usize, &str)]) -> Vec<AnnotationSpan> {
        items.iter().map(|(s, e, l)| AnnotationSpan::new(*s, *e, *l)).collect()
    }

    #[test]
    fn test_unsorted_spans_resolve_labels() {
        let sentence = "14h em 12/09/17 Página 2";
        let spans = spans(&[(7, 15, "Tempo"), (0, 3, "Tempo")]);
        let slices = slice_sentence(sentence, &spans);

        let pairs: Vec<(&str, Option<&str>)> = slices.iter().map(|s| (s.text, s.label)).collect();
        assert_eq!(
            pairs,
            vec![
                ("14h", Some("Tempo")),
                (" em ", None),
                ("12/09/17", Some("Tempo")),
                (" Página 2", None),
            ]
        );

        let rebuilt: String = slices.iter().map(|s| s.text).collect();
        assert_eq!(rebuilt, sentence);
    }

    #[test]
    fn test_span_at_end_of_sentence() {
        let sentence = "hoje é dia 20/01/2022";
        let spans = spans(&[(11, 21, "Data")]);
        let slices = slice_sentence(sentence, &spans);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[1].text, "20/01/2022");
        assert_eq!(slices[1].label, Some("Data"));
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        let sentence = "Licitação de São Paulo";
        let spans = spans(&[(13, 22, "Local")]);
        let slices = slice_sentence(sentence, &spans);
        assert_eq!(slices.last().map(|s| s.text), Some("São Paulo"));
        assert_eq!(slices.last().and_then(|s| s.label), Some("Local"));
    }

    #[test]
    fn test_zero_width_span_dropped() {
        let sentence = "abc def";
        let spans = spans(&[(3, 3, "Vazio")]);
        let slices = slice_sentence(sentence, &spans);
        assert!(slices.iter().all(|s| s.label.is_none()));
        let rebuilt: String = slices.iter().map(|s| s.text).collect();
        assert_eq!(rebuilt, sentence);
    }

    #[test]
    fn test_no_spans_single_outside_slice() {
        let slices = slice_sentence("sem entidades", &[]);
        assert_eq!(slices, vec![Slice { text: "sem entidades", label: None }]);
    }

    #[test]
    fn test_offsets_past_end_are_clamped() {
        let spans = spans(&[(4, 99, "X")]);
        let slices = slice_sentence("abc def", &spans);
        assert_eq!(slices.last().map(|s| s.text), Some("def"));
    }

    #[test]
    fn test_span_deserializes_from_array() {
        let span: AnnotationSpan = serde_json::from_str(r#"[7, 15, "Tempo"]"#).expect("span válido");
        assert_eq!(span, AnnotationSpan::new(7, 15, "Tempo"));
        assert_eq!(serde_json::to_string(&span).ok().as_deref(), Some(r#"[7,15,"Tempo"]"#));
    }

    proptest! {
        #[test]
        fn prop_disjoint_spans_rebuild_sentence(
            words in prop::collection::vec("[a-zà-ú0-9]{1,6}", 1..12),
            picks in prop::collection::vec(any::<bool>(), 12),
            reverse in any::<bool>(),
        ) {
            let sentence = words.join(" ");
            let mut spans = Vec::new();
            let mut offset = 0;
            for (i, word) in words.iter().enumerate() {
                let len = word.chars().count();
                if picks[i] {
                    spans.push(AnnotationSpan::new(offset, offset + len, "L"));
                }
                offset += len + 1;
            }
            if reverse {
                spans.reverse();
            }

            let slices = slice_sentence(&sentence, &spans);
            let rebuilt: String = slices.iter().map(|s| s.text).collect();
            prop_assert_eq!(&rebuilt, &sentence);

            let labelled = slices.iter().filter(|s| s.label.is_some()).count();
            prop_assert_eq!(labelled, spans.len());
        }
    }
}
