//! # Validação da Sequência de Seções
//!
//! Nem todo número isolado é uma seção: anos, quantidades e contadores de
//! página também aparecem como termos numéricos. O validador percorre os
//! candidatos aos pares (candidato atual `c`, próximo candidato `n`) e guarda
//! a última seção validada. Um candidato é aceito quando:
//!
//! 1. **Continuação da mesma seção** (`c.seção == última.seção`):
//!    - subseções preenchidas e `c.sub == última.sub + 1` ou `c.sub == última.sub`;
//!    - ou, se alguma subseção estiver vazia, `c.sub == "1"` ou `c.seção == "1"`
//!      (reinício após uma raiz numérica).
//! 2. **Início do tipo `x.`**: `c.seção == n.seção`, `c.sub == ""` e `n.sub == "1"`.
//! 3. **Início do tipo `x.1`**: `c.seção == n.seção`, `c.sub == "1"` e `n.sub == "2"`.
//! 4. **Repescagem**: `c.sub == "1"` e, olhando adiante, aparece `(c.seção, "2")`
//!    antes de passar por mais de [`REPESCAGEM_WINDOW`] candidatos. Tolera ruído
//!    entre `x.1` e `x.2`, por exemplo `[6.9, 7.1, 5, 80, 7.2]`.
//!
//! As regras formam uma cadeia: se `c` pertence à mesma seção da última
//! validada, somente a regra 1 decide. O último candidato é sempre aceito.
//!
//! A janela da repescagem e a escolha de `"1"` → `"2"` são heurísticas
//! calibradas para editais de compras e são mantidas literalmente para
//! compatibilidade com os corpora já anotados.

use serde::{Deserialize, Serialize};

use crate::candidates::{split_number, Candidate};

/// Quantos candidatos a repescagem pode ultrapassar antes de desistir.
pub const REPESCAGEM_WINDOW: usize = 30;

/// Um marcador de seção/subseção validado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    /// Numeração literal (ex: `"2."`, `"2.1"`).
    pub number: String,
    pub page: u32,
    /// Texto entre este marcador e o próximo; preenchido pela extração de descrições.
    pub description: String,
}

impl SectionMarker {
    pub fn new(number: impl Into<String>, page: u32) -> Self {
        Self {
            number: number.into(),
            page,
            description: String::new(),
        }
    }

    /// `(seção, subseção)` da numeração.
    pub fn parts(&self) -> (&str, &str) {
        split_number(&self.number)
    }
}

/// Verifica se `c` continua a última seção validada.
fn continues_section(current: (&str, &str), last: (&str, &str)) -> bool {
    let (section, subsection) = current;
    let (_, last_subsection) = last;

    if !subsection.is_empty() && !last_subsection.is_empty() {
        if subsection == last_subsection {
            return true;
        }
        return match (subsection.parse::<u64>(), last_subsection.parse::<u64>()) {
            (Ok(sub), Ok(last_sub)) => sub == last_sub + 1,
            _ => false,
        };
    }

    subsection == "1" || section == "1"
}

/// Procura `(seção, "2")` a partir de `from`, ultrapassando no máximo
/// [`REPESCAGEM_WINDOW`] candidatos.
fn repescagem(candidates: &[Candidate], section: &str, from: usize) -> bool {
    for (inspected, candidate) in candidates.iter().skip(from).enumerate() {
        let (next_section, next_subsection) = candidate.parts();
        if next_section == section && next_subsection == "2" {
            return true;
        }
        if inspected > REPESCAGEM_WINDOW {
            break;
        }
    }
    false
}

/// Decide se o candidato da posição `index` é um marcador genuíno.
fn is_valid(candidates: &[Candidate], index: usize, last: (&str, &str)) -> bool {
    let current = candidates[index].parts();
    let (section, subsection) = current;
    let (next_section, next_subsection) = candidates[index + 1].parts();

    if section == last.0 {
        continues_section(current, last)
    } else if section == next_section && subsection.is_empty() && next_subsection == "1" {
        true
    } else if section == next_section && subsection == "1" && next_subsection == "2" {
        true
    } else if subsection == "1" {
        repescagem(candidates, section, index + 1)
    } else {
        false
    }
}

/// Valida a lista de candidatos e devolve os marcadores aceitos, em ordem.
///
/// Uma lista vazia produz uma lista vazia.
pub fn validate_candidates(candidates: &[Candidate]) -> Vec<SectionMarker> {
    let Some((final_candidate, rest)) = candidates.split_last() else {
        return Vec::new();
    };

    let mut markers = Vec::new();
    let mut last: (String, String) = ("-1".to_string(), String::new());

    for index in 0..rest.len() {
        if is_valid(candidates, index, (&last.0, &last.1)) {
            let candidate = &candidates[index];
            let (section, subsection) = candidate.parts();
            last = (section.to_string(), subsection.to_string());
            markers.push(SectionMarker::new(candidate.number.clone(), candidate.page));
        }
    }

    markers.push(SectionMarker::new(final_candidate.number.clone(), final_candidate.page));
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(numbers: &[&str]) -> Vec<Candidate> {
        numbers
            .iter()
            .enumerate()
            .map(|(i, n)| Candidate {
                number: n.to_string(),
                page: 1,
                term_index: i,
            })
            .collect()
    }

    fn validated(numbers: &[&str]) -> Vec<String> {
        validate_candidates(&candidates(numbers))
            .into_iter()
            .map(|m| m.number)
            .collect()
    }

    #[test]
    fn test_empty_list() {
        assert!(validate_candidates(&[]).is_empty());
    }

    #[test]
    fn test_single_candidate_always_accepted() {
        assert_eq!(validated(&["2020"]), vec!["2020"]);
    }

    #[test]
    fn test_repescagem_scenario() {
        let result = validated(&["6.9", "7.1", "5", "80", "7.2", "7.3", "7.4"]);
        assert_eq!(result, vec!["7.1", "7.2", "7.3", "7.4"]);
    }

    #[test]
    fn test_root_with_dot_then_subsections() {
        let result = validated(&["1.", "1.1", "1.2", "2020", "2.", "2.1", "2.2"]);
        assert_eq!(result, vec!["1.", "1.1", "1.2", "2.", "2.1", "2.2"]);
    }

    #[test]
    fn test_noise_numbers_rejected() {
        let result = validated(&["1.", "1.1", "15", "1.2", "300", "2.", "2.1"]);
        assert_eq!(result, vec!["1.", "1.1", "1.2", "2.", "2.1"]);
    }

    #[test]
    fn test_same_subsection_repeated_is_continuation() {
        // "1.1.1", "1.1.2" compartilham o segundo nível "1"
        let result = validated(&["1.", "1.1", "1.1.1", "1.1.2", "1.2"]);
        assert_eq!(result, vec!["1.", "1.1", "1.1.1", "1.1.2", "1.2"]);
    }

    #[test]
    fn test_skipped_subsection_rejected_within_same_section() {
        // mesma seção da última validada: só a regra de continuação decide
        let result = validated(&["3.1", "3.2", "3.5", "3.6"]);
        assert_eq!(result, vec!["3.1", "3.2", "3.6"]);
    }

    #[test]
    fn test_restart_after_bare_root() {
        let result = validated(&["1.", "1.1", "1.3", "1.", "1.1", "2."]);
        assert_eq!(result, vec!["1.", "1.1", "1.", "1.1", "2."]);
    }

    #[test]
    fn test_repescagem_window_bounded() {
        let mut numbers = vec!["4.1"];
        numbers.extend(std::iter::repeat("99").take(REPESCAGEM_WINDOW + 5));
        numbers.push("4.2");
        let result = validated(&numbers);
        assert_eq!(result.first().map(String::as_str), Some("4.2"));
    }

    #[test]
    fn test_repescagem_within_window() {
        let mut numbers = vec!["4.1"];
        numbers.extend(std::iter::repeat("99").take(REPESCAGEM_WINDOW - 1));
        numbers.push("4.2");
        let result = validated(&numbers);
        assert_eq!(result, vec!["4.1", "4.2"]);
    }

    #[test]
    fn test_marker_pages_preserved() {
        let mut cands = candidates(&["1.", "1.1"]);
        cands[1].page = 3;
        let markers = validate_candidates(&cands);
        assert_eq!(markers[1].page, 3);
        assert!(markers.iter().all(|m| m.description.is_empty()));
    }
}
