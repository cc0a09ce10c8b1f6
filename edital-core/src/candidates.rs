//! # Detecção de Seções Candidatas
//!
//! Procura, no fluxo de termos, os tokens que parecem numeração hierárquica
//! (`1.`, `2.3`, `2.3.4`). Em editais os cabeçalhos de seção são quase sempre
//! números isolados terminados em `.`; termos com mais de um número (datas,
//! intervalos) nunca são um marcador válido.
//!
//! Quando o número vem grudado no texto (`"2.1.Objeto"`), o número vira o
//! candidato e o restante (`"Objeto"`) é inserido como um novo termo logo
//! depois dele, na mesma página. Em vez de alterar a lista enquanto a
//! percorre, o detector constrói um **novo** [`TermStream`] em uma passada.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::terms::{Term, TermStream};

/// Um termo que pode ser marcador de seção.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Numeração do candidato (ex: `"2.1"`, `"3."`).
    pub number: String,
    pub page: u32,
    /// Posição do candidato no fluxo de termos reconstruído.
    pub term_index: usize,
}

impl Candidate {
    /// Divide a numeração em `(seção, subseção)` usando os dois primeiros
    /// componentes separados por ponto: `"2.3.4"` → `("2", "3")`, `"2."` → `("2", "")`.
    pub fn parts(&self) -> (&str, &str) {
        split_number(&self.number)
    }
}

/// Resultado da detecção: o fluxo de termos reconstruído e os candidatos
/// encontrados, na ordem em que aparecem.
#[derive(Debug, Clone, Default)]
pub struct CandidateScan {
    pub terms: TermStream,
    pub candidates: Vec<Candidate>,
}

/// Divide uma numeração em `(seção, subseção)`.
pub fn split_number(number: &str) -> (&str, &str) {
    let mut parts = number.split('.');
    let section = parts.next().unwrap_or("");
    let subsection = parts.next().unwrap_or("");
    (section, subsection)
}

fn numbered_item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9][0-9.]*").expect("regex de itens numerados é válida"))
}

/// Encontra os itens numerados de um termo (ex: `"12/09/17"` → `["12", "09", "17"]`).
pub fn find_numbered_items(text: &str) -> Vec<&str> {
    numbered_item_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// O que fazer com um termo durante a detecção.
#[derive(Debug, PartialEq, Eq)]
enum Classification<'a> {
    /// Não é candidato.
    Reject,
    /// O termo inteiro é o candidato.
    Whole,
    /// O termo começa com o número (terminado em `.`) seguido de texto grudado.
    Split { number: &'a str, rest: &'a str },
}

fn classify(text: &str) -> Classification<'_> {
    let items = find_numbered_items(text);
    let [item] = items.as_slice() else {
        return Classification::Reject;
    };

    if *item == text && !item.starts_with('0') {
        return Classification::Whole;
    }

    if text.starts_with(item) && item.ends_with('.') {
        return Classification::Split {
            number: item,
            rest: &text[item.len()..],
        };
    }

    Classification::Reject
}

/// Detecta as seções candidatas e devolve o fluxo de termos reconstruído.
pub fn detect_candidates(stream: &TermStream) -> CandidateScan {
    let mut terms: Vec<Term> = Vec::with_capacity(stream.len());
    let mut candidates = Vec::new();

    for term in stream {
        match classify(&term.text) {
            Classification::Reject => terms.push(term.clone()),
            Classification::Whole => {
                candidates.push(Candidate {
                    number: term.text.clone(),
                    page: term.page,
                    term_index: terms.len(),
                });
                terms.push(term.clone());
            }
            Classification::Split { number, rest } => {
                candidates.push(Candidate {
                    number: number.to_string(),
                    page: term.page,
                    term_index: terms.len(),
                });
                terms.push(Term::new(number, term.page));
                // "0." não tem texto grudado: nada a inserir
                if !rest.is_empty() {
                    terms.push(Term::new(rest, term.page));
                }
            }
        }
    }

    CandidateScan {
        terms: TermStream::from_terms(terms),
        candidates,
    }
}
