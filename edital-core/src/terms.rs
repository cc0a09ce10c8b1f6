//! # Fluxo de Termos do Documento
//!
//! Primeira etapa da extração de seções: o texto de cada página é quebrado em
//! termos (por espaços em branco) e cada termo carrega o número da página de
//! onde veio. Nenhuma informação de layout é usada.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tokenizer::tokenize;

/// Um termo do documento e a página onde ele aparece.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    pub page: u32,
}

impl Term {
    pub fn new(text: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            page,
        }
    }
}

/// Sequência ordenada e imutável de termos de um documento.
///
/// Quem precisa alterar a sequência (ex: o detector de candidatos, ao separar
/// texto grudado num número de seção) constrói um novo `TermStream`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStream {
    terms: Vec<Term>,
}

impl TermStream {
    /// Quebra as páginas em termos, percorrendo as páginas em ordem crescente.
    pub fn from_pages(pages: &BTreeMap<u32, String>) -> Self {
        let terms = pages
            .iter()
            .flat_map(|(page, text)| {
                tokenize(text)
                    .into_iter()
                    .map(move |token| Term::new(token.text, *page))
            })
            .collect();
        Self { terms }
    }

    pub fn from_terms(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn as_slice(&self) -> &[Term] {
        &self.terms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    /// Primeira posição, a partir de `from`, de um termo com o mesmo texto e página.
    pub fn position_from(&self, text: &str, page: u32, from: usize) -> Option<usize> {
        self.terms
            .iter()
            .skip(from)
            .position(|t| t.page == page && t.text == text)
            .map(|offset| from + offset)
    }

    /// Junta com espaço o texto dos termos no intervalo `[start, end)`.
    pub fn join_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.terms.len());
        if start >= end {
            return String::new();
        }
        self.terms[start..end]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<'a> IntoIterator for &'a TermStream {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}
