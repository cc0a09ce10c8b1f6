//! # Tokenizador por Espaços em Branco
//!
//! Os dois pipelines do sistema trabalham com "termos" separados apenas por
//! espaços em branco: a extração de seções lê o texto cru das páginas do
//! edital e a conversão BIO precisa reproduzir exatamente os tokens que a
//! ferramenta de anotação exibiu. Pontuação colada em palavras **não** é
//! separada (ex: `"2.1.Objeto"` continua um único token).
//!
//! Cada token preserva sua posição original no texto (offsets em bytes).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use edital_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("14h em  12/09/17");
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[2].text, "12/09/17");
//! assert_eq!(tokens[2].start, 8);
//! ```

use serde::{Deserialize, Serialize};

/// Um token extraído do texto original.
///
/// `start` e `end` são offsets de byte, de modo que `&text[start..end] == token.text`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// O texto do token (ex: `"2.1"`, `"Objeto"`, `"12/09/17"`).
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Tokeniza um texto separando por espaços em branco Unicode.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start: Option<usize> = None;

    for (byte_pos, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = current_start.take() {
                flush_token(&mut tokens, text, start, byte_pos);
            }
        } else if current_start.is_none() {
            current_start = Some(byte_pos);
        }
    }

    if let Some(start) = current_start {
        flush_token(&mut tokens, text, start, text.len());
    }

    tokens
}

/// Fecha o token acumulado e adiciona à lista
fn flush_token(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize) {
    let index = tokens.len();
    tokens.push(Token {
        text: text[start..end].to_string(),
        start,
        end,
        index,
    });
}
