//! # Esquema de Tags BIO
//!
//! Converte as fatias rotuladas de uma sentença ([`crate::annotation`]) em
//! tokens com tags no esquema **BIO** (Beginning-Inside-Outside):
//!
//! - `B-TAG`: Begin — primeiro token de uma entidade
//! - `I-TAG`: Inside — tokens subsequentes da mesma entidade
//! - `O`: Outside — não é parte de nenhuma entidade
//!
//! Diferente de um conjunto fixo de categorias, os labels aqui são os que a
//! equipe de anotação definiu (`Tempo`, `Organizacao`, `Prazo`, ...).
//!
//! ## Exemplo
//! ```text
//! ("Pregão Eletrônico", Some("MODALIDADE"))  →  Pregão B-MODALIDADE, Eletrônico I-MODALIDADE
//! (" em ", None)                              →  em O
//! ```

use serde::{Deserialize, Serialize};

use crate::annotation::{slice_sentence, AnnotationSpan, Slice};
use crate::tokenizer::tokenize;

/// Tag BIO aplicada a um token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// **Begin**: primeiro token da entidade.
    Begin(String),
    /// **Inside**: continuação da entidade.
    Inside(String),
    /// **Outside**: fora de entidade.
    Outside,
}

impl Tag {
    /// Representação textual da tag (ex: "B-TEMPO", "I-PRAZO", "O")
    pub fn label(&self) -> String {
        match self {
            Tag::Begin(l) => format!("B-{l}"),
            Tag::Inside(l) => format!("I-{l}"),
            Tag::Outside => "O".to_string(),
        }
    }

    /// Nome da entidade desta tag (se for B- ou I-)
    pub fn entity(&self) -> Option<&str> {
        match self {
            Tag::Begin(l) | Tag::Inside(l) => Some(l),
            Tag::Outside => None,
        }
    }

    pub fn is_begin(&self) -> bool {
        matches!(self, Tag::Begin(_))
    }

    /// Verifica se a transição tag_prev → self é válida no esquema BIO
    ///
    /// Regras:
    /// - `I-X` só pode seguir `B-X` ou `I-X` (mesmo label)
    /// - `B-X` pode seguir qualquer tag
    /// - `O` pode seguir qualquer tag
    pub fn is_valid_transition(prev: &Tag, next: &Tag) -> bool {
        match next {
            Tag::Inside(label) => match prev {
                Tag::Begin(prev_label) | Tag::Inside(prev_label) => prev_label == label,
                Tag::Outside => false,
            },
            _ => true,
        }
    }

    /// Parseia uma tag a partir de string (ex: "B-TEMPO" → Begin("TEMPO"))
    pub fn from_label(s: &str) -> Option<Self> {
        if s == "O" {
            return Some(Tag::Outside);
        }
        let (prefix, label) = s.split_once('-')?;
        if label.is_empty() {
            return None;
        }
        match prefix {
            "B" => Some(Tag::Begin(label.to_string())),
            "I" => Some(Tag::Inside(label.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Um token com sua tag BIO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub text: String,
    pub tag: Tag,
}

/// Sentença já convertida para tokens com tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    pub tokens: Vec<TaggedToken>,
}

impl TaggedSentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Quantidade de entidades (tags `B-`).
    pub fn entity_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.tag.is_begin()).count()
    }

    /// Nenhum `I-X` aparece sem um `B-X`/`I-X` antes.
    pub fn is_well_formed(&self) -> bool {
        let mut prev = Tag::Outside;
        for token in &self.tokens {
            if !Tag::is_valid_transition(&prev, &token.tag) {
                return false;
            }
            prev = token.tag.clone();
        }
        true
    }
}

/// Distribui as tags entre os tokens de cada fatia.
///
/// Fatias sem label (ou com o label `"O"`) geram só `O`. Nas demais, o
/// primeiro token recebe `B-label` e os seguintes `I-label`. Quando
/// `uppercase` é verdadeiro o label vai em maiúsculas.
pub fn distribute_tags(slices: &[Slice<'_>], uppercase: bool) -> TaggedSentence {
    let mut tokens = Vec::new();

    for slice in slices {
        let label = slice
            .label
            .filter(|l| *l != "O")
            .map(|l| if uppercase { l.to_uppercase() } else { l.to_string() });

        for (i, token) in tokenize(slice.text).into_iter().enumerate() {
            let tag = match &label {
                None => Tag::Outside,
                Some(l) if i == 0 => Tag::Begin(l.clone()),
                Some(l) => Tag::Inside(l.clone()),
            };
            tokens.push(TaggedToken {
                text: token.text,
                tag,
            });
        }
    }

    TaggedSentence { tokens }
}

/// Fatia e distribui as tags de uma sentença anotada.
pub fn tag_sentence(sentence: &str, spans: &[AnnotationSpan], uppercase: bool) -> TaggedSentence {
    distribute_tags(&slice_sentence(sentence, spans), uppercase)
}

/// Uma entidade reconstruída a partir das tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    /// Texto da entidade (tokens unidos por espaço)
    pub text: String,
    pub label: String,
    /// Índice do primeiro token
    pub start_token: usize,
    /// Índice do último token (inclusivo)
    pub end_token: usize,
}

/// Converte uma sequência de tokens com tags BIO em entidades.
///
/// - Inicia uma nova entidade ao encontrar `B-X`.
/// - Continua a entidade enquanto encontrar `I-X` do **mesmo** label.
/// - Finaliza ao encontrar `O`, `B-Y` ou `I-Y` de outro label.
///
/// # Exemplo
/// `[B-TEMPO, O, B-PRAZO, I-PRAZO]` -> `[TEMPO, PRAZO]`
pub fn collect_entities(tokens: &[TaggedToken]) -> Vec<EntityMention> {
    let mut entities = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let Tag::Begin(label) = &tokens[i].tag else {
            i += 1;
            continue;
        };

        let mut words = vec![tokens[i].text.as_str()];
        let mut j = i + 1;
        while let Some(Tag::Inside(next)) = tokens.get(j).map(|t| &t.tag) {
            if next != label {
                break;
            }
            words.push(tokens[j].text.as_str());
            j += 1;
        }

        entities.push(EntityMention {
            text: words.join(" "),
            label: label.clone(),
            start_token: i,
            end_token: j - 1,
        });
        i = j;
    }

    entities
}
