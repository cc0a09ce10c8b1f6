//! # Agrupamento em Seções e Subseções
//!
//! Transforma a lista plana de marcadores validados numa hierarquia de dois
//! níveis. Todos os marcadores `2.x` pertencem à seção `2`:
//!
//! ```text
//! 1.  DO OBJETO        → Section { number: "1", title: "DO OBJETO" }
//! 1.1 Aquisição de...  →     Subsection { number: "1.1", ... }
//! 1.2 Os itens...      →     Subsection { number: "1.2", ... }
//! 2.  DO PRAZO         → Section { number: "2", title: "DO PRAZO" }
//! ```
//!
//! O primeiro marcador de cada raiz vira a seção (título e primeira página);
//! os seguintes viram subseções.

use serde::{Deserialize, Serialize};

use crate::validator::SectionMarker;

/// Subseção de um edital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    pub number: String,
    pub description: String,
    pub page: u32,
}

/// Seção de um edital com suas subseções.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Raiz numérica da seção (ex: `"2"`).
    pub number: String,
    /// Marcador literal que abriu a seção (ex: `"2."`, `"2.1"`).
    pub marker: String,
    pub title: String,
    /// Páginas onde a seção aparece, na ordem em que foram vistas.
    pub pages: Vec<u32>,
    pub subsections: Vec<Subsection>,
}

impl Section {
    fn open(root: &str, marker: &SectionMarker) -> Self {
        Self {
            number: root.to_string(),
            marker: marker.number.clone(),
            title: marker.description.clone(),
            pages: vec![marker.page],
            subsections: Vec::new(),
        }
    }

    /// Registra uma página, se ainda não estiver na lista.
    pub fn insert_page(&mut self, page: u32) {
        if !self.pages.contains(&page) {
            self.pages.push(page);
        }
    }

    pub fn insert_subsection(&mut self, subsection: Subsection) {
        self.insert_page(subsection.page);
        self.subsections.push(subsection);
    }
}

/// Agrupa os marcadores (já com descrição) em seções.
pub fn group_sections(markers: &[SectionMarker]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for marker in markers {
        let (root, _) = marker.parts();

        match current.as_mut().filter(|section| section.number == root) {
            Some(section) => section.insert_subsection(Subsection {
                number: marker.number.clone(),
                description: marker.description.clone(),
                page: marker.page,
            }),
            None => {
                if let Some(done) = current.replace(Section::open(root, marker)) {
                    sections.push(done);
                }
            }
        }
    }

    sections.extend(current);
    sections
}
