//! # Extração de Seções de Editais
//!
//! Orquestra o pipeline de ingestão de um documento:
//!
//! 1. [`TermStream`]: texto das páginas → termos com página.
//! 2. [`detect_candidates`]: termos que parecem numeração de seção.
//! 3. [`validate_candidates`]: descarta datas, anos e contadores.
//! 4. [`fill_descriptions`]: texto entre marcadores consecutivos.
//! 5. [`group_sections`]: hierarquia Seção → Subseção.
//!
//! Cada documento é independente dos demais, então um lote pode ser
//! processado em paralelo com `rayon`; a ordem de saída é a ordem de entrada.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidates::detect_candidates;
use crate::description::fill_descriptions;
use crate::error::{Error, Result};
use crate::grouper::{group_sections, Section};
use crate::terms::TermStream;
use crate::validator::validate_candidates;

/// Documento paginado entregue pelo extrator de PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedDocument {
    pub document_id: String,
    /// Lote de ingestão ao qual o documento pertence.
    #[serde(default)]
    pub lot_id: String,
    /// Número da página → texto da página.
    pub pages: BTreeMap<u32, String>,
}

/// Resultado da extração, pronto para ser persistido.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEdital {
    pub document_id: String,
    pub lot_id: String,
    pub sections: Vec<Section>,
    /// Texto cru de cada página, em ordem de página.
    pub page_dump: Vec<String>,
}

/// Extrai as seções de um único documento.
pub fn extract_edital(document: &PagedDocument) -> Result<ExtractedEdital> {
    if document.pages.is_empty() {
        return Err(Error::EmptyDocument(document.document_id.clone()));
    }

    let sections = extract_sections(&document.pages);
    debug!(
        document = %document.document_id,
        sections = sections.len(),
        "seções extraídas"
    );

    Ok(ExtractedEdital {
        document_id: document.document_id.clone(),
        lot_id: document.lot_id.clone(),
        sections,
        page_dump: document.pages.values().cloned().collect(),
    })
}

/// Executa as cinco etapas sobre as páginas de um documento.
pub fn extract_sections(pages: &BTreeMap<u32, String>) -> Vec<Section> {
    let stream = TermStream::from_pages(pages);
    let scan = detect_candidates(&stream);
    let mut markers = validate_candidates(&scan.candidates);
    fill_descriptions(&mut markers, &scan.terms);
    group_sections(&markers)
}

/// Extrai vários documentos em paralelo.
///
/// Cada documento recebe seu próprio `Result`: um documento inválido não
/// interrompe o lote.
pub fn extract_batch(documents: &[PagedDocument]) -> Vec<Result<ExtractedEdital>> {
    documents
        .par_iter()
        .map(|document| {
            extract_edital(document).inspect_err(|err| {
                warn!(document = %document.document_id, "falha na extração: {err}");
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::demo_edital;

    #[test]
    fn test_extract_demo_edital() {
        let edital = extract_edital(&demo_edital()).expect("edital de demonstração é válido");
        let numbers: Vec<&str> = edital.sections.iter().map(|s| s.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);

        let objeto = &edital.sections[0];
        assert_eq!(objeto.title, "DO OBJETO");
        assert_eq!(objeto.subsections.len(), 2);
        assert!(objeto.subsections[0].description.starts_with("Aquisição de material"));

        // o ano "2023" e a data não viram seções
        assert!(edital
            .sections
            .iter()
            .flat_map(|s| s.subsections.iter())
            .all(|sub| !sub.number.starts_with("2023")));
        assert_eq!(edital.page_dump.len(), 2);
    }

    #[test]
    fn test_glued_section_title() {
        let mut pages = BTreeMap::new();
        pages.insert(1, "1.OBJETO Compra de cadeiras 1.1 Cadeiras giratórias 2.PRAZO Dez dias".to_string());
        let sections = extract_sections(&pages);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "OBJETO Compra de cadeiras");
        assert_eq!(sections[1].title, "PRAZO Dez dias");
    }

    #[test]
    fn test_empty_document_is_error() {
        let document = PagedDocument {
            document_id: "vazio.pdf".into(),
            lot_id: "lote".into(),
            pages: BTreeMap::new(),
        };
        assert!(matches!(extract_edital(&document), Err(Error::EmptyDocument(_))));
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let mut empty = demo_edital();
        empty.document_id = "vazio".into();
        empty.pages.clear();

        let mut second = demo_edital();
        second.document_id = "segundo".into();

        let results = extract_batch(&[demo_edital(), empty, second]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(
            results[2].as_ref().map(|e| e.document_id.as_str()).ok(),
            Some("segundo")
        );
    }

    #[test]
    fn test_no_numbering_yields_no_sections() {
        let mut pages = BTreeMap::new();
        pages.insert(1, "texto corrido sem numeração alguma".to_string());
        assert!(extract_sections(&pages).is_empty());
    }
}
