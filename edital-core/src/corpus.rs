//! # Corpus de Demonstração
//!
//! Um edital curto (duas páginas) e algumas sentenças anotadas no formato
//! exportado pelo Doccano. Usados nos testes e no endpoint de demonstração
//! do servidor web.
//!
//! O edital contém de propósito os ruídos típicos do gênero: número de
//! página ("Página 2"), ano colado em ponto ("2023."), datas e horários.

use std::collections::BTreeMap;

use crate::annotation::AnnotationSpan;
use crate::extractor::PagedDocument;
use crate::jsonl::AnnotatedRecord;

const PAGE_1: &str = "PREGÃO ELETRÔNICO Nº 12/2023 \
1. DO OBJETO \
1.1 Aquisição de material de expediente para a Secretaria de Educação. \
1.2 As quantidades referem-se ao exercício de 2023. conforme Anexo I. \
2. DAS CONDIÇÕES DE PARTICIPAÇÃO \
2.1 Poderão participar empresas do ramo.";

const PAGE_2: &str = "Página 2 \
2.2 Não poderão participar empresas suspensas. \
3. DO PRAZO \
3.1 A sessão será realizada em 15/03/2023 às 10h. \
3.2 O prazo de entrega é de dez dias úteis.";

/// Edital de demonstração com três seções.
pub fn demo_edital() -> PagedDocument {
    let mut pages = BTreeMap::new();
    pages.insert(1, PAGE_1.to_string());
    pages.insert(2, PAGE_2.to_string());
    PagedDocument {
        document_id: "0001_pregao_eletronico_12_2023.pdf".to_string(),
        lot_id: "lote_demo".to_string(),
        pages,
    }
}

fn record(id: i64, data: &str, spans: &[(usize, usize, &str)]) -> AnnotatedRecord {
    AnnotatedRecord {
        id,
        data: data.to_string(),
        label: spans
            .iter()
            .map(|(start, end, label)| AnnotationSpan::new(*start, *end, *label))
            .collect(),
    }
}

/// Sentenças anotadas como exportadas pela ferramenta de anotação.
///
/// A segunda sentença tem os spans fora de ordem, exatamente como o Doccano
/// às vezes exporta.
pub fn demo_annotations() -> Vec<AnnotatedRecord> {
    vec![
        record(
            1,
            "A Prefeitura de Curitiba torna público o Pregão Eletrônico nº 12/2023",
            &[(2, 24, "Organizacao"), (41, 69, "Modalidade")],
        ),
        record(78, "14h em 12/09/17 Página 2", &[(7, 15, "Tempo"), (0, 3, "Tempo")]),
        record(
            80,
            "O prazo de entrega é de dez dias úteis",
            &[(24, 38, "Prazo")],
        ),
        record(81, "Documentos de habilitação conforme o edital", &[]),
    ]
}

/// As mesmas sentenças, serializadas uma por linha (JSONL).
pub fn demo_jsonl() -> String {
    demo_annotations()
        .iter()
        .filter_map(|r| serde_json::to_string(r).ok())
        .map(|line| line + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_spans_within_text() {
        for record in demo_annotations() {
            let chars = record.data.chars().count();
            for span in &record.label {
                assert!(span.start <= span.end && span.end <= chars, "{span:?} em {}", record.data);
            }
        }
    }

    #[test]
    fn test_demo_jsonl_has_one_line_per_record() {
        assert_eq!(demo_jsonl().lines().count(), demo_annotations().len());
    }
}
