//! # Extração de Descrições
//!
//! A descrição de um marcador é o texto entre ele e o marcador seguinte.
//! Marcadores são localizados pela primeira ocorrência de um termo com o
//! mesmo texto **e** a mesma página.
//!
//! Se o número do próximo marcador volta a aparecer logo adiante (ex: o
//! texto cita "item 2.3." perto do próprio cabeçalho), a descrição se
//! estende até a última dessas ocorrências dentro de [`NEXT_MARKER_WINDOW`]
//! termos a partir da primeira. O último marcador do documento recebe no
//! máximo [`LAST_MARKER_TERMS`] termos.

use crate::terms::TermStream;
use crate::validator::SectionMarker;

/// Janela, em termos, para procurar repetições do próximo marcador.
pub const NEXT_MARKER_WINDOW: usize = 300;

/// Quantos termos a descrição do último marcador pode ter.
pub const LAST_MARKER_TERMS: usize = 300;

/// Índice onde termina a descrição de um marcador que começa em `start`.
fn description_end(terms: &TermStream, start: usize, next: &SectionMarker) -> Option<usize> {
    let first = terms.position_from(&next.number, next.page, start + 1)?;

    let last_in_window = terms
        .iter()
        .enumerate()
        .skip(first)
        .take(NEXT_MARKER_WINDOW + 1)
        .filter(|(_, t)| t.page == next.page && t.text == next.number)
        .map(|(i, _)| i)
        .last()
        .unwrap_or(first);

    Some(last_in_window)
}

/// Preenche o campo `description` de cada marcador, na ordem da lista.
///
/// Não falha: marcadores que não são encontrados no fluxo ficam com descrição vazia.
pub fn fill_descriptions(markers: &mut [SectionMarker], terms: &TermStream) {
    let count = markers.len();

    for i in 0..count {
        let Some(start) = terms.position_from(&markers[i].number, markers[i].page, 0) else {
            continue;
        };

        let end = match markers.get(i + 1) {
            Some(next) => description_end(terms, start, next),
            None => Some((start + 1 + LAST_MARKER_TERMS).min(terms.len())),
        };

        if let Some(end) = end {
            markers[i].description = terms.join_range(start + 1, end);
        }
    }
}
