//! Conversão completa de uma pasta de anotações: concatenação, remoção de
//! semelhantes, divisão treino/teste/validação e relatórios.

use std::fs;
use std::path::Path;

use edital_core::config::{DedupConfig, ExportConfig};
use edital_core::conll::{TEST_FILE, TRAIN_FILE, VALIDATION_FILE};
use edital_core::jsonl::{load_jsonl, ADMIN_FILE, CONCATENATED_FILE, UNKNOWN_FILE};
use edital_core::stats::{DISCARD_REPORT_FILE, MANIFEST_FILE, STATISTICS_FILE};
use edital_core::{ConllExport, DedupScope};
use serde_json::json;

const SESSION: &str = "A sessão pública ocorrerá às 14h em 12/09/17";
const AGENCY: &str = "Prefeitura Municipal de Curitiba abre licitação";

fn record(id: i64, data: &str, label: serde_json::Value) -> String {
    json!({ "id": id, "data": data, "label": label }).to_string()
}

fn write_lines(path: &Path, lines: &[String]) {
    fs::write(path, lines.join("\n") + "\n").expect("write");
}

/// `a/` tem admin + unknown intercalados por id; `b/` só admin, com uma
/// sentença repetida de `a/`.
fn annotated_corpus(root: &Path) {
    let a = root.join("pregao_1");
    let b = root.join("pregao_2");
    fs::create_dir_all(&a).expect("mkdir");
    fs::create_dir_all(&b).expect("mkdir");

    write_lines(
        &a.join(UNKNOWN_FILE),
        &[
            record(1, SESSION, json!([[29, 32, "Tempo"], [36, 44, "Tempo"]])),
            record(3, "Os envelopes serão recebidos na sala de reuniões", json!([])),
        ],
    );
    write_lines(
        &a.join(ADMIN_FILE),
        &[
            record(2, "O objeto desta licitação é a compra de papel", json!([])),
            record(4, "Não serão aceitas propostas enviadas por fax", json!([])),
        ],
    );

    write_lines(
        &b.join(ADMIN_FILE),
        &[
            record(5, AGENCY, json!([[0, 32, "Orgao"]])),
            record(6, "O prazo de entrega é de trinta dias corridos", json!([])),
            record(7, "A garantia contratual será de cinco por cento", json!([])),
            record(8, "Microempresas terão tratamento diferenciado", json!([])),
            record(9, "Recursos devem ser protocolados por escrito", json!([])),
            record(10, "O resultado será publicado no diário oficial", json!([])),
            record(11, SESSION, json!([[29, 32, "Tempo"]])),
        ],
    );
}

fn config(source: &Path, base: &Path) -> ExportConfig {
    ExportConfig {
        source_dir: source.to_path_buf(),
        base_dir: base.to_path_buf(),
        dedup: DedupConfig {
            enabled: true,
            scope: DedupScope::Global,
            reprocess: true,
            ..DedupConfig::default()
        },
        test_fraction: 0.25,
        concatenate: true,
        ..ExportConfig::default()
    }
}

#[test]
fn test_full_export_with_dedup_and_split() {
    let source = tempfile::tempdir().expect("tempdir");
    let base = tempfile::tempdir().expect("tempdir");
    annotated_corpus(source.path());

    let summary = ConllExport::new(config(source.path(), base.path())).run().expect("conversão");

    assert_eq!(summary.files_found, 2);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.discarded, 1);
    assert_eq!(summary.sentences, 10);

    // admin + unknown fundidos em ordem de id
    let merged = load_jsonl(&source.path().join("pregao_1").join(CONCATENATED_FILE)).expect("concatenado");
    let ids: Vec<i64> = merged.lines.iter().map(|l| l.record.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    // 10 sentenças com fração 0.25 → 7 / 1 / 2
    let sizes: Vec<usize> = summary.conll_files.iter().map(|f| f.sentences).collect();
    assert_eq!(sizes, vec![7, 1, 2]);

    let train = fs::read_to_string(source.path().join(TRAIN_FILE)).expect("treino");
    assert!(train.starts_with("A O\nsessão O\n"));
    assert!(train.contains("14h B-TEMPO\nem O\n12/09/17 B-TEMPO\n"));
    assert!(train.contains("Prefeitura B-ORGAO\nMunicipal I-ORGAO\nde I-ORGAO\nCuritiba I-ORGAO\nabre O\n"));
    assert_eq!(train.matches("\n\n").count(), 7);

    let validation = fs::read_to_string(source.path().join(VALIDATION_FILE)).expect("validação");
    assert!(validation.contains("diário O\noficial O\n"));
    assert!(source.path().join(TEST_FILE).is_file());

    assert_eq!(summary.label_totals.get("TEMPO"), Some(&2));
    assert_eq!(summary.label_totals.get("ORGAO"), Some(&1));

    let report = fs::read_to_string(source.path().join(DISCARD_REPORT_FILE)).expect("relatório");
    assert!(report.contains(SESSION));
    assert!(source.path().join(STATISTICS_FILE).is_file());
    assert!(source.path().join(MANIFEST_FILE).is_file());
}

#[test]
fn test_second_run_against_persisted_base_discards_everything() {
    let source = tempfile::tempdir().expect("tempdir");
    let base = tempfile::tempdir().expect("tempdir");
    annotated_corpus(source.path());

    ConllExport::new(config(source.path(), base.path())).run().expect("primeira conversão");

    let mut again = config(source.path(), base.path());
    again.dedup.reprocess = false;
    let summary = ConllExport::new(again).run().expect("segunda conversão");

    assert_eq!(summary.discarded, 11);
    assert_eq!(summary.files_processed, 0);
    assert_eq!(summary.files_failed(), 2);
    assert!(summary.conll_files.is_empty());
}
