use indicator_lookup::layout::ReportLayout;
use indicator_lookup::output::to_pretty_json;
use indicator_lookup::reshape::build_lookup;
use indicator_lookup::table::{DEFAULT_SHEET, SourceFormat, SourceTable};
use serde_json::Value;

fn render(table: &SourceTable) -> Vec<u8> {
    let (lookup, _) = build_lookup(table, &ReportLayout::default());
    to_pretty_json(&lookup).expect("Failed to render JSON")
}

fn pipeline() -> Value {
    let bytes = include_bytes!("fixtures/base_indicadores.csv");
    let table = SourceTable::from_bytes(bytes, b',').expect("Failed to parse table");
    serde_json::from_slice(&render(&table)).expect("Rendered JSON does not parse")
}

fn close(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[test]
fn test_full_pipeline() {
    let doc = pipeline();

    let saldo = &doc["Especial"]["credito"]["Saldo Médio"];
    assert!(close(&saldo["Cheque Especial"], 120.5));
    assert!(close(&saldo["Consignado"], 500.0));
    // Capital de Giro and Outro Raro are not retail credit lines.
    assert!(close(&saldo["Demais"], 15.0));

    let pj = &doc["PJ"]["credito"]["Saldo Médio"];
    assert!(close(&pj["Cheque Emp/ADP"], 80.0));
    assert!(close(&pj["Capital de Giro"], 900.0));

    assert!(close(&doc["Total"]["cascada"]["MOB"], 6350.0));
    assert!(close(&doc["SCIB"]["comissoes"]["Corretagem"], 55.0));
}

#[test]
fn test_total_segment_only_has_cascada() {
    let doc = pipeline();
    let total = doc["Total"].as_object().unwrap();
    assert_eq!(total.keys().collect::<Vec<_>>(), vec!["cascada"]);
}

#[test]
fn test_categories_stay_within_whitelist() {
    let doc = pipeline();
    let layout = ReportLayout::default();

    for (segment, topics) in doc.as_object().unwrap() {
        for (topic, breakdown) in topics.as_object().unwrap() {
            if layout.is_flat(topic) {
                continue;
            }
            let allowed = layout.allowed(topic, segment).unwrap();
            for (indicator, categories) in breakdown.as_object().unwrap() {
                for category in categories.as_object().unwrap().keys() {
                    assert!(
                        category == &layout.catch_all || allowed.contains(category),
                        "{segment}/{topic}/{indicator}: '{category}' escaped the whitelist"
                    );
                }
            }
        }
    }
}

#[test]
fn test_sums_are_preserved() {
    let bytes = include_bytes!("fixtures/base_indicadores.csv");
    let table = SourceTable::from_bytes(bytes, b',').unwrap();
    let doc = pipeline();

    for segment in ["Especial", "PJ", "Consumer"] {
        let column = table.column_index(segment).unwrap();
        for indicator in table.indicators("credito") {
            let expected: f64 = table
                .rows()
                .filter(|r| r.topic() == "credito" && r.indicator() == indicator)
                .map(|r| r.cell(column).parse::<f64>().unwrap())
                .sum();
            let actual: f64 = doc[segment]["credito"][indicator]
                .as_object()
                .unwrap()
                .values()
                .filter_map(Value::as_f64)
                .sum();
            assert!((expected - actual).abs() < 1e-9, "{segment}/{indicator}");
        }
    }
}

#[test]
fn test_consumer_funding_is_all_catch_all() {
    let doc = pipeline();
    let saldo = doc["Consumer"]["captacoes"]["Saldo Médio"].as_object().unwrap();
    assert_eq!(saldo.len(), 1);
    assert!(close(&saldo["Demais"], 35.0));
}

#[test]
fn test_workbook_matches_delimited_export() {
    let workbook = include_bytes!("fixtures/base_indicadores.xlsx");
    let format = SourceFormat::from_source("base_indicadores.xlsx");
    assert_eq!(format, SourceFormat::Workbook);
    let table =
        SourceTable::load(workbook, format, b',', DEFAULT_SHEET).expect("Failed to read workbook");

    let doc: Value = serde_json::from_slice(&render(&table)).unwrap();
    assert!(close(&doc["Especial"]["credito"]["Saldo Médio"]["Cheque Especial"], 120.5));
    assert!(close(&doc["Total"]["cascada"]["MOB"], 6350.0));
    assert_eq!(doc, pipeline());
}

#[test]
fn test_whole_totals_written_without_fraction() {
    let bytes = include_bytes!("fixtures/base_indicadores.csv");
    let table = SourceTable::from_bytes(bytes, b',').unwrap();
    let body = String::from_utf8(render(&table)).unwrap();

    assert!(body.contains("\"MOB\": 6350"));
    assert!(!body.contains("6350.0"));
    assert!(body.contains("\"Cheque Especial\": 120.5"));
    assert!(!body.contains("null"));
}
