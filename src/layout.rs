//! Reporting layout: segments, flat topics, label rewrites and the category
//! whitelist that decides which raw `Abertura` labels survive reshaping.
//!
//! The built-in [`ReportLayout::default`] matches the dashboard front end. A
//! replacement can be loaded from a JSON file with [`ReportLayout::load`]:
//! ```json
//! {
//!   "segments": ["Especial", "PJ", "Total"],
//!   "flat_topics": ["cascada", "comissoes"],
//!   "total_segment": "Total",
//!   "total_topic": "cascada",
//!   "catch_all": "Demais",
//!   "label_rewrites": [
//!     { "raw": "Cheque", "segments": ["Especial"], "label": "Cheque Especial" }
//!   ],
//!   "whitelist": { "credito": { "Especial": ["Cheque Especial", "Demais"] } }
//! }
//! ```

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

/// Renames one raw category label for a group of segments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelRewrite {
    pub raw: String,
    pub segments: Vec<String>,
    pub label: String,
}

/// topic → segment → allowed category labels.
pub type Whitelist = IndexMap<String, IndexMap<String, Vec<String>>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ReportLayout {
    /// Segment columns, in output order.
    pub segments: Vec<String>,
    /// Topics reported without an indicator level and without label cleanup.
    pub flat_topics: Vec<String>,
    pub total_segment: String,
    /// The only topic populated for `total_segment`.
    pub total_topic: String,
    pub catch_all: String,
    #[serde(default)]
    pub label_rewrites: Vec<LabelRewrite>,
    pub whitelist: Whitelist,
}

impl ReportLayout {
    /// Loads a layout from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout file '{path}'"))?;
        let layout: ReportLayout = serde_json::from_str(&content)
            .with_context(|| format!("parsing layout file '{path}'"))?;
        Ok(layout)
    }

    pub fn is_flat(&self, topic: &str) -> bool {
        self.flat_topics.iter().any(|t| t == topic)
    }

    /// Whether `(segment, topic)` belongs in the output at all.
    pub fn includes(&self, segment: &str, topic: &str) -> bool {
        segment != self.total_segment || topic == self.total_topic
    }

    /// Allowed labels for a topic/segment pair, if the layout defines one.
    pub fn allowed(&self, topic: &str, segment: &str) -> Option<&[String]> {
        self.whitelist
            .get(topic)
            .and_then(|by_segment| by_segment.get(segment))
            .map(Vec::as_slice)
    }

    /// Applies the segment-specific rewrite for `label`, if any.
    pub fn rewrite<'a>(&'a self, segment: &str, label: &'a str) -> &'a str {
        self.label_rewrites
            .iter()
            .find(|r| r.raw == label && r.segments.iter().any(|s| s == segment))
            .map(|r| r.label.as_str())
            .unwrap_or(label)
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn topic(entries: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(segment, allowed)| (segment.to_string(), labels(allowed)))
        .collect()
}

impl Default for ReportLayout {
    fn default() -> Self {
        let mut whitelist = Whitelist::new();

        whitelist.insert(
            "credito".to_string(),
            topic(&[
                ("Especial", &["Cheque Especial", "Cartões", "CP", "Consignado", "Hipotecas", "Autos", "Demais"]),
                ("Prospera", &["Cheque Especial", "Cartões", "CP", "Consignado", "Hipotecas", "Autos", "Microcrédito", "Demais"]),
                ("Select", &["Cheque Especial", "Cartões", "CP", "Consignado", "Hipotecas", "Autos", "Agro", "Comex", "Demais"]),
                ("PJ", &["Cheque Emp/ADP", "Cartões", "Hipotecas", "Autos", "Agro", "Capital de Giro", "Comex", "Conta Garantida", "Confirming", "Internegócios", "Demais"]),
                ("Corporate", &["Hipotecas", "Autos", "Agro", "Capital de Giro", "Comex", "Conta Garantida", "Confirming", "Internegócios", "Demais"]),
                ("SCIB", &["Cartões", "Hipotecas", "Autos", "Agro", "Capital de Giro", "Comex", "Confirming", "Internegócios", "Demais"]),
                ("Private", &["Cartões", "CP", "Hipotecas", "Autos", "Agro", "Capital de Giro", "Comex", "Internegócios", "Demais"]),
                ("Consumer", &["CP", "Autos", "Demais"]),
            ]),
        );

        whitelist.insert(
            "captacoes".to_string(),
            topic(&[
                ("Especial", &["DAV", "Contamax", "CDB", "Poupança", "Letras", "Demais"]),
                ("Prospera", &["DAV", "Contamax", "CDB", "Poupança", "Letras", "Demais"]),
                ("Select", &["DAV", "Contamax", "CDB", "Poupança", "Letras", "Captações Comex", "Demais"]),
                ("PJ", &["DAV", "Contamax", "CDB", "Poupança", "Letras", "Captações Comex", "Time Deposit", "Demais"]),
                ("Corporate", &["DAV", "Contamax", "CDB", "Letras", "Captações Comex", "Time Deposit", "Demais"]),
                ("SCIB", &["DAV", "Contamax", "CDB", "Letras", "Captações Comex", "Time Deposit", "LF", "Demais"]),
                ("Private", &["DAV", "Contamax", "CDB", "Letras", "Captações Comex", "COE", "Demais"]),
                ("Consumer", &[]),
            ]),
        );

        whitelist.insert(
            "comissoes".to_string(),
            topic(&[
                ("Especial", &["Cartões", "Seguros Open", "Seguros Related", "Tarifas C/C", "Capitalização", "Consórcio", "Esfera", "Fidelização INSS", "Tecban", "Demais"]),
                ("Prospera", &["Cartões", "Seguros Open", "Seguros Related", "Tarifas C/C", "Capitalização", "Consórcio", "Esfera", "Fidelização INSS", "Tecban", "Demais"]),
                ("Select", &["Cartões", "Seguros Open", "Seguros Related", "Tarifas C/C", "Capitalização", "Consórcio", "Esfera", "Tecban", "AAA", "Demais"]),
                ("PJ", &["Cartões", "Seguros Open", "Seguros Related", "Tarifas C/C", "Capitalização", "Consórcio", "Esfera", "Tecban", "Abertura Conta", "Adquirência", "FX", "Cash", "Demais"]),
                ("Corporate", &["Cartões", "Seguros Open", "Seguros Related", "Tarifas C/C", "Capitalização", "Consórcio", "Mercado de Capitais", "Fiança", "Abertura Conta", "Adquirência", "FX", "Cash", "Demais"]),
                ("SCIB", &["Mercado de Capitais", "FX", "Fiança", "Comex", "Cash", "Corretagem", "Demais"]),
                ("Private", &["Previdência", "Fundos", "FX", "Mercado de Capitais", "Comex", "Esfera", "Cartões", "Demais"]),
                ("Consumer", &["Seguros Open", "Seguros Related", "Tarifas de Crédito", "Demais"]),
            ]),
        );

        Self {
            segments: labels(&[
                "Especial", "Prospera", "Select", "PJ", "Corporate", "SCIB", "Private", "Consumer",
                "Total",
            ]),
            flat_topics: labels(&["cascada", "comissoes"]),
            total_segment: "Total".to_string(),
            total_topic: "cascada".to_string(),
            catch_all: "Demais".to_string(),
            label_rewrites: vec![
                LabelRewrite {
                    raw: "Cheque".to_string(),
                    segments: labels(&["Especial", "Prospera", "Select"]),
                    label: "Cheque Especial".to_string(),
                },
                LabelRewrite {
                    raw: "Cheque".to_string(),
                    segments: labels(&["PJ"]),
                    label: "Cheque Emp/ADP".to_string(),
                },
            ],
            whitelist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_segments_end_with_total() {
        let layout = ReportLayout::default();
        assert_eq!(layout.segments.len(), 9);
        assert_eq!(layout.segments.last().map(String::as_str), Some("Total"));
    }

    #[test]
    fn test_rewrite_depends_on_segment() {
        let layout = ReportLayout::default();
        assert_eq!(layout.rewrite("Especial", "Cheque"), "Cheque Especial");
        assert_eq!(layout.rewrite("Select", "Cheque"), "Cheque Especial");
        assert_eq!(layout.rewrite("PJ", "Cheque"), "Cheque Emp/ADP");
        assert_eq!(layout.rewrite("Corporate", "Cheque"), "Cheque");
        assert_eq!(layout.rewrite("Especial", "Cartões"), "Cartões");
    }

    #[test]
    fn test_includes_only_total_topic_for_total() {
        let layout = ReportLayout::default();
        assert!(layout.includes("Total", "cascada"));
        assert!(!layout.includes("Total", "credito"));
        assert!(layout.includes("PJ", "credito"));
    }

    #[test]
    fn test_allowed_consumer_funding_is_empty() {
        let layout = ReportLayout::default();
        assert_eq!(layout.allowed("captacoes", "Consumer"), Some(&[][..]));
        assert!(layout.allowed("credito", "Total").is_none());
        assert!(layout.allowed("pl", "PJ").is_none());
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "segments": ["Varejo", "Total"],
                "flat_topics": ["cascada"],
                "total_segment": "Total",
                "total_topic": "cascada",
                "catch_all": "Outros",
                "whitelist": {{ "credito": {{ "Varejo": ["Autos", "Outros"] }} }}
            }}"#
        )
        .unwrap();

        let layout = ReportLayout::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(layout.catch_all, "Outros");
        assert!(layout.label_rewrites.is_empty());
        assert_eq!(
            layout.allowed("credito", "Varejo").unwrap(),
            &["Autos".to_string(), "Outros".to_string()]
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ReportLayout::load("/nonexistent/layout.json").is_err());
    }
}
