use crate::models::ReceiptMeta;
use crate::receipt::document::FetchedDocument;
use crate::receipt::locale::parse_datetime;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

static CNPJ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").expect("cnpj pattern"));

static EMISSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Data\s+de\s+)?Emiss[ãa]o\s*[:\-]?\s*(\d{2}/\d{2}/\d{4}(?:\s+\d{2}:\d{2}(?::\d{2})?)?)",
    )
    .expect("emission date pattern")
});

static FIELD_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("field gap pattern"));

/// 商户名称标签 (按优先级, 含无重音写法)
const STORE_LABELS: [&str; 9] = [
    "razão social",
    "razao social",
    "nome/razão social",
    "nome/razao social",
    "nome / razão social",
    "emitente",
    "estabelecimento",
    "nome fantasia",
    "nome",
];

/// 候选值中出现这些词说明抓到的是相邻标签而不是值
const LABEL_MARKERS: [&str; 4] = ["cnpj", "cpf", "emissão", "emissao"];

/// 提取小票元数据; 各字段互相独立, 任一失败只影响该字段
pub fn extract_meta(doc: &FetchedDocument) -> ReceiptMeta {
    ReceiptMeta {
        cnpj: find_cnpj(doc.flat_text()),
        store_name: find_store_name(doc),
        purchase_date: find_purchase_date(doc.flat_text()),
    }
}

fn find_cnpj(text: &str) -> Option<String> {
    CNPJ_RE.find(text).map(|m| m.as_str().to_string())
}

fn find_purchase_date(text: &str) -> Option<NaiveDateTime> {
    let caps = EMISSION_RE.captures(text)?;
    parse_datetime(&caps[1])
}

/// 标签启发式: 找到第一个标签元素后, 取其后的兄弟文本或下一个元素的文本
fn find_store_name(doc: &FetchedDocument) -> Option<String> {
    let elements = doc.find_all("*");

    let label = STORE_LABELS.iter().find_map(|label| {
        elements
            .iter()
            .copied()
            .find(|el| normalize_label(&doc.own_text(*el)) == *label)
    })?;

    let candidate = doc
        .next_sibling_text(label)
        .filter(|text| is_value(text))
        .or_else(|| {
            doc.next_element(label)
                .map(|el| doc.text_of(el))
                .filter(|text| is_value(text))
        })?;

    let value = FIELD_GAP_RE.split(candidate.trim()).next()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn normalize_label(text: &str) -> String {
    text.trim().trim_end_matches(':').trim().to_lowercase()
}

fn is_value(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.chars().count() > 2 && !LABEL_MARKERS.iter().any(|m| lower.contains(m))
}
