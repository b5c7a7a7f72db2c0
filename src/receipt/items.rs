use crate::models::LineItem;
use crate::receipt::document::FetchedDocument;
use crate::receipt::locale::parse_decimal;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// 商品表头关键字, 用于给候选表格打分
const HEADER_KEYWORDS: [&str; 6] = [
    "descrição",
    "descricao",
    "qtde",
    "valor unitário",
    "valor unitario",
    "valor total",
];
const SCORE_CELLS: usize = 8;
const MIN_SCORE: usize = 3;

const NAME_KEYS: [&str; 4] = ["descri", "produto", "mercadoria", "item"];
const QTY_KEYS: [&str; 2] = ["qtde", "quant"];
const UNIT_KEYS: [&str; 4] = ["valor unit", "vl unit", "unitário", "unitario"];
const TOTAL_KEYS: [&str; 3] = ["valor total", "vl total", "total"];

/// 展平文本兜底: "1 - Nome Qtde.: 2,0000 Valor unitário R$ 5,00 Valor total R$ 10,00"
static ITEM_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(?:\d+\s*-\s*)?(?P<name>[^|]+?)\s+Qtde\.?\s*:?\s*(?P<qty>-?[\d.,]+)(?:\s+UN\s*:?\s*\S+)?\s+(?:Valor\s+unit[áa]rio|Vl\.?\s*unit\.?)\s*:?\s*(?:R\$)?\s*(?P<unit>-?[\d.,]+)\s+(?:Valor\s+total|Vl\.?\s*total)\s*:?\s*(?:R\$)?\s*(?P<total>-?[\d.,]+)",
    )
    .expect("item text pattern")
});

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("tr selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("cell selector"));

/// 商品列对应的列下标
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ColumnMap {
    name: Option<usize>,
    quantity: Option<usize>,
    unit_price: Option<usize>,
    total_price: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let find = |keys: &[&str]| header.iter().position(|h| keys.iter().any(|k| h.contains(k)));
        Self {
            name: find(&NAME_KEYS[..]),
            quantity: find(&QTY_KEYS[..]),
            unit_price: find(&UNIT_KEYS[..]),
            total_price: find(&TOTAL_KEYS[..]),
        }
    }

    /// 名称列存在, 且不与任一价格列落在同一单元格
    fn is_usable(&self) -> bool {
        self.name.is_some() && self.unit_price != self.name && self.total_price != self.name
    }
}

/// 提取小票商品明细
///
/// 先找结构化表格; 表格没有产出时再对展平文本做正则匹配; 都没有则返回空列表。
pub fn extract_items(doc: &FetchedDocument) -> Vec<LineItem> {
    let items = items_from_tables(doc);
    if !items.is_empty() {
        return items;
    }

    let items = items_from_text(doc.flat_text());
    if items.is_empty() {
        tracing::debug!("no line items found in receipt page");
    }
    items
}

/// 第一层: 结构化表格
fn items_from_tables(doc: &FetchedDocument) -> Vec<LineItem> {
    for table in doc.find_all("table") {
        // 嵌套表格只看最内层, 外层布局表格的单元格会包含整张内表的文本
        if has_nested_table(table) || table_score(doc, table) < MIN_SCORE {
            continue;
        }

        let rows: Vec<Vec<String>> = table
            .select(&ROW_SELECTOR)
            .map(|row| {
                doc.cells_of(row)
                    .into_iter()
                    .map(|cell| doc.text_of(cell))
                    .collect()
            })
            .collect();

        let Some(header_idx) = rows.iter().position(|row| is_header_row(row)) else {
            continue;
        };

        let header = &rows[header_idx];
        let lowered: Vec<String> = header.iter().map(|h| h.to_lowercase()).collect();
        let columns = ColumnMap::from_header(&lowered);
        tracing::debug!("item table header {:?} mapped to {:?}", header, columns);
        if !columns.is_usable() {
            continue;
        }

        return rows
            .iter()
            .skip(header_idx + 1)
            .filter(|row| *row != header)
            .filter_map(|row| item_from_row(row, &columns))
            .collect();
    }

    Vec::new()
}

fn has_nested_table(table: ElementRef<'_>) -> bool {
    table
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "table")
}

/// 前 8 个单元格中出现的表头关键字个数
fn table_score(doc: &FetchedDocument, table: ElementRef<'_>) -> usize {
    let head = table
        .select(&CELL_SELECTOR)
        .take(SCORE_CELLS)
        .map(|cell| doc.text_of(cell))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    HEADER_KEYWORDS.iter().filter(|k| head.contains(*k)).count()
}

fn is_header_row(row: &[String]) -> bool {
    let lowered: Vec<String> = row.iter().map(|c| c.to_lowercase()).collect();
    lowered.iter().any(|c| c.contains("descri")) && lowered.iter().any(|c| c.contains("valor"))
}

fn item_from_row(row: &[String], columns: &ColumnMap) -> Option<LineItem> {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str);

    LineItem::new(
        cell(columns.name).unwrap_or_default(),
        cell(columns.quantity).and_then(parse_decimal),
        cell(columns.unit_price).and_then(parse_decimal),
        cell(columns.total_price).and_then(parse_decimal),
    )
}

/// 第二层: 展平文本正则
fn items_from_text(text: &str) -> Vec<LineItem> {
    ITEM_TEXT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            LineItem::new(
                &caps["name"],
                parse_decimal(&caps["qty"]),
                parse_decimal(&caps["unit"]),
                parse_decimal(&caps["total"]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Option<BigDecimal> {
        Some(BigDecimal::from_str(s).unwrap())
    }

    fn table(rows: &[&[&str]]) -> String {
        let body: String = rows
            .iter()
            .map(|row| {
                let cells: String = row.iter().map(|c| format!("<td>{}</td>", c)).collect();
                format!("<tr>{}</tr>", cells)
            })
            .collect();
        format!("<html><body><table>{}</table></body></html>", body)
    }

    #[test]
    fn structured_table_yields_items() {
        let html = table(&[
            &["Descrição", "Qtde", "Valor unitário", "Valor total"],
            &["Arroz 5kg", "1,0000", "9,99", "9,99"],
        ]);
        let items = extract_items(&FetchedDocument::parse(&html));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Arroz 5kg");
        assert_eq!(items[0].quantity, dec("1.0"));
        assert_eq!(items[0].unit_price, dec("9.99"));
        assert_eq!(items[0].total_price, dec("9.99"));
    }

    #[test]
    fn header_repeats_and_priceless_rows_are_dropped() {
        let html = table(&[
            &["Código", "Descrição", "Qtde", "Valor unitário", "Valor total"],
            &["001", "Leite 1L", "2,0000", "4,50", "9,00"],
            &["Código", "Descrição", "Qtde", "Valor unitário", "Valor total"],
            &["002", "Brinde", "1,0000", "-", ""],
            &["003", "", "1,0000", "3,00", "3,00"],
            &["004", "Pão francês", "0,350", "", "R$ 5,25"],
        ]);
        let items = extract_items(&FetchedDocument::parse(&html));

        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Leite 1L", "Pão francês"]);
        assert_eq!(items[1].unit_price, None);
        assert_eq!(items[1].total_price, dec("5.25"));
    }

    #[test]
    fn low_scoring_tables_are_ignored() {
        let html = format!(
            "<html><body><table><tr><td>Descrição</td><td>Valor</td></tr>\
             <tr><td>Taxa</td><td>1,00</td></tr></table>{}</body></html>",
            "<table><tr><th>Descricao</th><th>Qtde</th><th>Valor unitario</th><th>Valor total</th></tr>\
             <tr><td>Sabão</td><td>3</td><td>2,00</td><td>6,00</td></tr></table>"
        );
        let items = extract_items(&FetchedDocument::parse(&html));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Sabão");
        assert_eq!(items[0].quantity, dec("3"));
    }

    #[test]
    fn table_without_header_row_is_skipped() {
        // 得分够, 但没有同时含 descri 与 valor 的行
        let html = table(&[&["Descrição", "Qtde"], &["Valor unitário", "Valor total"]]);
        let doc = FetchedDocument::parse(&html);
        assert!(items_from_tables(&doc).is_empty());
    }

    #[test]
    fn keywords_past_first_eight_cells_do_not_count() {
        let html = table(&[
            &["x", "x", "x", "x"],
            &["x", "x", "x", "x"],
            &["Descrição", "Qtde", "Valor unitário", "Valor total"],
            &["Arroz 5kg", "1,0000", "9,99", "9,99"],
        ]);
        let doc = FetchedDocument::parse(&html);
        assert!(items_from_tables(&doc).is_empty());
    }

    #[test]
    fn headerless_table_hands_over_to_next_table() {
        let html = "<html><body>\
            <table><tr><td>Descrição</td><td>Qtde</td></tr>\
            <tr><td>Valor unitário</td><td>Valor total</td></tr></table>\
            <table><tr><th>Descrição</th><th>Qtde</th><th>Valor unitário</th><th>Valor total</th></tr>\
            <tr><td>Café 500g</td><td>1</td><td>15,90</td><td>15,90</td></tr></table>\
            </body></html>";
        let items = items_from_tables(&FetchedDocument::parse(html));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Café 500g");
        assert_eq!(items[0].unit_price, dec("15.90"));
    }

    #[test]
    fn layout_wrapper_table_is_not_read_as_items() {
        let inner = "<table><tr><td>Descrição</td><td>Qtde</td><td>Valor unitário</td><td>Valor total</td></tr>\
                     <tr><td>Arroz 5kg</td><td>1,0000</td><td>9,99</td><td>9,99</td></tr></table>";
        let html = format!(
            "<html><body><table><tr><td>{}</td></tr></table></body></html>",
            inner
        );
        let items = extract_items(&FetchedDocument::parse(&html));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Arroz 5kg");
        assert_eq!(items[0].quantity, dec("1"));
        assert_eq!(items[0].unit_price, dec("9.99"));
        assert_eq!(items[0].total_price, dec("9.99"));
    }

    #[test]
    fn name_and_price_in_same_column_is_rejected() {
        assert!(!ColumnMap::from_header(&["descrição / valor total".to_string()]).is_usable());
        assert!(ColumnMap::from_header(&["descrição".to_string(), "valor total".to_string()]).is_usable());
    }

    #[test]
    fn flattened_text_fallback() {
        let html = "<html><body><span>1 - Feijao 1kg</span> <span>Qtde.: 2,0000</span> \
                    <span>Valor unitário R$ 5,00</span> <span>Valor total R$ 10,00</span></body></html>";
        let items = extract_items(&FetchedDocument::parse(html));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Feijao 1kg");
        assert_eq!(items[0].quantity, dec("2.0"));
        assert_eq!(items[0].unit_price, dec("5.00"));
        assert_eq!(items[0].total_price, dec("10.00"));
    }

    #[test]
    fn fallback_reads_consecutive_items() {
        let text = "1 - Feijao 1kg Qtde.: 2,0000 Valor unitário R$ 5,00 Valor total R$ 10,00 \
                    2 - Cafe 500g Qtde.: 1 Valor unitario 12,90 Valor total 12,90";
        let items = items_from_text(text);
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Feijao 1kg", "Cafe 500g"]);
        assert_eq!(items[1].total_price, dec("12.90"));
    }

    #[test]
    fn no_items_is_an_empty_list() {
        let doc = FetchedDocument::parse("<html><body><p>Consulta indisponível</p></body></html>");
        assert!(extract_items(&doc).is_empty());
    }

    #[test]
    fn extraction_is_repeatable() {
        let html = table(&[
            &["Descrição", "Qtde", "Valor unitário", "Valor total"],
            &["Arroz 5kg", "1,0000", "9,99", "9,99"],
        ]);
        let doc = FetchedDocument::parse(&html);
        assert_eq!(extract_items(&doc), extract_items(&doc));
    }
}
