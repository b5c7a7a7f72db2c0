use scraper::{ElementRef, Html, Node, Selector};

/// 不可见内容的标签, 展平文本时跳过
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// 抓取到的小票页面: DOM 树 + 展平文本
///
/// 展平文本 = 所有可见文本节点各自 trim 后以单个空格连接, 供正则兜底使用。
/// 只读; 提取函数不会修改文档, 同一文档可重复提取。
#[derive(Debug)]
pub struct FetchedDocument {
    html: Html,
    flat_text: String,
}

impl FetchedDocument {
    pub fn parse(body: &str) -> Self {
        let html = Html::parse_document(body);
        let flat_text = flatten(&html);
        Self { html, flat_text }
    }

    pub fn flat_text(&self) -> &str {
        &self.flat_text
    }

    /// 按标签名 (或任意 CSS 选择器) 查找所有元素, 文档顺序
    pub fn find_all(&self, tag: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(tag) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// 元素内全部文本, 逐段 trim 后以空格连接
    pub fn text_of(&self, el: ElementRef<'_>) -> String {
        join_trimmed(el.text())
    }

    /// 元素自身的直接文本子节点 (不含子元素文本)
    pub fn own_text(&self, el: ElementRef<'_>) -> String {
        join_trimmed(el.children().filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        }))
    }

    /// 紧随元素之后的兄弟文本节点 (trim 后), 为空或不是文本时返回 None
    pub fn next_sibling_text(&self, el: ElementRef<'_>) -> Option<String> {
        let sibling = el.next_sibling()?;
        let text = sibling.value().as_text()?.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// 文档顺序中紧随该元素的下一个元素: 有子元素时为第一个子元素, 否则向后/向上查找
    pub fn next_element<'a>(&'a self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        if let Some(child) = el.children().find_map(ElementRef::wrap) {
            return Some(child);
        }

        let mut node = *el;
        loop {
            let mut sibling = node.next_sibling();
            while let Some(candidate) = sibling {
                if let Some(element) = ElementRef::wrap(candidate) {
                    return Some(element);
                }
                sibling = candidate.next_sibling();
            }
            node = node.parent()?;
        }
    }

    /// 行内的直接单元格 (th/td)
    pub fn cells_of<'a>(&'a self, row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        row.children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "th" | "td"))
            .collect()
    }
}

fn join_trimmed<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn flatten(html: &Html) -> String {
    let visible = html.tree.root().descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
        });
        (!hidden).then_some(&**text)
    });
    join_trimmed(visible)
}
