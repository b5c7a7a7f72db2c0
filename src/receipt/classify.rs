/// 判断扫码文本是否像 NFC-e 查询链接 (宽松启发式, 不访问网络)
pub fn looks_like_receipt_url(text: &str) -> bool {
    let lower = text.to_lowercase();

    let has_scheme = text.contains("http://") || text.contains("https://");
    let has_authority = lower.contains("sefaz") || lower.contains("fazenda");
    let has_key = text.contains("p=") || text.contains("chNFe") || lower.contains("chave");

    has_scheme && has_authority && has_key
}

/// 从扫码文本中取出第一个 http(s) 链接; 文本本身就是链接时原样返回
pub fn receipt_url(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|token| token.starts_with("http://") || token.starts_with("https://"))
        .or_else(|| {
            let start = text.find("https://").or_else(|| text.find("http://"))?;
            text[start..].split_whitespace().next()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_sefaz_links_with_key_markers() {
        assert!(looks_like_receipt_url(
            "https://www.sefaz.sp.gov.br/nfce?p=123|2|1|1|ABC&chNFe=351234"
        ));
        assert!(looks_like_receipt_url(
            "http://www.fazenda.rj.gov.br/nfce/consulta?CHAVE=3324"
        ));
        assert!(looks_like_receipt_url(
            "https://portalsped.fazenda.mg.gov.br/portalnfce/sistema/qrcode.xhtml?p=31240"
        ));
    }

    #[test]
    fn rejects_unrelated_text() {
        assert!(!looks_like_receipt_url("https://example.com/abc"));
        assert!(!looks_like_receipt_url("https://example.com/abc?p=1"));
        // 缺少协议
        assert!(!looks_like_receipt_url("www.sefaz.sp.gov.br/nfce?p=1"));
        // 缺少参数标记
        assert!(!looks_like_receipt_url("https://www.sefaz.sp.gov.br/nfce"));
        assert!(!looks_like_receipt_url(""));
    }

    #[test]
    fn extracts_embedded_url() {
        assert_eq!(
            receipt_url("NFC-e: https://sefaz.ba.gov.br/nfce?p=1 obrigado"),
            Some("https://sefaz.ba.gov.br/nfce?p=1")
        );
        assert_eq!(
            receipt_url("url=https://sefaz.ba.gov.br/nfce?p=1"),
            Some("https://sefaz.ba.gov.br/nfce?p=1")
        );
        assert_eq!(receipt_url("sem link"), None);
    }
}
