use indexmap::IndexSet;

/// 解码图片中的所有二维码文本 (去重, 保持出现顺序)
///
/// 图片无法解码或没有二维码时返回空列表。
pub fn decode_qr_bytes(image_bytes: &[u8]) -> Vec<String> {
    let image = match image::load_from_memory(image_bytes) {
        Ok(image) => image.to_luma8(),
        Err(e) => {
            tracing::debug!("image decode failed: {}", e);
            return Vec::new();
        }
    };

    let (width, height) = image.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| image.get_pixel(x as u32, y as u32).0[0],
    );

    let mut texts: IndexSet<String> = IndexSet::new();
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) if !content.is_empty() => {
                texts.insert(content);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("QR grid decode failed: {}", e),
        }
    }

    texts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    #[test]
    fn garbage_bytes_decode_to_nothing() {
        assert!(decode_qr_bytes(b"definitely not an image").is_empty());
        assert!(decode_qr_bytes(&[]).is_empty());
    }

    #[test]
    fn blank_image_has_no_codes() {
        let blank = GrayImage::from_pixel(64, 64, Luma([255u8]));
        let mut png = Cursor::new(Vec::new());
        blank.write_to(&mut png, ImageFormat::Png).unwrap();
        assert!(decode_qr_bytes(png.get_ref()).is_empty());
    }
}
