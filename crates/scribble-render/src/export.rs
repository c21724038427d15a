//! PNG export and data-URI encoding.

use crate::RenderResult;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tiny_skia::Pixmap;

/// Prefix of a base64 PNG data URI.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Pixel data converted from premultiplied to straight alpha, row-major RGBA8.
pub fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    data
}

/// Encode a pixmap as an 8-bit RGBA PNG.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&demultiplied_rgba(pixmap))?;
    }
    Ok(buf)
}

/// Wrap PNG bytes in a `data:image/png;base64,` URI.
pub fn to_data_uri(png: &[u8]) -> String {
    let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len().div_ceil(3) * 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    STANDARD.encode_string(png, &mut uri);
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn decode(png_bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(png_bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_png_round_trip_straight_alpha() {
        let mut pixmap = Pixmap::new(4, 3).unwrap();
        pixmap.fill(Color::from_rgba8(200, 100, 50, 128));

        let (info, data) = decode(&encode_png(&pixmap).unwrap());
        assert_eq!((info.width, info.height), (4, 3));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(data.len(), 4 * 3 * 4);
        // Straight alpha survives premultiplication within rounding
        assert_eq!(data[3], 128);
        assert!((i32::from(data[0]) - 200).abs() <= 2);
        assert!((i32::from(data[1]) - 100).abs() <= 2);
    }

    #[test]
    fn test_transparent_pixels_are_zero() {
        let pixmap = Pixmap::new(2, 2).unwrap();
        assert!(demultiplied_rgba(&pixmap).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_data_uri() {
        let uri = to_data_uri(&[0x89, b'P', b'N', b'G']);
        assert_eq!(uri, "data:image/png;base64,iVBORw==");

        let pixmap = Pixmap::new(1, 1).unwrap();
        let png_bytes = encode_png(&pixmap).unwrap();
        let uri = to_data_uri(&png_bytes);
        let payload = uri.strip_prefix(PNG_DATA_URI_PREFIX).unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), png_bytes);
    }
}
