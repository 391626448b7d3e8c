use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info};

use crate::data::preprocess::{load_image, save_image};
use crate::error::{Error, Result};
use crate::stego::bits::{bits_to_bytes, bytes_to_bits, find_terminator, frame, TERMINATOR};

// Slot order is the raw interleaved buffer of the decoded image: rows top to
// bottom, pixels left to right, channels in storage order (R, G, B[, A]).
// Encoder and decoder must walk the same order.

/// Writes `payload` and the terminator into the LSBs of `slots`.  Slots after
/// the terminator are untouched.
pub fn encode_bits(slots: &mut [u8], payload: &[u8]) -> Result<()> {
    let framed = frame(payload)?;
    if framed.len() > slots.len() {
        return Err(Error::EncodingCapacity { needed: framed.len(), available: slots.len() });
    }
    for (slot, &bit) in slots.iter_mut().zip(framed.iter()) {
        *slot = (*slot & !1) | (bit & 1);
    }
    Ok(())
}

/// Reads LSBs until the terminator and returns the bits before it.
pub fn decode_bits(slots: &[u8]) -> Result<Vec<u8>> {
    let bits: Vec<u8> = slots.iter().map(|s| s & 1).collect();
    let end = find_terminator(&bits).ok_or(Error::MissingTerminator)?;
    Ok(bits[..end].to_vec())
}

/// Converts to an 8-bit buffer the codec can address: RGBA when the image
/// has alpha, RGB otherwise.
fn to_carrier(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Channel slots available in `img` once converted to a carrier.
pub fn capacity(img: &DynamicImage) -> usize {
    let channels = if img.color().has_alpha() { 4 } else { 3 };
    img.width() as usize * img.height() as usize * channels
}

pub fn encode(img: &DynamicImage, payload: &[u8]) -> Result<DynamicImage> {
    let mut carrier = to_carrier(img);
    match &mut carrier {
        DynamicImage::ImageRgba8(buf) => encode_bits(buf, payload)?,
        DynamicImage::ImageRgb8(buf) => encode_bits(buf, payload)?,
        _ => unreachable!("carrier is always 8-bit RGB or RGBA"),
    }
    debug!(bits = payload.len(), capacity = capacity(img), "payload embedded");
    Ok(carrier)
}

pub fn decode(img: &DynamicImage) -> Result<Vec<u8>> {
    match to_carrier(img) {
        DynamicImage::ImageRgba8(buf) => decode_bits(&buf),
        DynamicImage::ImageRgb8(buf) => decode_bits(&buf),
        _ => unreachable!("carrier is always 8-bit RGB or RGBA"),
    }
}

/// Embeds UTF-8 text.
pub fn encode_message(img: &DynamicImage, message: &str) -> Result<DynamicImage> {
    encode(img, &bytes_to_bits(message.as_bytes()))
}

pub fn decode_message(img: &DynamicImage) -> Result<String> {
    let bytes = bits_to_bytes(&decode(img)?)?;
    Ok(String::from_utf8(bytes)?)
}

/// Output formats that store every 8-bit channel value unchanged.
const LOSSLESS_OUTPUTS: [&str; 4] = ["png", "bmp", "tif", "tiff"];

fn is_lossless(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| LOSSLESS_OUTPUTS.iter().any(|ok| e.eq_ignore_ascii_case(ok)))
        .unwrap_or(false)
}

/// Reads `input`, embeds `message`, and writes a lossless `output`.
pub fn encode_file(input: &Path, message: &str, output: &Path) -> Result<()> {
    if !is_lossless(output) {
        return Err(Error::LossyFormat(output.to_path_buf()));
    }
    let img = load_image(input)?;
    let encoded = encode_message(&img, message)?;
    save_image(&encoded, output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        bits = message.len() * 8 + TERMINATOR.len(),
        capacity = capacity(&img),
        "message encoded"
    );
    Ok(())
}

pub fn decode_file(input: &Path) -> Result<String> {
    decode_message(&load_image(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 7 + y) as u8, (y * 13) as u8, (x * y) as u8])
        }))
    }

    #[test]
    fn message_round_trip() {
        let img = gradient(20, 10);
        let msg = "Testing with encoded message. Orange County, Florida.";
        let encoded = encode_message(&img, msg).unwrap();
        assert_eq!(decode_message(&encoded).unwrap(), msg);
    }

    #[test]
    fn only_payload_and_marker_slots_change() {
        let img = gradient(8, 8);
        let bits = vec![1, 0, 1, 1, 0];
        let encoded = encode(&img, &bits).unwrap();
        let before = img.to_rgb8().into_raw();
        let after = encoded.to_rgb8().into_raw();
        let used = bits.len() + TERMINATOR.len();
        assert!(before.iter().zip(&after).all(|(a, b)| a >> 1 == b >> 1));
        assert_eq!(before[used..], after[used..]);
        assert_eq!(decode(&encoded).unwrap(), bits);
    }

    #[test]
    fn exact_capacity_fits_one_more_bit_does_not() {
        // 4 x 2 RGB = 24 slots: 8 payload bits + 16 marker bits.
        let img = gradient(4, 2);
        let fits = bytes_to_bits(b"a");
        assert_eq!(decode(&encode(&img, &fits).unwrap()).unwrap(), fits);

        let mut too_long = fits.clone();
        too_long.push(0);
        let err = encode(&img, &too_long).unwrap_err();
        assert!(matches!(err, Error::EncodingCapacity { needed: 25, available: 24 }));
    }

    #[test]
    fn rgba_images_use_the_alpha_slot() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255])));
        assert_eq!(capacity(&img), 24);
        let bits = bytes_to_bits(b"z");
        let encoded = encode(&img, &bits).unwrap();
        assert!(encoded.color().has_alpha());
        assert_eq!(decode(&encoded).unwrap(), bits);
    }

    #[test]
    fn clean_image_has_no_marker() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
        assert!(matches!(decode(&img), Err(Error::MissingTerminator)));
    }

    #[test]
    fn empty_payload_round_trips() {
        let img = gradient(4, 4);
        assert_eq!(decode_message(&encode_message(&img, "").unwrap()).unwrap(), "");
    }

    #[test]
    fn file_helpers_refuse_lossy_outputs_and_round_trip_png() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.png");
        gradient(16, 16).save(&src).unwrap();

        for name in ["out.JPG", "out.jpeg", "out.gif", "out"] {
            let lossy = dir.path().join(name);
            assert!(matches!(encode_file(&src, "hi", &lossy), Err(Error::LossyFormat(_))), "{name}");
            assert!(!lossy.exists());
        }

        for name in ["out.png", "out.bmp"] {
            let out = dir.path().join(name);
            encode_file(&src, "hidden message", &out).unwrap();
            assert_eq!(decode_file(&out).unwrap(), "hidden message");
        }
    }
}
