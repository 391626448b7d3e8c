use image::{Rgb, RgbImage};

use crate::saliency::map::SaliencyMap;

/// Jet colour map: dark blue at 0 through cyan, yellow, to dark red at 1.
pub fn jet(value: f64) -> Rgb<u8> {
    let v = value.clamp(0.0, 1.0);
    let channel = |offset: f64| {
        let c = (1.5 - (4.0 * v - offset).abs()).clamp(0.0, 1.0);
        (c * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

pub fn heatmap(map: &SaliencyMap) -> RgbImage {
    RgbImage::from_fn(map.width as u32, map.height as u32, |x, y| {
        jet(map.get(x as usize, y as usize))
    })
}

/// Blends the map, resized to `base`, over it: `(1 - alpha) * base + alpha * jet`.
pub fn overlay(base: &RgbImage, map: &SaliencyMap, alpha: f64) -> RgbImage {
    let (w, h) = base.dimensions();
    let map = map.resize(w as usize, h as usize);
    let alpha = alpha.clamp(0.0, 1.0);
    RgbImage::from_fn(w, h, |x, y| {
        let under = base.get_pixel(x, y).0;
        let over = jet(map.get(x as usize, y as usize)).0;
        let mut out = [0u8; 3];
        for c in 0..3 {
            out[c] = ((1.0 - alpha) * under[c] as f64 + alpha * over[c] as f64).round() as u8;
        }
        Rgb(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jet_endpoints() {
        let low = jet(0.0).0;
        let high = jet(1.0).0;
        assert!(low[2] > 100 && low[0] == 0 && low[1] == 0);
        assert!(high[0] > 100 && high[1] == 0 && high[2] == 0);
        assert_eq!(jet(0.5).0[1], 255);
    }

    #[test]
    fn overlay_matches_base_size_and_alpha_extremes() {
        let base = RgbImage::from_pixel(5, 3, Rgb([10, 20, 30]));
        let map = SaliencyMap { width: 2, height: 2, values: vec![1.0; 4] };
        let none = overlay(&base, &map, 0.0);
        assert_eq!(none, base);
        let full = overlay(&base, &map, 1.0);
        assert_eq!(full.dimensions(), (5, 3));
        assert_eq!(*full.get_pixel(4, 2), jet(1.0));
    }
}
