use image::{GrayImage, Luma};
use mtgscan::detection::ocr::{normalize_whitespace, pad_for_ocr};

#[test]
fn test_padding_surrounds_crop_with_white() {
    let crop = GrayImage::from_pixel(13, 62, Luma([0u8]));
    let padded = pad_for_ocr(&crop, 10);

    assert_eq!(padded.dimensions(), (33, 82));
    assert_eq!(padded.get_pixel(0, 0)[0], 255);
    assert_eq!(padded.get_pixel(9, 40)[0], 255);
    assert_eq!(padded.get_pixel(10, 10)[0], 0);
    assert_eq!(padded.get_pixel(22, 71)[0], 0);
    assert_eq!(padded.get_pixel(23, 71)[0], 255);
}

#[test]
fn test_whitespace_is_collapsed() {
    assert_eq!(normalize_whitespace("  Muldrotha,\n the   Gravetide "), "Muldrotha, the Gravetide");
    assert_eq!(normalize_whitespace("\n"), "");
}
