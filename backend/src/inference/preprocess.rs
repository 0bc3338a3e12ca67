use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use ndarray::Array4;

pub const IMAGE_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;
const JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to re-encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Batch of one NHWC image, values in [0, 1].
#[derive(Debug, Clone)]
pub struct ImageTensor(Array4<f32>);

#[cfg(any(feature = "torch", test))]
impl ImageTensor {
    pub fn expected_shape() -> [usize; 4] {
        [1, IMAGE_SIZE as usize, IMAGE_SIZE as usize, CHANNELS]
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn has_expected_shape(&self) -> bool {
        self.shape() == Self::expected_shape()
    }
}

impl From<Array4<f32>> for ImageTensor {
    fn from(array: Array4<f32>) -> Self {
        ImageTensor(array)
    }
}

pub fn preprocess(image_bytes: &[u8]) -> Result<ImageTensor, PreprocessError> {
    let decoded = image::load_from_memory(image_bytes).map_err(PreprocessError::Decode)?;

    // Aspect ratio is not preserved.
    let resized = decoded
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Lanczos3)
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&resized)
        .map_err(PreprocessError::Encode)?;

    let rgb = image::load_from_memory(&jpeg)
        .map_err(PreprocessError::Decode)?
        .to_rgb8();

    let size = IMAGE_SIZE as usize;
    let tensor = Array4::from_shape_fn((1, size, size, CHANNELS), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });

    Ok(ImageTensor(tensor))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    pub fn solid_image(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }
}
