use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

/// 模型输入通道数（RGB）
pub const INPUT_CHANNELS: usize = 3;

/// 将任意解码图像转换为模型输入张量 (1, H, W, 3)，数值范围 [0, 1]
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    height: u32,
    width: u32,
}

impl ImagePreprocessor {
    /// `input_size` 为 (height, width)
    pub fn new(input_size: (u32, u32)) -> Self {
        let (height, width) = input_size;
        Self { height, width }
    }

    pub fn input_dims(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, INPUT_CHANNELS]
    }

    pub fn to_input_tensor(&self, image: &DynamicImage) -> Array4<f32> {
        // 先转RGB再缩放，不保持宽高比
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8())
            .resize_exact(self.width, self.height, FilterType::CatmullRom)
            .to_rgb8();

        Array4::from_shape_fn(
            (1, self.height as usize, self.width as usize, INPUT_CHANNELS),
            |(_, y, x, c)| rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, LumaA, Rgb, Rgba};

    fn assert_normalized(tensor: &Array4<f32>) {
        assert_eq!(tensor.shape(), &[1, 128, 128, 3]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn grayscale_expands_to_three_channels() {
        let gray = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(50, 70, Luma([128u8])));
        let tensor = ImagePreprocessor::new((128, 128)).to_input_tensor(&gray);

        assert_normalized(&tensor);
        let expected = 128.0 / 255.0;
        for c in 0..3 {
            assert!((tensor[[0, 64, 64, c]] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn alpha_channel_is_dropped() {
        let rgba = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(300, 200, Rgba([255u8, 0, 0, 10])));
        let tensor = ImagePreprocessor::new((128, 128)).to_input_tensor(&rgba);

        assert_normalized(&tensor);
        assert_eq!(tensor[[0, 10, 10, 0]], 1.0);
        assert_eq!(tensor[[0, 10, 10, 1]], 0.0);
        assert_eq!(tensor[[0, 10, 10, 2]], 0.0);
    }

    #[test]
    fn gray_alpha_and_sixteen_bit_images_normalize() {
        let la = DynamicImage::ImageLumaA8(ImageBuffer::from_pixel(10, 10, LumaA([255u8, 0])));
        let rgb16 = DynamicImage::ImageRgb16(ImageBuffer::from_pixel(9, 33, Rgb([65535u16, 0, 32768])));
        let preprocessor = ImagePreprocessor::new((128, 128));

        let tensor = preprocessor.to_input_tensor(&la);
        assert_normalized(&tensor);
        assert_eq!(tensor[[0, 0, 0, 2]], 1.0);

        let tensor = preprocessor.to_input_tensor(&rgb16);
        assert_normalized(&tensor);
        assert_eq!(tensor[[0, 127, 127, 0]], 1.0);
        assert_eq!(tensor[[0, 127, 127, 1]], 0.0);
    }

    #[test]
    fn resize_ignores_aspect_ratio() {
        // 左半红、右半蓝的宽图，拉伸后左右分界仍在中间
        let wide = ImageBuffer::from_fn(400, 10, |x, _| {
            if x < 200 {
                Rgb([255u8, 0, 0])
            } else {
                Rgb([0u8, 0, 255])
            }
        });
        let tensor = ImagePreprocessor::new((128, 128)).to_input_tensor(&DynamicImage::ImageRgb8(wide));

        assert_normalized(&tensor);
        assert_eq!(tensor[[0, 0, 5, 0]], 1.0);
        assert_eq!(tensor[[0, 127, 122, 2]], 1.0);
        assert_eq!(tensor[[0, 127, 122, 0]], 0.0);
    }

    #[test]
    fn input_dims_are_nhwc() {
        assert_eq!(ImagePreprocessor::new((128, 96)).input_dims(), [1, 128, 96, 3]);
    }
}
