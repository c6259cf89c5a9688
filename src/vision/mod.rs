/*
 * @Description  : 本模块提供与图像文件相关的功能：把 MNIST 样本保存为灰度图，或把灰度图读回张量。
 *                 “灰度”（图）等同于英文中luma、luminance、grey、gray的概念。
 */

use std::path::Path;

use image::ImageError;

use crate::tensor::Tensor;

#[cfg(test)]
mod tests;

/// MNIST 图像边长
pub const DIGIT_SIDE: usize = 28;

pub struct Vision;

impl Vision {
    /// 把一张展平的 MNIST 图像（784 个值，形状[784]或[1, 784]）保存为灰度图。
    /// 采用"Greys"色表：0 为白、1 为黑，超出[0,1]的值先截断；`scale`为最近邻放大倍数
    pub fn save_digit(image: &Tensor, path: impl AsRef<Path>, scale: u32) -> Result<(), ImageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ImageError::IoError)?;
        }
        image
            .reshape(&[DIGIT_SIDE, DIGIT_SIDE])
            .to_gray_image(true, scale)
            .save(path)
    }

    /// 读取灰度图为[h, w]张量，像素值映射到[0, 1]（白为 0，黑为 1 时需传`inverted`）
    pub fn load_gray(path: impl AsRef<Path>, inverted: bool) -> Result<Tensor, ImageError> {
        let img = image::open(path)?.to_luma8();
        let (width, height) = img.dimensions();
        let data: Vec<f32> = img
            .pixels()
            .map(|p| {
                let v = f32::from(p[0]) / 255.0;
                if inverted { 1.0 - v } else { v }
            })
            .collect();
        Ok(Tensor::from_vec(data, &[height as usize, width as usize]))
    }
}
