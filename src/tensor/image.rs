/*
 * @Description  : 张量与`image`库之间的转换，目前只需要灰度图
 */

use super::Tensor;
use image::{GrayImage, Luma, imageops};

impl Tensor {
    /// 把形状为[h, w]、取值约在[0,1]的张量转为8位灰度图。
    /// 超出[0,1]的值会被截断；`inverted`为true时0映射为白、1映射为黑（与matplotlib的"Greys"色表一致）。
    /// `scale`为最近邻放大倍数（至少为1）。
    pub fn to_gray_image(&self, inverted: bool, scale: u32) -> GrayImage {
        self.assert_rank(2);
        let (height, width) = (self.shape()[0], self.shape()[1]);
        let mut img = GrayImage::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                let v = self[[y, x]].clamp(0.0, 1.0);
                let v = if inverted { 1.0 - v } else { v };
                img.put_pixel(x as u32, y as u32, Luma([(v * 255.0).round() as u8]));
            }
        }
        let scale = scale.max(1);
        if scale == 1 {
            img
        } else {
            imageops::resize(
                &img,
                width as u32 * scale,
                height as u32 * scale,
                imageops::FilterType::Nearest,
            )
        }
    }
}
