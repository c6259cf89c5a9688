mod buffer;
mod driver;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::tensor::Tensor;

/// 像素取自 N(0.3, 0.3) 的随机图像
pub(super) fn random_images(rows: usize, seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::normal_with_rng(0.3, 0.3, &[rows, 784], &mut rng)
}
