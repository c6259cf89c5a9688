use approx::assert_abs_diff_eq;

use crate::tensor::Tensor;
use crate::vision::Vision;

#[test]
fn test_save_digit_uses_greys_colormap_and_upscales() {
    let dir = std::env::temp_dir().join(format!("mnist_adv_vision_{}", std::process::id()));
    let path = dir.join("plots").join("digit.png");

    let mut digit = Tensor::zeros(&[1, 784]);
    digit[[0, 0]] = 1.0; // 左上角为黑
    digit[[0, 29]] = 0.5;
    digit[[0, 783]] = 3.0; // 截断为 1
    digit[[0, 1]] = -2.0; // 截断为 0
    Vision::save_digit(&digit, &path, 10).unwrap();

    let raw = Vision::load_gray(&path, false).unwrap();
    assert_eq!(raw.shape(), &[280, 280]);
    // 0 为白，1 为黑；放大后同一个 10x10 块内取值相同
    assert_eq!(raw[[0, 0]], 0.0);
    assert_eq!(raw[[9, 9]], 0.0);
    assert_eq!(raw[[0, 10]], 1.0);
    assert_eq!(raw[[279, 279]], 0.0);
    assert_abs_diff_eq!(raw[[15, 15]], 0.5, epsilon = 1.0 / 255.0);

    let restored = Vision::load_gray(&path, true).unwrap();
    assert_eq!(restored[[5, 5]], 1.0);
    assert_eq!(restored[[5, 15]], 0.0);

    std::fs::remove_dir_all(&dir).unwrap();
}
