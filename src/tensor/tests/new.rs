use crate::assert_panic;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_new() {
    let t = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(t.shape(), &[2, 3]);
    assert_eq!(t[[1, 0]], 4.);
    assert_eq!(t.data_as_slice(), &[1., 2., 3., 4., 5., 6.]);

    let scalar = Tensor::new(&[7.], &[]);
    assert!(scalar.is_scalar());
    assert_eq!(scalar.number(), Some(7.));
}

#[test]
fn test_new_with_wrong_length() {
    assert_panic!(
        Tensor::new(&[1., 2., 3.], &[2, 2]),
        "数据长度3与形状[2, 2]不符"
    );
}

#[test]
fn test_zeros_ones_full() {
    assert_eq!(Tensor::zeros(&[2, 2]).sum(), 0.);
    assert_eq!(Tensor::ones(&[3, 4]).sum(), 12.);
    assert_eq!(Tensor::full(0.1, &[1, 5]).data_as_slice(), &[0.1; 5]);
}

#[test]
fn test_truncated_normal_stays_within_two_std() {
    let mut rng = StdRng::seed_from_u64(7);
    let t = Tensor::truncated_normal_with_rng(0.0, 0.1, &[32, 5, 5], &mut rng);
    assert_eq!(t.shape(), &[32, 5, 5]);
    assert!(t.data_as_slice().iter().all(|x| x.abs() <= 0.2));
    // 800个样本的均值应当接近0
    assert!(t.mean().abs() < 0.02);
}

#[test]
fn test_normal_with_rng_is_reproducible() {
    let a = Tensor::normal_with_rng(1.0, 2.0, &[10], &mut StdRng::seed_from_u64(3));
    let b = Tensor::normal_with_rng(1.0, 2.0, &[10], &mut StdRng::seed_from_u64(3));
    assert_eq!(a, b);
}

#[test]
fn test_one_hot_rows() {
    let t = Tensor::one_hot_rows(5, 10, 3);
    assert_eq!(t.shape(), &[3, 10]);
    assert_eq!(t.argmax_rows(), vec![5, 5, 5]);
    assert_eq!(t.sum(), 3.);
    assert_panic!(Tensor::one_hot_rows(10, 10, 1), "class须<10");
}
