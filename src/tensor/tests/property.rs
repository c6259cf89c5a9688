use crate::assert_panic;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_sum_to_shape() {
    let t = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(t.sum_to_shape(&[1, 3]).data_as_slice(), &[5., 7., 9.]);
    assert_eq!(t.sum_to_shape(&[2, 1]).data_as_slice(), &[6., 15.]);
    assert_eq!(t.sum_to_shape(&[1, 1]).number(), Some(21.));
    assert_panic!(t.sum_to_shape(&[3]));
}

#[test]
fn test_rows() {
    let mut t = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[3, 2]);
    assert_eq!(t.rows(), 3);
    assert_eq!(t.row(1).data_as_slice(), &[3., 4.]);
    assert_eq!(t.row(1).shape(), &[2]);
    assert_eq!(t.select_rows(&[2, 0]).data_as_slice(), &[5., 6., 1., 2.]);
    t.set_row(0, &Tensor::new(&[9., 9.], &[2]));
    assert_eq!(t.data_as_slice(), &[9., 9., 3., 4., 5., 6.]);
    assert_panic!(t.row(3), "索引3越界（上限为3）");
}

#[test]
fn test_argmax_rows_prefers_first_on_tie() {
    let t = Tensor::new(&[0.1, 0.7, 0.2, 0.5, 0.5, 0.0], &[2, 3]);
    assert_eq!(t.argmax_rows(), vec![1, 0]);
}

#[test]
fn test_softmax_rows() {
    let t = Tensor::new(&[1., 2., 3., 1000., 1000., 1000.], &[2, 3]);
    let p = t.softmax_rows();
    assert_abs_diff_eq!(p.row(0).sum(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(p[[0, 2]], 0.665_240_9, epsilon = 1e-6);
    // 数值稳定：大数不会溢出
    assert_abs_diff_eq!(p[[1, 0]], 1.0 / 3.0, epsilon = 1e-6);
}

#[test]
fn test_norms() {
    let t = Tensor::new(&[3., 4., 0., 0.], &[2, 2]);
    assert_eq!(t.norm(), 5.);
    assert_eq!(t.row_norms(), vec![5., 0.]);
}

#[test]
fn test_display() {
    assert_eq!(Tensor::new(&[0.5], &[1, 1]).to_string(), "0.5000");
    assert_eq!(Tensor::new(&[0.1, 0.9], &[2]).to_string(), "[0.1000, 0.9000]");
    assert_eq!(
        Tensor::new(&[1., 2., 3., 4.], &[2, 2]).to_string(),
        "[[1.0000, 2.0000],\n [3.0000, 4.0000]]"
    );
    assert_eq!(Tensor::zeros(&[1, 1, 2, 2]).to_string(), "<张量，形状 [1, 1, 2, 2]>");
}
