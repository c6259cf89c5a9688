use super::random_images;
use crate::adversarial::{AdversarialError, InputBuffer};
use crate::assert_err;
use crate::tensor::Tensor;

#[test]
fn test_new_buffer_is_zero() {
    let buffer = InputBuffer::new(4);
    assert_eq!(buffer.batch_size(), 4);
    assert_eq!(buffer.read(), Tensor::zeros(&[4, 784]));
}

#[test]
fn test_assign_then_read_back() {
    let mut buffer = InputBuffer::new(3);
    let images = random_images(3, 1);
    buffer.assign(&images).unwrap();
    assert_eq!(buffer.read(), images);

    // 重复一次结果不变
    buffer.assign(&buffer.read()).unwrap();
    assert_eq!(buffer.read(), images);
    assert_eq!(buffer.value(), &images);
}

#[test]
fn test_assign_wrong_shape_keeps_contents() {
    let mut buffer = InputBuffer::new(2);
    let images = random_images(2, 2);
    buffer.assign(&images).unwrap();

    assert_err!(
        buffer.assign(&Tensor::zeros(&[3, 784])),
        AdversarialError::ShapeMismatch { expected, got } if expected == &[2, 784] && got == &[3, 784]
    );
    assert_err!(
        buffer.assign(&Tensor::zeros(&[2, 28, 28])),
        AdversarialError::ShapeMismatch { .. }
    );
    assert_eq!(buffer.into_inner(), images);
}
