/*
 * @Description  : 运算（op）节点。每个节点只负责两件事：
 *                 由父节点的值算出自身的值，以及把上游梯度传给指定的父节点（VJP）。
 */

mod add;
mod channel_bias_add;
mod conv2d;
mod dropout;
mod leaky_relu;
mod mat_mul;
mod max_pool2d;
mod reshape;

pub(crate) use add::Add;
pub(crate) use channel_bias_add::ChannelBiasAdd;
pub(crate) use conv2d::Conv2d;
pub(crate) use dropout::Dropout;
pub(crate) use leaky_relu::LeakyReLU;
pub(crate) use mat_mul::MatMul;
pub(crate) use max_pool2d::MaxPool2d;
pub(crate) use reshape::Reshape;
