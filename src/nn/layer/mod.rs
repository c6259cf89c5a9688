/*
 * @Description  : Layer 模块 - 组合 Node 构建常见网络结构
 *
 * Layer 不是新的抽象层，只负责创建参数并把节点按固定方式连起来。
 */

mod conv2d;
mod linear;
mod max_pool2d;

pub use conv2d::Conv2d;
pub use linear::Linear;
pub use max_pool2d::MaxPool2d;
