pub mod conv2d;
pub mod dense;
pub mod dropout;
pub mod grads;
pub mod layer;
pub mod pool;

pub use conv2d::Conv2d;
pub use dense::Dense;
pub use dropout::Dropout;
pub use grads::{Gradients, ParamGrads};
pub use layer::{Layer, LayerCache};
pub use pool::MaxPool2d;
