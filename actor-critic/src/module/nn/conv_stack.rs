use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        PaddingConfig2d, Relu,
    },
    prelude::*,
};

/// One convolution layer of the stack: square kernel, filter count,
/// convolution stride, and the max-pool kernel/stride that follows it.
#[derive(Config, Debug)]
pub struct ConvLayerSpec {
    pub kernel_size: usize,
    pub filters: usize,
    pub stride: usize,
    pub pool: usize,
}

#[derive(Config, Debug)]
pub struct ConvStackConfig {
    pub input_channels: usize,
    pub input_height: usize,
    pub input_width: usize,
    pub layers: Vec<ConvLayerSpec>,
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    pool: MaxPool2d,
}

/// Ordered (convolution → max-pool) blocks followed by a flatten, applied
/// in the order the configuration lists them.
#[derive(Module, Debug)]
pub struct ConvStack<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
    activation: Relu,
}

fn conv_out(size: usize, kernel: usize, stride: usize, padding: usize) -> usize {
    (size + 2 * padding - kernel) / stride + 1
}

fn pool_out(size: usize, pool: usize) -> usize {
    (size - pool) / pool + 1
}

impl ConvStackConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvStack<B> {
        let mut blocks = Vec::new();
        let mut channels = self.input_channels;
        for layer in &self.layers {
            let padding = (layer.kernel_size - 1) / 2;
            blocks.push(ConvBlock {
                conv: Conv2dConfig::new([channels, layer.filters], [layer.kernel_size; 2])
                    .with_stride([layer.stride; 2])
                    .with_padding(PaddingConfig2d::Explicit(padding, padding))
                    .init(device),
                pool: MaxPool2dConfig::new([layer.pool; 2])
                    .with_strides([layer.pool; 2])
                    .init(),
            });
            channels = layer.filters;
        }
        ConvStack {
            blocks,
            activation: Relu::new(),
        }
    }

    /// Flattened feature width produced by `forward`, so downstream layer
    /// widths are known at construction.
    pub fn output_len(&self) -> usize {
        let mut channels = self.input_channels;
        let mut height = self.input_height;
        let mut width = self.input_width;
        for layer in &self.layers {
            let padding = (layer.kernel_size - 1) / 2;
            channels = layer.filters;
            height = pool_out(conv_out(height, layer.kernel_size, layer.stride, padding), layer.pool);
            width = pool_out(conv_out(width, layer.kernel_size, layer.stride, padding), layer.pool);
        }
        channels * height * width
    }
}

impl<B: Backend> ConvStack<B> {
    /// `[batch, channels, height, width]` in, flattened `[batch, features]` out.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = input;
        for block in &self.blocks {
            x = self.activation.forward(block.conv.forward(x));
            x = block.pool.forward(x);
        }
        let [batch, channels, height, width] = x.dims();
        x.reshape([batch, channels * height * width])
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use expect_test::expect;

    use super::*;

    fn spec() -> Vec<ConvLayerSpec> {
        vec![ConvLayerSpec::new(3, 16, 1, 2), ConvLayerSpec::new(3, 32, 1, 2)]
    }

    #[test]
    fn test_forward_matches_output_len() {
        let device = &Default::default();
        let config = ConvStackConfig::new(3, 64, 64, spec());
        let stack = config.init::<NdArray>(device);

        assert_eq!(stack.len(), 2);
        let x = Tensor::zeros([2, 3, 64, 64], device);
        let out = stack.forward(x);
        assert_eq!(out.dims(), [2, config.output_len()]);

        // 64x64 halves twice under pool 2, 32 filters: 32 * 16 * 16
        let expected = expect![[r#"
            8192
        "#]];
        expected.assert_debug_eq(&config.output_len());
    }

    #[test]
    fn test_empty_stack_flattens_input() {
        let device = &Default::default();
        let config = ConvStackConfig::new(3, 8, 8, Vec::new());
        let stack = config.init::<NdArray>(device);

        assert!(stack.is_empty());
        assert_eq!(config.output_len(), 3 * 8 * 8);
        let x = Tensor::zeros([4, 3, 8, 8], device);
        assert_eq!(stack.forward(x).dims(), [4, 192]);
    }

    #[test]
    fn test_feature_width_shrinks_per_block() {
        // Constant filter width, pool 2: every appended block must shrink
        // the flattened output.
        let mut layers = Vec::new();
        let mut previous = usize::MAX;
        for _ in 0..3 {
            layers.push(ConvLayerSpec::new(3, 8, 1, 2));
            let config = ConvStackConfig::new(8, 32, 32, layers.clone());
            let len = config.output_len();
            assert!(len < previous, "expected {} < {}", len, previous);
            previous = len;
        }
    }

    #[test]
    fn test_strided_convolution() {
        let device = &Default::default();
        // Stride 2 conv and pool 2 quarter the spatial dims per block.
        let config = ConvStackConfig::new(1, 16, 16, vec![ConvLayerSpec::new(3, 4, 2, 2)]);
        assert_eq!(config.output_len(), 4 * 4 * 4);

        let stack = config.init::<NdArray>(device);
        let x = Tensor::zeros([1, 1, 16, 16], device);
        assert_eq!(stack.forward(x).dims(), [1, 64]);
    }
}
