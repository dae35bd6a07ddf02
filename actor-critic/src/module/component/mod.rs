use burn::{prelude::Backend, tensor::Tensor};

/// Policy capability: observations and carried recurrent state in,
/// action logits and updated state out.
pub trait Actor<B: Backend> {
    type OBatch;
    type State;

    fn logits(&self, observations: Self::OBatch, state: Self::State)
        -> (Tensor<B, 2>, Self::State);
}

/// State-value capability over the same observation batch.
pub trait Value<B: Backend> {
    type OBatch;
    type State;

    fn v_batch(&self, observations: Self::OBatch, state: Self::State)
        -> (Tensor<B, 2>, Self::State);
}
